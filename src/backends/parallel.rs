//! Data-parallel kernels on the rayon global thread pool.
//!
//! The pool size is whatever the process pinned through
//! [`Device::pin`](super::Device::pin), or rayon's default otherwise.

use rayon::prelude::*;

/// Minimum number of elements handed to one rayon task.
const MIN_SPLIT: usize = 4096;

pub fn map(input: &[f32], f: impl Fn(f32) -> f32 + Sync + Send) -> Vec<f32> {
    input
        .par_iter()
        .with_min_len(MIN_SPLIT)
        .map(|&x| f(x))
        .collect()
}

pub fn zip_map(
    left: &[f32],
    right: &[f32],
    f: impl Fn(f32, f32) -> f32 + Sync + Send,
) -> Vec<f32> {
    debug_assert_eq!(left.len(), right.len());
    left.par_iter()
        .zip(right.par_iter())
        .with_min_len(MIN_SPLIT)
        .map(|(&a, &b)| f(a, b))
        .collect()
}

pub fn sum(input: &[f32]) -> f32 {
    input
        .par_iter()
        .with_min_len(MIN_SPLIT)
        .copied()
        .sum::<f32>()
}

/// `[m, k] x [k, n] -> [m, n]`, one output row per task.
pub fn matmul(a: &[f32], b: &[f32], m: usize, k: usize, n: usize) -> Vec<f32> {
    let mut output = vec![0.0f32; m * n];
    if n == 0 {
        return output;
    }
    output
        .par_chunks_mut(n)
        .enumerate()
        .for_each(|(row, out_row)| {
            let a_row = &a[row * k..(row + 1) * k];
            for (p, &a_val) in a_row.iter().enumerate() {
                let b_row = &b[p * n..(p + 1) * n];
                for (out, &b_val) in out_row.iter_mut().zip(b_row) {
                    *out += a_val * b_val;
                }
            }
        });
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::scalar;

    #[test]
    fn test_matmul_matches_scalar() {
        let (m, k, n) = (17, 9, 23);
        let a: Vec<f32> = (0..m * k).map(|i| (i as f32 * 0.01).sin()).collect();
        let b: Vec<f32> = (0..k * n).map(|i| (i as f32 * 0.02).cos()).collect();
        let expected = scalar::matmul(&a, &b, m, k, n);
        let actual = matmul(&a, &b, m, k, n);
        for (e, a) in expected.iter().zip(actual.iter()) {
            assert!((e - a).abs() < 1e-4);
        }
    }

    #[test]
    fn test_elementwise_kernels() {
        let input: Vec<f32> = (0..10_000).map(|i| i as f32).collect();
        let doubled = map(&input, |x| x * 2.0);
        assert_eq!(doubled[9_999], 19_998.0);
        let added = zip_map(&input, &doubled, |a, b| a + b);
        assert_eq!(added[3], 9.0);
        assert_eq!(sum(&[1.0, 2.0, 3.5]), 6.5);
    }
}
