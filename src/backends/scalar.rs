//! Baseline kernels: straightforward loops over row-major slices.

pub fn map(input: &[f32], f: impl Fn(f32) -> f32) -> Vec<f32> {
    let mut output = Vec::with_capacity(input.len());
    for &x in input {
        output.push(f(x));
    }
    output
}

pub fn zip_map(left: &[f32], right: &[f32], f: impl Fn(f32, f32) -> f32) -> Vec<f32> {
    debug_assert_eq!(left.len(), right.len());
    let mut output = Vec::with_capacity(left.len());
    for i in 0..left.len() {
        output.push(f(left[i], right[i]));
    }
    output
}

pub fn sum(input: &[f32]) -> f32 {
    let mut total = 0.0;
    for &x in input {
        total += x;
    }
    total
}

/// `[m, k] x [k, n] -> [m, n]`.
pub fn matmul(a: &[f32], b: &[f32], m: usize, k: usize, n: usize) -> Vec<f32> {
    let mut output = vec![0.0f32; m * n];
    for i in 0..m {
        for j in 0..n {
            let mut acc = 0.0;
            for p in 0..k {
                acc += a[i * k + p] * b[p * n + j];
            }
            output[i * n + j] = acc;
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matmul_small() {
        // [[1, 2], [3, 4]] x [[5, 6], [7, 8]]
        let out = matmul(&[1.0, 2.0, 3.0, 4.0], &[5.0, 6.0, 7.0, 8.0], 2, 2, 2);
        assert_eq!(out, vec![19.0, 22.0, 43.0, 50.0]);
    }

    #[test]
    fn test_zip_map_and_sum() {
        let out = zip_map(&[1.0, 2.0], &[3.0, 4.0], |a, b| a * b);
        assert_eq!(out, vec![3.0, 8.0]);
        assert_eq!(sum(&out), 11.0);
        assert_eq!(map(&[1.0, -2.0], f32::abs), vec![1.0, 2.0]);
    }
}
