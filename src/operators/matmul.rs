//! Rank-2 matrix multiplication.

use crate::backends::{Backend, nd, parallel, scalar};
use crate::errors::{OpError, OpResult};
use crate::operators::{BackwardFn, ForwardFn, Operator, check_arity};
use crate::tensor::Tensor;

/// `[m, k] x [k, n] -> [m, n]`.
///
/// The rayon backend only provides the forward kernel.
pub struct Matmul;

impl Operator for Matmul {
    fn name(&self) -> &'static str {
        "matmul"
    }

    fn arity(&self) -> usize {
        2
    }

    fn forward(&self, backend: Backend) -> Option<ForwardFn> {
        match backend {
            Backend::Scalar => Some(matmul_scalar),
            Backend::Ndarray => Some(matmul_ndarray),
            Backend::Rayon => Some(matmul_rayon),
        }
    }

    fn backward(&self, backend: Backend) -> Option<BackwardFn> {
        match backend {
            Backend::Ndarray => Some(matmul_backward_ndarray),
            Backend::Scalar | Backend::Rayon => None,
        }
    }
}

/// Validates operand ranks and inner dimensions, returning `(m, k, n)`.
fn dims(inputs: &[Tensor]) -> OpResult<(usize, usize, usize)> {
    check_arity("matmul", inputs, 2)?;
    let (a, b) = (&inputs[0], &inputs[1]);
    for t in [a, b] {
        if t.rank() != 2 {
            return Err(OpError::RankMismatch {
                operator: "matmul",
                expected: 2,
                actual: t.rank(),
            });
        }
    }
    if a.shape()[1] != b.shape()[0] {
        return Err(OpError::ShapeMismatch {
            operator: "matmul",
            left: a.shape().to_vec(),
            right: b.shape().to_vec(),
        });
    }
    Ok((a.shape()[0], a.shape()[1], b.shape()[1]))
}

fn matmul_scalar(inputs: &[Tensor]) -> OpResult<Tensor> {
    let (m, k, n) = dims(inputs)?;
    let out = scalar::matmul(inputs[0].data(), inputs[1].data(), m, k, n);
    Tensor::new(vec![m, n], out)
}

fn matmul_ndarray(inputs: &[Tensor]) -> OpResult<Tensor> {
    dims(inputs)?;
    let a = nd::view2("matmul", &inputs[0])?;
    let b = nd::view2("matmul", &inputs[1])?;
    nd::into_tensor(a.dot(&b))
}

fn matmul_rayon(inputs: &[Tensor]) -> OpResult<Tensor> {
    let (m, k, n) = dims(inputs)?;
    let out = parallel::matmul(inputs[0].data(), inputs[1].data(), m, k, n);
    Tensor::new(vec![m, n], out)
}

// dA = G . B^T, dB = A^T . G
fn matmul_backward_ndarray(inputs: &[Tensor], grad: &Tensor) -> OpResult<Vec<Tensor>> {
    let (m, _, n) = dims(inputs)?;
    if grad.shape() != [m, n] {
        return Err(OpError::ShapeMismatch {
            operator: "matmul",
            left: vec![m, n],
            right: grad.shape().to_vec(),
        });
    }
    let a = nd::view2("matmul", &inputs[0])?;
    let b = nd::view2("matmul", &inputs[1])?;
    let g = nd::view2("matmul", grad)?;
    Ok(vec![
        nd::into_tensor(g.dot(&b.t()))?,
        nd::into_tensor(a.t().dot(&g))?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matmul_forward_agrees() {
        let inputs = vec![
            Tensor::deterministic(&[12, 7], 0),
            Tensor::deterministic(&[7, 5], 1),
        ];
        let reference = matmul_scalar(&inputs).unwrap();
        assert_eq!(reference.shape(), &[12, 5]);
        for backend in [Backend::Ndarray, Backend::Rayon] {
            let out = Matmul.forward(backend).unwrap()(&inputs).unwrap();
            assert!(out.max_abs_diff(&reference) < 1e-4, "{}", backend);
        }
    }

    #[test]
    fn test_matmul_backward_shapes_and_values() {
        // A = [[1, 2]], B = [[3], [4]], G = [[1]]
        let inputs = vec![
            Tensor::new(vec![1, 2], vec![1.0, 2.0]).unwrap(),
            Tensor::new(vec![2, 1], vec![3.0, 4.0]).unwrap(),
        ];
        let grads = matmul_backward_ndarray(&inputs, &Tensor::ones(&[1, 1])).unwrap();
        assert_eq!(grads[0].shape(), &[1, 2]);
        assert_eq!(grads[0].data(), &[3.0, 4.0]);
        assert_eq!(grads[1].shape(), &[2, 1]);
        assert_eq!(grads[1].data(), &[1.0, 2.0]);
    }

    #[test]
    fn test_rayon_has_no_matmul_gradient() {
        assert!(Matmul.backward(Backend::Rayon).is_none());
        assert!(Matmul.backward(Backend::Ndarray).is_some());
    }

    #[test]
    fn test_inner_dimension_mismatch() {
        let inputs = vec![Tensor::ones(&[2, 3]), Tensor::ones(&[2, 3])];
        assert!(matches!(
            matmul_scalar(&inputs),
            Err(OpError::ShapeMismatch { .. })
        ));
    }
}
