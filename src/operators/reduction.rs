//! Full reductions.

use crate::backends::{Backend, nd, parallel, scalar};
use crate::errors::{OpError, OpResult};
use crate::operators::{BackwardFn, ForwardFn, Operator, check_arity};
use crate::tensor::Tensor;

/// Sum of all elements; the output is a rank-0 tensor.
pub struct Sum;

impl Operator for Sum {
    fn name(&self) -> &'static str {
        "sum"
    }

    fn arity(&self) -> usize {
        1
    }

    fn forward(&self, backend: Backend) -> Option<ForwardFn> {
        match backend {
            Backend::Scalar => Some(sum_scalar),
            Backend::Ndarray => Some(sum_ndarray),
            Backend::Rayon => Some(sum_rayon),
        }
    }

    fn backward(&self, backend: Backend) -> Option<BackwardFn> {
        match backend {
            Backend::Scalar => None,
            Backend::Ndarray => Some(sum_backward_ndarray),
            Backend::Rayon => Some(sum_backward_rayon),
        }
    }
}

fn sum_scalar(inputs: &[Tensor]) -> OpResult<Tensor> {
    check_arity("sum", inputs, 1)?;
    Ok(Tensor::scalar(scalar::sum(inputs[0].data())))
}

fn sum_ndarray(inputs: &[Tensor]) -> OpResult<Tensor> {
    check_arity("sum", inputs, 1)?;
    Ok(Tensor::scalar(nd::view(&inputs[0])?.sum()))
}

fn sum_rayon(inputs: &[Tensor]) -> OpResult<Tensor> {
    check_arity("sum", inputs, 1)?;
    Ok(Tensor::scalar(parallel::sum(inputs[0].data())))
}

/// The upstream gradient of a full reduction is a single value.
fn upstream_value(grad: &Tensor) -> OpResult<f32> {
    match grad.data() {
        [value] => Ok(*value),
        _ => Err(OpError::ShapeMismatch {
            operator: "sum",
            left: Vec::new(),
            right: grad.shape().to_vec(),
        }),
    }
}

fn sum_backward_ndarray(inputs: &[Tensor], grad: &Tensor) -> OpResult<Vec<Tensor>> {
    check_arity("sum", inputs, 1)?;
    let value = upstream_value(grad)?;
    let dx = ndarray::ArrayD::from_elem(inputs[0].shape(), value);
    Ok(vec![nd::into_tensor(dx)?])
}

fn sum_backward_rayon(inputs: &[Tensor], grad: &Tensor) -> OpResult<Vec<Tensor>> {
    check_arity("sum", inputs, 1)?;
    let value = upstream_value(grad)?;
    let dx = parallel::map(inputs[0].data(), |_| value);
    Ok(vec![Tensor::new(inputs[0].shape().to_vec(), dx)?])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum_forward() {
        let x = vec![Tensor::new(vec![2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap()];
        for backend in Backend::ALL {
            let out = Sum.forward(backend).unwrap()(&x).unwrap();
            assert_eq!(out.rank(), 0);
            assert_eq!(out.data(), &[21.0]);
        }
    }

    #[test]
    fn test_sum_backward_broadcasts_upstream() {
        let x = vec![Tensor::ones(&[2, 2])];
        for backend in [Backend::Ndarray, Backend::Rayon] {
            let grads = Sum.backward(backend).unwrap()(&x, &Tensor::scalar(3.0)).unwrap();
            assert_eq!(grads[0].shape(), &[2, 2]);
            assert_eq!(grads[0].data(), &[3.0; 4]);
        }
    }

    #[test]
    fn test_sum_backward_rejects_non_scalar_upstream() {
        let x = vec![Tensor::ones(&[2])];
        let result = Sum.backward(Backend::Rayon).unwrap()(&x, &Tensor::ones(&[2]));
        assert!(matches!(result, Err(OpError::ShapeMismatch { .. })));
    }
}
