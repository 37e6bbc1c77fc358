//! Element-wise transcendental operators.

use crate::backends::{Backend, nd, parallel, scalar};
use crate::errors::OpResult;
use crate::operators::{BackwardFn, ForwardFn, Operator, check_arity, check_same_shape};
use crate::tensor::Tensor;

pub struct Exp;

impl Operator for Exp {
    fn name(&self) -> &'static str {
        "exp"
    }

    fn arity(&self) -> usize {
        1
    }

    fn forward(&self, backend: Backend) -> Option<ForwardFn> {
        match backend {
            Backend::Scalar => Some(exp_scalar),
            Backend::Ndarray => Some(exp_ndarray),
            Backend::Rayon => Some(exp_rayon),
        }
    }

    fn backward(&self, backend: Backend) -> Option<BackwardFn> {
        match backend {
            Backend::Scalar => None,
            Backend::Ndarray => Some(exp_backward_ndarray),
            Backend::Rayon => Some(exp_backward_rayon),
        }
    }
}

pub struct Tanh;

impl Operator for Tanh {
    fn name(&self) -> &'static str {
        "tanh"
    }

    fn arity(&self) -> usize {
        1
    }

    fn forward(&self, backend: Backend) -> Option<ForwardFn> {
        match backend {
            Backend::Scalar => Some(tanh_scalar),
            Backend::Ndarray => Some(tanh_ndarray),
            Backend::Rayon => Some(tanh_rayon),
        }
    }

    fn backward(&self, backend: Backend) -> Option<BackwardFn> {
        match backend {
            Backend::Scalar => None,
            Backend::Ndarray => Some(tanh_backward_ndarray),
            Backend::Rayon => Some(tanh_backward_rayon),
        }
    }
}

fn operand<'a>(operator: &'static str, inputs: &'a [Tensor]) -> OpResult<&'a Tensor> {
    check_arity(operator, inputs, 1)?;
    Ok(&inputs[0])
}

fn tanh_grad(x: f32, g: f32) -> f32 {
    let t = x.tanh();
    g * (1.0 - t * t)
}

fn exp_scalar(inputs: &[Tensor]) -> OpResult<Tensor> {
    let x = operand("exp", inputs)?;
    Tensor::new(x.shape().to_vec(), scalar::map(x.data(), f32::exp))
}

fn exp_ndarray(inputs: &[Tensor]) -> OpResult<Tensor> {
    let x = operand("exp", inputs)?;
    nd::into_tensor(nd::view(x)?.mapv(f32::exp))
}

fn exp_rayon(inputs: &[Tensor]) -> OpResult<Tensor> {
    let x = operand("exp", inputs)?;
    Tensor::new(x.shape().to_vec(), parallel::map(x.data(), f32::exp))
}

fn exp_backward_ndarray(inputs: &[Tensor], grad: &Tensor) -> OpResult<Vec<Tensor>> {
    let x = operand("exp", inputs)?;
    check_same_shape("exp", x, grad)?;
    let dx = nd::view(x)?.mapv(f32::exp) * &nd::view(grad)?;
    Ok(vec![nd::into_tensor(dx)?])
}

fn exp_backward_rayon(inputs: &[Tensor], grad: &Tensor) -> OpResult<Vec<Tensor>> {
    let x = operand("exp", inputs)?;
    check_same_shape("exp", x, grad)?;
    let dx = parallel::zip_map(x.data(), grad.data(), |v, g| v.exp() * g);
    Ok(vec![Tensor::new(x.shape().to_vec(), dx)?])
}

fn tanh_scalar(inputs: &[Tensor]) -> OpResult<Tensor> {
    let x = operand("tanh", inputs)?;
    Tensor::new(x.shape().to_vec(), scalar::map(x.data(), f32::tanh))
}

fn tanh_ndarray(inputs: &[Tensor]) -> OpResult<Tensor> {
    let x = operand("tanh", inputs)?;
    nd::into_tensor(nd::view(x)?.mapv(f32::tanh))
}

fn tanh_rayon(inputs: &[Tensor]) -> OpResult<Tensor> {
    let x = operand("tanh", inputs)?;
    Tensor::new(x.shape().to_vec(), parallel::map(x.data(), f32::tanh))
}

fn tanh_backward_ndarray(inputs: &[Tensor], grad: &Tensor) -> OpResult<Vec<Tensor>> {
    let x = operand("tanh", inputs)?;
    check_same_shape("tanh", x, grad)?;
    let mut dx = nd::view(grad)?.to_owned();
    dx.zip_mut_with(&nd::view(x)?, |g, &v| *g = tanh_grad(v, *g));
    Ok(vec![nd::into_tensor(dx)?])
}

fn tanh_backward_rayon(inputs: &[Tensor], grad: &Tensor) -> OpResult<Vec<Tensor>> {
    let x = operand("tanh", inputs)?;
    check_same_shape("tanh", x, grad)?;
    let dx = parallel::zip_map(x.data(), grad.data(), tanh_grad);
    Ok(vec![Tensor::new(x.shape().to_vec(), dx)?])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exp_forward_agrees() {
        let x = vec![Tensor::deterministic(&[5, 7], 0)];
        let reference = Exp.forward(Backend::Scalar).unwrap()(&x).unwrap();
        for backend in [Backend::Ndarray, Backend::Rayon] {
            let out = Exp.forward(backend).unwrap()(&x).unwrap();
            assert!(out.max_abs_diff(&reference) < 1e-6);
        }
    }

    #[test]
    fn test_tanh_gradient_at_zero_is_one() {
        let x = vec![Tensor::filled(&[3], 0.0)];
        let grad = Tensor::ones(&[3]);
        for backend in [Backend::Ndarray, Backend::Rayon] {
            let grads = Tanh.backward(backend).unwrap()(&x, &grad).unwrap();
            assert_eq!(grads[0].data(), &[1.0, 1.0, 1.0]);
        }
    }

    #[test]
    fn test_exp_gradient_is_exp() {
        let x = vec![Tensor::new(vec![2], vec![0.0, 1.0]).unwrap()];
        let grad = Tensor::new(vec![2], vec![2.0, 1.0]).unwrap();
        let grads = Exp.backward(Backend::Ndarray).unwrap()(&x, &grad).unwrap();
        assert!((grads[0].data()[0] - 2.0).abs() < 1e-6);
        assert!((grads[0].data()[1] - 1.0f32.exp()).abs() < 1e-6);
    }
}
