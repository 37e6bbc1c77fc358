//! Element-wise binary operators over equally shaped inputs.

use crate::backends::{Backend, nd, parallel, scalar};
use crate::errors::OpResult;
use crate::operators::{BackwardFn, ForwardFn, Operator, check_arity, check_same_shape};
use crate::tensor::Tensor;

pub struct Add;

impl Operator for Add {
    fn name(&self) -> &'static str {
        "add"
    }

    fn arity(&self) -> usize {
        2
    }

    fn forward(&self, backend: Backend) -> Option<ForwardFn> {
        match backend {
            Backend::Scalar => Some(add_scalar),
            Backend::Ndarray => Some(add_ndarray),
            Backend::Rayon => Some(add_rayon),
        }
    }

    fn backward(&self, backend: Backend) -> Option<BackwardFn> {
        match backend {
            Backend::Scalar => None,
            Backend::Ndarray => Some(add_backward_ndarray),
            Backend::Rayon => Some(add_backward_rayon),
        }
    }
}

pub struct Multiply;

impl Operator for Multiply {
    fn name(&self) -> &'static str {
        "multiply"
    }

    fn arity(&self) -> usize {
        2
    }

    fn forward(&self, backend: Backend) -> Option<ForwardFn> {
        match backend {
            Backend::Scalar => Some(multiply_scalar),
            Backend::Ndarray => Some(multiply_ndarray),
            Backend::Rayon => Some(multiply_rayon),
        }
    }

    fn backward(&self, backend: Backend) -> Option<BackwardFn> {
        match backend {
            Backend::Scalar => None,
            Backend::Ndarray => Some(multiply_backward_ndarray),
            Backend::Rayon => Some(multiply_backward_rayon),
        }
    }
}

fn operands<'a>(operator: &'static str, inputs: &'a [Tensor]) -> OpResult<(&'a Tensor, &'a Tensor)> {
    check_arity(operator, inputs, 2)?;
    check_same_shape(operator, &inputs[0], &inputs[1])?;
    Ok((&inputs[0], &inputs[1]))
}

fn add_scalar(inputs: &[Tensor]) -> OpResult<Tensor> {
    let (a, b) = operands("add", inputs)?;
    Tensor::new(a.shape().to_vec(), scalar::zip_map(a.data(), b.data(), |x, y| x + y))
}

fn add_ndarray(inputs: &[Tensor]) -> OpResult<Tensor> {
    let (a, b) = operands("add", inputs)?;
    nd::into_tensor(&nd::view(a)? + &nd::view(b)?)
}

fn add_rayon(inputs: &[Tensor]) -> OpResult<Tensor> {
    let (a, b) = operands("add", inputs)?;
    Tensor::new(a.shape().to_vec(), parallel::zip_map(a.data(), b.data(), |x, y| x + y))
}

fn add_backward_ndarray(inputs: &[Tensor], grad: &Tensor) -> OpResult<Vec<Tensor>> {
    let (a, _) = operands("add", inputs)?;
    check_same_shape("add", a, grad)?;
    let g = nd::view(grad)?;
    Ok(vec![nd::into_tensor(g.to_owned())?, nd::into_tensor(g.to_owned())?])
}

fn add_backward_rayon(inputs: &[Tensor], grad: &Tensor) -> OpResult<Vec<Tensor>> {
    let (a, _) = operands("add", inputs)?;
    check_same_shape("add", a, grad)?;
    let grad_a = parallel::map(grad.data(), |g| g);
    let grad_b = parallel::map(grad.data(), |g| g);
    Ok(vec![
        Tensor::new(a.shape().to_vec(), grad_a)?,
        Tensor::new(a.shape().to_vec(), grad_b)?,
    ])
}

fn multiply_scalar(inputs: &[Tensor]) -> OpResult<Tensor> {
    let (a, b) = operands("multiply", inputs)?;
    Tensor::new(a.shape().to_vec(), scalar::zip_map(a.data(), b.data(), |x, y| x * y))
}

fn multiply_ndarray(inputs: &[Tensor]) -> OpResult<Tensor> {
    let (a, b) = operands("multiply", inputs)?;
    nd::into_tensor(&nd::view(a)? * &nd::view(b)?)
}

fn multiply_rayon(inputs: &[Tensor]) -> OpResult<Tensor> {
    let (a, b) = operands("multiply", inputs)?;
    Tensor::new(a.shape().to_vec(), parallel::zip_map(a.data(), b.data(), |x, y| x * y))
}

// d(a * b)/da = b, d(a * b)/db = a
fn multiply_backward_ndarray(inputs: &[Tensor], grad: &Tensor) -> OpResult<Vec<Tensor>> {
    let (a, b) = operands("multiply", inputs)?;
    check_same_shape("multiply", a, grad)?;
    let g = nd::view(grad)?;
    Ok(vec![
        nd::into_tensor(&g * &nd::view(b)?)?,
        nd::into_tensor(&g * &nd::view(a)?)?,
    ])
}

fn multiply_backward_rayon(inputs: &[Tensor], grad: &Tensor) -> OpResult<Vec<Tensor>> {
    let (a, b) = operands("multiply", inputs)?;
    check_same_shape("multiply", a, grad)?;
    let grad_a = parallel::zip_map(grad.data(), b.data(), |g, y| g * y);
    let grad_b = parallel::zip_map(grad.data(), a.data(), |g, x| g * x);
    Ok(vec![
        Tensor::new(a.shape().to_vec(), grad_a)?,
        Tensor::new(b.shape().to_vec(), grad_b)?,
    ])
}
