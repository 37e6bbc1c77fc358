//! `ndarray` adapters: borrow tensor buffers as views and move results back.

use ndarray::{ArrayD, ArrayView2, ArrayViewD, IxDyn};

use crate::errors::{OpError, OpResult};
use crate::tensor::Tensor;

pub fn view(tensor: &Tensor) -> OpResult<ArrayViewD<'_, f32>> {
    ArrayViewD::from_shape(IxDyn(tensor.shape()), tensor.data()).map_err(|_| {
        OpError::InvalidShape {
            shape: tensor.shape().to_vec(),
            len: tensor.len(),
        }
    })
}

pub fn view2<'a>(operator: &'static str, tensor: &'a Tensor) -> OpResult<ArrayView2<'a, f32>> {
    if tensor.rank() != 2 {
        return Err(OpError::RankMismatch {
            operator,
            expected: 2,
            actual: tensor.rank(),
        });
    }
    let shape = (tensor.shape()[0], tensor.shape()[1]);
    ArrayView2::from_shape(shape, tensor.data()).map_err(|_| OpError::InvalidShape {
        shape: tensor.shape().to_vec(),
        len: tensor.len(),
    })
}

/// Converts an owned array back into a [`Tensor`] without copying when the
/// array is already in standard layout.
pub fn into_tensor<D: ndarray::Dimension>(array: ndarray::Array<f32, D>) -> OpResult<Tensor> {
    let array: ArrayD<f32> = array.into_dyn();
    let shape = array.shape().to_vec();
    let data = if array.is_standard_layout() {
        let (data, offset) = array.into_raw_vec_and_offset();
        match offset {
            Some(0) | None => data,
            Some(start) => data[start..].to_vec(),
        }
    } else {
        array.iter().copied().collect()
    };
    Tensor::new(shape, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_round_trip() {
        let t = Tensor::deterministic(&[3, 4], 0);
        let v = view(&t).unwrap();
        assert_eq!(v.shape(), &[3, 4]);
        let back = into_tensor(v.to_owned()).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn test_transposed_result_is_copied_in_logical_order() {
        let t = Tensor::new(vec![2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let v = view2("test", &t).unwrap();
        let transposed = into_tensor(v.t().to_owned()).unwrap();
        assert_eq!(transposed.shape(), &[3, 2]);
        assert_eq!(transposed.data(), &[1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
    }

    #[test]
    fn test_view2_rejects_other_ranks() {
        let t = Tensor::ones(&[2, 2, 2]);
        assert!(matches!(
            view2("matmul", &t),
            Err(OpError::RankMismatch { actual: 3, .. })
        ));
    }
}
