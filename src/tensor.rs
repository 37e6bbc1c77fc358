//! Dense row-major `f32` tensors shared by every backend.
//!
//! Backends never own a private array type across the benchmark boundary:
//! inputs are generated once as [`Tensor`]s and each kernel borrows the
//! underlying buffer (as a slice or as an `ndarray` view), so conversion
//! cost stays out of the timed region.

use rand::Rng;
use rand::distributions::Uniform;

use crate::errors::{OpError, OpResult};

/// Lower bound of generated input values. Keeping inputs strictly positive
/// keeps every operator inside its domain.
pub const INPUT_LOW: f32 = 0.5;
/// Upper bound (exclusive) of generated input values.
pub const INPUT_HIGH: f32 = 1.5;

#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    shape: Vec<usize>,
    data: Vec<f32>,
}

impl Tensor {
    /// Creates a tensor, checking that `data` holds exactly one value per element of `shape`.
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> OpResult<Self> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(OpError::InvalidShape {
                shape,
                len: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    pub fn filled(shape: &[usize], value: f32) -> Self {
        let len = shape.iter().product();
        Self {
            shape: shape.to_vec(),
            data: vec![value; len],
        }
    }

    pub fn ones(shape: &[usize]) -> Self {
        Self::filled(shape, 1.0)
    }

    /// Rank-0 tensor holding a single value.
    pub fn scalar(value: f32) -> Self {
        Self {
            shape: Vec::new(),
            data: vec![value],
        }
    }

    /// Deterministic input in `[INPUT_LOW, INPUT_HIGH]`; `salt` decorrelates
    /// the inputs of multi-input operators.
    pub fn deterministic(shape: &[usize], salt: usize) -> Self {
        let len: usize = shape.iter().product();
        let mid = (INPUT_LOW + INPUT_HIGH) / 2.0;
        let half = (INPUT_HIGH - INPUT_LOW) / 2.0;
        let data = (0..len)
            .map(|i| mid + half * ((i + salt * 7919) as f32 * 0.001).sin())
            .collect();
        Self {
            shape: shape.to_vec(),
            data,
        }
    }

    /// Uniform random input in `[INPUT_LOW, INPUT_HIGH)`.
    pub fn random<R: Rng>(shape: &[usize], rng: &mut R) -> Self {
        let len: usize = shape.iter().product();
        let dist = Uniform::new(INPUT_LOW, INPUT_HIGH);
        let data = (0..len).map(|_| rng.sample(dist)).collect();
        Self {
            shape: shape.to_vec(),
            data,
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Largest absolute element-wise difference to `other`.
    ///
    /// Returns `f64::INFINITY` when the shapes differ.
    pub fn max_abs_diff(&self, other: &Tensor) -> f64 {
        if self.shape != other.shape {
            return f64::INFINITY;
        }
        self.data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| (f64::from(*a) - f64::from(*b)).abs())
            .fold(0.0, f64::max)
    }
}
