//! Operator registry.
//!
//! Every benchmarked operator implements [`Operator`]: for a given backend it
//! hands out a forward kernel and, where the backend can differentiate the
//! operator, a backward kernel. A missing kernel means the backend does not
//! support the operator in that mode; the benchmark runner records it as
//! such instead of failing.

pub mod binary;
pub mod matmul;
pub mod reduction;
pub mod unary;

pub use binary::{Add, Multiply};
pub use matmul::Matmul;
pub use reduction::Sum;
pub use unary::{Exp, Tanh};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::backends::Backend;
use crate::benchmarks::BenchmarkError;
use crate::errors::{OpError, OpResult};
use crate::tensor::Tensor;

/// Forward kernel: consumes the operator inputs, returns the output.
pub type ForwardFn = fn(&[Tensor]) -> OpResult<Tensor>;

/// Backward kernel: consumes the operator inputs and the upstream gradient
/// (shaped like the forward output), returns one gradient per input.
pub type BackwardFn = fn(&[Tensor], &Tensor) -> OpResult<Vec<Tensor>>;

/// Direction of a benchmark run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Forward,
    Backward,
}

impl Mode {
    pub fn identifier(self) -> &'static str {
        match self {
            Mode::Forward => "forward",
            Mode::Backward => "backward",
        }
    }

    /// Tag used in chart file names (`<op>_f_<set>.html`).
    pub fn file_tag(self) -> &'static str {
        match self {
            Mode::Forward => "f",
            Mode::Backward => "b",
        }
    }

    /// Backends compared in this mode; the first one is the baseline.
    ///
    /// The scalar backend has no gradients, so backward runs compare
    /// against `ndarray` instead.
    pub fn default_backends(self) -> &'static [Backend] {
        match self {
            Mode::Forward => &[Backend::Scalar, Backend::Ndarray, Backend::Rayon],
            Mode::Backward => &[Backend::Ndarray, Backend::Rayon],
        }
    }

    pub fn baseline(self) -> Backend {
        self.default_backends()[0]
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

impl FromStr for Mode {
    type Err = BenchmarkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "forward" => Ok(Mode::Forward),
            "backward" => Ok(Mode::Backward),
            _ => Err(BenchmarkError::InvalidSettings {
                message: format!("unknown mode '{}', expected 'forward' or 'backward'", s),
            }),
        }
    }
}

/// Capability interface of a benchmarked operator.
pub trait Operator: Send + Sync {
    /// Registry key, e.g. `"add"`.
    fn name(&self) -> &'static str;

    /// Number of input tensors.
    fn arity(&self) -> usize;

    fn forward(&self, backend: Backend) -> Option<ForwardFn>;

    fn backward(&self, _backend: Backend) -> Option<BackwardFn> {
        None
    }
}

/// Immutable name -> operator mapping, assembled once at start-up.
pub struct OperatorRegistry {
    operators: BTreeMap<&'static str, Box<dyn Operator>>,
}

impl OperatorRegistry {
    pub fn empty() -> Self {
        Self {
            operators: BTreeMap::new(),
        }
    }

    /// Registry holding every operator shipped with the crate.
    pub fn builtin() -> Self {
        Self::empty()
            .with(Box::new(Add))
            .with(Box::new(Multiply))
            .with(Box::new(Exp))
            .with(Box::new(Tanh))
            .with(Box::new(Sum))
            .with(Box::new(Matmul))
    }

    /// Adds `operator`, replacing any operator registered under the same name.
    pub fn with(mut self, operator: Box<dyn Operator>) -> Self {
        self.operators.insert(operator.name(), operator);
        self
    }

    pub fn get(&self, name: &str) -> Option<&dyn Operator> {
        self.operators.get(name).map(|op| op.as_ref())
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.operators.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }
}

impl Default for OperatorRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

pub(crate) fn check_arity(operator: &'static str, inputs: &[Tensor], expected: usize) -> OpResult<()> {
    if inputs.len() != expected {
        return Err(OpError::ArityMismatch {
            operator,
            expected,
            actual: inputs.len(),
        });
    }
    Ok(())
}

pub(crate) fn check_same_shape(operator: &'static str, left: &Tensor, right: &Tensor) -> OpResult<()> {
    if left.shape() != right.shape() {
        return Err(OpError::ShapeMismatch {
            operator,
            left: left.shape().to_vec(),
            right: right.shape().to_vec(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry_contents() {
        let registry = OperatorRegistry::builtin();
        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, vec!["add", "exp", "matmul", "multiply", "sum", "tanh"]);
        assert!(registry.get("add").is_some());
        assert!(registry.get("conv2d").is_none());
    }

    #[test]
    fn test_scalar_backend_has_no_gradients() {
        let registry = OperatorRegistry::builtin();
        for name in registry.names() {
            let op = registry.get(name).unwrap();
            assert!(op.forward(Backend::Scalar).is_some(), "{}", name);
            assert!(op.backward(Backend::Scalar).is_none(), "{}", name);
        }
    }

    #[test]
    fn test_mode_baselines() {
        assert_eq!(Mode::Forward.baseline(), Backend::Scalar);
        assert_eq!(Mode::Backward.baseline(), Backend::Ndarray);
        assert_eq!("backward".parse::<Mode>().unwrap(), Mode::Backward);
        assert!("sideways".parse::<Mode>().is_err());
    }

    #[test]
    fn test_check_arity() {
        let inputs = vec![Tensor::ones(&[2])];
        assert!(check_arity("add", &inputs, 1).is_ok());
        assert_eq!(
            check_arity("add", &inputs, 2),
            Err(OpError::ArityMismatch {
                operator: "add",
                expected: 2,
                actual: 1
            })
        );
    }
}
