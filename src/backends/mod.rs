//! Array-computation backends under comparison.
//!
//! Each backend module holds the primitive kernels that operator
//! implementations build on:
//!
//! - [`scalar`]: hand-written loops over slices, the forward baseline.
//! - [`nd`]: zero-copy `ndarray` views over the tensor buffers.
//! - [`parallel`]: `rayon` data-parallel loops on the global thread pool.

pub mod device;
pub mod nd;
pub mod parallel;
pub mod scalar;

pub use device::Device;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one backend implementation of the operators.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Plain scalar loops; no gradients.
    Scalar,
    /// `ndarray` views with analytic gradients.
    Ndarray,
    /// `rayon` parallel loops.
    Rayon,
}

impl Backend {
    pub const ALL: [Backend; 3] = [Backend::Scalar, Backend::Ndarray, Backend::Rayon];

    /// Stable identifier used in records, CLI arguments and configuration files.
    pub fn identifier(self) -> &'static str {
        match self {
            Backend::Scalar => "scalar",
            Backend::Ndarray => "ndarray",
            Backend::Rayon => "rayon",
        }
    }

    /// Bar colour in rendered charts.
    pub fn color(self) -> &'static str {
        match self {
            Backend::Scalar => "#756bb1",
            Backend::Ndarray => "#43a2ca",
            Backend::Rayon => "#e84d60",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}
