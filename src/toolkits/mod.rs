//! Toolkit registry: the configurations each operator is benchmarked under.
//!
//! A toolkit names an operator, the configuration sets used for forward
//! charts and the (possibly empty) sets used for backward charts. Each set
//! becomes one chart; each configuration inside a set becomes one group of
//! bars in that chart.

pub mod loader;

pub use loader::ConfigLoader;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use crate::benchmarks::{BenchmarkError, BenchmarkResult};
use crate::operators::{Mode, OperatorRegistry};
use crate::tensor::Tensor;

/// Seed of the random input generator; input `i` uses `INPUT_SEED + i`.
pub const INPUT_SEED: u64 = 0x5eed;

/// Input shapes of one benchmark case, one shape per operator input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    pub shapes: Vec<Vec<usize>>,
}

impl Configuration {
    pub fn new(shapes: Vec<Vec<usize>>) -> Self {
        Self { shapes }
    }

    /// Generates the operator inputs for this configuration.
    pub fn inputs(&self, random: bool) -> Vec<Tensor> {
        self.shapes
            .iter()
            .enumerate()
            .map(|(i, shape)| {
                if random {
                    let mut rng = StdRng::seed_from_u64(INPUT_SEED + i as u64);
                    Tensor::random(shape, &mut rng)
                } else {
                    Tensor::deterministic(shape, i)
                }
            })
            .collect()
    }

    /// One shape per line, as shown in chart tooltips.
    pub fn label(&self) -> String {
        self.shapes
            .iter()
            .map(|shape| format_shape(shape))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shapes: Vec<String> = self.shapes.iter().map(|s| format_shape(s)).collect();
        write!(f, "[{}]", shapes.join(", "))
    }
}

fn format_shape(shape: &[usize]) -> String {
    let dims: Vec<String> = shape.iter().map(|d| d.to_string()).collect();
    if dims.len() == 1 {
        format!("({},)", dims[0])
    } else {
        format!("({})", dims.join(", "))
    }
}

/// A named list of configurations, rendered as one chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigSet {
    pub id: String,
    pub configurations: Vec<Configuration>,
}

impl ConfigSet {
    pub fn new(id: &str, configurations: Vec<Configuration>) -> Self {
        Self {
            id: id.to_string(),
            configurations,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toolkit {
    /// Name used in report titles and file names.
    pub name: String,
    /// Key into the [`OperatorRegistry`].
    pub operator: String,
    #[serde(default)]
    pub forward_sets: Vec<ConfigSet>,
    #[serde(default)]
    pub backward_sets: Vec<ConfigSet>,
}

impl Toolkit {
    pub fn new(operator: &str, forward_sets: Vec<ConfigSet>, backward_sets: Vec<ConfigSet>) -> Self {
        Self {
            name: operator.to_string(),
            operator: operator.to_string(),
            forward_sets,
            backward_sets,
        }
    }

    pub fn sets(&self, mode: Mode) -> &[ConfigSet] {
        match mode {
            Mode::Forward => &self.forward_sets,
            Mode::Backward => &self.backward_sets,
        }
    }

    pub fn set_ids(&self, mode: Mode) -> Vec<&str> {
        self.sets(mode).iter().map(|s| s.id.as_str()).collect()
    }

    pub fn config_set(&self, mode: Mode, id: &str) -> Option<&ConfigSet> {
        self.sets(mode).iter().find(|s| s.id == id)
    }

    /// Checks the toolkit against the operators it refers to.
    pub fn validate(&self, operators: &OperatorRegistry) -> BenchmarkResult<()> {
        let operator = operators
            .get(&self.operator)
            .ok_or_else(|| BenchmarkError::UnknownOperator {
                name: self.operator.clone(),
            })?;

        if self.name.is_empty() {
            return Err(BenchmarkError::ConfigValidationError {
                field: format!("{}.name", self.operator),
                message: "Toolkit name must not be empty".to_string(),
            });
        }

        if self.forward_sets.is_empty() {
            return Err(BenchmarkError::ConfigValidationError {
                field: format!("{}.forward_sets", self.name),
                message: "At least one forward configuration set is required".to_string(),
            });
        }

        for mode in [Mode::Forward, Mode::Backward] {
            let mut seen = HashSet::new();
            for set in self.sets(mode) {
                let field = format!("{}.{}_sets.{}", self.name, mode, set.id);
                if set.id.is_empty() || !seen.insert(set.id.as_str()) {
                    return Err(BenchmarkError::ConfigValidationError {
                        field,
                        message: "Set ids must be unique and non-empty".to_string(),
                    });
                }
                if set.configurations.is_empty() {
                    return Err(BenchmarkError::ConfigValidationError {
                        field,
                        message: "A configuration set needs at least one configuration".to_string(),
                    });
                }
                for configuration in &set.configurations {
                    if configuration.shapes.len() != operator.arity() {
                        return Err(BenchmarkError::ConfigValidationError {
                            field,
                            message: format!(
                                "Operator `{}` takes {} inputs but {} declares {}",
                                operator.name(),
                                operator.arity(),
                                configuration,
                                configuration.shapes.len()
                            ),
                        });
                    }
                    if configuration.shapes.iter().flatten().any(|&d| d == 0) {
                        return Err(BenchmarkError::ConfigValidationError {
                            field,
                            message: format!("Zero-sized dimension in {}", configuration),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolkitRegistry {
    pub toolkits: Vec<Toolkit>,
}

impl ToolkitRegistry {
    /// Toolkits for every built-in operator.
    pub fn builtin() -> Self {
        let elementwise = |op: &str| {
            let unary = op == "exp" || op == "tanh" || op == "sum";
            let case = |rows: usize, cols: usize| {
                let shape = vec![rows, cols];
                if unary {
                    Configuration::new(vec![shape])
                } else {
                    Configuration::new(vec![shape.clone(), shape])
                }
            };
            Toolkit::new(
                op,
                vec![
                    ConfigSet::new("small", vec![case(64, 64), case(256, 256), case(512, 512)]),
                    ConfigSet::new("large", vec![case(1024, 1024), case(2048, 2048)]),
                ],
                vec![ConfigSet::new(
                    "small",
                    vec![case(64, 64), case(256, 256), case(512, 512)],
                )],
            )
        };
        let matmul_case =
            |m: usize, k: usize, n: usize| Configuration::new(vec![vec![m, k], vec![k, n]]);

        Self {
            toolkits: vec![
                elementwise("add"),
                elementwise("multiply"),
                elementwise("exp"),
                elementwise("tanh"),
                elementwise("sum"),
                Toolkit::new(
                    "matmul",
                    vec![
                        ConfigSet::new(
                            "small",
                            vec![
                                matmul_case(32, 32, 32),
                                matmul_case(64, 128, 64),
                                matmul_case(128, 128, 128),
                            ],
                        ),
                        ConfigSet::new(
                            "large",
                            vec![matmul_case(256, 256, 256), matmul_case(512, 256, 512)],
                        ),
                    ],
                    vec![ConfigSet::new(
                        "small",
                        vec![matmul_case(32, 32, 32), matmul_case(64, 128, 64)],
                    )],
                ),
            ],
        }
    }

    /// Loads toolkits from a JSON file, falling back to [`ToolkitRegistry::builtin`]
    /// when the file does not exist, and validates them against `operators`.
    pub fn load_or_default<P: AsRef<Path>>(path: P, operators: &OperatorRegistry) -> BenchmarkResult<Self> {
        let registry: Self = ConfigLoader::load_config(path.as_ref(), "toolkits")?;
        registry.validate(operators)?;
        Ok(registry)
    }

    pub fn validate(&self, operators: &OperatorRegistry) -> BenchmarkResult<()> {
        let mut seen = HashSet::new();
        for toolkit in &self.toolkits {
            if !seen.insert(toolkit.name.as_str()) {
                return Err(BenchmarkError::ConfigValidationError {
                    field: toolkit.name.clone(),
                    message: "Duplicate toolkit name".to_string(),
                });
            }
            toolkit.validate(operators)?;
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Toolkit> {
        self.toolkits.iter().find(|t| t.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Toolkit> {
        self.toolkits.iter()
    }

    pub fn len(&self) -> usize {
        self.toolkits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toolkits.is_empty()
    }
}

impl Default for ToolkitRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry_is_valid() {
        let operators = OperatorRegistry::builtin();
        let toolkits = ToolkitRegistry::builtin();
        assert!(toolkits.validate(&operators).is_ok());
        assert_eq!(toolkits.len(), operators.len());
    }

    #[test]
    fn test_configuration_display_and_label() {
        let c = Configuration::new(vec![vec![4, 4], vec![8]]);
        assert_eq!(c.to_string(), "[(4, 4), (8,)]");
        assert_eq!(c.label(), "(4, 4)\n(8,)");
    }

    #[test]
    fn test_inputs_follow_shapes() {
        let c = Configuration::new(vec![vec![3, 2], vec![2, 5]]);
        for random in [false, true] {
            let inputs = c.inputs(random);
            assert_eq!(inputs.len(), 2);
            assert_eq!(inputs[0].shape(), &[3, 2]);
            assert_eq!(inputs[1].shape(), &[2, 5]);
        }
        assert_eq!(c.inputs(true), c.inputs(true));
    }

    #[test]
    fn test_validate_rejects_arity_mismatch() {
        let operators = OperatorRegistry::builtin();
        let toolkit = Toolkit::new(
            "add",
            vec![ConfigSet::new("bad", vec![Configuration::new(vec![vec![4, 4]])])],
            vec![],
        );
        assert!(matches!(
            toolkit.validate(&operators),
            Err(BenchmarkError::ConfigValidationError { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_unknown_operator_and_zero_dims() {
        let operators = OperatorRegistry::builtin();
        let unknown = Toolkit::new(
            "conv2d",
            vec![ConfigSet::new("small", vec![Configuration::new(vec![vec![1]])])],
            vec![],
        );
        assert!(matches!(
            unknown.validate(&operators),
            Err(BenchmarkError::UnknownOperator { .. })
        ));

        let zero = Toolkit::new(
            "exp",
            vec![ConfigSet::new("small", vec![Configuration::new(vec![vec![0, 4]])])],
            vec![],
        );
        assert!(zero.validate(&operators).is_err());
    }

    #[test]
    fn test_config_set_lookup() {
        let toolkits = ToolkitRegistry::builtin();
        let matmul = toolkits.get("matmul").unwrap();
        assert_eq!(matmul.set_ids(Mode::Forward), vec!["small", "large"]);
        assert!(matmul.config_set(Mode::Backward, "large").is_none());
        assert_eq!(
            matmul.config_set(Mode::Backward, "small").unwrap().configurations.len(),
            2
        );
    }
}
