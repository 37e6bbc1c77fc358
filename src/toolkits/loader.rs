use log::{info, warn};
use serde::de::DeserializeOwned;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::benchmarks::{BenchmarkError, BenchmarkResult};

/// Reads JSON configuration files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a configuration file with fallback to defaults.
    ///
    /// A missing file yields `T::default()`; an unreadable or malformed file
    /// is an error.
    pub fn load_config<T>(path: &Path, config_name: &str) -> BenchmarkResult<T>
    where
        T: DeserializeOwned + Default,
    {
        match fs::read_to_string(path) {
            Ok(content) => {
                info!("Loading {} configuration from '{}'", config_name, path.display());
                serde_json::from_str(&content).map_err(|e| BenchmarkError::ConfigParseError {
                    path: path.display().to_string(),
                    source: e,
                })
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(
                    "Config file '{}' not found, using default configuration for {}",
                    path.display(),
                    config_name
                );
                Ok(T::default())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolkits::ToolkitRegistry;
    use std::io::Write;

    #[test]
    fn test_missing_file_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let loaded: ToolkitRegistry =
            ConfigLoader::load_config(&dir.path().join("absent.json"), "toolkits").unwrap();
        assert_eq!(loaded, ToolkitRegistry::builtin());
    }

    #[test]
    fn test_malformed_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ \"toolkits\": [ }}").unwrap();
        let result: BenchmarkResult<ToolkitRegistry> = ConfigLoader::load_config(file.path(), "toolkits");
        assert!(matches!(result, Err(BenchmarkError::ConfigParseError { .. })));
    }
}
