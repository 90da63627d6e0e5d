// src/config/loader.rs
//! Layered configuration loader
//!
//! Defaults are overlaid by every configuration file that exists (system, user,
//! then local, in increasing precedence) and finally by `SCOPE_` environment
//! variables. The merged document is validated before it is handed out.

use crate::config::{constants::paths, SystemConfig};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;
use tracing::{debug, info};

/// Configuration loader
pub struct ConfigLoader {
    config_paths: Vec<PathBuf>,
    current_config: SystemConfig,
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),

    #[error("Configuration validation errors: {}", .0.join("; "))]
    ValidationError(Vec<String>),

    #[error("IO error: {0}")]
    IoError(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError(err.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl ConfigLoader {
    /// Create new configuration loader searching the standard locations
    pub fn new() -> Self {
        Self::with_paths(Self::discover_config_paths())
    }

    /// Create loader with custom paths
    pub fn with_paths(paths: Vec<PathBuf>) -> Self {
        Self {
            config_paths: paths,
            current_config: SystemConfig::default(),
        }
    }

    /// Load system configuration with validation
    pub fn load_system_config(&mut self) -> Result<SystemConfig, ConfigError> {
        let config = self.load_and_merge_configs()?;
        info!(summary = ?config.get_summary(), "configuration loaded");
        self.current_config = config.clone();
        Ok(config)
    }

    /// Get the most recently loaded configuration
    pub fn get_current_config(&self) -> &SystemConfig {
        &self.current_config
    }

    /// Paths searched, lowest precedence first
    pub fn config_paths(&self) -> &[PathBuf] {
        &self.config_paths
    }

    /// Parse and validate a single file on top of the defaults without loading it
    pub fn validate_config_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let mut merged = Self::default_document()?;
        let file_config = self.load_config_file(path)?;
        self.merge_toml_values(&mut merged, file_config);
        Self::into_validated(merged).map(|_| ())
    }

    /// Export current configuration to file
    pub fn export_config<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let toml_content = toml::to_string_pretty(&self.current_config)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Get configuration file modification times
    pub fn get_config_timestamps(&self) -> Vec<(PathBuf, Option<SystemTime>)> {
        self.config_paths
            .iter()
            .map(|path| {
                let timestamp = std::fs::metadata(path)
                    .and_then(|meta| meta.modified())
                    .ok();
                (path.clone(), timestamp)
            })
            .collect()
    }

    fn load_and_merge_configs(&self) -> Result<SystemConfig, ConfigError> {
        let mut merged_config = Self::default_document()?;

        for config_path in &self.config_paths {
            if config_path.exists() {
                debug!(path = %config_path.display(), "merging configuration file");
                match self.load_config_file(config_path) {
                    Ok(file_config) => {
                        self.merge_toml_values(&mut merged_config, file_config);
                    }
                    Err(ConfigError::FileNotFound(_)) => continue,
                    Err(e) => return Err(e),
                }
            }
        }

        self.apply_environment_overrides(&mut merged_config);

        Self::into_validated(merged_config)
    }

    fn default_document() -> Result<toml::Value, ConfigError> {
        toml::Value::try_from(SystemConfig::default())
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    fn into_validated(document: toml::Value) -> Result<SystemConfig, ConfigError> {
        let config: SystemConfig = document
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError(format!("Failed to deserialize config: {}", e)))?;

        config
            .validate_consistency()
            .map_err(ConfigError::ValidationError)?;

        Ok(config)
    }

    fn load_config_file<P: AsRef<Path>>(&self, path: P) -> Result<toml::Value, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)?;
        let config: toml::Value = toml::from_str(&content)?;

        Ok(config)
    }

    fn merge_toml_values(&self, base: &mut toml::Value, overlay: toml::Value) {
        match (base, overlay) {
            (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
                for (key, value) in overlay_table {
                    if let Some(base_value) = base_table.get_mut(&key) {
                        self.merge_toml_values(base_value, value);
                    } else {
                        base_table.insert(key, value);
                    }
                }
            }
            (base_value, overlay_value) => {
                *base_value = overlay_value;
            }
        }
    }

    /// `SCOPE_ACQUISITION__SAMPLE_RATE_HZ=1000` sets `acquisition.sample_rate_hz`
    fn apply_environment_overrides(&self, config: &mut toml::Value) {
        for (key, value) in std::env::vars() {
            let Some(stripped) = key.strip_prefix(paths::ENV_PREFIX) else {
                continue;
            };

            let config_key = stripped
                .to_lowercase()
                .split(paths::ENV_SECTION_SEPARATOR)
                .collect::<Vec<_>>()
                .join(".");

            debug!(key = %config_key, "applying environment override");
            self.set_nested_value(config, &config_key, self.parse_env_value(&value));
        }
    }

    fn parse_env_value(&self, value: &str) -> toml::Value {
        if let Ok(int_val) = value.parse::<i64>() {
            toml::Value::Integer(int_val)
        } else if let Ok(float_val) = value.parse::<f64>() {
            toml::Value::Float(float_val)
        } else if let Ok(bool_val) = value.parse::<bool>() {
            toml::Value::Boolean(bool_val)
        } else if value.starts_with('[') {
            // Arrays such as `[0, 1]`; fall back to a plain string when malformed
            toml::from_str::<toml::Table>(&format!("v = {}", value))
                .ok()
                .and_then(|mut t| t.remove("v"))
                .unwrap_or_else(|| toml::Value::String(value.to_string()))
        } else {
            toml::Value::String(value.to_string())
        }
    }

    fn set_nested_value(&self, config: &mut toml::Value, path: &str, value: toml::Value) {
        let parts: Vec<&str> = path.split('.').collect();
        let mut current = config;

        for (i, part) in parts.iter().enumerate() {
            let toml::Value::Table(table) = current else {
                return;
            };

            if i == parts.len() - 1 {
                table.insert(part.to_string(), value);
                return;
            }

            current = table
                .entry(part.to_string())
                .or_insert_with(|| toml::Value::Table(toml::value::Table::new()));
        }
    }

    fn discover_config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        paths.push(PathBuf::from(paths::SYSTEM_CONFIG_PATH));

        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(paths::USER_CONFIG_DIR).join("config.toml"));
        }

        paths.push(PathBuf::from(paths::DEFAULT_CONFIG_FILE));
        paths.push(PathBuf::from(paths::LOCAL_CONFIG_FILE));

        paths
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

// Cross-platform directory discovery
mod dirs {
    use std::path::PathBuf;

    pub fn home_dir() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            std::env::var_os("USERPROFILE").map(PathBuf::from)
        }
        #[cfg(not(target_os = "windows"))]
        {
            std::env::var_os("HOME").map(PathBuf::from)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::WrapPolicy;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_config(content: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "{}", content).unwrap();
        temp_file
    }

    #[test]
    fn test_config_loader_creation() {
        let loader = ConfigLoader::new();
        assert!(!loader.config_paths().is_empty());
    }

    #[test]
    #[serial]
    fn test_load_default_config() {
        let mut loader = ConfigLoader::with_paths(Vec::new());
        let config = loader.load_system_config().unwrap();
        assert_eq!(config.acquisition.buffer_capacity, 8192);
    }

    #[test]
    #[serial]
    fn test_later_files_take_precedence() {
        let base = temp_config(
            r#"
[acquisition]
sample_rate_hz = 2000
buffer_capacity = 1024
"#,
        );
        let local = temp_config(
            r#"
[acquisition]
sample_rate_hz = 4000
"#,
        );

        let mut loader = ConfigLoader::with_paths(vec![
            base.path().to_path_buf(),
            PathBuf::from("/nonexistent/scope.toml"),
            local.path().to_path_buf(),
        ]);
        let config = loader.load_system_config().unwrap();

        assert_eq!(config.acquisition.sample_rate_hz, 4000);
        assert_eq!(config.acquisition.buffer_capacity, 1024);
        assert_eq!(loader.get_current_config().acquisition.sample_rate_hz, 4000);
    }

    #[test]
    fn test_config_file_validation() {
        let loader = ConfigLoader::with_paths(Vec::new());
        let temp_file = temp_config(
            r#"
[acquisition]
sample_rate_hz = 100000
wrap_policy = "inclusive_boundary"

[channels]
enabled = [0, 1]

[hal]
device_type = "simulator"
"#,
        );

        assert!(loader.validate_config_file(temp_file.path()).is_ok());
    }

    #[test]
    fn test_invalid_config_validation() {
        let loader = ConfigLoader::with_paths(Vec::new());
        let temp_file = temp_config(
            r#"
[acquisition]
buffer_capacity = 16
start_index = 32
"#,
        );

        match loader.validate_config_file(temp_file.path()) {
            Err(ConfigError::ValidationError(errors)) => {
                assert!(errors.iter().any(|e| e.contains("Start index")));
            }
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_config_is_parse_error() {
        let loader = ConfigLoader::with_paths(Vec::new());
        let temp_file = temp_config("[acquisition\nsample_rate_hz = ");
        assert!(matches!(
            loader.validate_config_file(temp_file.path()),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_missing_file_is_reported() {
        let loader = ConfigLoader::with_paths(Vec::new());
        assert!(matches!(
            loader.validate_config_file("/nonexistent/scope.toml"),
            Err(ConfigError::FileNotFound(_))
        ));
    }

    #[test]
    #[serial]
    fn test_environment_override() {
        unsafe {
            std::env::set_var("SCOPE_ACQUISITION__SAMPLE_RATE_HZ", "4000");
            std::env::set_var("SCOPE_ACQUISITION__WRAP_POLICY", "exact");
            std::env::set_var("SCOPE_CHANNELS__ENABLED", "[2, 3]");
        }

        let mut loader = ConfigLoader::with_paths(Vec::new());
        let result = loader.load_system_config();

        unsafe {
            std::env::remove_var("SCOPE_ACQUISITION__SAMPLE_RATE_HZ");
            std::env::remove_var("SCOPE_ACQUISITION__WRAP_POLICY");
            std::env::remove_var("SCOPE_CHANNELS__ENABLED");
        }

        let config = result.unwrap();
        assert_eq!(config.acquisition.sample_rate_hz, 4000);
        assert_eq!(config.acquisition.wrap_policy, WrapPolicy::Exact);
        assert_eq!(config.channels.enabled, vec![2, 3]);
    }

    #[test]
    #[serial]
    fn test_config_export() {
        let mut loader = ConfigLoader::with_paths(Vec::new());
        loader.load_system_config().unwrap();
        let temp_file = NamedTempFile::new().unwrap();

        assert!(loader.export_config(temp_file.path()).is_ok());

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert!(content.contains("[acquisition]"));
        assert!(loader.validate_config_file(temp_file.path()).is_ok());
    }
}
