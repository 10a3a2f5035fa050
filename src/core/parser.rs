//! NP-003: nutriprep.yaml parsing and validation.
//!
//! Parses the project config and validates structural constraints:
//! - Version must be "1.0"
//! - No path may be empty
//! - Output paths must not collide with each other or with an input

use super::error::PrepError;
use super::types::*;
use std::path::{Path, PathBuf};

/// Validation error.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Parse a nutriprep.yaml file from disk. A missing file yields the defaults.
pub fn parse_config_file(path: &Path) -> Result<PrepConfig, PrepError> {
    if !path.exists() {
        tracing::info!(config = %path.display(), "no config file, using default paths");
        return Ok(PrepConfig::default());
    }
    let content = std::fs::read_to_string(path).map_err(PrepError::io("read", path))?;
    parse_config(&content).map_err(|source| PrepError::Config {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse a nutriprep.yaml from a string.
pub fn parse_config(yaml: &str) -> Result<PrepConfig, serde_yaml_ng::Error> {
    serde_yaml_ng::from_str(yaml)
}

/// Validate a parsed config. Returns a list of errors (empty = valid).
pub fn validate_config(config: &PrepConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if config.version != "1.0" {
        errors.push(ValidationError {
            message: format!("version must be \"1.0\", got \"{}\"", config.version),
        });
    }

    let paths = &config.paths;
    let all = paths
        .inputs()
        .into_iter()
        .chain(std::iter::once(("food_dir", &paths.food_dir)))
        .chain(paths.outputs());
    for (label, path) in all {
        if path.as_os_str().is_empty() {
            errors.push(ValidationError {
                message: format!("path '{}' must not be empty", label),
            });
        }
    }

    let outputs = paths.outputs();
    for (i, (label, path)) in outputs.iter().enumerate() {
        if path.as_os_str().is_empty() {
            continue;
        }
        for (other_label, other) in &outputs[i + 1..] {
            if path == other {
                errors.push(ValidationError {
                    message: format!(
                        "outputs '{}' and '{}' both write {}",
                        label,
                        other_label,
                        path.display()
                    ),
                });
            }
        }
        for (input_label, input) in paths.inputs() {
            if *path == input {
                errors.push(ValidationError {
                    message: format!(
                        "output '{}' would overwrite input '{}'",
                        label, input_label
                    ),
                });
            }
        }
    }

    errors
}

/// Resolve every relative path against `base` (the config file's directory).
pub fn resolve_paths(paths: &DataPaths, base: &Path) -> DataPaths {
    let join = |p: &PathBuf| -> PathBuf {
        if p.is_absolute() || p.as_os_str().is_empty() {
            p.clone()
        } else {
            base.join(p)
        }
    };
    DataPaths {
        foods_workbook: join(&paths.foods_workbook),
        dishes_workbook: join(&paths.dishes_workbook),
        food_dir: join(&paths.food_dir),
        taxonomy: join(&paths.taxonomy),
        dishes_raw: join(&paths.dishes_raw),
        dishes: join(&paths.dishes),
        missing_report: join(&paths.missing_report),
        foods_csv: join(&paths.foods_csv),
    }
}

/// Directory relative paths in `config_file` are resolved against.
pub fn config_base_dir(config_file: &Path) -> PathBuf {
    match config_file.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Parse, validate, and resolve a config file into the paths a job uses.
pub fn load_data_paths(config_file: &Path) -> Result<DataPaths, PrepError> {
    let config = parse_config_file(config_file)?;
    let errors = validate_config(&config);
    if !errors.is_empty() {
        for e in &errors {
            tracing::error!("{}", e);
        }
        return Err(PrepError::Validation(errors.len()));
    }
    Ok(resolve_paths(&config.paths, &config_base_dir(config_file)))
}
