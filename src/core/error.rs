//! NP-002: Error type shared by every job.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrepError {
    #[error("cannot {action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON serialize error: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("YAML parse error in {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_yaml_ng::Error,
    },

    #[error("{0} validation error(s)")]
    Validation(usize),

    #[error("cannot read workbook {}: {message}", path.display())]
    Workbook { path: PathBuf, message: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("{0} ingredient(s) could not be resolved")]
    Unresolved(usize),

    #[error("{} already exists", .0.display())]
    AlreadyExists(PathBuf),
}

impl PrepError {
    /// Build a closure that wraps an `io::Error` with the action and path.
    pub fn io(action: &'static str, path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io {
            action,
            path,
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_np002_io_message_names_action_and_path() {
        let err = PrepError::io("write", "/data/foods/肉类.json")(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        let msg = err.to_string();
        assert!(msg.starts_with("cannot write /data/foods/肉类.json"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn test_np002_unresolved_message() {
        assert_eq!(
            PrepError::Unresolved(3).to_string(),
            "3 ingredient(s) could not be resolved"
        );
    }
}
