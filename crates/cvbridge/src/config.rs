//! Bridge configuration

use std::path::Path;

use cvbridge_executor::ExecutorConfig;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::sys::CV_STORAGE_BLOCK_SIZE;

/// Configuration for [`Bridge::start`](crate::Bridge::start)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub executor: ExecutorConfig,
    /// Switch the native library to silent error mode on first use, so
    /// failures are only reported through the error status
    pub silence_native_errors: bool,
    /// Block size for memory storages created without an explicit size
    pub storage_block_size: i32,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            executor: ExecutorConfig::default(),
            silence_native_errors: true,
            storage_block_size: CV_STORAGE_BLOCK_SIZE,
        }
    }
}

impl BridgeConfig {
    /// Parse from JSON; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        if self.storage_block_size <= 0 {
            return Err(Error::Config(format!(
                "storage_block_size must be positive, got {}",
                self.storage_block_size
            )));
        }
        if self.executor.queue_capacity == Some(0) {
            return Err(Error::Config(
                "executor.queue_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config =
            BridgeConfig::from_json_str(r#"{"executor": {"name": "vision", "stall_warning_ms": 0}}"#)
                .unwrap();

        assert_eq!(config.executor.name, "vision");
        assert_eq!(config.executor.stall_warning(), None);
        assert!(config.silence_native_errors);
        assert_eq!(config.storage_block_size, CV_STORAGE_BLOCK_SIZE);
    }

    #[test]
    fn test_rejects_bad_block_size() {
        let err = BridgeConfig::from_json_str(r#"{"storage_block_size": -1}"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_rejects_zero_capacity_queue() {
        let err =
            BridgeConfig::from_json_str(r#"{"executor": {"queue_capacity": 0}}"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"silence_native_errors": false}}"#).unwrap();

        let config = BridgeConfig::from_file(file.path()).unwrap();
        assert_eq!(
            config,
            BridgeConfig {
                silence_native_errors: false,
                ..BridgeConfig::default()
            }
        );
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            BridgeConfig::from_json_str("{"),
            Err(Error::Serialization(_))
        ));
    }
}
