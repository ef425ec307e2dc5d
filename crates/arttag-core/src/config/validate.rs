//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::{Config, EmbeddingConfig};

/// Upper bound for size limits given in megabytes (16 GiB).
pub(crate) const MAX_LIMIT_MB: u64 = 16 * 1024;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.embedding.image_size == 0 {
            return Err(ConfigError::ValidationError(
                "embedding.image_size must be > 0".into(),
            ));
        }
        let expected_size = EmbeddingConfig::image_size_for_model(&self.embedding.model);
        if self.embedding.image_size != expected_size {
            return Err(ConfigError::ValidationError(format!(
                "embedding.image_size must be {} for model {:?}, got {}",
                expected_size, self.embedding.model, self.embedding.image_size
            )));
        }
        if self.limits.max_file_size_mb > MAX_LIMIT_MB {
            return Err(ConfigError::ValidationError(format!(
                "limits.max_file_size_mb must be <= {MAX_LIMIT_MB}"
            )));
        }
        if self.server.max_body_size_mb as u64 > MAX_LIMIT_MB {
            return Err(ConfigError::ValidationError(format!(
                "server.max_body_size_mb must be <= {MAX_LIMIT_MB}"
            )));
        }
        if self.limits.max_file_size_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_file_size_mb must be > 0".into(),
            ));
        }
        if self.limits.max_image_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_image_dimension must be > 0".into(),
            ));
        }
        if self.limits.decode_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.decode_timeout_ms must be > 0".into(),
            ));
        }
        if self.limits.embed_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.embed_timeout_ms must be > 0".into(),
            ));
        }
        if self.server.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "server.timeout_secs must be > 0".into(),
            ));
        }
        if self.server.max_body_size_mb == 0 {
            return Err(ConfigError::ValidationError(
                "server.max_body_size_mb must be > 0".into(),
            ));
        }
        if !matches!(self.output.format.as_str(), "json" | "jsonl") {
            return Err(ConfigError::ValidationError(format!(
                "output.format must be \"json\" or \"jsonl\", got {:?}",
                self.output.format
            )));
        }
        Ok(())
    }
}
