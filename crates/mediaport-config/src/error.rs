use thiserror::Error;

/// Errors produced while loading or validating storage configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to parse storage config: {0}")]
  Parse(#[from] serde_json::Error),

  #[error("disk not configured: {0}")]
  UnknownDisk(String),

  #[error("unsupported disk driver: {0}")]
  UnknownDriver(String),

  #[error("missing required setting: {0}")]
  MissingVar(String),

  #[error("invalid value for '{name}': {message}")]
  InvalidValue { name: String, message: String },

  #[error("invalid cloudinary url: {0}")]
  InvalidCloudinaryUrl(String),
}
