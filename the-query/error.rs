//! Error taxonomy shared by every parameter operation.
//!
//! All failures are raised synchronously by the call that detects them and
//! nothing is retried internally.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, QueryError>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum QueryError {
  #[error("key must be a non-empty string")]
  InvalidKey,
  #[error("invalid argument: {0}")]
  InvalidArgument(String),
  #[error("keys must be non-empty strings, got {0}")]
  InvalidKeyType(String),
  #[error("parameter {key} is required")]
  MissingRequired { key: String },
  #[error("parameter {key} does not match required pattern")]
  PatternMismatch { key: String },
  #[error("parameter {key} is too short (minimum {min})")]
  TooShort { key: String, min: usize },
  #[error("parameter {key} is too long (maximum {max})")]
  TooLong { key: String, max: usize },
  #[error("parameter {key} must be one of: {}", .allowed.join(", "))]
  NotInEnum { key: String, allowed: Vec<String> },
  #[error("failed to serialize object: {0}")]
  Serialization(String),
  #[error("invalid serialized object: {0}")]
  Deserialization(String),
  #[error("nested parameter writes exceeded the depth limit of {limit}")]
  MiddlewareRecursionExceeded { limit: usize },
}

impl QueryError {
  /// True for the errors produced by rule validation.
  pub fn is_rule_violation(&self) -> bool {
    matches!(
      self,
      Self::MissingRequired { .. }
        | Self::PatternMismatch { .. }
        | Self::TooShort { .. }
        | Self::TooLong { .. }
        | Self::NotInEnum { .. }
    )
  }
}
