use thiserror::Error;

/// The error type for `fibre_ambient` resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  /// No override was active and the type has no registered default factory.
  #[error("No default construction path for type: {type_name}")]
  Construction { type_name: &'static str },
}

/// A specialized `Result` type for `fibre_ambient` operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
