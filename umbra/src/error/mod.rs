//! Crate error types.
//!
//! Errors only surface from construction and builder paths. Once a logger is
//! built, logging is infallible from the caller's perspective: runtime sink
//! failures are contained by handlers and reported to stderr.

use std::fmt;
use std::io;

use crate::config::ConfigError;
use crate::formatter::ParseError;

/// Error raised while constructing components, parsing configuration or
/// building a logger.
#[derive(Debug)]
pub enum Error {
  /// Configuration tree error: missing field, wrong type, bad value.
  Config(ConfigError),
  /// Malformed formatter pattern.
  Pattern(ParseError),
  /// A constructor argument is out of its documented range.
  InvalidArgument(String),
  /// A type name has no registered factory.
  UnknownType {
    kind: &'static str,
    name: String,
  },
  Io(io::Error),
}

impl fmt::Display for Error {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Error::Config(err) => write!(f, "configuration error: {}", err),
      Error::Pattern(err) => write!(f, "pattern error: {}", err),
      Error::InvalidArgument(message) => write!(f, "invalid argument: {}", message),
      Error::UnknownType { kind, name } => {
        write!(f, "unknown {} type '{}'", kind, name)
      },
      Error::Io(err) => write!(f, "i/o error: {}", err),
    }
  }
}

impl std::error::Error for Error {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      Error::Config(err) => Some(err),
      Error::Pattern(err) => Some(err),
      Error::Io(err) => Some(err),
      _ => None,
    }
  }
}

impl From<ConfigError> for Error {
  fn from(err: ConfigError) -> Self {
    Error::Config(err)
  }
}

impl From<ParseError> for Error {
  fn from(err: ParseError) -> Self {
    Error::Pattern(err)
  }
}

impl From<io::Error> for Error {
  fn from(err: io::Error) -> Self {
    Error::Io(err)
  }
}

/// Error raised by a sink while emitting one record.
///
/// Handlers catch these per sink; they never reach the logging caller.
#[derive(Debug)]
pub enum EmitError {
  Io(io::Error),
  /// The asynchronous queue is full and the overflow policy reports drops.
  QueueFull,
  /// The sink is shut down.
  Closed,
}

impl fmt::Display for EmitError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      EmitError::Io(err) => write!(f, "i/o error: {}", err),
      EmitError::QueueFull => write!(f, "queue overflow, record dropped"),
      EmitError::Closed => write!(f, "sink is closed"),
    }
  }
}

impl std::error::Error for EmitError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      EmitError::Io(err) => Some(err),
      _ => None,
    }
  }
}

impl From<io::Error> for EmitError {
  fn from(err: io::Error) -> Self {
    EmitError::Io(err)
  }
}
