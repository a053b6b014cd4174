//! # Sink Module
//!
//! Terminal consumers of `(record, formatted payload)` pairs.
//!
//! Sinks are sequential appenders. Every sink that writes to a shared
//! destination owns a mutex and serializes its writes so that concurrent
//! messages interleave line by line, never byte by byte. Failures are
//! returned to the calling handler, which contains them.

mod __test__;
pub mod asynchronous;
pub mod console;
pub mod file;
pub mod null;

use crate::error::EmitError;
use crate::record::Record;

/// Consumes one formatted record.
pub trait Sink: Send + Sync {
  fn emit(&self, record: &Record<'_>, formatted: &str) -> Result<(), EmitError>;
}
