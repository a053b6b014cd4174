use crate::error::EmitError;
use crate::record::Record;
use crate::sink::Sink;

/// Sink that discards everything.
#[derive(Debug, Default)]
pub struct Null;

impl Sink for Null {
  fn emit(&self, _record: &Record<'_>, _formatted: &str) -> Result<(), EmitError> {
    Ok(())
  }
}
