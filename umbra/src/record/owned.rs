use serde::{Deserialize, Serialize};
use std::time::SystemTime;

use crate::attribute::{AttributeList, AttributePack, OwnedAttributes};
use crate::record::{Record, Severity};

/// An independent deep copy of a [`Record`], suitable for crossing threads.
///
/// Construction copies the message, the formatted payload and every
/// attribute. Borrowed strings become owned strings; deferred-format
/// closures are invoked once during the copy and their rendered text becomes
/// the stored value. The attribute pack is flattened into a single list,
/// preserving entry order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnedRecord {
  severity: Severity,
  message: String,
  formatted: String,
  timestamp: SystemTime,
  pid: u32,
  tid: u64,
  attributes: OwnedAttributes,
}

impl OwnedRecord {
  /// Deep-copies `record`.
  pub fn from_record(record: &Record<'_>) -> Self {
    let mut attributes = OwnedAttributes::new();
    for (key, value) in record.attributes().entries() {
      attributes.push(((*key).to_string(), value.into_owned()));
    }

    Self {
      severity: record.severity(),
      message: record.message().to_string(),
      formatted: record.formatted().to_string(),
      timestamp: record.timestamp(),
      pid: record.pid(),
      tid: record.tid(),
      attributes,
    }
  }

  #[inline]
  pub fn severity(&self) -> Severity {
    self.severity
  }

  #[inline]
  pub fn message(&self) -> &str {
    &self.message
  }

  #[inline]
  pub fn formatted(&self) -> &str {
    &self.formatted
  }

  #[inline]
  pub fn timestamp(&self) -> SystemTime {
    self.timestamp
  }

  #[inline]
  pub fn attributes(&self) -> &OwnedAttributes {
    &self.attributes
  }

  /// Runs `f` with a borrowed [`Record`] view over the owned storage.
  ///
  /// The view carries the captured severity, timestamp and process and
  /// thread identity of the original event; its attribute pack references
  /// the flattened owned list.
  pub fn with_view<R>(&self, f: impl FnOnce(&Record<'_>) -> R) -> R {
    let list: AttributeList<'_> = self
      .attributes
      .iter()
      .map(|(key, value)| (key.as_str(), value.view()))
      .collect();

    let mut pack = AttributePack::new();
    pack.push(&list);

    let record = Record::restored(
      self.severity,
      &self.message,
      &self.formatted,
      self.timestamp,
      self.pid,
      self.tid,
      &pack,
    );

    f(&record)
  }
}

impl From<&Record<'_>> for OwnedRecord {
  fn from(record: &Record<'_>) -> Self {
    OwnedRecord::from_record(record)
  }
}
