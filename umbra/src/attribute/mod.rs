//! # Attribute Module
//!
//! Values, lists and packs that carry the structured part of a log event.
//!
//! Two families of types live here:
//! - **Views** ([`Value`], [`AttributeList`], [`AttributePack`]) borrow their
//!   string payloads from the caller and are what the hot path works with.
//!   Nothing in a view allocates.
//! - **Owned** counterparts ([`OwnedValue`], [`OwnedAttributes`]) deep-copy
//!   the payloads and are used wherever an event has to cross a thread or
//!   outlive the log call, most notably inside the asynchronous sink.
//!
//! Converting owned data back into a view is zero-copy for strings; the view
//! simply borrows the owned storage. Converting a view into owned data is the
//! single point where deferred-format closures are materialized.

mod __test__;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Deferred-format function.
///
/// Invoked with a string buffer when (and only when) the value text is
/// actually needed, either by a formatter or while deep-copying the event.
pub type LazyFormat = dyn Fn(&mut String) + Send + Sync;

/// A borrowed attribute value.
///
/// String payloads are bound to the caller's storage and must outlive every
/// record referencing them.
#[derive(Clone, Copy)]
pub enum Value<'a> {
  I64(i64),
  F64(f64),
  Str(&'a str),
  /// Lazily rendered text. See [`LazyFormat`].
  Lazy(&'a LazyFormat),
}

impl<'a> Value<'a> {
  /// Appends the textual rendering of the value to `out`.
  ///
  /// For `Lazy` values this invokes the closure.
  pub fn render(&self, out: &mut String) {
    use std::fmt::Write;
    match self {
      Value::I64(value) => {
        let _ = write!(out, "{}", value);
      },
      Value::F64(value) => {
        let _ = write!(out, "{}", value);
      },
      Value::Str(value) => out.push_str(value),
      Value::Lazy(format) => format(out),
    }
  }

  /// Deep-copies the value, materializing `Lazy` closures exactly once.
  pub fn into_owned(self) -> OwnedValue {
    match self {
      Value::I64(value) => OwnedValue::I64(value),
      Value::F64(value) => OwnedValue::F64(value),
      Value::Str(value) => OwnedValue::String(value.to_string()),
      Value::Lazy(format) => {
        let mut text = String::new();
        format(&mut text);
        OwnedValue::String(text)
      },
    }
  }
}

impl fmt::Debug for Value<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Value::I64(value) => f.debug_tuple("I64").field(value).finish(),
      Value::F64(value) => f.debug_tuple("F64").field(value).finish(),
      Value::Str(value) => f.debug_tuple("Str").field(value).finish(),
      Value::Lazy(_) => f.write_str("Lazy(..)"),
    }
  }
}

impl PartialEq for Value<'_> {
  fn eq(&self, other: &Self) -> bool {
    match (self, other) {
      (Value::I64(lhs), Value::I64(rhs)) => lhs == rhs,
      (Value::F64(lhs), Value::F64(rhs)) => lhs == rhs,
      (Value::Str(lhs), Value::Str(rhs)) => lhs == rhs,
      // Closures have no identity worth comparing.
      _ => false,
    }
  }
}

impl From<i64> for Value<'_> {
  fn from(value: i64) -> Self {
    Value::I64(value)
  }
}

impl From<i32> for Value<'_> {
  fn from(value: i32) -> Self {
    Value::I64(value as i64)
  }
}

impl From<u32> for Value<'_> {
  fn from(value: u32) -> Self {
    Value::I64(value as i64)
  }
}

impl From<f64> for Value<'_> {
  fn from(value: f64) -> Self {
    Value::F64(value)
  }
}

impl<'a> From<&'a str> for Value<'a> {
  fn from(value: &'a str) -> Self {
    Value::Str(value)
  }
}

impl<'a> From<&'a String> for Value<'a> {
  fn from(value: &'a String) -> Self {
    Value::Str(value.as_str())
  }
}

impl<'a> From<&'a OwnedValue> for Value<'a> {
  fn from(value: &'a OwnedValue) -> Self {
    value.view()
  }
}

/// An owned attribute value.
///
/// Serialized with `"type"` and `"value"` keys, e.g.
/// `{"type": "I64", "value": 42}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum OwnedValue {
  I64(i64),
  F64(f64),
  String(String),
}

impl OwnedValue {
  /// Borrows the value as a view. Zero-copy for the string payload.
  #[inline]
  pub fn view(&self) -> Value<'_> {
    match self {
      OwnedValue::I64(value) => Value::I64(*value),
      OwnedValue::F64(value) => Value::F64(*value),
      OwnedValue::String(value) => Value::Str(value.as_str()),
    }
  }
}

impl From<i64> for OwnedValue {
  fn from(value: i64) -> Self {
    OwnedValue::I64(value)
  }
}

impl From<i32> for OwnedValue {
  fn from(value: i32) -> Self {
    OwnedValue::I64(value as i64)
  }
}

impl From<f64> for OwnedValue {
  fn from(value: f64) -> Self {
    OwnedValue::F64(value)
  }
}

impl From<&str> for OwnedValue {
  fn from(value: &str) -> Self {
    OwnedValue::String(value.to_string())
  }
}

impl From<String> for OwnedValue {
  fn from(value: String) -> Self {
    OwnedValue::String(value)
  }
}

/// An ordered list of borrowed `(key, value)` pairs.
///
/// Sixteen entries fit inline, which covers typical log calls without
/// touching the heap.
pub type AttributeList<'a> = SmallVec<[(&'a str, Value<'a>); 16]>;

/// An ordered list of owned `(key, value)` pairs.
pub type OwnedAttributes = SmallVec<[(String, OwnedValue); 16]>;

/// An ordered sequence of references to attribute lists.
///
/// Assembled on the stack at log-call time from per-call attributes, scoped
/// frames and handler-side additions. Frozen once the record is constructed.
#[derive(Default)]
pub struct AttributePack<'a> {
  lists: SmallVec<[&'a AttributeList<'a>; 16]>,
}

impl<'a> AttributePack<'a> {
  #[inline]
  pub fn new() -> Self {
    Self {
      lists: SmallVec::new(),
    }
  }

  /// Appends a list reference. Order is preserved.
  #[inline]
  pub fn push(&mut self, list: &'a AttributeList<'a>) {
    self.lists.push(list);
  }

  /// Number of referenced lists.
  #[inline]
  pub fn len(&self) -> usize {
    self.lists.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.lists.is_empty()
  }

  /// Iterates over the referenced lists in insertion order.
  pub fn lists(&self) -> impl Iterator<Item = &'a AttributeList<'a>> + '_ {
    self.lists.iter().copied()
  }

  /// Iterates over every `(key, value)` pair across all lists.
  pub fn entries(&self) -> impl Iterator<Item = &'a (&'a str, Value<'a>)> + '_ {
    self.lists.iter().flat_map(|list| list.iter())
  }

  /// Finds the first value stored under `key`.
  ///
  /// Linear in the total pack size. Callers that consume many attributes
  /// should iterate once via [`AttributePack::entries`] instead of repeating
  /// named lookups.
  pub fn find(&self, key: &str) -> Option<Value<'a>> {
    self
      .entries()
      .find(|(name, _)| *name == key)
      .map(|(_, value)| *value)
  }
}

impl fmt::Debug for AttributePack<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_list().entries(self.entries()).finish()
  }
}
