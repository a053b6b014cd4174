//! # Logger Module
//!
//! The public entry point of the pipeline.
//!
//! A logger holds a filter and a vector of handlers behind an atomically
//! swappable snapshot. Every log call loads one snapshot, so readers never
//! observe a torn `(filter, handlers)` pair, and reconfiguration never
//! blocks logging threads.
//!
//! The logging algorithm:
//! 1. Load the snapshot.
//! 2. Collect scoped frames and per-call attributes into a stack-local pack.
//! 3. Construct an inactive record (pid and tid captured here).
//! 4. Evaluate the filter; a denied record stops, paying neither for the
//!    clock read nor for message formatting.
//! 5. Invoke the lazy supplier, if any, and activate the record.
//! 6. Fan out to every handler inside a panic barrier, handing over the
//!    filter verdict: an accept forces the record through the handler and
//!    sink filters downstream.
//!
//! The logger never fails the caller; only construction paths return errors.


use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use arc_swap::ArcSwap;
use smallvec::SmallVec;

use crate::attribute::{AttributeList, AttributePack, OwnedAttributes};
use crate::filter::{Action, Filter, PassFilter};
use crate::handler::Handle;
use crate::record::{Record, Severity};
use crate::scope::{ScopeGuard, ScopeManager};

struct Inner {
  filter: Arc<dyn Filter>,
  handlers: Arc<Vec<Box<dyn Handle>>>,
}

/// The root logger.
///
/// A logger with zero handlers accepts records and discards them silently.
pub struct Logger {
  inner: ArcSwap<Inner>,
  manager: ScopeManager,
}

impl Logger {
  /// Logger passing everything through to `handlers`.
  pub fn new(handlers: Vec<Box<dyn Handle>>) -> Self {
    Self::with_filter(Box::new(PassFilter), handlers)
  }

  /// Logger with an initial filter.
  pub fn with_filter(filter: Box<dyn Filter>, handlers: Vec<Box<dyn Handle>>) -> Self {
    Self {
      inner: ArcSwap::from_pointee(Inner {
        filter: Arc::from(filter),
        handlers: Arc::new(handlers),
      }),
      manager: ScopeManager::new(),
    }
  }

  /// Atomically replaces the filter, leaving the handler set untouched.
  ///
  /// The filter must be cheap and thread-safe; it runs on every log call.
  pub fn filter(&self, filter: Box<dyn Filter>) {
    let filter: Arc<dyn Filter> = Arc::from(filter);
    self.inner.rcu(|inner| {
      Arc::new(Inner {
        filter: Arc::clone(&filter),
        handlers: Arc::clone(&inner.handlers),
      })
    });
  }

  /// Consumes `other`, atomically replacing this logger's filter and
  /// handlers with its state and rebinding the current thread's scoped
  /// frame chain of `other` to this logger.
  ///
  /// This is the move-assignment of the pipeline: guards created from
  /// `other` keep contributing their attributes through `self`.
  pub fn assign(&self, other: Logger) {
    self.inner.store(other.inner.load_full());
    self.manager.adopt(&other.manager);
  }

  /// Attaches `attributes` to the current thread until the returned guard
  /// is dropped. Guards nest and must be dropped in reverse creation order.
  pub fn scoped(&self, attributes: OwnedAttributes) -> ScopeGuard {
    ScopeGuard::new(&self.manager, attributes)
  }

  /// Logs a plain message.
  pub fn log(&self, severity: Severity, message: &str) {
    self.consume(severity, message, &[], None::<fn() -> String>);
  }

  /// Logs a message with per-call attributes.
  pub fn log_with(&self, severity: Severity, message: &str, attributes: &AttributeList<'_>) {
    self.consume(severity, message, &[attributes], None::<fn() -> String>);
  }

  /// Logs with a lazily produced payload.
  ///
  /// `supplier` runs only when the record passes filtering; its output
  /// becomes the record's formatted message.
  pub fn log_lazy<F>(
    &self,
    severity: Severity,
    message: &str,
    attributes: &AttributeList<'_>,
    supplier: F,
  ) where
    F: FnOnce() -> String,
  {
    self.consume(severity, message, &[attributes], Some(supplier));
  }

  /// The pack is assembled in source order: caller-provided lists first,
  /// then scoped frames, innermost to outermost.
  fn consume<F>(
    &self,
    severity: Severity,
    message: &str,
    lists: &[&AttributeList<'_>],
    supplier: Option<F>,
  ) where
    F: FnOnce() -> String,
  {
    let inner = self.inner.load();

    let mut scoped: SmallVec<[AttributeList<'_>; 8]> = SmallVec::new();
    self.manager.collect(&mut scoped);

    let mut pack = AttributePack::new();
    for &list in lists {
      if !list.is_empty() {
        pack.push(list);
      }
    }
    for list in scoped.iter() {
      pack.push(list);
    }

    let rendered: Option<String>;
    let mut record = Record::new(severity, message, &pack);

    // The verdict travels with the record: an accept here forces it
    // through the handler and sink filters downstream.
    let action = inner.filter.filter(&record);
    if action == Action::Deny {
      return;
    }

    rendered = supplier.map(|supply| supply());
    record.activate(rendered.as_deref());

    for handler in inner.handlers.iter() {
      let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler.handle(&record, action)));
      if outcome.is_err() {
        eprintln!("[umbra] logging core error occurred: handler panicked");
      }
    }
  }
}

impl Default for Logger {
  fn default() -> Self {
    Self::new(Vec::new())
  }
}

/// A logger facade carrying its own attributes.
///
/// Every call through a wrapper contributes the wrapped attribute set ahead
/// of the per-call attributes, which is convenient for tagging a whole
/// subsystem (a connection id, a component name) without scoped guards.
pub struct Wrapper<'a> {
  logger: &'a Logger,
  attributes: OwnedAttributes,
}

impl<'a> Wrapper<'a> {
  pub fn new(logger: &'a Logger, attributes: OwnedAttributes) -> Self {
    Self { logger, attributes }
  }

  /// The attributes attached to every record logged through this wrapper.
  pub fn attributes(&self) -> &OwnedAttributes {
    &self.attributes
  }

  fn view(&self) -> AttributeList<'_> {
    self
      .attributes
      .iter()
      .map(|(key, value)| (key.as_str(), value.view()))
      .collect()
  }

  pub fn log(&self, severity: Severity, message: &str) {
    let own = self.view();
    self
      .logger
      .consume(severity, message, &[&own], None::<fn() -> String>);
  }

  pub fn log_with(&self, severity: Severity, message: &str, attributes: &AttributeList<'_>) {
    let own = self.view();
    self
      .logger
      .consume(severity, message, &[&own, attributes], None::<fn() -> String>);
  }

  pub fn log_lazy<F>(
    &self,
    severity: Severity,
    message: &str,
    attributes: &AttributeList<'_>,
    supplier: F,
  ) where
    F: FnOnce() -> String,
  {
    let own = self.view();
    self
      .logger
      .consume(severity, message, &[&own, attributes], Some(supplier));
  }
}
