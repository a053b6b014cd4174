//! # Handler Module
//!
//! A handler composes one formatter with any number of sinks. The record is
//! rendered once, into a reusable buffer, and the same payload view is
//! handed to every sink. Sink failures are contained per sink: they are
//! reported to the stderr last-resort channel and never reach the logger or
//! the remaining sinks.
//!
//! Filtering composes along the whole pipeline: the logger filter runs
//! first, then the handler filter, then each sink's filter. The first
//! `Deny` drops the record and the first `Accept` forces it through every
//! later check, so the logger's verdict is threaded into
//! [`Handle::handle`].


use std::sync::Mutex;

use crate::filter::{evaluate, Action, Filter};
use crate::formatter::Format;
use crate::record::Record;
use crate::sink::Sink;

/// Processes one active record.
///
/// `prior` is the verdict of the filters already evaluated upstream,
/// normally the logger's. An `Accept` forces the record through the handler
/// and sink filters; `Neutral` defers to them.
pub trait Handle: Send + Sync {
  fn handle(&self, record: &Record<'_>, prior: Action);
}

struct SinkEntry {
  sink: Box<dyn Sink>,
  filter: Option<Box<dyn Filter>>,
}

/// Handler that renders and emits on the calling thread.
pub struct Blocking {
  formatter: Box<dyn Format>,
  sinks: Vec<SinkEntry>,
  filter: Option<Box<dyn Filter>>,
  buffer: Mutex<String>,
}

impl Blocking {
  pub fn new(formatter: Box<dyn Format>) -> Self {
    Self {
      formatter,
      sinks: Vec::new(),
      filter: None,
      buffer: Mutex::new(String::with_capacity(256)),
    }
  }

  /// Appends a sink. Emission order follows insertion order.
  pub fn add_sink(&mut self, sink: Box<dyn Sink>) {
    self.sinks.push(SinkEntry { sink, filter: None });
  }

  /// Appends a sink guarded by its own filter.
  ///
  /// The sink filter decides only for its sink, after the record was
  /// already rendered, and is bypassed entirely when an earlier filter in
  /// the chain accepted the record.
  pub fn add_sink_with_filter(&mut self, sink: Box<dyn Sink>, filter: Box<dyn Filter>) {
    self.sinks.push(SinkEntry {
      sink,
      filter: Some(filter),
    });
  }

  /// Installs a handler-level filter evaluated before rendering.
  pub fn set_filter(&mut self, filter: Box<dyn Filter>) {
    self.filter = Some(filter);
  }
}

impl Handle for Blocking {
  fn handle(&self, record: &Record<'_>, prior: Action) {
    // An upstream accept forces the record through; otherwise the handler
    // filter gets its say before any rendering cost is paid.
    let action = match prior {
      Action::Accept => Action::Accept,
      _ => match &self.filter {
        Some(filter) => filter.filter(record),
        None => Action::Neutral,
      },
    };
    if action == Action::Deny {
      return;
    }

    let mut buffer = match self.buffer.lock() {
      Ok(guard) => guard,
      Err(poisoned) => poisoned.into_inner(),
    };
    buffer.clear();
    self.formatter.format(record, &mut buffer);

    for entry in &self.sinks {
      let admitted = match action {
        Action::Accept => true,
        _ => evaluate(entry.filter.as_deref(), record),
      };
      if !admitted {
        continue;
      }
      if let Err(err) = entry.sink.emit(record, &buffer) {
        eprintln!("[umbra] sink emit failed: {}", err);
      }
    }
  }
}
