//! # Registry Module
//!
//! Name-keyed factories and the configuration-driven logger builder.
//!
//! A [`Registry`] maps type names to factories for each component kind:
//! formatter, sink, handler and filter. Factories receive the registry
//! itself, so composite components (the asynchronous sink wrapping an inner
//! sink) can build their parts through the same table.
//!
//! The [`Builder`] walks a named array of handler descriptions and produces
//! a fully constructed [`Logger`]:
//!
//! ```json
//! {
//!   "root": [
//!     {
//!       "formatter": {"type": "string", "pattern": "{severity}: {message}"},
//!       "sinks": [{"type": "console", "target": "stdout"}]
//!     }
//!   ]
//! }
//! ```

mod __test__;

use std::collections::HashMap;

use crate::config::{Config, Node};
use crate::error::Error;
use crate::filter::{Filter, SeverityFilter};
use crate::formatter::{Format, StringFormatter};
use crate::handler::{Blocking, Handle};
use crate::logger::Logger;
use crate::sink::asynchronous::{Asynchronous, OverflowPolicy, DEFAULT_CAPACITY_EXPONENT};
use crate::sink::console::{Console, Target};
use crate::sink::file::{FileSink, FlushPolicy};
use crate::sink::null::Null;
use crate::sink::Sink;

pub type FormatterFactory =
  Box<dyn Fn(&Registry, &Node<'_>) -> Result<Box<dyn Format>, Error> + Send + Sync>;
pub type SinkFactory =
  Box<dyn Fn(&Registry, &Node<'_>) -> Result<Box<dyn Sink>, Error> + Send + Sync>;
pub type HandlerFactory =
  Box<dyn Fn(&Registry, &Node<'_>) -> Result<Box<dyn Handle>, Error> + Send + Sync>;
pub type FilterFactory =
  Box<dyn Fn(&Registry, &Node<'_>) -> Result<Box<dyn Filter>, Error> + Send + Sync>;

/// Factory table for the four component kinds.
#[derive(Default)]
pub struct Registry {
  formatters: HashMap<String, FormatterFactory>,
  sinks: HashMap<String, SinkFactory>,
  handlers: HashMap<String, HandlerFactory>,
  filters: HashMap<String, FilterFactory>,
}

impl Registry {
  /// An empty registry.
  pub fn new() -> Self {
    Self::default()
  }

  /// A registry with every built-in component registered: the `string`
  /// formatter; the `null`, `console`, `file` and `asynchronous` sinks; the
  /// `blocking` handler; the `severity` filter.
  pub fn configured() -> Self {
    let mut registry = Self::new();

    registry.add_formatter("string", Box::new(make_string_formatter));
    registry.add_sink("null", Box::new(make_null_sink));
    registry.add_sink("console", Box::new(make_console_sink));
    registry.add_sink("file", Box::new(make_file_sink));
    registry.add_sink("asynchronous", Box::new(make_asynchronous_sink));
    registry.add_handler("blocking", Box::new(make_blocking_handler));
    registry.add_filter("severity", Box::new(make_severity_filter));

    registry
  }

  pub fn add_formatter(&mut self, name: impl Into<String>, factory: FormatterFactory) {
    self.formatters.insert(name.into(), factory);
  }

  pub fn add_sink(&mut self, name: impl Into<String>, factory: SinkFactory) {
    self.sinks.insert(name.into(), factory);
  }

  pub fn add_handler(&mut self, name: impl Into<String>, factory: HandlerFactory) {
    self.handlers.insert(name.into(), factory);
  }

  pub fn add_filter(&mut self, name: impl Into<String>, factory: FilterFactory) {
    self.filters.insert(name.into(), factory);
  }

  pub fn formatter(&self, name: &str) -> Result<&FormatterFactory, Error> {
    self.formatters.get(name).ok_or_else(|| Error::UnknownType {
      kind: "formatter",
      name: name.to_string(),
    })
  }

  pub fn sink(&self, name: &str) -> Result<&SinkFactory, Error> {
    self.sinks.get(name).ok_or_else(|| Error::UnknownType {
      kind: "sink",
      name: name.to_string(),
    })
  }

  pub fn handler(&self, name: &str) -> Result<&HandlerFactory, Error> {
    self.handlers.get(name).ok_or_else(|| Error::UnknownType {
      kind: "handler",
      name: name.to_string(),
    })
  }

  pub fn filter(&self, name: &str) -> Result<&FilterFactory, Error> {
    self.filters.get(name).ok_or_else(|| Error::UnknownType {
      kind: "filter",
      name: name.to_string(),
    })
  }

  /// Builds a sink from its description, dispatching on `type`.
  pub fn build_sink(&self, node: &Node<'_>) -> Result<Box<dyn Sink>, Error> {
    let kind = node.get("type").expect("each sink must have a type")?.to_str()?;
    self.sink(kind)?(self, node)
  }

  /// Builds a formatter from its description, dispatching on `type`.
  pub fn build_formatter(&self, node: &Node<'_>) -> Result<Box<dyn Format>, Error> {
    let kind = node
      .get("type")
      .expect("each formatter must have a type")?
      .to_str()?;
    self.formatter(kind)?(self, node)
  }

  /// Builds a handler from its description; `type` defaults to `blocking`.
  pub fn build_handler(&self, node: &Node<'_>) -> Result<Box<dyn Handle>, Error> {
    let kind = node.get("type").to_str()?.unwrap_or("blocking");
    self.handler(kind)?(self, node)
  }

  /// Builds a filter from its description, dispatching on `type`.
  pub fn build_filter(&self, node: &Node<'_>) -> Result<Box<dyn Filter>, Error> {
    let kind = node
      .get("type")
      .expect("each filter must have a type")?
      .to_str()?;
    self.filter(kind)?(self, node)
  }
}

/// Assembles loggers from a registry and a parsed configuration.
pub struct Builder<'r> {
  registry: &'r Registry,
  config: Config,
}

impl<'r> Builder<'r> {
  pub fn new(registry: &'r Registry, config: Config) -> Self {
    Self { registry, config }
  }

  /// Convenience for JSON input.
  pub fn from_json(registry: &'r Registry, input: &str) -> Result<Self, Error> {
    Ok(Self::new(registry, Config::from_str(input)?))
  }

  /// Builds the logger configured under `name`: an array of handler
  /// descriptions, each carrying a formatter, its sinks and an optional
  /// handler type and filter.
  pub fn build(&self, name: &str) -> Result<Logger, Error> {
    let root = self.config.root();
    let described = root
      .get(name)
      .expect("logger configuration is required")?
      .items()?;

    let mut handlers: Vec<Box<dyn Handle>> = Vec::with_capacity(described.len());
    for node in &described {
      handlers.push(self.registry.build_handler(node)?);
    }

    Ok(Logger::new(handlers))
  }
}

fn make_string_formatter(_registry: &Registry, node: &Node<'_>) -> Result<Box<dyn Format>, Error> {
  let pattern = node
    .get("pattern")
    .expect("field 'pattern' is required")?
    .to_str()?;

  let mut formatter = StringFormatter::new(pattern)?;
  let severity = node.get("severity");
  if severity.is_some() {
    let entries = severity.items()?;
    let mut names = Vec::with_capacity(entries.len());
    for entry in &entries {
      names.push(entry.to_str()?.to_string());
    }
    formatter = formatter.with_severity_map(names);
  }

  Ok(Box::new(formatter))
}

fn make_null_sink(_registry: &Registry, _node: &Node<'_>) -> Result<Box<dyn Sink>, Error> {
  Ok(Box::new(Null))
}

fn make_console_sink(_registry: &Registry, node: &Node<'_>) -> Result<Box<dyn Sink>, Error> {
  let target = match node.get("target").to_str()? {
    None | Some("stdout") => Target::Stdout,
    Some("stderr") => Target::Stderr,
    Some(other) => {
      return Err(Error::InvalidArgument(format!(
        "unknown console target '{}', expected 'stdout' or 'stderr'",
        other
      )));
    },
  };

  Ok(Box::new(Console::new(target)))
}

fn make_file_sink(_registry: &Registry, node: &Node<'_>) -> Result<Box<dyn Sink>, Error> {
  let path = node
    .get("path")
    .expect("field 'path' is required")?
    .to_str()?;

  let flush = node.get("flush");
  let policy = if !flush.is_some() {
    FlushPolicy::Never
  } else if let Some(records) = flush.to_u64().ok().flatten() {
    FlushPolicy::EveryRecords(records)
  } else {
    match flush.to_byte_count()? {
      Some(bytes) => FlushPolicy::EveryBytes(bytes),
      None => FlushPolicy::Never,
    }
  };

  Ok(Box::new(FileSink::with_flush_policy(path, policy)))
}

fn make_asynchronous_sink(registry: &Registry, node: &Node<'_>) -> Result<Box<dyn Sink>, Error> {
  let wrapped = registry.build_sink(node.get("sink").expect("field 'sink' is required")?)?;

  let exponent = node
    .get("factor")
    .to_u64()?
    .map(|factor| factor as usize)
    .unwrap_or(DEFAULT_CAPACITY_EXPONENT);

  let policy = match node.get("overflow").to_str()? {
    None | Some("block") => OverflowPolicy::Block,
    Some("drop") => OverflowPolicy::DropSilently,
    Some("drop-with-error") => OverflowPolicy::DropWithError,
    Some(other) => {
      return Err(Error::InvalidArgument(format!(
        "unknown overflow policy '{}', expected 'drop', 'drop-with-error' or 'block'",
        other
      )));
    },
  };

  Ok(Box::new(Asynchronous::with_options(
    wrapped, exponent, policy,
  )?))
}

fn make_blocking_handler(registry: &Registry, node: &Node<'_>) -> Result<Box<dyn Handle>, Error> {
  let formatter = registry.build_formatter(
    node
      .get("formatter")
      .expect("each handler must have a formatter")?,
  )?;

  let mut handler = Blocking::new(formatter);
  for sink_node in &node.get("sinks").items()? {
    let sink = registry.build_sink(sink_node)?;
    let sink_filter = sink_node.get("filter");
    match sink_filter.as_node() {
      Some(filter_node) => {
        handler.add_sink_with_filter(sink, registry.build_filter(filter_node)?);
      },
      None => handler.add_sink(sink),
    }
  }

  let filter = node.get("filter");
  if let Some(filter_node) = filter.as_node() {
    handler.set_filter(registry.build_filter(filter_node)?);
  }

  Ok(Box::new(handler))
}

fn make_severity_filter(_registry: &Registry, node: &Node<'_>) -> Result<Box<dyn Filter>, Error> {
  let threshold = node
    .get("threshold")
    .expect("field 'threshold' is required")?
    .to_i64()?;
  Ok(Box::new(SeverityFilter::new(threshold)))
}
