//! # Formatter Module
//!
//! Renders records into textual payloads.
//!
//! The [`StringFormatter`] consumes a placeholder pattern once, at
//! construction, and renders records into a caller-provided string buffer at
//! emit time. The pattern grammar is brace based:
//!
//! ```text
//! {timestamp} {severity}: {message} [{...:{{name}={value}:p}{, :s}s}]
//! ```
//!
//! Well-known placeholders are `message`, `severity`, `timestamp`, `process`
//! and `thread`; every other name is looked up in the record's attribute
//! pack. The `{...}` placeholder renders all attributes not consumed by a
//! named placeholder, joining an item pattern with a separator.
//!
//! Rendering never allocates beyond the growth of the output buffer, and a
//! record rendered twice through a formatter without time-dependent
//! placeholders produces byte-identical output.

pub(crate) mod grammar;
pub(crate) mod spec;

pub use grammar::ParseError;

use std::fmt::Write as _;

use chrono::{DateTime, Local, Utc};

use crate::attribute::Value;
use crate::formatter::grammar::{FieldKind, ItemToken, TimestampSpec, Token};
use crate::formatter::spec::{Kind, Spec};
use crate::record::Record;
use crate::utils;

/// Renders a record into a byte buffer.
pub trait Format: Send + Sync {
  fn format(&self, record: &Record<'_>, out: &mut String);
}

/// Pattern-driven record formatter.
///
/// Attribute lookups cost a linear scan of the pack per named placeholder;
/// patterns that consume many attributes should prefer the variadic
/// placeholder, which walks the pack once.
pub struct StringFormatter {
  pattern: String,
  tokens: Vec<Token>,
  /// Attribute names claimed by named placeholders, excluded from `{...}`.
  consumed: Vec<String>,
  /// Maps non-negative severities to display names. Empty means numeric.
  severity_map: Vec<String>,
}

impl StringFormatter {
  /// Parses `pattern`. Fails on malformed syntax, unknown sub-placeholders
  /// inside the variadic item pattern and invalid timestamp format strings.
  pub fn new(pattern: &str) -> Result<Self, ParseError> {
    let tokens = grammar::parse(pattern)?;
    let consumed = tokens
      .iter()
      .filter_map(|token| match token {
        Token::Field {
          kind: FieldKind::Attribute(name),
          ..
        } => Some(name.clone()),
        _ => None,
      })
      .collect();

    Ok(Self {
      pattern: pattern.to_string(),
      tokens,
      consumed,
      severity_map: Vec::new(),
    })
  }

  /// Attaches a severity table mapping severity `n` to `names[n]`.
  ///
  /// Severities outside the table fall back to their numeric rendering, as
  /// does any `{severity:d}` placeholder.
  pub fn with_severity_map(mut self, names: Vec<String>) -> Self {
    self.severity_map = names;
    self
  }

  /// The original pattern string.
  pub fn pattern(&self) -> &str {
    &self.pattern
  }

  fn render_field(&self, record: &Record<'_>, kind: &FieldKind, spec: &Spec, out: &mut String) {
    match kind {
      FieldKind::Message => spec.pad(record.formatted(), out),
      FieldKind::Severity => self.render_severity(record.severity(), spec, out),
      FieldKind::Timestamp(timestamp) => render_timestamp(record, timestamp, spec, out),
      FieldKind::Process => {
        if spec.kind == Some(Kind::Str) {
          spec.pad(utils::process_name(), out);
        } else {
          let mut scratch = String::new();
          let _ = write!(scratch, "{}", record.pid());
          spec.pad(&scratch, out);
        }
      },
      FieldKind::Thread => render_thread(record, spec, out),
      FieldKind::Attribute(name) => match record.attributes().find(name) {
        Some(value) => render_value(value, spec, out),
        None => spec.pad("none", out),
      },
    }
  }

  fn render_severity(&self, severity: i64, spec: &Spec, out: &mut String) {
    if spec.kind != Some(Kind::Decimal) {
      let mapped = usize::try_from(severity)
        .ok()
        .and_then(|index| self.severity_map.get(index));
      if let Some(name) = mapped {
        spec.pad(name, out);
        return;
      }
    }

    let mut scratch = String::new();
    let _ = write!(scratch, "{}", severity);
    spec.pad(&scratch, out);
  }

  fn render_variadic(
    &self,
    record: &Record<'_>,
    pattern: &[ItemToken],
    separator: &str,
    spec: &Spec,
    out: &mut String,
  ) {
    let mut joined = String::new();
    let mut first = true;

    for (key, value) in record.attributes().entries() {
      if self.consumed.iter().any(|name| name.as_str() == *key) {
        continue;
      }
      if !first {
        joined.push_str(separator);
      }
      first = false;

      for item in pattern {
        match item {
          ItemToken::Literal(text) => joined.push_str(text),
          ItemToken::Name(spec) => spec.pad(key, &mut joined),
          ItemToken::Value(spec) => render_value(*value, spec, &mut joined),
        }
      }
    }

    spec.pad(&joined, out);
  }
}

impl Format for StringFormatter {
  fn format(&self, record: &Record<'_>, out: &mut String) {
    for token in &self.tokens {
      match token {
        Token::Literal(text) => out.push_str(text),
        Token::Field { kind, spec } => self.render_field(record, kind, spec, out),
        Token::Variadic {
          pattern,
          separator,
          spec,
        } => self.render_variadic(record, pattern, separator, spec, out),
      }
    }
  }
}

impl std::fmt::Debug for StringFormatter {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("StringFormatter")
      .field("pattern", &self.pattern)
      .finish()
  }
}

fn render_timestamp(record: &Record<'_>, timestamp: &TimestampSpec, spec: &Spec, out: &mut String) {
  let mut scratch = String::with_capacity(32);
  if timestamp.localtime {
    let instant: DateTime<Local> = record.timestamp().into();
    let _ = write!(scratch, "{}", instant.format(&timestamp.strftime));
  } else {
    let instant: DateTime<Utc> = record.timestamp().into();
    let _ = write!(scratch, "{}", instant.format(&timestamp.strftime));
  }
  spec.pad(&scratch, out);
}

fn render_thread(record: &Record<'_>, spec: &Spec, out: &mut String) {
  if spec.kind == Some(Kind::Str) && record.tid() == utils::current_thread_id() {
    if let Some(name) = utils::current_thread_name() {
      spec.pad(&name, out);
      return;
    }
  }

  let mut scratch = String::new();
  let _ = write!(scratch, "{}", record.tid());
  spec.pad(&scratch, out);
}

fn render_value(value: Value<'_>, spec: &Spec, out: &mut String) {
  match value {
    Value::Str(text) => spec.pad(text, out),
    Value::I64(number) => {
      let mut scratch = String::new();
      let _ = write!(scratch, "{}", number);
      spec.pad(&scratch, out);
    },
    Value::F64(number) => {
      let mut scratch = String::new();
      match spec.precision {
        Some(precision) => {
          let _ = write!(scratch, "{:.*}", precision, number);
        },
        None => {
          let _ = write!(scratch, "{}", number);
        },
      }
      spec.pad(&scratch, out);
    },
    Value::Lazy(format) => {
      let mut scratch = String::new();
      format(&mut scratch);
      spec.pad(&scratch, out);
    },
  }
}
