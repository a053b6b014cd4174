use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

use crate::error::EmitError;
use crate::record::Record;
use crate::sink::Sink;

/// Decides when a destination flushes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlushPolicy {
  /// Flush only when the stream buffer fills and on shutdown.
  #[default]
  Never,
  /// Flush after every N accepted records.
  EveryRecords(u64),
  /// Flush once at least N bytes were written since the last flush.
  EveryBytes(u64),
}

/// Per-destination flush counter.
#[derive(Debug)]
enum Flusher {
  Repeat { counter: u64, threshold: u64 },
  ByteCount { counter: u64, threshold: u64 },
}

impl Flusher {
  fn from_policy(policy: FlushPolicy) -> Option<Self> {
    match policy {
      FlushPolicy::Never => None,
      FlushPolicy::EveryRecords(threshold) => Some(Flusher::Repeat {
        counter: 0,
        threshold: threshold.max(1),
      }),
      FlushPolicy::EveryBytes(threshold) => Some(Flusher::ByteCount {
        counter: 0,
        threshold: threshold.max(1),
      }),
    }
  }

  /// Accounts `written` bytes of one record; true means flush now.
  fn update(&mut self, written: u64) -> bool {
    if written == 0 {
      return false;
    }
    match self {
      Flusher::Repeat { counter, threshold } => {
        *counter = (*counter + 1) % *threshold;
        *counter == 0
      },
      Flusher::ByteCount { counter, threshold } => {
        let flush = *counter + written >= *threshold;
        *counter = (*counter + written) % *threshold;
        flush
      },
    }
  }
}

struct Backend {
  file: BufWriter<std::fs::File>,
  flusher: Option<Flusher>,
}

impl Backend {
  fn open(path: &str, policy: FlushPolicy) -> io::Result<Self> {
    if let Some(parent) = Path::new(path).parent() {
      if !parent.as_os_str().is_empty() {
        std::fs::create_dir_all(parent)?;
      }
    }

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(Self {
      file: BufWriter::new(file),
      flusher: Flusher::from_policy(policy),
    })
  }

  fn write(&mut self, message: &str) -> io::Result<()> {
    self.file.write_all(message.as_bytes())?;
    self.file.write_all(b"\n")?;

    let written = message.len() as u64 + 1;
    if let Some(flusher) = &mut self.flusher {
      if flusher.update(written) {
        self.file.flush()?;
      }
    }
    Ok(())
  }
}

/// Sink appending formatted records to files.
///
/// The path is a pattern: `{name}` placeholders are substituted from the
/// record's attributes at emit time, so a single sink can write to multiple
/// destinations. Each destination keeps its own open handle and flusher.
/// Writes are serialized per sink.
pub struct FileSink {
  path: String,
  policy: FlushPolicy,
  backends: Mutex<HashMap<String, Backend>>,
}

impl FileSink {
  pub fn new(path: impl Into<String>) -> Self {
    Self::with_flush_policy(path, FlushPolicy::Never)
  }

  pub fn with_flush_policy(path: impl Into<String>, policy: FlushPolicy) -> Self {
    Self {
      path: path.into(),
      policy,
      backends: Mutex::new(HashMap::new()),
    }
  }

  /// The destination path pattern.
  pub fn path(&self) -> &str {
    &self.path
  }

  /// Resolves the destination for `record`.
  ///
  /// Attribute placeholders render their value, or the literal `none` when
  /// the attribute is missing; `{{` and `}}` escape literal braces.
  pub fn filename(&self, record: &Record<'_>) -> String {
    let mut out = String::with_capacity(self.path.len());
    let mut chars = self.path.chars().peekable();

    while let Some(c) = chars.next() {
      match c {
        '{' if chars.peek() == Some(&'{') => {
          chars.next();
          out.push('{');
        },
        '}' if chars.peek() == Some(&'}') => {
          chars.next();
          out.push('}');
        },
        '{' => {
          let mut name = String::new();
          let mut closed = false;
          for inner in chars.by_ref() {
            if inner == '}' {
              closed = true;
              break;
            }
            name.push(inner);
          }
          if !closed {
            out.push('{');
            out.push_str(&name);
            break;
          }
          match record.attributes().find(&name) {
            Some(value) => value.render(&mut out),
            None => out.push_str("none"),
          }
        },
        _ => out.push(c),
      }
    }

    out
  }
}

impl Sink for FileSink {
  fn emit(&self, record: &Record<'_>, formatted: &str) -> Result<(), EmitError> {
    let filename = self.filename(record);

    let mut backends = match self.backends.lock() {
      Ok(guard) => guard,
      Err(poisoned) => poisoned.into_inner(),
    };

    let backend = match backends.entry(filename) {
      Entry::Occupied(entry) => entry.into_mut(),
      Entry::Vacant(entry) => {
        let backend = Backend::open(entry.key(), self.policy)?;
        entry.insert(backend)
      },
    };

    backend.write(formatted).map_err(EmitError::from)
  }
}
