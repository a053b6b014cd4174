use std::io::{self, IsTerminal, Write};
use std::sync::Mutex;

use crate::error::EmitError;
use crate::record::Record;
use crate::sink::Sink;

const RESET: &str = "\x1b[0m";

/// Both standard output and error share one access mutex. Messages written
/// through umbra stay line-atomic; otherwise an intermixing can occur.
static STDIO_MUTEX: Mutex<()> = Mutex::new(());

/// Console destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
  Stdout,
  Stderr,
}

/// An ANSI color applied to a whole output line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TermColor {
  code: Option<&'static str>,
}

impl TermColor {
  pub const RED: TermColor = TermColor {
    code: Some("\x1b[31m"),
  };
  pub const GREEN: TermColor = TermColor {
    code: Some("\x1b[32m"),
  };
  pub const YELLOW: TermColor = TermColor {
    code: Some("\x1b[33m"),
  };
  pub const BLUE: TermColor = TermColor {
    code: Some("\x1b[34m"),
  };
  pub const MAGENTA: TermColor = TermColor {
    code: Some("\x1b[35m"),
  };
  pub const CYAN: TermColor = TermColor {
    code: Some("\x1b[36m"),
  };
  pub const WHITE: TermColor = TermColor {
    code: Some("\x1b[37m"),
  };

  /// No coloring.
  pub const fn none() -> Self {
    Self { code: None }
  }
}

/// Maps a record to the color its line is written with.
pub type ColorMap = Box<dyn Fn(&Record<'_>) -> TermColor + Send + Sync>;

/// Sink writing to stdout or stderr.
///
/// Colors apply only when the target is a terminal; redirected output stays
/// clean.
pub struct Console {
  target: Target,
  colormap: ColorMap,
}

impl Console {
  /// Uncolored console sink.
  pub fn new(target: Target) -> Self {
    Self {
      target,
      colormap: Box::new(|_| TermColor::none()),
    }
  }

  /// Console sink with a severity-to-color mapping.
  pub fn with_colormap(target: Target, colormap: ColorMap) -> Self {
    Self { target, colormap }
  }

  pub fn target(&self) -> Target {
    self.target
  }

  fn is_tty(&self) -> bool {
    match self.target {
      Target::Stdout => io::stdout().is_terminal(),
      Target::Stderr => io::stderr().is_terminal(),
    }
  }

  fn write_line(&self, line: &[u8]) -> io::Result<()> {
    match self.target {
      Target::Stdout => {
        let mut handle = io::stdout().lock();
        handle.write_all(line)?;
        handle.flush()
      },
      Target::Stderr => {
        let mut handle = io::stderr().lock();
        handle.write_all(line)?;
        handle.flush()
      },
    }
  }
}

impl Sink for Console {
  fn emit(&self, record: &Record<'_>, formatted: &str) -> Result<(), EmitError> {
    let color = if self.is_tty() {
      (self.colormap)(record)
    } else {
      TermColor::none()
    };

    let mut line = String::with_capacity(formatted.len() + 16);
    match color.code {
      Some(code) => {
        line.push_str(code);
        line.push_str(formatted);
        line.push_str(RESET);
      },
      None => line.push_str(formatted),
    }
    line.push('\n');

    let guard = match STDIO_MUTEX.lock() {
      Ok(guard) => guard,
      Err(poisoned) => poisoned.into_inner(),
    };
    let result = self.write_line(line.as_bytes());
    drop(guard);

    result.map_err(EmitError::from)
  }
}
