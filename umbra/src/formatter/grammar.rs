//! Pattern grammar for the string formatter.
//!
//! A pattern is parsed exactly once, at formatter construction, into a
//! sequence of tokens. Placeholders are brace delimited: `{name[:spec]}`,
//! with `{{` and `}}` escaping literal braces. The variadic placeholder
//! `{...}` accepts an item pattern and a separator as tagged sub-blocks:
//! `{...:{<item-pattern>:p}{<separator>:s}<spec>}`.

use std::fmt;
use std::fmt::Write as _;
use std::time::UNIX_EPOCH;

use chrono::{DateTime, Utc};

use crate::formatter::spec::Spec;

/// Error raised while parsing a formatter pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
  message: String,
  position: usize,
}

impl ParseError {
  pub(crate) fn new(message: impl Into<String>, position: usize) -> Self {
    Self {
      message: message.into(),
      position,
    }
  }

  pub fn message(&self) -> &str {
    &self.message
  }

  /// Byte offset into the pattern where the error was detected.
  pub fn position(&self) -> usize {
    self.position
  }
}

impl fmt::Display for ParseError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "malformed pattern at byte {}: {}",
      self.position, self.message
    )
  }
}

impl std::error::Error for ParseError {}

pub(crate) const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S.%6f";
pub(crate) const DEFAULT_ITEM_PATTERN: &str = "{name}: {value}";
pub(crate) const DEFAULT_SEPARATOR: &str = ", ";

/// Timestamp rendering parameters carried by a `{timestamp}` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TimestampSpec {
  /// strftime format, with the `%f` microseconds extension already expanded.
  pub strftime: String,
  pub localtime: bool,
}

impl Default for TimestampSpec {
  fn default() -> Self {
    Self {
      strftime: DEFAULT_TIMESTAMP_FORMAT.to_string(),
      localtime: false,
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum FieldKind {
  Message,
  Severity,
  Timestamp(TimestampSpec),
  Process,
  Thread,
  Attribute(String),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ItemToken {
  Literal(String),
  Name(Spec),
  Value(Spec),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
  Literal(String),
  Field {
    kind: FieldKind,
    spec: Spec,
  },
  Variadic {
    pattern: Vec<ItemToken>,
    separator: String,
    spec: Spec,
  },
}

struct Cursor {
  chars: Vec<(usize, char)>,
  pos: usize,
  end: usize,
}

impl Cursor {
  fn new(src: &str) -> Self {
    Self {
      chars: src.char_indices().collect(),
      pos: 0,
      end: src.len(),
    }
  }

  fn peek(&self) -> Option<char> {
    self.chars.get(self.pos).map(|(_, c)| *c)
  }

  fn peek_at(&self, ahead: usize) -> Option<char> {
    self.chars.get(self.pos + ahead).map(|(_, c)| *c)
  }

  fn bump(&mut self) -> Option<char> {
    let c = self.peek();
    if c.is_some() {
      self.pos += 1;
    }
    c
  }

  /// Byte offset of the current character, or the pattern length at the end.
  fn offset(&self) -> usize {
    self
      .chars
      .get(self.pos)
      .map(|(offset, _)| *offset)
      .unwrap_or(self.end)
  }
}

pub(crate) fn parse(pattern: &str) -> Result<Vec<Token>, ParseError> {
  let mut cursor = Cursor::new(pattern);
  let mut tokens = Vec::new();
  let mut literal = String::new();

  while let Some(c) = cursor.peek() {
    match c {
      '{' if cursor.peek_at(1) == Some('{') => {
        literal.push('{');
        cursor.bump();
        cursor.bump();
      },
      '}' if cursor.peek_at(1) == Some('}') => {
        literal.push('}');
        cursor.bump();
        cursor.bump();
      },
      '}' => {
        return Err(ParseError::new("unmatched '}' in pattern", cursor.offset()));
      },
      '{' => {
        if !literal.is_empty() {
          tokens.push(Token::Literal(std::mem::take(&mut literal)));
        }
        cursor.bump();
        tokens.push(parse_placeholder(&mut cursor)?);
      },
      _ => {
        literal.push(c);
        cursor.bump();
      },
    }
  }

  if !literal.is_empty() {
    tokens.push(Token::Literal(literal));
  }

  Ok(tokens)
}

fn parse_placeholder(cursor: &mut Cursor) -> Result<Token, ParseError> {
  let start = cursor.offset();
  let mut name = String::new();

  loop {
    match cursor.peek() {
      None => return Err(ParseError::new("unterminated placeholder", start)),
      Some(':') | Some('}') => break,
      Some('{') => {
        return Err(ParseError::new(
          "unexpected '{' in placeholder name",
          cursor.offset(),
        ));
      },
      Some(c) => {
        name.push(c);
        cursor.bump();
      },
    }
  }

  if name.is_empty() {
    return Err(ParseError::new("empty placeholder name", start));
  }

  let has_spec = cursor.peek() == Some(':');
  if has_spec {
    cursor.bump();
  }

  if name == "..." {
    return parse_variadic(cursor, has_spec, start);
  }

  if name == "timestamp" && has_spec && cursor.peek() == Some('{') {
    cursor.bump();
    let content = scan_braced(cursor)?;
    // The character after the block toggles the time zone: `s` (or
    // nothing) renders UTC, `l` renders local time.
    let trailer = read_spec_raw(cursor, true, start)?;
    let localtime = match trailer.as_str() {
      "" | "s" => false,
      "l" => true,
      other => {
        return Err(ParseError::new(
          format!("unknown timestamp type '{}'", other),
          start,
        ));
      },
    };

    let strftime = convert_strftime(&content);
    validate_strftime(&strftime, start)?;
    return Ok(Token::Field {
      kind: FieldKind::Timestamp(TimestampSpec {
        strftime,
        localtime,
      }),
      spec: Spec::default(),
    });
  }

  let raw = read_spec_raw(cursor, has_spec, start)?;
  let spec = Spec::parse(&raw, start)?;
  let kind = match name.as_str() {
    "message" => FieldKind::Message,
    "severity" => FieldKind::Severity,
    "timestamp" => FieldKind::Timestamp(TimestampSpec::default()),
    "process" => FieldKind::Process,
    "thread" => FieldKind::Thread,
    _ => FieldKind::Attribute(name),
  };

  Ok(Token::Field { kind, spec })
}

/// Reads a plain (non-nested) spec up to the closing brace, consuming it.
fn read_spec_raw(cursor: &mut Cursor, has_spec: bool, start: usize) -> Result<String, ParseError> {
  let mut raw = String::new();

  if !has_spec {
    match cursor.peek() {
      Some('}') => {
        cursor.bump();
        return Ok(raw);
      },
      _ => return Err(ParseError::new("unterminated placeholder", start)),
    }
  }

  loop {
    match cursor.peek() {
      None => return Err(ParseError::new("unterminated placeholder", start)),
      Some('}') => {
        cursor.bump();
        return Ok(raw);
      },
      Some('{') => {
        return Err(ParseError::new(
          "unexpected '{' in format spec",
          cursor.offset(),
        ));
      },
      Some(c) => {
        raw.push(c);
        cursor.bump();
      },
    }
  }
}

fn parse_variadic(cursor: &mut Cursor, has_spec: bool, start: usize) -> Result<Token, ParseError> {
  let mut pattern_raw: Option<String> = None;
  let mut separator_raw: Option<String> = None;
  let mut outer_raw = String::new();

  if has_spec {
    while cursor.peek() == Some('{') {
      cursor.bump();
      let (content, tag, tag_position) = scan_block(cursor)?;
      match tag {
        'p' => pattern_raw = Some(content),
        's' => separator_raw = Some(content),
        other => {
          return Err(ParseError::new(
            format!("unknown pattern type '{}'", other),
            tag_position,
          ));
        },
      }
    }

    loop {
      match cursor.peek() {
        None => return Err(ParseError::new("unterminated placeholder", start)),
        Some('}') => {
          cursor.bump();
          break;
        },
        Some('{') => {
          return Err(ParseError::new(
            "unexpected '{' in format spec",
            cursor.offset(),
          ));
        },
        Some(c) => {
          outer_raw.push(c);
          cursor.bump();
        },
      }
    }
  } else {
    match cursor.peek() {
      Some('}') => {
        cursor.bump();
      },
      _ => return Err(ParseError::new("unterminated placeholder", start)),
    }
  }

  let pattern = parse_item_pattern(
    pattern_raw.as_deref().unwrap_or(DEFAULT_ITEM_PATTERN),
    start,
  )?;
  let separator = match separator_raw {
    Some(raw) => unescape_braces(&raw),
    None => DEFAULT_SEPARATOR.to_string(),
  };
  let spec = Spec::parse(&outer_raw, start)?;

  Ok(Token::Variadic {
    pattern,
    separator,
    spec,
  })
}

/// Scans a plain braced block after its opening brace, with `{{` and `}}`
/// escapes, up to and including the matching `}`. Used for the timestamp
/// strftime sub-spec.
fn scan_braced(cursor: &mut Cursor) -> Result<String, ParseError> {
  let start = cursor.offset();
  let mut content = String::new();
  let mut depth = 1usize;

  loop {
    let Some(c) = cursor.peek() else {
      return Err(ParseError::new("unterminated pattern block", start));
    };
    match c {
      '{' if cursor.peek_at(1) == Some('{') => {
        content.push('{');
        cursor.bump();
        cursor.bump();
      },
      '}' if depth == 1 && cursor.peek_at(1) == Some('}') => {
        content.push('}');
        cursor.bump();
        cursor.bump();
      },
      '{' => {
        depth += 1;
        content.push('{');
        cursor.bump();
      },
      '}' => {
        cursor.bump();
        depth -= 1;
        if depth == 0 {
          return Ok(content);
        }
        content.push('}');
      },
      _ => {
        content.push(c);
        cursor.bump();
      },
    }
  }
}

/// Scans a tagged sub-block after its opening brace.
///
/// The block runs to the matching unescaped `}` and must end with `:<tag>`,
/// e.g. `{name}={value}:p`. Returns the content with the tag stripped, the
/// tag character and the byte position just past the block.
fn scan_block(cursor: &mut Cursor) -> Result<(String, char, usize), ParseError> {
  let start = cursor.offset();
  let mut content = String::new();
  let mut depth = 1usize;

  loop {
    let Some(c) = cursor.peek() else {
      return Err(ParseError::new("unterminated pattern block", start));
    };
    match c {
      '{' if cursor.peek_at(1) == Some('{') => {
        content.push_str("{{");
        cursor.bump();
        cursor.bump();
      },
      '}' if depth == 1 && cursor.peek_at(1) == Some('}') => {
        content.push_str("}}");
        cursor.bump();
        cursor.bump();
      },
      '{' => {
        depth += 1;
        content.push('{');
        cursor.bump();
      },
      '}' => {
        cursor.bump();
        depth -= 1;
        if depth == 0 {
          let mut reversed = content.chars().rev();
          let tag = reversed.next();
          let colon = reversed.next();
          return match (colon, tag) {
            (Some(':'), Some(tag)) if tag.is_ascii_alphabetic() => {
              let body = content[..content.len() - 2].to_string();
              Ok((body, tag, cursor.offset()))
            },
            _ => Err(ParseError::new(
              "pattern type must be specified",
              cursor.offset(),
            )),
          };
        }
        content.push('}');
      },
      _ => {
        content.push(c);
        cursor.bump();
      },
    }
  }
}

/// Parses the variadic item pattern: literals plus `{name[:spec]}` and
/// `{value[:spec]}` placeholders.
fn parse_item_pattern(raw: &str, at: usize) -> Result<Vec<ItemToken>, ParseError> {
  let mut cursor = Cursor::new(raw);
  let mut items = Vec::new();
  let mut literal = String::new();

  while let Some(c) = cursor.peek() {
    match c {
      '{' if cursor.peek_at(1) == Some('{') => {
        literal.push('{');
        cursor.bump();
        cursor.bump();
      },
      '}' if cursor.peek_at(1) == Some('}') => {
        literal.push('}');
        cursor.bump();
        cursor.bump();
      },
      '}' => {
        return Err(ParseError::new("unmatched '}' in attribute pattern", at));
      },
      '{' => {
        if !literal.is_empty() {
          items.push(ItemToken::Literal(std::mem::take(&mut literal)));
        }
        cursor.bump();

        let mut name = String::new();
        loop {
          match cursor.peek() {
            None => {
              return Err(ParseError::new("unterminated attribute pattern", at));
            },
            Some(':') | Some('}') => break,
            Some(c) => {
              name.push(c);
              cursor.bump();
            },
          }
        }

        let has_spec = cursor.peek() == Some(':');
        if has_spec {
          cursor.bump();
        }
        let spec_raw = read_spec_raw(&mut cursor, has_spec, at)?;
        let spec = Spec::parse(&spec_raw, at)?;

        match name.as_str() {
          "name" => items.push(ItemToken::Name(spec)),
          "value" => items.push(ItemToken::Value(spec)),
          other => {
            return Err(ParseError::new(
              format!("unknown placeholder '{}' in attribute pattern", other),
              at,
            ));
          },
        }
      },
      _ => {
        literal.push(c);
        cursor.bump();
      },
    }
  }

  if !literal.is_empty() {
    items.push(ItemToken::Literal(literal));
  }

  Ok(items)
}

fn unescape_braces(raw: &str) -> String {
  let mut out = String::with_capacity(raw.len());
  let mut chars = raw.chars().peekable();
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
      _ => out.push(c),
    }
  }
  out
}

/// Expands the `%f` microseconds extension into chrono's `%6f`.
fn convert_strftime(raw: &str) -> String {
  let mut out = String::with_capacity(raw.len() + 4);
  let mut chars = raw.chars();
  while let Some(c) = chars.next() {
    if c == '%' {
      match chars.next() {
        Some('f') => out.push_str("%6f"),
        Some(other) => {
          out.push('%');
          out.push(other);
        },
        None => out.push('%'),
      }
    } else {
      out.push(c);
    }
  }
  out
}

/// Renders a probe instant so that malformed strftime strings are rejected
/// at construction instead of at every emit.
fn validate_strftime(strftime: &str, at: usize) -> Result<(), ParseError> {
  let probe: DateTime<Utc> = UNIX_EPOCH.into();
  let mut scratch = String::new();
  if write!(scratch, "{}", probe.format(strftime)).is_err() {
    return Err(ParseError::new("invalid timestamp format string", at));
  }
  Ok(())
}
