//! # Config Module
//!
//! A uniform node tree over parsed JSON, with path-aware accessors.
//!
//! Every traversal step appends a `/key` or `/index` segment to a cursor, so
//! a type mismatch deep inside a handler description reports exactly where
//! it happened, the expected type and the actual one. Absent nodes propagate
//! through indexing without panicking; [`ConfigOption::expect`] turns
//! absence into a structured error.


use std::fmt;

use byte_unit::Byte;
use serde_json::Value as Json;

/// Error raised while reading a configuration tree.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
  /// The input is not valid JSON.
  Syntax(String),
  /// A node has the wrong type.
  TypeMismatch {
    cursor: String,
    expected: &'static str,
    actual: &'static str,
  },
  /// A required node is absent.
  Missing { cursor: String, reason: String },
  /// A node has the right type but an unusable value.
  InvalidValue { cursor: String, message: String },
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::Syntax(message) => write!(f, "syntax error: {}", message),
      ConfigError::TypeMismatch {
        cursor,
        expected,
        actual,
      } => write!(
        f,
        "type mismatch at \"{}\": expected \"{}\", actual \"{}\"",
        cursor, expected, actual
      ),
      ConfigError::Missing { cursor, reason } => {
        write!(f, "missing node at \"{}\": {}", cursor, reason)
      },
      ConfigError::InvalidValue { cursor, message } => {
        write!(f, "invalid value at \"{}\": {}", cursor, message)
      },
    }
  }
}

impl std::error::Error for ConfigError {}

/// A parsed configuration tree.
#[derive(Debug, Clone)]
pub struct Config {
  root: Json,
}

impl Config {
  /// Parses a JSON document.
  pub fn from_str(input: &str) -> Result<Self, ConfigError> {
    let root = serde_json::from_str(input).map_err(|err| ConfigError::Syntax(err.to_string()))?;
    Ok(Self { root })
  }

  /// Wraps an already parsed JSON value.
  pub fn from_value(root: Json) -> Self {
    Self { root }
  }

  /// The root node.
  pub fn root(&self) -> Node<'_> {
    Node {
      value: &self.root,
      cursor: String::new(),
    }
  }
}

/// A cursor-carrying view over one tree node.
#[derive(Debug, Clone)]
pub struct Node<'a> {
  value: &'a Json,
  cursor: String,
}

fn type_name(value: &Json) -> &'static str {
  match value {
    Json::Null => "null",
    Json::Bool(_) => "bool",
    Json::Number(_) => "number",
    Json::String(_) => "string",
    Json::Array(_) => "array",
    Json::Object(_) => "object",
  }
}

impl<'a> Node<'a> {
  /// The JSON-pointer style location of this node; `/` for the root.
  pub fn cursor(&self) -> &str {
    if self.cursor.is_empty() {
      "/"
    } else {
      &self.cursor
    }
  }

  fn advance_key(&self, key: &str) -> String {
    format!("{}/{}", self.cursor, key)
  }

  fn advance_index(&self, index: usize) -> String {
    format!("{}/{}", self.cursor, index)
  }

  fn mismatch(&self, expected: &'static str) -> ConfigError {
    ConfigError::TypeMismatch {
      cursor: self.cursor().to_string(),
      expected,
      actual: type_name(self.value),
    }
  }

  pub fn is_bool(&self) -> bool {
    self.value.is_boolean()
  }

  pub fn is_i64(&self) -> bool {
    self.value.is_i64()
  }

  pub fn is_u64(&self) -> bool {
    self.value.is_u64()
  }

  pub fn is_f64(&self) -> bool {
    self.value.is_f64()
  }

  pub fn is_str(&self) -> bool {
    self.value.is_string()
  }

  pub fn is_array(&self) -> bool {
    self.value.is_array()
  }

  pub fn is_object(&self) -> bool {
    self.value.is_object()
  }

  pub fn to_bool(&self) -> Result<bool, ConfigError> {
    self.value.as_bool().ok_or_else(|| self.mismatch("bool"))
  }

  pub fn to_i64(&self) -> Result<i64, ConfigError> {
    self.value.as_i64().ok_or_else(|| self.mismatch("int64"))
  }

  pub fn to_u64(&self) -> Result<u64, ConfigError> {
    self.value.as_u64().ok_or_else(|| self.mismatch("uint64"))
  }

  pub fn to_f64(&self) -> Result<f64, ConfigError> {
    self.value.as_f64().ok_or_else(|| self.mismatch("double"))
  }

  pub fn to_str(&self) -> Result<&'a str, ConfigError> {
    self.value.as_str().ok_or_else(|| self.mismatch("string"))
  }

  /// Array elements, cursors advanced per index.
  pub fn items(&self) -> Result<Vec<Node<'a>>, ConfigError> {
    let array = self.value.as_array().ok_or_else(|| self.mismatch("array"))?;
    Ok(
      array
        .iter()
        .enumerate()
        .map(|(index, value)| Node {
          value,
          cursor: self.advance_index(index),
        })
        .collect(),
    )
  }

  /// Object members, cursors advanced per key.
  pub fn members(&self) -> Result<Vec<(&'a str, Node<'a>)>, ConfigError> {
    let object = self
      .value
      .as_object()
      .ok_or_else(|| self.mismatch("object"))?;
    Ok(
      object
        .iter()
        .map(|(key, value)| {
          (
            key.as_str(),
            Node {
              value,
              cursor: self.advance_key(key),
            },
          )
        })
        .collect(),
    )
  }

  /// Child lookup by key. Absence is not an error.
  pub fn get(&self, key: &str) -> ConfigOption<'a> {
    let cursor = self.advance_key(key);
    match self.value.get(key) {
      Some(value) => ConfigOption {
        node: Some(Node { value, cursor }),
        cursor: String::new(),
      },
      None => ConfigOption { node: None, cursor },
    }
  }

  /// Child lookup by index. Absence is not an error.
  pub fn at(&self, index: usize) -> ConfigOption<'a> {
    let cursor = self.advance_index(index);
    match self.value.get(index) {
      Some(value) => ConfigOption {
        node: Some(Node { value, cursor }),
        cursor: String::new(),
      },
      None => ConfigOption { node: None, cursor },
    }
  }
}

/// An optional node that keeps tracking its would-be location.
///
/// Indexing an absent option stays absent; the cursor keeps growing so the
/// eventual [`ConfigOption::expect`] error names the full path.
#[derive(Debug, Clone)]
pub struct ConfigOption<'a> {
  node: Option<Node<'a>>,
  /// Location of the absent node; unused while `node` is present.
  cursor: String,
}

impl<'a> ConfigOption<'a> {
  pub fn is_some(&self) -> bool {
    self.node.is_some()
  }

  /// The underlying node, when present.
  pub fn as_node(&self) -> Option<&Node<'a>> {
    self.node.as_ref()
  }

  fn cursor(&self) -> &str {
    match &self.node {
      Some(node) => node.cursor(),
      None => {
        if self.cursor.is_empty() {
          "/"
        } else {
          &self.cursor
        }
      },
    }
  }

  /// Unwraps, reporting `reason` at the tracked cursor when absent.
  pub fn expect(&self, reason: &str) -> Result<&Node<'a>, ConfigError> {
    self.node.as_ref().ok_or_else(|| ConfigError::Missing {
      cursor: self.cursor().to_string(),
      reason: reason.to_string(),
    })
  }

  pub fn get(&self, key: &str) -> ConfigOption<'a> {
    match &self.node {
      Some(node) => node.get(key),
      None => ConfigOption {
        node: None,
        cursor: format!("{}/{}", self.cursor, key),
      },
    }
  }

  pub fn at(&self, index: usize) -> ConfigOption<'a> {
    match &self.node {
      Some(node) => node.at(index),
      None => ConfigOption {
        node: None,
        cursor: format!("{}/{}", self.cursor, index),
      },
    }
  }

  pub fn to_bool(&self) -> Result<Option<bool>, ConfigError> {
    self.node.as_ref().map(Node::to_bool).transpose()
  }

  pub fn to_i64(&self) -> Result<Option<i64>, ConfigError> {
    self.node.as_ref().map(Node::to_i64).transpose()
  }

  pub fn to_u64(&self) -> Result<Option<u64>, ConfigError> {
    self.node.as_ref().map(Node::to_u64).transpose()
  }

  pub fn to_f64(&self) -> Result<Option<f64>, ConfigError> {
    self.node.as_ref().map(Node::to_f64).transpose()
  }

  pub fn to_str(&self) -> Result<Option<&'a str>, ConfigError> {
    self.node.as_ref().map(|node| node.to_str()).transpose()
  }

  /// Array elements of a present node; absent yields an empty list.
  pub fn items(&self) -> Result<Vec<Node<'a>>, ConfigError> {
    match &self.node {
      Some(node) => node.items(),
      None => Ok(Vec::new()),
    }
  }

  /// Reads a byte count: either an unsigned integer or a string with a data
  /// size suffix (`B`, `kB`, `MB`, `GB`, `KiB`, `MiB`, `GiB`).
  pub fn to_byte_count(&self) -> Result<Option<u64>, ConfigError> {
    let node = match &self.node {
      Some(node) => node,
      None => return Ok(None),
    };

    if node.is_u64() {
      return Ok(Some(node.to_u64()?));
    }

    let encoded = node.to_str()?;
    let byte = Byte::parse_str(encoded, true).map_err(|err| ConfigError::InvalidValue {
      cursor: node.cursor().to_string(),
      message: format!("bad data size '{}': {}", encoded, err),
    })?;
    Ok(Some(byte.as_u64()))
  }
}
