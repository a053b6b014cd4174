#[cfg(test)]
mod __test__ {

  use std::sync::{Arc, Mutex};

  use crate::config::{ConfigError, Node};
  use crate::error::{EmitError, Error};
  use crate::record::Record;
  use crate::registry::{Builder, Registry};
  use crate::sink::Sink;

  struct RecordingSink {
    entries: Arc<Mutex<Vec<(i64, String)>>>,
  }

  impl Sink for RecordingSink {
    fn emit(&self, record: &Record<'_>, formatted: &str) -> Result<(), EmitError> {
      self
        .entries
        .lock()
        .unwrap()
        .push((record.severity(), formatted.to_string()));
      Ok(())
    }
  }

  /// Registry with an extra `recording` sink capturing into `entries`.
  fn registry_with_recording(entries: &Arc<Mutex<Vec<(i64, String)>>>) -> Registry {
    let mut registry = Registry::configured();
    let entries = Arc::clone(entries);
    registry.add_sink(
      "recording",
      Box::new(move |_registry: &Registry, _node: &Node<'_>| {
        let sink: Box<dyn Sink> = Box::new(RecordingSink {
          entries: Arc::clone(&entries),
        });
        Ok(sink)
      }),
    );
    registry
  }

  #[test]
  fn test_build_with_builtin_components() {
    let registry = Registry::configured();
    let builder = Builder::from_json(
      &registry,
      r#"{
        "root": [
          {
            "formatter": {"type": "string", "pattern": "{severity}: {message}"},
            "sinks": [{"type": "null"}]
          }
        ]
      }"#,
    )
    .unwrap();

    let logger = builder.build("root").unwrap();
    logger.log(0, "smoke");
  }

  #[test]
  fn test_built_logger_flows_end_to_end() {
    let entries = Arc::new(Mutex::new(Vec::new()));
    let registry = registry_with_recording(&entries);

    let builder = Builder::from_json(
      &registry,
      r#"{
        "root": [
          {
            "formatter": {
              "type": "string",
              "pattern": "{severity}: {message}",
              "severity": ["debug", "info", "warn", "error"]
            },
            "sinks": [{"type": "recording"}]
          }
        ]
      }"#,
    )
    .unwrap();

    let logger = builder.build("root").unwrap();
    logger.log(1, "ready");

    assert_eq!(
      entries.lock().unwrap().as_slice(),
      &[(1, "info: ready".to_string())]
    );
  }

  #[test]
  fn test_handler_filter_from_config() {
    let entries = Arc::new(Mutex::new(Vec::new()));
    let registry = registry_with_recording(&entries);

    let builder = Builder::from_json(
      &registry,
      r#"{
        "root": [
          {
            "formatter": {"type": "string", "pattern": "{message}"},
            "sinks": [{"type": "recording"}],
            "filter": {"type": "severity", "threshold": 2}
          }
        ]
      }"#,
    )
    .unwrap();

    let logger = builder.build("root").unwrap();
    logger.log(1, "dropped");
    logger.log(2, "kept");

    assert_eq!(
      entries.lock().unwrap().as_slice(),
      &[(2, "kept".to_string())]
    );
  }

  #[test]
  fn test_per_sink_filter_from_config() {
    let entries = Arc::new(Mutex::new(Vec::new()));
    let registry = registry_with_recording(&entries);

    let builder = Builder::from_json(
      &registry,
      r#"{
        "root": [
          {
            "formatter": {"type": "string", "pattern": "{message}"},
            "sinks": [
              {
                "type": "recording",
                "filter": {"type": "severity", "threshold": 3}
              }
            ]
          }
        ]
      }"#,
    )
    .unwrap();

    let logger = builder.build("root").unwrap();
    logger.log(1, "quiet");
    logger.log(3, "loud");

    assert_eq!(
      entries.lock().unwrap().as_slice(),
      &[(3, "loud".to_string())]
    );
  }

  #[test]
  fn test_asynchronous_sink_from_config() {
    let entries = Arc::new(Mutex::new(Vec::new()));
    let registry = registry_with_recording(&entries);

    let builder = Builder::from_json(
      &registry,
      r#"{
        "root": [
          {
            "formatter": {"type": "string", "pattern": "{message}"},
            "sinks": [
              {
                "type": "asynchronous",
                "sink": {"type": "recording"},
                "factor": 4,
                "overflow": "block"
              }
            ]
          }
        ]
      }"#,
    )
    .unwrap();

    let logger = builder.build("root").unwrap();
    for i in 0..100 {
      logger.log(i, &format!("message {}", i));
    }
    // Dropping the logger joins the worker after the backlog drains.
    drop(logger);

    let entries = entries.lock().unwrap();
    assert_eq!(entries.len(), 100);
    assert_eq!(entries[0], (0, "message 0".to_string()));
    assert_eq!(entries[99], (99, "message 99".to_string()));
  }

  #[test]
  fn test_file_sink_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("configured.log");
    let registry = Registry::configured();

    let config = format!(
      r#"{{
        "root": [
          {{
            "formatter": {{"type": "string", "pattern": "{{message}}"}},
            "sinks": [{{"type": "file", "path": "{}", "flush": 1}}]
          }}
        ]
      }}"#,
      path.display()
    );

    let builder = Builder::from_json(&registry, &config).unwrap();
    let logger = builder.build("root").unwrap();
    logger.log(0, "to disk");

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "to disk\n");
  }

  #[test]
  fn test_unknown_sink_type() {
    let registry = Registry::configured();
    let builder = Builder::from_json(
      &registry,
      r#"{
        "root": [
          {
            "formatter": {"type": "string", "pattern": "{message}"},
            "sinks": [{"type": "carrier-pigeon"}]
          }
        ]
      }"#,
    )
    .unwrap();

    match builder.build("root") {
      Err(Error::UnknownType { kind, name }) => {
        assert_eq!(kind, "sink");
        assert_eq!(name, "carrier-pigeon");
      },
      other => panic!("expected an unknown type error, got {:?}", other.err()),
    }
  }

  #[test]
  fn test_missing_formatter_reports_cursor() {
    let registry = Registry::configured();
    let builder = Builder::from_json(
      &registry,
      r#"{"root": [{"sinks": [{"type": "null"}]}]}"#,
    )
    .unwrap();

    match builder.build("root") {
      Err(Error::Config(ConfigError::Missing { cursor, .. })) => {
        assert_eq!(cursor, "/root/0/formatter");
      },
      other => panic!("expected a missing formatter error, got {:?}", other.err()),
    }
  }

  #[test]
  fn test_missing_logger_name() {
    let registry = Registry::configured();
    let builder = Builder::from_json(&registry, r#"{}"#).unwrap();

    assert!(matches!(
      builder.build("absent"),
      Err(Error::Config(ConfigError::Missing { .. }))
    ));
  }

  #[test]
  fn test_malformed_pattern_is_a_pattern_error() {
    let registry = Registry::configured();
    let builder = Builder::from_json(
      &registry,
      r#"{
        "root": [
          {
            "formatter": {"type": "string", "pattern": "{message"},
            "sinks": [{"type": "null"}]
          }
        ]
      }"#,
    )
    .unwrap();

    assert!(matches!(builder.build("root"), Err(Error::Pattern(_))));
  }

  #[test]
  fn test_invalid_capacity_exponent_from_config() {
    let registry = Registry::configured();
    let builder = Builder::from_json(
      &registry,
      r#"{
        "root": [
          {
            "formatter": {"type": "string", "pattern": "{message}"},
            "sinks": [
              {"type": "asynchronous", "sink": {"type": "null"}, "factor": 21}
            ]
          }
        ]
      }"#,
    )
    .unwrap();

    assert!(matches!(
      builder.build("root"),
      Err(Error::InvalidArgument(_))
    ));
  }
}
