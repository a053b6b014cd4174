#[cfg(test)]
mod __test__ {

  use std::sync::{Arc, Mutex};

  use smallvec::smallvec;

  use crate::attribute::{AttributeList, AttributePack, Value};
  use crate::error::EmitError;
  use crate::record::Record;
  use crate::sink::asynchronous::{Asynchronous, OverflowPolicy, MAX_CAPACITY_EXPONENT};
  use crate::sink::console::{Console, Target, TermColor};
  use crate::sink::file::{FileSink, FlushPolicy};
  use crate::sink::null::Null;
  use crate::sink::Sink;

  /// Sink remembering everything it observed, in order.
  #[derive(Default)]
  struct RecordingSink {
    entries: Arc<Mutex<Vec<(i64, String)>>>,
  }

  impl RecordingSink {
    fn new() -> (Self, Arc<Mutex<Vec<(i64, String)>>>) {
      let entries = Arc::new(Mutex::new(Vec::new()));
      (
        Self {
          entries: Arc::clone(&entries),
        },
        entries,
      )
    }
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

  /// Sink that blocks on every emit until the gate channel yields a token.
  struct GatedSink {
    gate: crossbeam_channel::Receiver<()>,
    started: crossbeam_channel::Sender<()>,
  }

  impl Sink for GatedSink {
    fn emit(&self, _record: &Record<'_>, _formatted: &str) -> Result<(), EmitError> {
      let _ = self.started.send(());
      let _ = self.gate.recv();
      Ok(())
    }
  }

  fn active_record<'a>(severity: i64, pack: &'a AttributePack<'a>) -> Record<'a> {
    let mut record = Record::new(severity, "payload", pack);
    record.activate(None);
    record
  }

  #[test]
  fn test_null_sink_accepts_everything() {
    let pack = AttributePack::new();
    let record = active_record(0, &pack);

    assert!(Null.emit(&record, "anything").is_ok());
  }

  #[test]
  fn test_console_sink_writes_without_error() {
    let pack = AttributePack::new();
    let record = active_record(0, &pack);

    let sink = Console::new(Target::Stdout);
    assert_eq!(sink.target(), Target::Stdout);
    assert!(sink.emit(&record, "console smoke test").is_ok());

    let colored = Console::with_colormap(
      Target::Stderr,
      Box::new(|record: &Record<'_>| {
        if record.severity() >= 4 {
          TermColor::RED
        } else {
          TermColor::none()
        }
      }),
    );
    assert!(colored.emit(&record, "colored smoke test").is_ok());
  }

  #[test]
  fn test_file_sink_appends_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.log");
    let sink = FileSink::with_flush_policy(path.to_string_lossy(), FlushPolicy::EveryRecords(1));

    let pack = AttributePack::new();
    let record = active_record(0, &pack);
    sink.emit(&record, "first").unwrap();
    sink.emit(&record, "second").unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(contents, "first\nsecond\n");
  }

  #[test]
  fn test_file_sink_creates_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/deep/out.log");
    let sink = FileSink::with_flush_policy(path.to_string_lossy(), FlushPolicy::EveryRecords(1));

    let pack = AttributePack::new();
    sink.emit(&active_record(0, &pack), "line").unwrap();

    assert!(path.exists());
  }

  #[test]
  fn test_file_sink_fans_out_by_attribute() {
    let dir = tempfile::tempdir().unwrap();
    let pattern = dir.path().join("{channel}.log");
    let sink = FileSink::with_flush_policy(
      pattern.to_string_lossy(),
      FlushPolicy::EveryRecords(1),
    );

    let alpha: AttributeList = smallvec![("channel", Value::Str("alpha"))];
    let beta: AttributeList = smallvec![("channel", Value::Str("beta"))];

    let mut pack = AttributePack::new();
    pack.push(&alpha);
    sink.emit(&active_record(0, &pack), "to alpha").unwrap();

    let mut pack = AttributePack::new();
    pack.push(&beta);
    sink.emit(&active_record(0, &pack), "to beta").unwrap();

    assert_eq!(
      std::fs::read_to_string(dir.path().join("alpha.log")).unwrap(),
      "to alpha\n"
    );
    assert_eq!(
      std::fs::read_to_string(dir.path().join("beta.log")).unwrap(),
      "to beta\n"
    );
  }

  #[test]
  fn test_filename_substitution() {
    let sink = FileSink::new("/var/log/{service}-{shard}.log");

    let list: AttributeList = smallvec![("service", Value::Str("api")), ("shard", Value::I64(3))];
    let mut pack = AttributePack::new();
    pack.push(&list);
    let record = active_record(0, &pack);

    assert_eq!(sink.filename(&record), "/var/log/api-3.log");

    let empty = AttributePack::new();
    let record = active_record(0, &empty);
    assert_eq!(sink.filename(&record), "/var/log/none-none.log");

    let escaped = FileSink::new("literal-{{braces}}.log");
    assert_eq!(sink.path(), "/var/log/{service}-{shard}.log");
    assert_eq!(escaped.filename(&record), "literal-{braces}.log");
  }

  #[test]
  fn test_async_round_trip_preserves_order() {
    let (recording, entries) = RecordingSink::new();
    let sink = Asynchronous::with_options(Box::new(recording), 8, OverflowPolicy::Block).unwrap();

    let pack = AttributePack::new();
    for i in 0..1000 {
      let record = active_record(i, &pack);
      sink.emit(&record, &format!("message {}", i)).unwrap();
    }

    // Dropping joins the worker after the backlog is drained.
    drop(sink);

    let entries = entries.lock().unwrap();
    assert_eq!(entries.len(), 1000);
    for (i, (severity, formatted)) in entries.iter().enumerate() {
      assert_eq!(*severity, i as i64);
      assert_eq!(formatted, &format!("message {}", i));
    }
  }

  #[test]
  fn test_async_snapshot_is_independent_of_caller_storage() {
    let (recording, entries) = RecordingSink::new();
    let sink = Asynchronous::with_options(Box::new(recording), 4, OverflowPolicy::Block).unwrap();

    {
      let storage = String::from("short lived");
      let list: AttributeList = smallvec![("k", Value::Str(&storage))];
      let mut pack = AttributePack::new();
      pack.push(&list);
      let record = active_record(1, &pack);
      sink.emit(&record, "copied").unwrap();
    }

    drop(sink);

    let entries = entries.lock().unwrap();
    assert_eq!(entries.as_slice(), &[(1, "copied".to_string())]);
  }

  #[test]
  fn test_async_capacity_exponent_bounds() {
    let sink = Asynchronous::with_options(Box::new(Null), 0, OverflowPolicy::Block);
    assert!(sink.is_ok());

    let sink = Asynchronous::with_options(
      Box::new(Null),
      MAX_CAPACITY_EXPONENT + 1,
      OverflowPolicy::Block,
    );
    assert!(sink.is_err());
  }

  #[test]
  fn test_async_drop_with_error_reports_overflow() {
    let (gate_tx, gate_rx) = crossbeam_channel::unbounded();
    let (started_tx, started_rx) = crossbeam_channel::unbounded();
    let gated = GatedSink {
      gate: gate_rx,
      started: started_tx,
    };

    // One queue slot; the worker blocks inside the first emit.
    let sink =
      Asynchronous::with_options(Box::new(gated), 0, OverflowPolicy::DropWithError).unwrap();

    let pack = AttributePack::new();
    let record = active_record(0, &pack);

    sink.emit(&record, "in flight").unwrap();
    started_rx.recv().unwrap();

    // Fills the single queue slot.
    sink.emit(&record, "queued").unwrap();

    // Queue is full now.
    match sink.emit(&record, "overflow") {
      Err(EmitError::QueueFull) => {},
      other => panic!("expected queue overflow, got {:?}", other.err()),
    }

    // Release the worker and let the drop drain the backlog.
    drop(gate_tx);
    drop(sink);
  }

  #[test]
  fn test_async_drop_silently_swallows_overflow() {
    let (gate_tx, gate_rx) = crossbeam_channel::unbounded();
    let (started_tx, started_rx) = crossbeam_channel::unbounded();
    let gated = GatedSink {
      gate: gate_rx,
      started: started_tx,
    };

    let sink =
      Asynchronous::with_options(Box::new(gated), 0, OverflowPolicy::DropSilently).unwrap();
    assert_eq!(sink.overflow_policy(), OverflowPolicy::DropSilently);

    let pack = AttributePack::new();
    let record = active_record(0, &pack);

    sink.emit(&record, "in flight").unwrap();
    started_rx.recv().unwrap();
    sink.emit(&record, "queued").unwrap();
    assert!(sink.emit(&record, "overflow").is_ok());

    drop(gate_tx);
    drop(sink);
  }
}
