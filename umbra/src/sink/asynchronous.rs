//! Asynchronous sink wrapper.
//!
//! Wraps another sink behind a bounded queue drained by a dedicated worker
//! thread. `emit` deep-copies the record, so the caller's borrowed storage
//! never crosses the thread boundary, and origin pid/tid survive the hop.
//!
//! Lifecycle: constructed -> running -> stopping -> joined. Dropping the
//! sink stops intake, lets the worker drain every accepted entry and joins
//! it, so accepted entries are delivered at least once. Emits that arrive
//! after shutdown started are dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::error::{EmitError, Error};
use crate::record::{OwnedRecord, Record};
use crate::sink::Sink;

/// Largest accepted capacity exponent; `2^20` slots.
pub const MAX_CAPACITY_EXPONENT: usize = 20;

/// Default capacity exponent; `2^10` slots.
pub const DEFAULT_CAPACITY_EXPONENT: usize = 10;

/// What `emit` does when the queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
  /// Drop the record and report nothing.
  DropSilently,
  /// Drop the record and return [`EmitError::QueueFull`].
  DropWithError,
  /// Wait until the queue has space.
  #[default]
  Block,
}

struct Entry {
  record: OwnedRecord,
  formatted: String,
}

/// Sink that forwards to a wrapped sink from a worker thread.
pub struct Asynchronous {
  tx: Option<Sender<Entry>>,
  policy: OverflowPolicy,
  running: AtomicBool,
  worker: Option<JoinHandle<()>>,
}

impl Asynchronous {
  /// Wraps `sink` with the default capacity exponent and a blocking
  /// overflow policy.
  pub fn new(sink: Box<dyn Sink>) -> Result<Self, Error> {
    Self::with_options(sink, DEFAULT_CAPACITY_EXPONENT, OverflowPolicy::default())
  }

  /// Wraps `sink` with a queue of `2^exponent` slots.
  ///
  /// Fails when `exponent` exceeds [`MAX_CAPACITY_EXPONENT`].
  pub fn with_options(
    sink: Box<dyn Sink>,
    exponent: usize,
    policy: OverflowPolicy,
  ) -> Result<Self, Error> {
    if exponent > MAX_CAPACITY_EXPONENT {
      return Err(Error::InvalidArgument(format!(
        "capacity exponent should fit in [0; {}] range, got {}",
        MAX_CAPACITY_EXPONENT, exponent
      )));
    }

    let (tx, rx) = crossbeam_channel::bounded::<Entry>(1usize << exponent);
    let worker = std::thread::Builder::new()
      .name("umbra-async-sink".to_string())
      .spawn(move || Self::run(rx, sink))
      .map_err(Error::Io)?;

    Ok(Self {
      tx: Some(tx),
      policy,
      running: AtomicBool::new(true),
      worker: Some(worker),
    })
  }

  pub fn overflow_policy(&self) -> OverflowPolicy {
    self.policy
  }

  /// Worker loop. Dequeues FIFO and forwards to the wrapped sink; exits
  /// once the channel is closed and drained.
  fn run(rx: Receiver<Entry>, sink: Box<dyn Sink>) {
    while let Ok(entry) = rx.recv() {
      let outcome = entry
        .record
        .with_view(|record| sink.emit(record, &entry.formatted));
      if let Err(err) = outcome {
        eprintln!("[umbra] asynchronous sink delivery failed: {}", err);
      }
    }
  }
}

impl Sink for Asynchronous {
  fn emit(&self, record: &Record<'_>, formatted: &str) -> Result<(), EmitError> {
    if !self.running.load(Ordering::Acquire) {
      return Ok(());
    }
    let tx = match &self.tx {
      Some(tx) => tx,
      None => return Ok(()),
    };

    let entry = Entry {
      record: OwnedRecord::from_record(record),
      formatted: formatted.to_string(),
    };

    match self.policy {
      OverflowPolicy::Block => tx.send(entry).map_err(|_| EmitError::Closed),
      OverflowPolicy::DropSilently => {
        let _ = tx.try_send(entry);
        Ok(())
      },
      OverflowPolicy::DropWithError => tx.try_send(entry).map_err(|err| match err {
        TrySendError::Full(_) => EmitError::QueueFull,
        TrySendError::Disconnected(_) => EmitError::Closed,
      }),
    }
  }
}

impl Drop for Asynchronous {
  fn drop(&mut self) {
    self.running.store(false, Ordering::Release);
    // Closing the channel lets the worker drain the backlog and exit.
    drop(self.tx.take());
    if let Some(worker) = self.worker.take() {
      let _ = worker.join();
    }
  }
}
