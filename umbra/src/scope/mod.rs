//! # Scope Module
//!
//! Thread-local scoped attributes.
//!
//! A [`ScopeGuard`] attaches an owned attribute list to the calling thread
//! for as long as the guard is alive. Guards stack: every log call on that
//! thread collects the attributes of all live guards, innermost first.
//!
//! Frames form a singly-linked list rooted in a thread-local head pointer,
//! one head per [`ScopeManager`] (that is, per logger). There is no
//! cross-thread sharing: pushing, popping and collecting all happen on the
//! owning thread, so no synchronization is involved.
//!
//! Guards **must** be dropped in reverse creation order. Debug builds assert
//! the discipline; violating it in release builds leaves the frame chain
//! pointing at dead stack frames, with undefined results.


use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::ptr;
use std::sync::atomic::{AtomicU64, Ordering};

use smallvec::SmallVec;

use crate::attribute::{AttributeList, OwnedAttributes};

static NEXT_MANAGER_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
  /// Innermost frame per manager, for the current thread.
  static HEADS: RefCell<HashMap<u64, *const Frame>> = RefCell::new(HashMap::new());
}

struct Frame {
  attributes: OwnedAttributes,
  /// Identity of the manager this frame is currently bound to.
  manager: Cell<u64>,
  prev: Cell<*const Frame>,
}

/// Identity handle rooting the scoped-frame chains of one logger.
#[derive(Debug)]
pub struct ScopeManager {
  id: u64,
}

impl ScopeManager {
  pub(crate) fn new() -> Self {
    Self {
      id: NEXT_MANAGER_ID.fetch_add(1, Ordering::Relaxed),
    }
  }

  fn head(&self) -> *const Frame {
    HEADS.with(|heads| {
      heads
        .borrow()
        .get(&self.id)
        .copied()
        .unwrap_or(ptr::null())
    })
  }

  fn set_head(&self, frame: *const Frame) {
    HEADS.with(|heads| {
      let mut heads = heads.borrow_mut();
      if frame.is_null() {
        heads.remove(&self.id);
      } else {
        heads.insert(self.id, frame);
      }
    });
  }

  /// Collects the attribute lists of every live frame on the current thread,
  /// innermost to outermost, as borrowed views.
  ///
  /// The produced views borrow frame storage. Frames are stack guards on the
  /// current thread, so they outlive any log call made beneath them.
  pub(crate) fn collect<'a>(&self, lists: &mut SmallVec<[AttributeList<'a>; 8]>) {
    let mut cursor = self.head();
    while !cursor.is_null() {
      // Frames are alive as long as their guard is on the stack; the LIFO
      // drop discipline keeps every pointer in the chain valid.
      let frame = unsafe { &*cursor };
      let list: AttributeList<'a> = frame
        .attributes
        .iter()
        .map(|(key, value)| (key.as_str(), value.view()))
        .collect();
      lists.push(list);
      cursor = frame.prev.get();
    }
  }

  /// Transfers the current thread's frame chain of `source` to this manager.
  ///
  /// Walks the chain updating each frame's manager binding, then moves the
  /// head pointer. Used while a logger is being replaced wholesale.
  pub(crate) fn adopt(&self, source: &ScopeManager) {
    if self.id == source.id {
      return;
    }

    let head = source.head();
    source.set_head(ptr::null());

    let mut cursor = head;
    while !cursor.is_null() {
      let frame = unsafe { &*cursor };
      frame.manager.set(self.id);
      cursor = frame.prev.get();
    }

    if !head.is_null() {
      self.set_head(head);
    }
  }
}

/// A scoped-attributes guard.
///
/// Created by `Logger::scoped`. While alive, its attributes are merged into
/// every record logged from the current thread through the owning logger.
/// Not sendable across threads.
pub struct ScopeGuard {
  // Boxed so the frame address stays stable while the guard itself moves.
  frame: Box<Frame>,
}

impl ScopeGuard {
  pub(crate) fn new(manager: &ScopeManager, attributes: OwnedAttributes) -> Self {
    let frame = Box::new(Frame {
      attributes,
      manager: Cell::new(manager.id),
      prev: Cell::new(manager.head()),
    });
    manager.set_head(&*frame as *const Frame);
    Self { frame }
  }

  /// The attributes held by this guard.
  pub fn attributes(&self) -> &OwnedAttributes {
    &self.frame.attributes
  }
}

impl Drop for ScopeGuard {
  fn drop(&mut self) {
    let frame = &*self.frame;
    let id = frame.manager.get();
    HEADS.with(|heads| {
      let mut heads = heads.borrow_mut();
      let head = heads.get(&id).copied().unwrap_or(ptr::null());
      debug_assert!(
        ptr::eq(head, frame as *const Frame),
        "scope guards must be dropped in reverse creation order"
      );
      let prev = frame.prev.get();
      if prev.is_null() {
        heads.remove(&id);
      } else {
        heads.insert(id, prev);
      }
    });
  }
}
