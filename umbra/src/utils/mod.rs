use once_cell::sync::Lazy;

static PROCESS_NAME: Lazy<String> = Lazy::new(|| {
  std::env::current_exe()
    .ok()
    .and_then(|path| {
      path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
    })
    .unwrap_or_else(|| std::process::id().to_string())
});

/// Stable numeric identifier for the calling thread.
///
/// `std::thread::ThreadId` is opaque, so the identifier is derived by hashing
/// it. The value is stable for the lifetime of the thread.
#[inline]
pub fn current_thread_id() -> u64 {
  use std::collections::hash_map::DefaultHasher;
  use std::hash::{Hash, Hasher};
  let mut hasher = DefaultHasher::new();
  std::thread::current().id().hash(&mut hasher);
  hasher.finish()
}

/// Name of the calling thread, if it was given one.
#[inline]
pub fn current_thread_name() -> Option<String> {
  std::thread::current().name().map(|name| name.to_string())
}

/// Short name of the current executable, falling back to the pid.
pub fn process_name() -> &'static str {
  &PROCESS_NAME
}
