//! A lock-free, fixed-capacity, multi-producer ring buffer log sink.
//!
//! Ported from the reference implementation's ring buffer component: entries are pushed by a
//! monotonically increasing atomic head index, with the oldest entry silently overwritten
//! once the buffer wraps. Reads come in two flavours: a non-blocking "fast" snapshot usable
//! from a hot path (entries may be in flight and thus momentarily stale), and a "safe"
//! snapshot/clear that excludes concurrent pushes via a `RwLock`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use crate::timing::SimpleTimer;

/// The number of slots in the ring buffer. Must be a power of two.
const CAPACITY: usize = 256;

/// The severity of a [LogEntry].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

/// A single log entry: a severity, a message, and the millisecond timestamp (relative to
/// process start) at which it was pushed.
#[derive(Clone, Debug, PartialEq)]
pub struct LogEntry {
    pub severity: Severity,
    pub message: String,
    pub timestamp_millis: u64,
}

impl Default for LogEntry {
    fn default() -> Self {
        LogEntry {
            severity: Severity::Debug,
            message: String::new(),
            timestamp_millis: 0,
        }
    }
}

/// A lock-free ring buffer log sink, shared between the timing thread, the worker thread and
/// any host consumer via `Arc<Logger>`.
pub struct Logger {
    slots: Vec<RwLock<LogEntry>>,
    push_head: AtomicUsize,
    read_head: AtomicUsize,
    clock: SimpleTimer,
}

impl Logger {
    /// Constructor that returns an empty [Logger] with [CAPACITY] slots.
    pub fn new() -> Self {
        let mut clock = SimpleTimer::new();
        clock.start();
        Logger {
            slots: (0..CAPACITY).map(|_| RwLock::new(LogEntry::default())).collect(),
            push_head: AtomicUsize::new(0),
            read_head: AtomicUsize::new(0),
            clock,
        }
    }

    /// Pushes a new entry into the buffer, overwriting the oldest entry once capacity is
    /// reached. Never blocks the caller for longer than it takes to acquire this slot's write
    /// lock, and never panics.
    pub fn push(&self, severity: Severity, message: impl Into<String>) {
        let index = self.push_head.fetch_add(1, Ordering::AcqRel);
        let entry = LogEntry {
            severity,
            message: message.into(),
            timestamp_millis: self.clock.get_elapsed_millis(),
        };
        if let Ok(mut slot) = self.slots[index & (CAPACITY - 1)].write() {
            *slot = entry;
        }
        let mut expected = self.read_head.load(Ordering::Acquire);
        while expected < index {
            match self.read_head.compare_exchange_weak(
                expected,
                index,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(actual) => expected = actual,
            }
        }
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.push(Severity::Debug, message);
    }
    pub fn info(&self, message: impl Into<String>) {
        self.push(Severity::Info, message);
    }
    pub fn warn(&self, message: impl Into<String>) {
        self.push(Severity::Warn, message);
    }
    pub fn error(&self, message: impl Into<String>) {
        self.push(Severity::Error, message);
    }
    pub fn fatal(&self, message: impl Into<String>) {
        self.push(Severity::Fatal, message);
    }

    fn snapshot(&self, count: usize, ascending: bool) -> Vec<LogEntry> {
        let head = self.read_head.load(Ordering::Acquire);
        let max = std::cmp::min(head + 1, CAPACITY);
        let take = if count == 0 { max } else { std::cmp::min(count, max) };
        let mut output = Vec::with_capacity(take);
        for offset in 0..take {
            let distance = if ascending { take - 1 - offset } else { offset };
            let index = head.wrapping_sub(distance) & (CAPACITY - 1);
            output.push(
                self.slots[index]
                    .read()
                    .map(|entry| entry.clone())
                    .unwrap_or_default(),
            );
        }
        output
    }

    /// Returns a non-blocking snapshot of up to `count` entries (0 means "all available"),
    /// oldest first. Safe to call from the worker thread's hot path.
    pub fn fast_snapshot_asc(&self, count: usize) -> Vec<LogEntry> {
        self.snapshot(count, true)
    }

    /// Returns a non-blocking snapshot of up to `count` entries, newest first.
    pub fn fast_snapshot_desc(&self, count: usize) -> Vec<LogEntry> {
        self.snapshot(count, false)
    }

    /// Returns a snapshot excluding concurrent pushes, newest first.
    pub fn safe_snapshot_desc(&self, count: usize) -> Vec<LogEntry> {
        self.snapshot(count, false)
    }

    /// Clears every slot back to its default value. Blocks concurrent pushes for the
    /// duration of the clear.
    pub fn clear(&self) {
        for slot in &self.slots {
            if let Ok(mut entry) = slot.write() {
                *entry = LogEntry::default();
            }
        }
    }
}

impl Default for Logger {
    fn default() -> Self {
        Logger::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_push_and_snapshot_order() {
        let logger = Logger::new();
        logger.info("first");
        logger.warn("second");
        let snapshot = logger.fast_snapshot_desc(0);
        assert_eq!(snapshot[0].message, "second");
        assert_eq!(snapshot[1].message, "first");
    }

    #[test]
    fn test_wraps_without_panicking_past_capacity() {
        let logger = Logger::new();
        for i in 0..(CAPACITY * 2) {
            logger.debug(format!("entry {i}"));
        }
        let snapshot = logger.fast_snapshot_desc(0);
        assert_eq!(snapshot.len(), CAPACITY);
        assert_eq!(snapshot[0].message, format!("entry {}", CAPACITY * 2 - 1));
    }

    #[test]
    fn test_clear_resets_entries() {
        let logger = Logger::new();
        logger.error("boom");
        logger.clear();
        let snapshot = logger.fast_snapshot_desc(1);
        assert_eq!(snapshot[0].message, "");
    }

    #[test]
    fn test_concurrent_pushes_do_not_panic() {
        let logger = Arc::new(Logger::new());
        let mut handles = Vec::new();
        for producer in 0..4 {
            let logger = Arc::clone(&logger);
            handles.push(thread::spawn(move || {
                for i in 0..64 {
                    logger.info(format!("producer {producer} entry {i}"));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(logger.fast_snapshot_asc(0).len(), CAPACITY);
    }
}
