//! Export progress counters
//!
//! Counters are strictly monotonic during one run and advanced only after
//! the corresponding bytes were handed to the underlying stream. The
//! driver polls a shared handle at any time; writing is the engine's
//! exclusive job. A new run starts from a fresh `Stats`.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Monotonic counters describing one export run
#[derive(Debug, Default)]
pub struct Stats {
    bytes_written: AtomicU64,
    files_created: AtomicU64,
    pictures_written: AtomicU64,
    contacts_written: AtomicU64,
    sessions_written: AtomicU64,
    messages_written: AtomicU64,
    dialogs_written: AtomicU64,
}

impl Stats {
    /// Create a zeroed counter set
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add_bytes(&self, count: u64) {
        self.bytes_written.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn add_file(&self) {
        self.files_created.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_pictures(&self, count: u64) {
        self.pictures_written.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn add_contacts(&self, count: u64) {
        self.contacts_written.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn add_sessions(&self, count: u64) {
        self.sessions_written.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn add_messages(&self, count: u64) {
        self.messages_written.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn add_dialog(&self) {
        self.dialogs_written.fetch_add(1, Ordering::Relaxed);
    }

    /// Total bytes handed to output streams so far
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written.load(Ordering::Relaxed)
    }

    /// Number of artifact files created so far
    pub fn files_created(&self) -> u64 {
        self.files_created.load(Ordering::Relaxed)
    }

    /// Profile pictures written so far
    pub fn pictures_written(&self) -> u64 {
        self.pictures_written.load(Ordering::Relaxed)
    }

    /// Contacts written so far
    pub fn contacts_written(&self) -> u64 {
        self.contacts_written.load(Ordering::Relaxed)
    }

    /// Sessions written so far
    pub fn sessions_written(&self) -> u64 {
        self.sessions_written.load(Ordering::Relaxed)
    }

    /// Messages written so far, across all conversations
    pub fn messages_written(&self) -> u64 {
        self.messages_written.load(Ordering::Relaxed)
    }

    /// Conversations fully written so far
    pub fn dialogs_written(&self) -> u64 {
        self.dialogs_written.load(Ordering::Relaxed)
    }

    /// Consistent point-in-time copy of all counters
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            bytes_written: self.bytes_written(),
            files_created: self.files_created(),
            pictures_written: self.pictures_written(),
            contacts_written: self.contacts_written(),
            sessions_written: self.sessions_written(),
            messages_written: self.messages_written(),
            dialogs_written: self.dialogs_written(),
        }
    }
}

/// Plain copy of the counters for reporting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub bytes_written: u64,
    pub files_created: u64,
    pub pictures_written: u64,
    pub contacts_written: u64,
    pub sessions_written: u64,
    pub messages_written: u64,
    pub dialogs_written: u64,
}
