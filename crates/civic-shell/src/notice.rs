//! # Notices
//!
//! User-visible, recoverable messages raised by the shell (camera denial,
//! unreadable uploads, empty frames). Frontends render them as toasts.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Default bound on queued notices before the oldest is dropped.
pub const MAX_PENDING_NOTICES: usize = 8;

/// Notice severity level
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoticeLevel {
    #[default]
    Info,
    Warning,
    Error,
}

impl NoticeLevel {
    /// Indicator symbol for this level
    pub fn icon(self) -> &'static str {
        match self {
            Self::Info => "ℹ",
            Self::Warning => "⚠",
            Self::Error => "✗",
        }
    }
}

/// A single notice
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    /// Monotonic id, unique within one shell
    pub id: u64,
    /// Subsystem that raised the notice ("camera", "upload", ...)
    pub source: String,
    pub message: String,
    pub level: NoticeLevel,
}

impl Notice {
    /// Whether this is an error level notice
    pub fn is_error(&self) -> bool {
        matches!(self.level, NoticeLevel::Error)
    }
}

/// Bounded FIFO of pending notices.
#[derive(Clone, Debug)]
pub struct NoticeQueue {
    pending: VecDeque<Notice>,
    capacity: usize,
    next_id: u64,
}

impl Default for NoticeQueue {
    fn default() -> Self {
        Self::with_capacity(MAX_PENDING_NOTICES)
    }
}

impl NoticeQueue {
    /// Create a queue holding at most `capacity` notices (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            pending: VecDeque::with_capacity(capacity),
            capacity,
            next_id: 1,
        }
    }

    /// Push a notice, dropping the oldest one when full. Returns the new id.
    pub fn push(
        &mut self,
        level: NoticeLevel,
        source: impl Into<String>,
        message: impl Into<String>,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        if self.pending.len() == self.capacity {
            self.pending.pop_front();
        }
        self.pending.push_back(Notice {
            id,
            source: source.into(),
            message: message.into(),
            level,
        });
        id
    }

    /// Dismiss a notice by id. Returns false if it was not pending.
    pub fn dismiss(&mut self, id: u64) -> bool {
        match self.pending.iter().position(|n| n.id == id) {
            Some(pos) => {
                self.pending.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Remove and return every pending notice.
    pub fn drain(&mut self) -> Vec<Notice> {
        self.pending.drain(..).collect()
    }

    /// Pending notices, oldest first.
    pub fn pending(&self) -> impl Iterator<Item = &Notice> {
        self.pending.iter()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
