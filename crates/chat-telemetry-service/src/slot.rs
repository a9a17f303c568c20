//! Indirection cell holding the sender currently in use.

use chat_telemetry_core::SharedSender;
use std::sync::{Mutex, OnceLock};

/// Holds an initial sender that can be replaced exactly once.
///
/// Reads never block. Once closed, the slot refuses replacements so a
/// sender adopted late cannot outlive the owner's disposal.
pub struct SenderSlot {
    initial: SharedSender,
    adopted: OnceLock<SharedSender>,
    closed: Mutex<bool>,
}

impl SenderSlot {
    pub fn new(initial: SharedSender) -> Self {
        Self {
            initial,
            adopted: OnceLock::new(),
            closed: Mutex::new(false),
        }
    }

    /// Sender to use for the next call.
    pub fn current(&self) -> SharedSender {
        self.adopted.get().unwrap_or(&self.initial).clone()
    }

    pub fn initial(&self) -> &SharedSender {
        &self.initial
    }

    pub fn is_adopted(&self) -> bool {
        self.adopted.get().is_some()
    }

    /// Replace the initial sender. Returns `false` if the slot was already
    /// replaced or closed.
    pub fn adopt(&self, sender: SharedSender) -> bool {
        let closed = self.closed.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if *closed {
            return false;
        }
        self.adopted.set(sender).is_ok()
    }

    /// Refuse further replacements and hand back the sender in use.
    pub fn close(&self) -> SharedSender {
        let mut closed = self.closed.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *closed = true;
        self.current()
    }
}
