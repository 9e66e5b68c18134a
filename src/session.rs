//! Session state (§3 lifecycles, §4.G transaction IDs): the
//! per-connection transaction-ID counter and open/closed state. A
//! session is owned by exactly one [`crate::engine::Engine`].

use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};

const STATE_CLOSED: u8 = 0;
const STATE_OPEN: u8 = 1;
const STATE_SUSPECT: u8 = 2;

/// Transaction-ID sequencing and open/suspect/closed state for one PTP
/// session. `OpenSession` itself always uses transaction ID 0; every
/// subsequent transaction increments the counter first, wrapping
/// `u32::MAX -> 1` (0 stays reserved for `OpenSession`).
pub struct Session {
    session_id: u32,
    next_transaction_id: AtomicU32,
    state: AtomicU8,
}

impl Session {
    pub fn new(session_id: u32) -> Self {
        Self {
            session_id,
            next_transaction_id: AtomicU32::new(1),
            state: AtomicU8::new(STATE_OPEN),
        }
    }

    pub fn session_id(&self) -> u32 {
        self.session_id
    }

    /// The fixed transaction ID used for the `OpenSession` command.
    pub const OPEN_SESSION_TRANSACTION_ID: u32 = 0;

    /// Allocates the next transaction ID and advances the counter.
    pub fn next_transaction_id(&self) -> u32 {
        loop {
            let current = self.next_transaction_id.load(Ordering::SeqCst);
            let next = if current == u32::MAX { 1 } else { current + 1 };
            if self
                .next_transaction_id
                .compare_exchange(current, next, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                return current;
            }
        }
    }

    pub fn is_open(&self) -> bool {
        self.state.load(Ordering::SeqCst) != STATE_CLOSED
    }

    pub fn is_suspect(&self) -> bool {
        self.state.load(Ordering::SeqCst) == STATE_SUSPECT
    }

    /// Marked after a transport error; the next operation call should
    /// probe device status before trusting the session further (§4.G).
    pub fn mark_suspect(&self) {
        self.state.store(STATE_SUSPECT, Ordering::SeqCst);
    }

    pub fn clear_suspect(&self) {
        if self.is_open() {
            self.state.store(STATE_OPEN, Ordering::SeqCst);
        }
    }

    pub fn close(&self) {
        self.state.store(STATE_CLOSED, Ordering::SeqCst);
    }
}
