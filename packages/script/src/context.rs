//! Cooperative cancellation for script runs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::CancelReason;

/// Cancellation flag plus optional deadline, shared between a caller and
/// the runs it starts.
///
/// Clones share the flag: cancelling any clone cancels them all. A run
/// checks the context between interpreter instructions, so a host function
/// that is already executing finishes before the run stops.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl RunContext {
    /// A context that is never done unless cancelled.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        RunContext {
            cancelled: Arc::default(),
            deadline: Some(deadline),
        }
    }

    /// A child sharing this context's flag with a deadline no later than
    /// `timeout` from now.
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        RunContext {
            cancelled: Arc::clone(&self.cancelled),
            deadline: Some(self.deadline.map_or(candidate, |d| d.min(candidate))),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Why the context is done, or `None` while it is live.
    pub fn err(&self) -> Option<CancelReason> {
        if self.cancelled.load(Ordering::SeqCst) {
            return Some(CancelReason::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(CancelReason::DeadlineExceeded),
            _ => None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }
}
