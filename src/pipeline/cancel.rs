//! Cooperative cancellation for pipeline runs.
//!
//! A [`CancelToken`] is cheap to clone; all clones share one flag. It can also
//! carry a deadline, after which it reports itself cancelled without anyone
//! calling [`CancelToken::cancel`]. The engine checks the token before every
//! processor invocation, and stages doing long work check it between units.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Why a run was stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    Cancelled,
    DeadlineExceeded,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => f.write_str("cancelled"),
            Self::DeadlineExceeded => f.write_str("deadline exceeded"),
        }
    }
}

/// Error reported when a [`CancelToken`] has fired.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("operation {reason}")]
pub struct Cancelled {
    pub reason: CancelReason,
}

#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    /// A token that only fires when [`cancel`](Self::cancel) is called.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            flag: Arc::default(),
            deadline: Some(deadline),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Cancel this token and every clone of it.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.reason().is_some()
    }

    fn reason(&self) -> Option<CancelReason> {
        if self.flag.load(Ordering::SeqCst) {
            Some(CancelReason::Cancelled)
        } else if self.deadline.is_some_and(|d| Instant::now() >= d) {
            Some(CancelReason::DeadlineExceeded)
        } else {
            None
        }
    }

    /// `Err` once the token has been cancelled or its deadline has passed.
    pub fn check(&self) -> Result<(), Cancelled> {
        match self.reason() {
            Some(reason) => Err(Cancelled { reason }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_token_is_live() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        assert!(token.check().is_ok());
    }

    #[test]
    fn cancel_reaches_clones() {
        let token = CancelToken::new();
        let clone = token.clone();
        token.cancel();
        assert!(clone.is_cancelled());
        assert_eq!(
            clone.check(),
            Err(Cancelled {
                reason: CancelReason::Cancelled
            })
        );
    }

    #[test]
    fn past_deadline_fires() {
        let token = CancelToken::with_deadline(Instant::now());
        assert_eq!(
            token.check(),
            Err(Cancelled {
                reason: CancelReason::DeadlineExceeded
            })
        );
    }

    #[test]
    fn future_deadline_is_live() {
        let token = CancelToken::with_timeout(Duration::from_secs(3600));
        assert!(token.check().is_ok());
        assert!(token.deadline().is_some());
    }

    #[test]
    fn explicit_cancel_wins_over_deadline() {
        let token = CancelToken::with_deadline(Instant::now());
        token.cancel();
        assert_eq!(token.check().unwrap_err().reason, CancelReason::Cancelled);
    }

    #[test]
    fn error_message() {
        let err = Cancelled {
            reason: CancelReason::DeadlineExceeded,
        };
        assert_eq!(err.to_string(), "operation deadline exceeded");
    }
}
