//! # Phase-scoped cancellation tokens with a deadline.
//!
//! A [`Deadline`] owns the token handed to one phase (init, run, one worker
//! iteration, cleanup). Its token is cancelled when:
//! - the parent token is cancelled (only for [`Deadline::child`] / [`Deadline::unbounded`]),
//! - the timeout elapses,
//! - the `Deadline` is dropped (the phase is done).
//!
//! ```text
//! root (signals)
//!  ├─ Deadline::child(root, init_timeout)      init
//!  ├─ Deadline::child(root, run_timeout)       single run (or ::unbounded)
//! Deadline::fresh(run_timeout)                 worker iteration (no parent)
//! Deadline::fresh(cleanup_timeout)             cleanup (no parent)
//! ```
//!
//! ## Rules
//! - Cancelling a deadline token never cancels its parent.
//! - Expiry only **cancels the token**; the phase future keeps running until it returns.
//! - A zero timeout yields a token that is already cancelled and expired.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::{task::JoinHandle, time};
use tokio_util::sync::CancellationToken;

/// Cancellation token bounded by an optional timeout.
pub(crate) struct Deadline {
    token: CancellationToken,
    timeout: Option<Duration>,
    expired: Arc<AtomicBool>,
    timer: Option<JoinHandle<()>>,
}

impl Deadline {
    /// Derives a token from `parent` that is also cancelled after `timeout`.
    pub(crate) fn child(parent: &CancellationToken, timeout: Duration) -> Self {
        Self::arm(parent.child_token(), timeout)
    }

    /// Creates an independent token cancelled after `timeout`.
    pub(crate) fn fresh(timeout: Duration) -> Self {
        Self::arm(CancellationToken::new(), timeout)
    }

    /// Derives a token from `parent` with no timeout of its own.
    pub(crate) fn unbounded(parent: &CancellationToken) -> Self {
        Self {
            token: parent.child_token(),
            timeout: None,
            expired: Arc::new(AtomicBool::new(false)),
            timer: None,
        }
    }

    fn arm(token: CancellationToken, timeout: Duration) -> Self {
        let expired = Arc::new(AtomicBool::new(false));

        if timeout.is_zero() {
            expired.store(true, Ordering::Release);
            token.cancel();
            return Self {
                token,
                timeout: Some(timeout),
                expired,
                timer: None,
            };
        }

        let timer = {
            let token = token.clone();
            let expired = Arc::clone(&expired);
            tokio::spawn(async move {
                tokio::select! {
                    _ = time::sleep(timeout) => {
                        expired.store(true, Ordering::Release);
                        token.cancel();
                    }
                    _ = token.cancelled() => {}
                }
            })
        };
        Self {
            token,
            timeout: Some(timeout),
            expired,
            timer: Some(timer),
        }
    }

    /// Returns a handle to the phase token.
    pub(crate) fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Returns the configured timeout (`None` for unbounded deadlines).
    pub(crate) fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Returns `true` if the timeout itself fired (not a parent cancellation).
    pub(crate) fn is_expired(&self) -> bool {
        self.expired.load(Ordering::Acquire)
    }
}

impl Drop for Deadline {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        self.token.cancel();
    }
}
