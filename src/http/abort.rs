//! Cancellation signals and request timeouts.
//!
//! An [`AbortController`] owns the sending side; every clone of its
//! [`AbortSignal`] observes the same state. [`with_timeout`] derives a signal
//! that fires after a duration or when a parent signal fires, whichever comes
//! first, and hands back a [`CancelToken`] that stops the timer.

use std::fmt;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Why a signal fired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    /// The request timeout elapsed.
    Timeout(Duration),
    /// The caller aborted with a reason.
    Cancelled(String),
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortReason::Timeout(d) => write!(f, "timed out after {}ms", d.as_millis()),
            AbortReason::Cancelled(reason) => f.write_str(reason),
        }
    }
}

/// Fires a signal once.
#[derive(Debug)]
pub struct AbortController {
    tx: watch::Sender<Option<AbortReason>>,
    signal: AbortSignal,
}

impl Default for AbortController {
    fn default() -> Self {
        Self::new()
    }
}

impl AbortController {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(None);
        Self {
            tx,
            signal: AbortSignal { rx },
        }
    }

    pub fn signal(&self) -> AbortSignal {
        self.signal.clone()
    }

    /// Fire the signal. Later calls keep the first reason.
    pub fn abort(&self, reason: impl Into<String>) {
        self.fire(AbortReason::Cancelled(reason.into()));
    }

    fn fire(&self, reason: AbortReason) {
        self.tx.send_if_modified(|state| {
            if state.is_none() {
                *state = Some(reason);
                true
            } else {
                false
            }
        });
    }
}

/// Observes an [`AbortController`].
#[derive(Debug, Clone)]
pub struct AbortSignal {
    rx: watch::Receiver<Option<AbortReason>>,
}

impl AbortSignal {
    pub fn is_aborted(&self) -> bool {
        self.rx.borrow().is_some()
    }

    pub fn reason(&self) -> Option<AbortReason> {
        self.rx.borrow().clone()
    }

    /// Resolve once the signal fires.
    ///
    /// If the controller is dropped without firing, this never resolves.
    pub async fn aborted(&self) -> AbortReason {
        let mut rx = self.rx.clone();
        let reason = match rx.wait_for(Option::is_some).await {
            Ok(state) => state.clone(),
            Err(_) => None,
        };
        match reason {
            Some(reason) => reason,
            None => std::future::pending().await,
        }
    }
}

/// Stops the timer behind a [`with_timeout`] signal. Dropping it does the same.
#[derive(Debug)]
pub struct CancelToken {
    timer: Option<JoinHandle<()>>,
}

impl CancelToken {
    pub fn cancel(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl Drop for CancelToken {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Signal that fires after `duration`, or earlier if `parent` fires.
///
/// Must be called within a tokio runtime.
pub fn with_timeout(
    duration: Duration,
    parent: Option<&AbortSignal>,
) -> (AbortSignal, CancelToken) {
    let controller = AbortController::new();
    let signal = controller.signal();
    let parent = parent.cloned();

    let timer = tokio::spawn(async move {
        let reason = match parent {
            Some(parent) => tokio::select! {
                _ = tokio::time::sleep(duration) => AbortReason::Timeout(duration),
                reason = parent.aborted() => reason,
            },
            None => {
                tokio::time::sleep(duration).await;
                AbortReason::Timeout(duration)
            }
        };
        controller.fire(reason);
    });

    (signal, CancelToken { timer: Some(timer) })
}
