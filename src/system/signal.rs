//! Shutdown signal handling
//!
//! SIGTERM (service managers) and SIGINT (Ctrl+C) both request a graceful
//! stop. Interested parties hold a [`ShutdownSignal`] and either poll it
//! between steps or await it while sleeping.

use tokio::sync::watch;
use tracing::warn;

/// Why the worker is being asked to stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    Terminate,
    Interrupt,
    Requested,
}

impl std::fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Terminate => write!(f, "SIGTERM"),
            Self::Interrupt => write!(f, "SIGINT"),
            Self::Requested => write!(f, "shutdown request"),
        }
    }
}

/// Receiving side of the shutdown notification
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<Option<ShutdownReason>>,
}

/// Sending side; dropping it does not trigger a shutdown
#[derive(Debug, Clone)]
pub struct ShutdownTrigger {
    tx: watch::Sender<Option<ShutdownReason>>,
}

/// Create a manually driven shutdown channel
pub fn shutdown_channel() -> (ShutdownTrigger, ShutdownSignal) {
    let (tx, rx) = watch::channel(None);
    (ShutdownTrigger { tx }, ShutdownSignal { rx })
}

impl ShutdownTrigger {
    pub fn trigger(&self, reason: ShutdownReason) {
        self.tx.send_if_modified(|current| {
            if current.is_none() {
                *current = Some(reason);
                true
            } else {
                false
            }
        });
    }
}

impl ShutdownSignal {
    /// Signal that never fires
    pub fn never() -> Self {
        shutdown_channel().1
    }

    /// Current state without waiting
    pub fn reason(&self) -> Option<ShutdownReason> {
        *self.rx.borrow()
    }

    pub fn is_triggered(&self) -> bool {
        self.reason().is_some()
    }

    /// Wait until shutdown is requested.
    ///
    /// Pends forever when every trigger is gone without firing.
    pub async fn wait(&mut self) -> ShutdownReason {
        loop {
            if let Some(reason) = *self.rx.borrow_and_update() {
                return reason;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Spawn a task translating OS signals into a [`ShutdownSignal`].
///
/// Must be called from within a Tokio runtime.
pub fn listen_for_shutdown() -> ShutdownSignal {
    let (trigger, signal) = shutdown_channel();
    tokio::spawn(async move {
        let reason = wait_for_os_signal().await;
        warn!("{} received...", reason);
        trigger.trigger(reason);
    });
    signal
}

#[cfg(unix)]
async fn wait_for_os_signal() -> ShutdownReason {
    use tokio::signal::unix::{SignalKind, signal};

    let mut term = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            warn!(
                "Failed to install SIGTERM handler: {}. Only Ctrl+C will stop the worker.",
                e
            );
            return ctrl_c().await;
        }
    };

    tokio::select! {
        _ = term.recv() => ShutdownReason::Terminate,
        reason = ctrl_c() => reason,
    }
}

#[cfg(not(unix))]
async fn wait_for_os_signal() -> ShutdownReason {
    ctrl_c().await
}

async fn ctrl_c() -> ShutdownReason {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    ShutdownReason::Interrupt
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_trigger_wakes_waiter() {
        let (trigger, mut signal) = shutdown_channel();
        assert!(!signal.is_triggered());

        let waiter = tokio::spawn(async move { signal.wait().await });
        trigger.trigger(ShutdownReason::Terminate);

        let reason = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reason, ShutdownReason::Terminate);
    }

    #[tokio::test]
    async fn test_first_reason_wins() {
        let (trigger, signal) = shutdown_channel();
        trigger.trigger(ShutdownReason::Interrupt);
        trigger.trigger(ShutdownReason::Terminate);
        assert_eq!(signal.reason(), Some(ShutdownReason::Interrupt));
    }

    #[tokio::test]
    async fn test_never_does_not_fire() {
        let mut signal = ShutdownSignal::never();
        let result = tokio::time::timeout(Duration::from_millis(50), signal.wait()).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_reason_display() {
        assert_eq!(ShutdownReason::Terminate.to_string(), "SIGTERM");
        assert_eq!(ShutdownReason::Interrupt.to_string(), "SIGINT");
    }
}
