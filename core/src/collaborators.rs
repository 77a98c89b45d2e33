//! Host-provided side effects: busy indicator, user notifications and
//! reachability.
//!
//! # Design
//! The pipeline drives these but does not implement them. Hosts plug in
//! their UI; the defaults here keep a headless client usable (always
//! reachable, no indicator, notifications logged through `tracing`).
//! Implementations must be `Send + Sync` because dispatched requests run on
//! the Tokio runtime.

use tracing::{info, warn};

/// Severity attached to a user notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Success,
    Error,
    Warning,
}

/// Loading overlay shown while a request is in flight. Implementations must
/// tolerate repeated `show`/`hide` calls without duplicating UI state.
pub trait BusyIndicator: Send + Sync {
    fn show(&self);
    fn hide(&self);
}

/// Fire-and-forget message to the end user.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, severity: Severity);
}

/// Connectivity probe consulted before every dispatch.
pub trait Reachability: Send + Sync {
    fn is_reachable(&self) -> bool;
}

impl<F> Reachability for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn is_reachable(&self) -> bool {
        self()
    }
}

/// Reachability that never blocks a request.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysReachable;

impl Reachability for AlwaysReachable {
    fn is_reachable(&self) -> bool {
        true
    }
}

/// Indicator that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIndicator;

impl BusyIndicator for NoIndicator {
    fn show(&self) {}
    fn hide(&self) {}
}

/// Notifier that writes messages to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Success => info!(%message, "user notification"),
            Severity::Error | Severity::Warning => warn!(%message, ?severity, "user notification"),
        }
    }
}
