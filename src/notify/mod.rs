//! Outbound notification capability.
//!
//! The engine treats delivery as fire-and-forget: a failed dispatch is
//! logged and counted, never propagated to the caller.

use std::collections::HashMap;

/// Dispatch capability provided by an external collaborator (e.g. a
/// WhatsApp gateway). Implementations render `template_key` with `vars` and
/// send to `recipient`.
pub trait Notifier: Send + Sync {
    /// Returns false on delivery failure.
    fn notify(&self, recipient: &str, template_key: &str, vars: &HashMap<String, String>) -> bool;
}

/// Default dispatcher that writes notifications to the log. Useful in tests
/// and single-process deployments without a gateway.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, recipient: &str, template_key: &str, vars: &HashMap<String, String>) -> bool {
        tracing::info!(
            recipient = recipient,
            template = template_key,
            vars = ?vars,
            "Notification dispatched"
        );
        true
    }
}
