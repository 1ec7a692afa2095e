//! Diagnostic hooks for send outcomes.
//!
//! The transcript deliberately shows one generic message for every failed
//! send. The distinction between transport and application failures is kept
//! for operators through a [`DiagnosticLogger`].

use crate::error::Error;
use crate::types::{OutgoingMessage, ResolvedReply};

/// A trait for recording what happened to each send.
///
/// # Example
///
/// ```rust,ignore
/// use honeypot_console::{DiagnosticLogger, Error, OutgoingMessage, ResolvedReply};
/// use std::sync::Mutex;
///
/// struct FailureLog(Mutex<Vec<String>>);
///
/// impl DiagnosticLogger for FailureLog {
///     fn log_reply(&self, _: &OutgoingMessage, _: &ResolvedReply) {}
///
///     fn log_failure(&self, message: &OutgoingMessage, error: &Error) {
///         self.0.lock().unwrap().push(format!("{}: {error}", message.session_id));
///     }
/// }
/// ```
pub trait DiagnosticLogger: Send + Sync {
    /// Called once per send whose reply was applied to the view.
    fn log_reply(&self, message: &OutgoingMessage, reply: &ResolvedReply);

    /// Called once per send that ended in the failure message.
    fn log_failure(&self, message: &OutgoingMessage, error: &Error);
}

/// Forwards diagnostics to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl DiagnosticLogger for TracingLogger {
    fn log_reply(&self, message: &OutgoingMessage, reply: &ResolvedReply) {
        tracing::debug!(
            session = %message.session_id,
            scam_type = %reply.scam_type,
            risk = %reply.risk.label,
            persona = %reply.persona,
            "reply applied"
        );
    }

    fn log_failure(&self, message: &OutgoingMessage, error: &Error) {
        tracing::warn!(
            session = %message.session_id,
            kind = error.kind(),
            status = ?error.status_code(),
            "send failed: {error}"
        );
    }
}
