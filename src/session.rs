//! The send-message cycle.
//!
//! One call to [`ChatSession::send`] is one round trip. The user's line is
//! appended to the transcript before the request goes out. When the request
//! resolves, either every facet is updated from that one reply or none are
//! and a single system line is appended instead. Sending takes `&mut self`,
//! so a session never has more than one request in flight.

use std::sync::Arc;
use std::time::Instant;

use crate::client::HoneypotTransport;
use crate::diagnostics::{DiagnosticLogger, TracingLogger};
use crate::identity::{IdentityStorage, IdentityStore, SessionIdentity};
use crate::observability::{
    SEND_APPLICATION_FAILURES, SEND_DURATION, SEND_IGNORED, SEND_REPLIES, SEND_REQUESTS,
    SEND_TRANSPORT_FAILURES,
};
use crate::types::{FAILURE_MESSAGE, OutgoingMessage, ResolvedReply, TranscriptEntry};
use crate::view::ViewSink;

/// What a call to [`ChatSession::send`] ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The input was blank; nothing was appended and nothing was sent.
    Ignored,
    /// The reply was applied to the transcript and every facet.
    Replied,
    /// The failure message was appended; facets were left alone.
    Failed,
}

/// Counters for one session.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SessionStats {
    /// Messages handed to the transport.
    pub sent: u64,
    /// Sends whose reply was applied.
    pub replies: u64,
    /// Sends that failed before or after reaching the service.
    pub transport_failures: u64,
    /// Sends the service rejected or answered with an unusable body.
    pub application_failures: u64,
    /// Blank inputs that were dropped.
    pub ignored: u64,
}

impl SessionStats {
    pub fn failures(&self) -> u64 {
        self.transport_failures + self.application_failures
    }
}

/// Drives one conversation with the analysis service.
pub struct ChatSession<T: HoneypotTransport, S: IdentityStorage> {
    transport: T,
    identity: IdentityStore<S>,
    last_identity: Option<SessionIdentity>,
    logger: Arc<dyn DiagnosticLogger>,
    stats: SessionStats,
}

impl<T: HoneypotTransport, S: IdentityStorage> ChatSession<T, S> {
    /// Creates a session that logs diagnostics through `tracing`.
    pub fn new(transport: T, identity: IdentityStore<S>) -> Self {
        Self {
            transport,
            identity,
            last_identity: None,
            logger: Arc::new(TracingLogger),
            stats: SessionStats::default(),
        }
    }

    /// Replaces the diagnostic logger.
    pub fn with_logger(mut self, logger: Arc<dyn DiagnosticLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Sends one line of user input.
    ///
    /// Never fails: every error is absorbed into the transcript as
    /// [`FAILURE_MESSAGE`] and reported to the diagnostic logger.
    pub async fn send(&mut self, raw_text: &str, view: &mut dyn ViewSink) -> SendOutcome {
        let text = raw_text.trim();
        if text.is_empty() {
            SEND_IGNORED.click();
            self.stats.ignored += 1;
            return SendOutcome::Ignored;
        }

        view.append_transcript_entry(&TranscriptEntry::user(text));
        view.clear_input_buffer();

        let identity = self.identity.get_or_create();
        let message = OutgoingMessage {
            session_id: identity.as_str().to_string(),
            text: text.to_string(),
        };
        self.last_identity = Some(identity);

        SEND_REQUESTS.click();
        self.stats.sent += 1;
        let start = Instant::now();
        let result = self.transport.analyze(&message).await;
        SEND_DURATION.add(start.elapsed().as_secs_f64());

        match result {
            Ok(reply) => {
                let reply = reply.resolve();
                apply_reply(view, &reply);
                SEND_REPLIES.click();
                self.stats.replies += 1;
                self.logger.log_reply(&message, &reply);
                SendOutcome::Replied
            }
            Err(err) => {
                view.append_transcript_entry(&TranscriptEntry::system(FAILURE_MESSAGE));
                if err.is_transport() {
                    SEND_TRANSPORT_FAILURES.click();
                    self.stats.transport_failures += 1;
                } else {
                    SEND_APPLICATION_FAILURES.click();
                    self.stats.application_failures += 1;
                }
                self.logger.log_failure(&message, &err);
                SendOutcome::Failed
            }
        }
    }

    /// The identity this session sends under.
    ///
    /// After a send this is the identity that send used. With working storage
    /// that is always the stored identity; when storage is unavailable every
    /// send mints an ephemeral one, and this reports the latest. Before the
    /// first send it asks the store directly.
    pub fn identity(&mut self) -> SessionIdentity {
        match &self.last_identity {
            Some(identity) => identity.clone(),
            None => self.identity.get_or_create(),
        }
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

/// Fans one resolved reply out to the view: transcript, scam type, risk, persona.
fn apply_reply(view: &mut dyn ViewSink, reply: &ResolvedReply) {
    view.append_transcript_entry(&TranscriptEntry::counterpart(&reply.reply));
    view.set_scam_type(&reply.scam_type);
    view.set_risk(&reply.risk);
    view.set_persona(&reply.persona);
}
