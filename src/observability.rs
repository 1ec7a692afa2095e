use biometrics::{Collector, Counter, Moments};

pub(crate) static SEND_REQUESTS: Counter = Counter::new("honeypot.session.sends");
pub(crate) static SEND_IGNORED: Counter = Counter::new("honeypot.session.ignored_inputs");
pub(crate) static SEND_REPLIES: Counter = Counter::new("honeypot.session.replies");
pub(crate) static SEND_TRANSPORT_FAILURES: Counter =
    Counter::new("honeypot.session.transport_failures");
pub(crate) static SEND_APPLICATION_FAILURES: Counter =
    Counter::new("honeypot.session.application_failures");
pub(crate) static SEND_DURATION: Moments = Moments::new("honeypot.session.round_trip_seconds");

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("honeypot.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("honeypot.client.request_errors");

pub(crate) static IDENTITY_CREATED: Counter = Counter::new("honeypot.identity.created");
pub(crate) static IDENTITY_FALLBACKS: Counter = Counter::new("honeypot.identity.fallbacks");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&SEND_REQUESTS);
    collector.register_counter(&SEND_IGNORED);
    collector.register_counter(&SEND_REPLIES);
    collector.register_counter(&SEND_TRANSPORT_FAILURES);
    collector.register_counter(&SEND_APPLICATION_FAILURES);
    collector.register_moments(&SEND_DURATION);

    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);

    collector.register_counter(&IDENTITY_CREATED);
    collector.register_counter(&IDENTITY_FALLBACKS);
}
