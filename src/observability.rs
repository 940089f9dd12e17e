use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("groqchat.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("groqchat.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("groqchat.client.request_duration_seconds");

pub(crate) static STREAM_EVENTS: Counter = Counter::new("groqchat.stream.events");
pub(crate) static STREAM_ERRORS: Counter = Counter::new("groqchat.stream.errors");
pub(crate) static STREAM_BYTES: Counter = Counter::new("groqchat.stream.bytes");

pub(crate) static TURNS: Counter = Counter::new("groqchat.chat.turns");
pub(crate) static TURN_FAILURES: Counter = Counter::new("groqchat.chat.turn_failures");
pub(crate) static TURN_DURATION: Moments = Moments::new("groqchat.chat.turn_duration_seconds");
pub(crate) static TITLES_GENERATED: Counter = Counter::new("groqchat.chat.titles_generated");
pub(crate) static SESSIONS_CREATED: Counter = Counter::new("groqchat.chat.sessions_created");
pub(crate) static SESSIONS_DELETED: Counter = Counter::new("groqchat.chat.sessions_deleted");
pub(crate) static MODEL_SWITCHES: Counter = Counter::new("groqchat.chat.model_switches");
pub(crate) static PROVIDER_BINDINGS: Counter = Counter::new("groqchat.provider.bindings");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&STREAM_EVENTS);
    collector.register_counter(&STREAM_ERRORS);
    collector.register_counter(&STREAM_BYTES);

    collector.register_counter(&TURNS);
    collector.register_counter(&TURN_FAILURES);
    collector.register_moments(&TURN_DURATION);
    collector.register_counter(&TITLES_GENERATED);
    collector.register_counter(&SESSIONS_CREATED);
    collector.register_counter(&SESSIONS_DELETED);
    collector.register_counter(&MODEL_SWITCHES);
    collector.register_counter(&PROVIDER_BINDINGS);
}
