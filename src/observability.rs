use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("owllama.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("owllama.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("owllama.client.request_duration_seconds");

pub(crate) static DECODE_LINES: Counter = Counter::new("owllama.decode.lines");
pub(crate) static DECODE_SKIPPED_LINES: Counter = Counter::new("owllama.decode.skipped_lines");

pub(crate) static CHAT_TURNS: Counter = Counter::new("owllama.chat.turns");
pub(crate) static CHAT_TURN_ERRORS: Counter = Counter::new("owllama.chat.turn_errors");

pub(crate) static HISTORY_SAVES: Counter = Counter::new("owllama.history.saves");
pub(crate) static HISTORY_LOAD_FAILURES: Counter =
    Counter::new("owllama.history.load_failures");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&DECODE_LINES);
    collector.register_counter(&DECODE_SKIPPED_LINES);

    collector.register_counter(&CHAT_TURNS);
    collector.register_counter(&CHAT_TURN_ERRORS);

    collector.register_counter(&HISTORY_SAVES);
    collector.register_counter(&HISTORY_LOAD_FAILURES);
}
