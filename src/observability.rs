use biometrics::{Collector, Counter};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("ragline.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("ragline.client.request_errors");

pub(crate) static STREAM_RECORDS: Counter = Counter::new("ragline.stream.records");
pub(crate) static STREAM_DELTAS: Counter = Counter::new("ragline.stream.deltas");
pub(crate) static STREAM_PARSE_ERRORS: Counter = Counter::new("ragline.stream.parse_errors");
pub(crate) static STREAM_BYTES: Counter = Counter::new("ragline.stream.bytes");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);

    collector.register_counter(&STREAM_RECORDS);
    collector.register_counter(&STREAM_DELTAS);
    collector.register_counter(&STREAM_PARSE_ERRORS);
    collector.register_counter(&STREAM_BYTES);
}
