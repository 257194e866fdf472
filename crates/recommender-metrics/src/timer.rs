//! Timing of recommender loop steps and of time-to-first-recommendation

use crate::sink::MetricSink;
use chrono::{DateTime, Utc};
use std::time::Instant;

/// Step label used for the whole-iteration duration
pub const TOTAL_STEP: &str = "total";

/// Measures one iteration of the recommender loop.
///
/// Each [`observe_step`](Self::observe_step) records the time since the
/// previous step; [`observe_total`](Self::observe_total) records the time
/// since the timer was started.
pub struct ExecutionTimer<'a> {
    sink: &'a dyn MetricSink,
    start: Instant,
    last: Instant,
}

impl<'a> ExecutionTimer<'a> {
    pub fn start(sink: &'a dyn MetricSink) -> Self {
        let now = Instant::now();
        Self {
            sink,
            start: now,
            last: now,
        }
    }

    pub fn observe_step(&mut self, step: &str) {
        let now = Instant::now();
        self.sink
            .observe_execution_time(step, now.duration_since(self.last).as_secs_f64());
        self.last = now;
    }

    /// Stop the timer and record the full iteration under [`TOTAL_STEP`]
    pub fn observe_total(self) {
        self.sink
            .observe_execution_time(TOTAL_STEP, self.start.elapsed().as_secs_f64());
    }
}

/// Record how long it took since `created` for the first recommendation to
/// appear.
pub fn observe_recommendation_latency(sink: &dyn MetricSink, created: DateTime<Utc>) {
    observe_recommendation_latency_at(sink, created, Utc::now());
}

/// Same as [`observe_recommendation_latency`] with an explicit current time.
/// A `created` later than `now` yields a negative observation.
pub fn observe_recommendation_latency_at(
    sink: &dyn MetricSink,
    created: DateTime<Utc>,
    now: DateTime<Utc>,
) {
    let elapsed = now.signed_duration_since(created);
    let seconds = match elapsed.num_nanoseconds() {
        Some(nanos) => nanos as f64 / 1e9,
        None => elapsed.num_milliseconds() as f64 / 1e3,
    };
    sink.observe_recommendation_latency(seconds);
}
