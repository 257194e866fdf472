//! One metrics reporting pass over the current set of managed objects

use crate::model::{ManagedObject, ObjectId};
use crate::recorder::{observe_recommendation, ObjectCounter};
use crate::sink::MetricSink;
use crate::timer::{observe_recommendation_latency_at, ExecutionTimer};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tracing::debug;

/// Step label for the reporting pass in the execution time metric
pub const UPDATE_METRICS_STEP: &str = "update_metrics";

/// Outcome of a single [`RecommendationReporter::report`] call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub objects: usize,
    pub with_recommendation: usize,
    /// Objects that got their first recommendation since the previous cycle
    pub first_recommendations: usize,
}

/// Reports recommendations and the object census once per cycle.
///
/// Remembers which objects already had a recommendation so that the
/// time-to-first-recommendation is observed only once per object.
#[derive(Debug, Default)]
pub struct RecommendationReporter {
    recommended: HashSet<ObjectId>,
}

impl RecommendationReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, sink: &dyn MetricSink, objects: &[ManagedObject]) -> CycleSummary {
        self.report_at(sink, objects, Utc::now())
    }

    /// Same as [`report`](Self::report) with an explicit current time for the
    /// latency observations.
    pub fn report_at(
        &mut self,
        sink: &dyn MetricSink,
        objects: &[ManagedObject],
        now: DateTime<Utc>,
    ) -> CycleSummary {
        let mut timer = ExecutionTimer::start(sink);
        let mut counter = ObjectCounter::new();
        let mut summary = CycleSummary {
            objects: objects.len(),
            ..CycleSummary::default()
        };

        for object in objects {
            if object.has_recommendation() {
                summary.with_recommendation += 1;
                observe_recommendation(sink, object);
                if self.recommended.insert(object.id.clone()) {
                    observe_recommendation_latency_at(sink, object.created, now);
                    summary.first_recommendations += 1;
                }
            }
            counter.add(object);
        }
        counter.observe(sink);

        let present: HashSet<&ObjectId> = objects.iter().map(|o| &o.id).collect();
        self.recommended.retain(|id| present.contains(id));

        timer.observe_step(UPDATE_METRICS_STEP);
        timer.observe_total();

        debug!(
            event = "metrics_reported",
            objects = summary.objects,
            with_recommendation = summary.with_recommendation,
            first_recommendations = summary.first_recommendations,
            "Reported recommender metrics"
        );

        summary
    }

    /// Number of objects known to have received a recommendation
    pub fn recommended_objects(&self) -> usize {
        self.recommended.len()
    }
}
