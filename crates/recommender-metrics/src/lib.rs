//! Metrics for the resource recommender
//!
//! This crate reports already-computed recommendations:
//! - Per-container recommendation gauges (lower bound, target, upper bound)
//! - A census of managed objects by update mode and recommendation presence
//! - Time from object creation to its first recommendation
//! - Execution time of recommender loop steps

pub mod cycle;
pub mod error;
pub mod model;
pub mod quantity;
pub mod recorder;
pub mod registry;
pub mod sink;
pub mod timer;

pub use cycle::{CycleSummary, RecommendationReporter};
pub use error::{MetricsError, Result};
pub use model::*;
pub use quantity::{to_metric_value, Quantity};
pub use recorder::{observe_recommendation, BucketKey, ObjectCounter};
pub use registry::MetricsRegistry;
pub use sink::{
    MetricSink, ObjectCountLabels, RecommendationLabels, RecommendationType, ResourceName,
};
pub use timer::{observe_recommendation_latency, ExecutionTimer};
