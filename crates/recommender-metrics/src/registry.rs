//! Prometheus metrics for the recommender
//!
//! Provides:
//! - Per-container recommendation gauge (three bands, cpu and memory)
//! - Object census gauge by update mode and recommendation presence
//! - Time-to-first-recommendation histogram
//! - Execution time histogram for steps of the recommender loop
//!
//! All metrics live in a [`prometheus::Registry`] owned by [`MetricsRegistry`]
//! rather than the process-wide default registry.

use crate::error::Result;
use crate::sink::{
    MetricSink, ObjectCountLabels, RecommendationLabels, OBJECT_COUNT_LABEL_NAMES,
    RECOMMENDATION_LABEL_NAMES,
};
use prometheus::proto::MetricFamily;
use prometheus::{GaugeVec, Histogram, HistogramOpts, HistogramVec, Opts, Registry};
use tracing::info;

/// Prefix shared by every recommender metric
pub const METRICS_NAMESPACE: &str = "vpa_recommender";

/// Buckets for time-to-first-recommendation (in seconds)
pub const RECOMMENDATION_LATENCY_BUCKETS: &[f64] = &[
    1.0, 2.0, 5.0, 7.5, 10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 90.0, 120.0, 150.0, 180.0, 240.0,
    300.0, 600.0, 900.0, 1800.0,
];

/// Buckets for recommender loop step durations (in seconds)
pub const EXECUTION_LATENCY_BUCKETS: &[f64] = &[
    0.01, 0.02, 0.05, 0.1, 0.2, 0.5, 1.0, 2.0, 5.0, 10.0, 20.0, 30.0, 60.0, 120.0, 300.0,
];

/// Handle to the recommender's metrics.
///
/// Created once at process start. Clones share the same underlying metrics
/// and registry.
#[derive(Clone)]
pub struct MetricsRegistry {
    registry: Registry,
    container_recommendations: GaugeVec,
    object_count: GaugeVec,
    recommendation_latency: Histogram,
    execution_latency: HistogramVec,
}

impl MetricsRegistry {
    /// Create the metrics in a fresh private registry
    pub fn new() -> Result<Self> {
        Self::with_registry(Registry::new())
    }

    /// Create the metrics and register them into `registry`.
    ///
    /// Fails if any of them is already registered there.
    pub fn with_registry(registry: Registry) -> Result<Self> {
        let container_recommendations = GaugeVec::new(
            Opts::new("vpa_recommendation", "Recommendation from the VPA")
                .namespace(METRICS_NAMESPACE),
            &RECOMMENDATION_LABEL_NAMES,
        )?;

        let object_count = GaugeVec::new(
            Opts::new(
                "vpa_objects_count",
                "Number of VPA objects present in the cluster.",
            )
            .namespace(METRICS_NAMESPACE),
            &OBJECT_COUNT_LABEL_NAMES,
        )?;

        let recommendation_latency = Histogram::with_opts(
            HistogramOpts::new(
                "recommendation_latency_seconds",
                "Time elapsed from creating a valid VPA configuration to the first recommendation.",
            )
            .namespace(METRICS_NAMESPACE)
            .buckets(RECOMMENDATION_LATENCY_BUCKETS.to_vec()),
        )?;

        let execution_latency = HistogramVec::new(
            HistogramOpts::new(
                "execution_latency_seconds",
                "Time spent in various parts of VPA Recommender main loop.",
            )
            .namespace(METRICS_NAMESPACE)
            .buckets(EXECUTION_LATENCY_BUCKETS.to_vec()),
            &["step"],
        )?;

        registry.register(Box::new(container_recommendations.clone()))?;
        registry.register(Box::new(object_count.clone()))?;
        registry.register(Box::new(recommendation_latency.clone()))?;
        registry.register(Box::new(execution_latency.clone()))?;

        info!(
            event = "metrics_registered",
            namespace = METRICS_NAMESPACE,
            "Registered recommender metrics"
        );

        Ok(Self {
            registry,
            container_recommendations,
            object_count,
            recommendation_latency,
            execution_latency,
        })
    }

    /// Snapshot of all registered metric families
    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }
}

impl MetricSink for MetricsRegistry {
    fn set_recommendation(&self, labels: &RecommendationLabels<'_>, value: f64) {
        self.container_recommendations
            .with_label_values(&labels.values())
            .set(value);
    }

    fn set_object_count(&self, labels: &ObjectCountLabels<'_>, count: f64) {
        self.object_count
            .with_label_values(&labels.values())
            .set(count);
    }

    fn observe_recommendation_latency(&self, seconds: f64) {
        self.recommendation_latency.observe(seconds);
    }

    fn observe_execution_time(&self, step: &str, seconds: f64) {
        self.execution_latency
            .with_label_values(&[step])
            .observe(seconds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MetricsError;
    use crate::sink::{RecommendationType, ResourceName};

    fn family<'a>(families: &'a [MetricFamily], name: &str) -> Option<&'a MetricFamily> {
        families.iter().find(|f| f.get_name() == name)
    }

    #[test]
    fn test_registries_are_independent() {
        let a = MetricsRegistry::new().unwrap();
        let b = MetricsRegistry::new().unwrap();

        a.observe_recommendation_latency(3.0);

        let count = |m: &MetricsRegistry| {
            family(&m.gather(), "vpa_recommender_recommendation_latency_seconds")
                .unwrap()
                .get_metric()[0]
                .get_histogram()
                .get_sample_count()
        };
        assert_eq!(count(&a), 1);
        assert_eq!(count(&b), 0);
    }

    #[test]
    fn test_double_registration_fails() {
        let registry = Registry::new();
        MetricsRegistry::with_registry(registry.clone()).unwrap();

        let err = MetricsRegistry::with_registry(registry).err().unwrap();
        assert!(matches!(err, MetricsError::Registration(_)));
    }

    #[test]
    fn test_recommendation_gauge_labels() {
        let metrics = MetricsRegistry::new().unwrap();
        metrics.set_recommendation(
            &RecommendationLabels {
                object_name: "web",
                namespace: "prod",
                pod_selector: "app=web",
                container: "nginx",
                recommendation_type: RecommendationType::Target,
                resource: ResourceName::Cpu,
            },
            0.25,
        );

        let families = metrics.gather();
        let gauge = family(&families, "vpa_recommender_vpa_recommendation").unwrap();
        assert_eq!(gauge.get_metric().len(), 1);

        let metric = &gauge.get_metric()[0];
        assert_eq!(metric.get_gauge().get_value(), 0.25);

        let labels: Vec<(&str, &str)> = metric
            .get_label()
            .iter()
            .map(|l| (l.get_name(), l.get_value()))
            .collect();
        assert!(labels.contains(&("recommendation_type", "target")));
        assert!(labels.contains(&("resource_name", "cpu")));
        assert!(labels.contains(&("pod_selector", "app=web")));
    }

    #[test]
    fn test_object_count_is_last_write_wins() {
        let metrics = MetricsRegistry::new().unwrap();
        let labels = ObjectCountLabels {
            update_mode: "Auto",
            has_recommendation: true,
        };
        metrics.set_object_count(&labels, 5.0);
        metrics.set_object_count(&labels, 2.0);

        let families = metrics.gather();
        let gauge = family(&families, "vpa_recommender_vpa_objects_count").unwrap();
        assert_eq!(gauge.get_metric().len(), 1);
        assert_eq!(gauge.get_metric()[0].get_gauge().get_value(), 2.0);
    }

    #[test]
    fn test_latency_histogram_buckets() {
        let metrics = MetricsRegistry::new().unwrap();
        metrics.observe_recommendation_latency(6.0);

        let families = metrics.gather();
        let histogram = family(&families, "vpa_recommender_recommendation_latency_seconds")
            .unwrap()
            .get_metric()[0]
            .get_histogram();

        let bounds: Vec<f64> = histogram
            .get_bucket()
            .iter()
            .map(|b| b.get_upper_bound())
            .collect();
        assert_eq!(bounds, RECOMMENDATION_LATENCY_BUCKETS);

        // 6s lands in the 7.5 bucket and above
        let cumulative: Vec<u64> = histogram
            .get_bucket()
            .iter()
            .map(|b| b.get_cumulative_count())
            .collect();
        assert_eq!(&cumulative[..4], &[0, 0, 0, 1]);
        assert_eq!(histogram.get_sample_sum(), 6.0);
    }

    #[test]
    fn test_execution_time_by_step() {
        let metrics = MetricsRegistry::new().unwrap();
        metrics.observe_execution_time("load_state", 0.03);
        metrics.observe_execution_time("total", 0.5);

        let families = metrics.gather();
        let histograms = family(&families, "vpa_recommender_execution_latency_seconds").unwrap();
        assert_eq!(histograms.get_metric().len(), 2);
    }
}
