//! Metrics definitions for the service registry.

use shared::metrics_defs::{MetricDef, MetricType};

pub const REGISTRY_LOOKUPS: MetricDef = MetricDef {
    name: "registry.lookups",
    metric_type: MetricType::Counter,
    description: "Number of service resolutions. Tagged with source, category, outcome.",
};

pub const ALL_METRICS: &[MetricDef] = &[REGISTRY_LOOKUPS];
