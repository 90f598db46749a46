use shared::metrics_defs::{MetricDef, MetricType};

pub const DISPATCH_REQUESTS: MetricDef = MetricDef {
    name: "dispatch.requests",
    metric_type: MetricType::Counter,
    description: "Requests sent to metrics services. Tagged with service, outcome.",
};

pub const DISPATCH_DURATION: MetricDef = MetricDef {
    name: "dispatch.duration",
    metric_type: MetricType::Histogram,
    description: "Request duration in seconds. Tagged with service.",
};

pub const ALL_METRICS: &[MetricDef] = &[DISPATCH_REQUESTS, DISPATCH_DURATION];
