use opentelemetry::{
    global,
    metrics::{Counter, Histogram},
};

pub struct Metrics {
    pub requests: Counter<u64>,
    pub detections: Counter<u64>,
    pub duration: Histogram<f64>,
}

impl Metrics {
    pub fn init() -> Self {
        let meter = global::meter("gateway");
        let latency_buckets = [0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

        let duration: Histogram<f64> = meter
            .f64_histogram("predict_duration_seconds")
            .with_description("Time to serve a single prediction (decode + infer + annotate)")
            .with_unit("s")
            .with_boundaries(latency_buckets.to_vec())
            .build();
        let requests: Counter<u64> = meter
            .u64_counter("predict_requests_total")
            .with_description("Total prediction requests accepted")
            .build();
        let detections: Counter<u64> = meter
            .u64_counter("predict_detections_total")
            .with_description("Total detections returned")
            .build();

        Self {
            requests,
            detections,
            duration,
        }
    }
}
