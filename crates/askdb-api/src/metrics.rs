//! Prometheus registry backing `/metrics`.
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounterVec, Opts, Registry, TextEncoder};

pub const OUTCOME_OK: &str = "ok";
pub const OUTCOME_EXECUTION_FAILED: &str = "execution_failed";
pub const OUTCOME_ERROR: &str = "error";

pub struct Metrics {
    registry: Registry,
    queries: IntCounterVec,
    pipeline_seconds: Histogram,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let queries = IntCounterVec::new(
            Opts::new("askdb_queries_total", "Questions answered, by outcome"),
            &["outcome"],
        )?;
        let pipeline_seconds = Histogram::with_opts(HistogramOpts::new(
            "askdb_pipeline_seconds",
            "Wall time of one pipeline run",
        ))?;

        registry.register(Box::new(queries.clone()))?;
        registry.register(Box::new(pipeline_seconds.clone()))?;

        Ok(Self {
            registry,
            queries,
            pipeline_seconds,
        })
    }

    pub fn observe(&self, outcome: &str, seconds: f64) {
        self.queries.with_label_values(&[outcome]).inc();
        self.pipeline_seconds.observe(seconds);
    }

    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcomes_are_counted() {
        let metrics = Metrics::new().unwrap();
        metrics.observe(OUTCOME_OK, 0.2);
        metrics.observe(OUTCOME_OK, 0.3);
        metrics.observe(OUTCOME_EXECUTION_FAILED, 0.1);

        let text = metrics.encode().unwrap();
        assert!(text.contains("askdb_queries_total{outcome=\"ok\"} 2"));
        assert!(text.contains("askdb_queries_total{outcome=\"execution_failed\"} 1"));
        assert!(text.contains("askdb_pipeline_seconds_count 3"));
    }
}
