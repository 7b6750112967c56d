use prometheus::{
    Counter, CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;
use std::time::Duration;

pub struct MetricsCollector {
    registry: Registry,

    // Mock surface
    pub mock_requests: CounterVec,

    // Generation
    pub generations: CounterVec,
    pub generation_duration: HistogramVec,
    pub records_generated: Counter,
}

impl MetricsCollector {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let mock_requests = CounterVec::new(
            Opts::new("mimic_mock_requests_total", "Total mock requests by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(mock_requests.clone()))?;

        let generations = CounterVec::new(
            Opts::new("mimic_generations_total", "Total generation runs"),
            &["provider", "outcome"],
        )?;
        registry.register(Box::new(generations.clone()))?;

        let generation_duration = HistogramVec::new(
            HistogramOpts::new(
                "mimic_generation_duration_seconds",
                "Generation duration in seconds",
            )
            .buckets(vec![0.01, 0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
            &["provider"],
        )?;
        registry.register(Box::new(generation_duration.clone()))?;

        let records_generated = Counter::new(
            "mimic_records_generated_total",
            "Total records produced by successful generations",
        )?;
        registry.register(Box::new(records_generated.clone()))?;

        Ok(Self {
            registry,
            mock_requests,
            generations,
            generation_duration,
            records_generated,
        })
    }

    /// `outcome` is one of `hit`, `miss` or `dataset`.
    pub fn record_mock_request(&self, outcome: &str) {
        self.mock_requests.with_label_values(&[outcome]).inc();
    }

    pub fn record_generation(&self, provider: &str, outcome: &str, elapsed: Duration, records: usize) {
        self.generations.with_label_values(&[provider, outcome]).inc();
        self.generation_duration
            .with_label_values(&[provider])
            .observe(elapsed.as_secs_f64());
        if records > 0 {
            self.records_generated.inc_by(records as f64);
        }
    }

    pub fn encode(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

pub struct MetricsHandler {
    collector: Arc<MetricsCollector>,
}

impl MetricsHandler {
    pub fn new(collector: Arc<MetricsCollector>) -> Self {
        Self { collector }
    }

    pub async fn metrics(&self) -> String {
        self.collector.encode().unwrap_or_else(|e| {
            tracing::error!("Failed to encode metrics: {}", e);
            String::from("# Error encoding metrics\n")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_collector_creation() {
        let collector = MetricsCollector::new();
        assert!(collector.is_ok());
    }

    #[test]
    fn test_metrics_encoding() {
        let collector = MetricsCollector::new().unwrap();

        collector.record_mock_request("hit");
        collector.record_generation("faker", "success", Duration::from_millis(12), 10);

        let metrics_text = collector.encode().unwrap();
        assert!(metrics_text.contains("mimic_mock_requests_total{outcome=\"hit\"} 1"));
        assert!(metrics_text.contains("mimic_generations_total"));
        assert!(metrics_text.contains("mimic_records_generated_total 10"));
    }

    #[test]
    fn test_failed_generation_adds_no_records() {
        let collector = MetricsCollector::new().unwrap();
        collector.record_generation("openai", "timeout", Duration::from_secs(1), 0);

        assert_eq!(collector.records_generated.get(), 0.0);
        assert_eq!(
            collector
                .generations
                .with_label_values(&["openai", "timeout"])
                .get(),
            1.0
        );
    }

    #[tokio::test]
    async fn test_metrics_handler() {
        let collector = Arc::new(MetricsCollector::new().unwrap());
        let handler = MetricsHandler::new(collector.clone());

        collector.record_mock_request("miss");

        let output = handler.metrics().await;
        assert!(output.contains("mimic_mock_requests_total"));
    }
}
