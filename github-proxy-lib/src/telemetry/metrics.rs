use opentelemetry::global;
use opentelemetry::metrics::{Counter, Gauge, Histogram, Meter, UpDownCounter};
use opentelemetry::KeyValue;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use prometheus::Registry;
use std::sync::Arc;

pub mod labels {
    pub const SCOPE: &str = "scope";
    pub const STATUS_CODE: &str = "status_code";
    pub const METHOD: &str = "method";
    pub const RESULT: &str = "result";
    pub const STRATEGY: &str = "strategy";
    pub const ERROR_TYPE: &str = "error_type";
    pub const VERSION: &str = "version";
    pub const RUST_VERSION: &str = "rust_version";
}

pub mod values {
    pub const RESULT_OK: &str = "ok";
    pub const RESULT_ERROR: &str = "error";
}

#[derive(Clone)]
pub struct Metrics {
    pub connections_total: Counter<u64>,
    pub connections_active: UpDownCounter<i64>,
    pub connections_rejected_total: Counter<u64>,

    pub requests_total: Counter<u64>,
    pub requests_duration_seconds: Histogram<f64>,
    pub bytes_sent_total: Counter<u64>,
    pub errors_total: Counter<u64>,

    // Admission
    pub rate_limit_allowed_total: Counter<u64>,
    pub rate_limit_rejected_total: Counter<u64>,
    pub client_limiters_active: Gauge<u64>,

    // Upstream
    pub credential_refreshes_total: Counter<u64>,
    pub upstream_fetches_total: Counter<u64>,

    pub build_info: Gauge<u64>,
}

impl Metrics {
    fn new(meter: Meter) -> Self {
        Self {
            connections_total: meter
                .u64_counter("github_proxy_connections_total")
                .with_description("Total number of connections established")
                .build(),
            connections_active: meter
                .i64_up_down_counter("github_proxy_connections_active")
                .with_description("Number of active connections")
                .build(),
            connections_rejected_total: meter
                .u64_counter("github_proxy_connections_rejected_total")
                .with_description("Connections refused because of the connection limit")
                .build(),

            requests_total: meter
                .u64_counter("github_proxy_requests_total")
                .with_description("Total number of requests processed")
                .build(),
            requests_duration_seconds: meter
                .f64_histogram("github_proxy_requests_duration_seconds")
                .with_description("Request duration in seconds")
                .build(),
            bytes_sent_total: meter
                .u64_counter("github_proxy_bytes_sent_total")
                .with_description("Total file bytes sent to clients")
                .build(),
            errors_total: meter
                .u64_counter("github_proxy_errors_total")
                .with_description("Requests rejected, by error type")
                .build(),

            rate_limit_allowed_total: meter
                .u64_counter("github_proxy_rate_limit_allowed_total")
                .with_description("Requests admitted by the rate gate")
                .build(),
            rate_limit_rejected_total: meter
                .u64_counter("github_proxy_rate_limit_rejected_total")
                .with_description("Requests rejected by the rate gate, by scope")
                .build(),
            client_limiters_active: meter
                .u64_gauge("github_proxy_client_limiters_active")
                .with_description("Per-client limiters currently tracked")
                .build(),

            credential_refreshes_total: meter
                .u64_counter("github_proxy_credential_refreshes_total")
                .with_description("Installation token mint attempts, by result")
                .build(),
            upstream_fetches_total: meter
                .u64_counter("github_proxy_upstream_fetches_total")
                .with_description("Upstream content retrievals, by strategy and result")
                .build(),

            build_info: meter
                .u64_gauge("github_proxy_build_info")
                .with_description("Build information")
                .build(),
        }
    }

    /// Set build info metric with version labels
    pub fn set_build_info(&self) {
        let version = env!("CARGO_PKG_VERSION");
        let rust_version = env!("CARGO_PKG_RUST_VERSION");

        self.build_info.record(
            1,
            &[
                KeyValue::new(labels::VERSION, version),
                KeyValue::new(labels::RUST_VERSION, rust_version),
            ],
        );
    }

    pub fn record_request(&self, method: &str, status_code: u16, duration_secs: f64) {
        let attrs = [
            KeyValue::new(labels::METHOD, method.to_string()),
            KeyValue::new(labels::STATUS_CODE, i64::from(status_code)),
        ];
        self.requests_total.add(1, &attrs);
        self.requests_duration_seconds.record(duration_secs, &attrs);
    }

    pub fn record_bytes_sent(&self, bytes: u64) {
        if bytes > 0 {
            self.bytes_sent_total.add(bytes, &[]);
        }
    }

    pub fn record_error(&self, error_type: &'static str) {
        self.errors_total
            .add(1, &[KeyValue::new(labels::ERROR_TYPE, error_type)]);
    }

    pub fn record_rate_limit_allowed(&self) {
        self.rate_limit_allowed_total.add(1, &[]);
    }

    pub fn record_rate_limit_rejection(&self, scope: &'static str) {
        self.rate_limit_rejected_total
            .add(1, &[KeyValue::new(labels::SCOPE, scope)]);
    }

    pub fn record_client_limiters_active(&self, active: usize) {
        self.client_limiters_active
            .record(u64::try_from(active).unwrap_or(u64::MAX), &[]);
    }

    pub fn record_credential_refresh(&self, success: bool) {
        let result = if success { values::RESULT_OK } else { values::RESULT_ERROR };
        self.credential_refreshes_total
            .add(1, &[KeyValue::new(labels::RESULT, result)]);
    }

    pub fn record_upstream_fetch(&self, strategy: &str, result: &str) {
        self.upstream_fetches_total.add(
            1,
            &[
                KeyValue::new(labels::STRATEGY, strategy.to_string()),
                KeyValue::new(labels::RESULT, result.to_string()),
            ],
        );
    }
}

pub fn init_metrics() -> Result<(Arc<Metrics>, Registry), Box<dyn std::error::Error + Send + Sync>>
{
    let registry = Registry::default();

    let exporter = opentelemetry_prometheus::exporter()
        .with_registry(registry.clone())
        .build()?;

    let meter_provider = SdkMeterProvider::builder().with_reader(exporter).build();

    global::set_meter_provider(meter_provider);

    let meter = global::meter("github-proxy");
    let metrics = Arc::new(Metrics::new(meter));

    metrics.set_build_info();

    Ok((metrics, registry))
}
