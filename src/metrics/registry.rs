//! Metric Registry
//!
//! Creates every instrument once, under a configured namespace/subsystem, and
//! owns the `prometheus::Registry` they are exposed through.

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounterVec, IntGauge, Opts, Registry};
use tracing::warn;

// == Label Keys & Values ==
pub const STATUS_KEY: &str = "status";
pub const FORMAT_KEY: &str = "format";
pub const DEFINES_TTL_KEY: &str = "defines_ttl";
pub const CONNECTION_ERROR_KEY: &str = "kind";

pub const TOTAL_VAL: &str = "add";
pub const ERROR_VAL: &str = "error";
pub const BAD_REQUEST_VAL: &str = "bad_request";

pub const JSON_VAL: &str = "json";
pub const XML_VAL: &str = "xml";
pub const INVALID_FORMAT_VAL: &str = "invalid_format";

pub const ACCEPT_VAL: &str = "accept";
pub const CLOSE_VAL: &str = "close";

// == Buckets ==
/// Latency buckets in seconds, from half a millisecond up to a few seconds.
pub const DURATION_BUCKETS: &[f64] = &[
    0.0005, 0.001, 0.002, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5,
];

/// Payload size buckets in bytes.
pub const SIZE_BUCKETS: &[f64] = &[
    64.0, 128.0, 256.0, 512.0, 1024.0, 2048.0, 4096.0, 8192.0, 16384.0, 65536.0, 262144.0,
    1048576.0,
];

/// Extra TTL buckets in seconds, one minute up to one week.
pub const EXTRA_TTL_BUCKETS: &[f64] = &[
    60.0, 300.0, 900.0, 3600.0, 10800.0, 21600.0, 43200.0, 86400.0, 604800.0,
];

// == Instrument Groups ==
/// Instruments of a channel counted by request status.
#[derive(Clone)]
pub struct RequestMetrics {
    pub duration: Histogram,
    /// `status` = add | error | bad_request
    pub status: IntCounterVec,
}

/// Instruments of the backend put channel.
#[derive(Clone)]
pub struct BackendPutMetrics {
    pub duration: Histogram,
    /// `format` x `status` x `defines_ttl`
    pub status: IntCounterVec,
    pub size: Histogram,
}

/// Open connection gauge plus accept/close error counter.
#[derive(Clone)]
pub struct ConnectionMetrics {
    pub open: IntGauge,
    /// `kind` = accept | close
    pub errors: IntCounterVec,
}

// == Metrics Registry ==
/// Every instrument the gateway exposes.
pub struct MetricsRegistry {
    registry: Registry,
    pub puts: RequestMetrics,
    pub gets: RequestMetrics,
    pub puts_backend: BackendPutMetrics,
    pub gets_backend: RequestMetrics,
    pub connections: ConnectionMetrics,
    pub extra_ttl: Histogram,
}

impl MetricsRegistry {
    /// Creates and registers all instruments under `namespace` and `subsystem`.
    ///
    /// Fails only when an instrument cannot be built (e.g. an invalid
    /// namespace). Registration conflicts are logged and leave the affected
    /// instrument usable but unexposed.
    pub fn new(namespace: &str, subsystem: &str) -> prometheus::Result<Self> {
        let builder = Builder {
            registry: Registry::new(),
            namespace,
            subsystem,
        };

        let puts = RequestMetrics {
            duration: builder.histogram(
                "put_duration_seconds",
                "Duration in seconds to process client put requests.",
                DURATION_BUCKETS,
            )?,
            status: builder.counter_vec(
                "put_total",
                "Count of client put requests labeled by status.",
                &[STATUS_KEY],
            )?,
        };

        let gets = RequestMetrics {
            duration: builder.histogram(
                "get_duration_seconds",
                "Duration in seconds to process client get requests.",
                DURATION_BUCKETS,
            )?,
            status: builder.counter_vec(
                "get_total",
                "Count of client get requests labeled by status.",
                &[STATUS_KEY],
            )?,
        };

        let puts_backend = BackendPutMetrics {
            duration: builder.histogram(
                "backend_put_duration_seconds",
                "Duration in seconds of backend put calls.",
                DURATION_BUCKETS,
            )?,
            status: builder.counter_vec(
                "backend_put_total",
                "Count of backend put calls labeled by format, status and TTL presence.",
                &[FORMAT_KEY, STATUS_KEY, DEFINES_TTL_KEY],
            )?,
            size: builder.histogram(
                "backend_put_size_bytes",
                "Size in bytes of backend put payloads.",
                SIZE_BUCKETS,
            )?,
        };

        let gets_backend = RequestMetrics {
            duration: builder.histogram(
                "backend_get_duration_seconds",
                "Duration in seconds of backend get calls.",
                DURATION_BUCKETS,
            )?,
            status: builder.counter_vec(
                "backend_get_total",
                "Count of backend get calls labeled by status.",
                &[STATUS_KEY],
            )?,
        };

        let connections = ConnectionMetrics {
            open: builder.gauge("connections", "Number of currently open inbound connections.")?,
            errors: builder.counter_vec(
                "connection_errors",
                "Count of connection accept and close errors.",
                &[CONNECTION_ERROR_KEY],
            )?,
        };

        let extra_ttl = builder.histogram(
            "extra_ttl_seconds",
            "Seconds requested beyond the maximum allowed TTL.",
            EXTRA_TTL_BUCKETS,
        )?;

        Ok(Self {
            registry: builder.registry,
            puts,
            gets,
            puts_backend,
            gets_backend,
            connections,
            extra_ttl,
        })
    }

    /// The underlying prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    // == Render ==
    /// Encodes every registered instrument in the Prometheus text format.
    pub fn render(&self) -> prometheus::Result<String> {
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

// == Builder ==
struct Builder<'a> {
    registry: Registry,
    namespace: &'a str,
    subsystem: &'a str,
}

impl Builder<'_> {
    fn opts(&self, name: &str, help: &str) -> Opts {
        Opts::new(name, help)
            .namespace(self.namespace)
            .subsystem(self.subsystem)
    }

    fn counter_vec(
        &self,
        name: &str,
        help: &str,
        labels: &[&str],
    ) -> prometheus::Result<IntCounterVec> {
        let counter = IntCounterVec::new(self.opts(name, help), labels)?;
        self.register(name, Box::new(counter.clone()));
        Ok(counter)
    }

    fn histogram(&self, name: &str, help: &str, buckets: &[f64]) -> prometheus::Result<Histogram> {
        let opts = HistogramOpts::new(name, help)
            .namespace(self.namespace)
            .subsystem(self.subsystem)
            .buckets(buckets.to_vec());
        let histogram = Histogram::with_opts(opts)?;
        self.register(name, Box::new(histogram.clone()));
        Ok(histogram)
    }

    fn gauge(&self, name: &str, help: &str) -> prometheus::Result<IntGauge> {
        let gauge = IntGauge::with_opts(self.opts(name, help))?;
        self.register(name, Box::new(gauge.clone()));
        Ok(gauge)
    }

    fn register(&self, name: &str, collector: Box<dyn prometheus::core::Collector>) {
        if let Err(err) = self.registry.register(collector) {
            warn!(instrument = name, error = %err, "Failed to register instrument");
        }
    }
}
