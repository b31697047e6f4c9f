//! Prometheus metrics
//!
//! Counters and gauges are labelled by exchange name. Without an installed
//! recorder every call is a no-op.

use std::time::Duration;

/// Counter metric types
#[derive(Debug, Clone, Copy)]
pub enum CounterMetric {
    /// Prices handed to the UI after dedup
    PricesReceived,
    /// Stream reconnect attempts
    StreamReconnects,
    /// Quote requests sent
    StatsRequests,
    /// Quote requests answered with the unavailable sentinel
    StatsFailures,
    /// Search requests sent
    Searches,
}

/// Gauge metric types
#[derive(Debug, Clone, Copy)]
pub enum GaugeMetric {
    /// Live subscriptions on a stream
    ActiveSubscriptions,
}

/// Latency metric types
#[derive(Debug, Clone, Copy)]
pub enum LatencyMetric {
    /// Time spent blocked in one stream read
    StreamRead,
    /// Quote round trip
    StatsRequest,
    /// Search round trip
    SearchRequest,
}

/// Add to a counter
pub fn increment(metric: CounterMetric, exchange: &'static str, value: u64) {
    let metric_name = match metric {
        CounterMetric::PricesReceived => "tickerwatch_prices_received_total",
        CounterMetric::StreamReconnects => "tickerwatch_stream_reconnects_total",
        CounterMetric::StatsRequests => "tickerwatch_stats_requests_total",
        CounterMetric::StatsFailures => "tickerwatch_stats_failures_total",
        CounterMetric::Searches => "tickerwatch_searches_total",
    };

    metrics::counter!(metric_name, "exchange" => exchange).increment(value);
}

/// Set a gauge value
pub fn set_gauge(metric: GaugeMetric, exchange: &'static str, value: f64) {
    let metric_name = match metric {
        GaugeMetric::ActiveSubscriptions => "tickerwatch_active_subscriptions",
    };

    metrics::gauge!(metric_name, "exchange" => exchange).set(value);
}

/// Record a latency measurement
pub fn record_latency(metric: LatencyMetric, duration: Duration) {
    let metric_name = match metric {
        LatencyMetric::StreamRead => "tickerwatch_stream_read_latency_ms",
        LatencyMetric::StatsRequest => "tickerwatch_stats_request_latency_ms",
        LatencyMetric::SearchRequest => "tickerwatch_search_request_latency_ms",
    };

    metrics::histogram!(metric_name).record(duration.as_secs_f64() * 1000.0);
}
