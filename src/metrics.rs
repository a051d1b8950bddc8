//! Parse and reconciliation metrics.
//!
//! Recording is a no-op until `init_metrics` installs the Prometheus
//! recorder, so library callers and tests never need to set anything up.

use std::net::SocketAddr;
use std::sync::Once;
use tracing::{info, warn};

static INIT: Once = Once::new();

/// Install the Prometheus recorder with an HTTP listener on `port`. Idempotent.
pub fn init_metrics(port: u16) {
    INIT.call_once(|| {
        let addr: SocketAddr = ([0, 0, 0, 0], port).into();
        let builder =
            metrics_exporter_prometheus::PrometheusBuilder::new().with_http_listener(addr);
        match builder.install() {
            Ok(()) => info!("Prometheus exporter listening on http://{}/metrics", addr),
            Err(e) => warn!("Prometheus exporter install failed: {}", e),
        }
    });
}

pub struct ParserMetrics;

impl ParserMetrics {
    pub fn record_parse(sport: &str, courts: usize, slots: usize, duration_secs: f64) {
        ::metrics::counter!("court_sync_parser_pages_total", "sport" => sport.to_string())
            .increment(1);
        ::metrics::counter!("court_sync_parser_slots_total", "sport" => sport.to_string())
            .increment(slots as u64);
        ::metrics::histogram!("court_sync_parser_courts_per_page").record(courts as f64);
        ::metrics::histogram!("court_sync_parser_duration_seconds").record(duration_secs);
    }

    /// A court block was dropped (no name, or cell count off the time axis)
    pub fn record_court_dropped(reason: &'static str) {
        ::metrics::counter!("court_sync_parser_courts_dropped_total", "reason" => reason)
            .increment(1);
    }

    pub fn record_empty_page(sport: &str) {
        ::metrics::counter!("court_sync_parser_empty_pages_total", "sport" => sport.to_string())
            .increment(1);
    }
}

pub struct SyncMetrics;

impl SyncMetrics {
    pub fn record_run(sport: &str, inserted: usize, updated: usize) {
        ::metrics::counter!("court_sync_reconcile_runs_total", "sport" => sport.to_string())
            .increment(1);
        ::metrics::counter!("court_sync_reconcile_inserted_total").increment(inserted as u64);
        ::metrics::counter!("court_sync_reconcile_updated_total").increment(updated as u64);
    }

    pub fn record_failure(kind: &'static str) {
        ::metrics::counter!("court_sync_reconcile_failures_total", "kind" => kind).increment(1);
    }
}
