use once_cell::sync::Lazy;
use prometheus::{register_int_counter, Encoder, IntCounter, TextEncoder};

// Prometheus metrics (default registry)
pub static UPLOADS_STORED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "bus_admin_uploads_stored_total",
        "Total bus images written to the upload store"
    )
    .expect("register uploads_stored_total")
});

pub static UPLOAD_CLEANUPS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "bus_admin_upload_cleanups_total",
        "Total stored images removed by discard or release"
    )
    .expect("register upload_cleanups_total")
});

pub static UPLOAD_CLEANUP_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "bus_admin_upload_cleanup_failures_total",
        "Total best-effort image removals that failed"
    )
    .expect("register upload_cleanup_failures_total")
});

pub static LOGINS_FAILED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "bus_admin_logins_failed_total",
        "Total rejected admin login attempts"
    )
    .expect("register logins_failed_total")
});

pub fn encode_metrics() -> (axum::http::StatusCode, String) {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            format!("metrics encode error: {e}"),
        );
    }
    (
        axum::http::StatusCode::OK,
        String::from_utf8(buffer).unwrap_or_default(),
    )
}
