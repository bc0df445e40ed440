//! Metrics collection.
//!
//! # Metrics
//! - `wildroute_resolutions_total` (counter): by outcome (matched, not_found)
//! - `wildroute_bind_warnings_total` (counter): misplaced variadic placeholders
//! - `wildroute_dispatch_total` (counter): responder outcomes by status
//! - `wildroute_table_reloads_total` (counter): by result (ok, error)
//!
//! # Design Decisions
//! - Recorded through the `metrics` facade; without an installed recorder
//!   every call is a no-op
//! - No exporter here, the embedding application picks one

pub fn record_resolution(matched: bool) {
    let outcome = if matched { "matched" } else { "not_found" };
    metrics::counter!("wildroute_resolutions_total", "outcome" => outcome).increment(1);
}

pub fn record_bind_warning() {
    metrics::counter!("wildroute_bind_warnings_total").increment(1);
}

pub fn record_dispatch(status: u16) {
    metrics::counter!("wildroute_dispatch_total", "status" => status.to_string()).increment(1);
}

pub fn record_reload(ok: bool) {
    let result = if ok { "ok" } else { "error" };
    metrics::counter!("wildroute_table_reloads_total", "result" => result).increment(1);
}
