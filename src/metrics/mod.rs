/*!
 * # Metrics Module
 *
 * Prometheus counters for the stock and billing workflows, registered on a
 * process-wide registry and rendered in the text exposition format at
 * `/metrics`.
 */

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use tracing::error;

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new_custom(Some("packworkx".to_string()), None)
        .expect("registry can be created");

    pub static ref GRNS_POSTED: IntCounter =
        register_counter("grns_posted_total", "Goods received notes posted");
    pub static ref GRNS_CANCELLED: IntCounter =
        register_counter("grns_cancelled_total", "Goods received notes cancelled");
    pub static ref INVENTORY_ADJUSTMENTS: IntCounter =
        register_counter("inventory_adjustments_total", "Manual inventory adjustments");
    pub static ref INVOICES_CREATED: IntCounter =
        register_counter("invoices_created_total", "Work-order invoices created");
    pub static ref PAYMENTS_RECORDED: IntCounter =
        register_counter("payments_recorded_total", "Partial payments recorded");
    pub static ref PAYMENTS_REVERSED: IntCounter =
        register_counter("payments_reversed_total", "Partial payments reversed");
    pub static ref CREDIT_NOTES_ISSUED: IntCounter =
        register_counter("credit_notes_issued_total", "Credit notes issued");
    pub static ref COMMAND_FAILURES: IntCounterVec = register_counter_vec(
        "command_failures_total",
        "Failed transactional commands",
        &["command", "error_type"],
    );
}

fn register_counter(name: &str, help: &str) -> IntCounter {
    let counter = IntCounter::with_opts(Opts::new(name, help)).expect("metric can be created");
    if let Err(e) = REGISTRY.register(Box::new(counter.clone())) {
        error!(metric = name, error = %e, "failed to register metric");
    }
    counter
}

fn register_counter_vec(name: &str, help: &str, labels: &[&str]) -> IntCounterVec {
    let counter =
        IntCounterVec::new(Opts::new(name, help), labels).expect("metric can be created");
    if let Err(e) = REGISTRY.register(Box::new(counter.clone())) {
        error!(metric = name, error = %e, "failed to register metric");
    }
    counter
}

/// Records a failed command under its error label.
pub fn record_failure(command: &str, error: &crate::errors::ServiceError) {
    COMMAND_FAILURES
        .with_label_values(&[command, error.kind()])
        .inc();
}

/// Renders every registered metric in the Prometheus text format.
pub fn render() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&REGISTRY.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

pub async fn metrics_handler() -> Response {
    match render() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics error").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_show_up_in_text_output() {
        GRNS_POSTED.inc();
        COMMAND_FAILURES
            .with_label_values(&["record_payment", "invalid_operation"])
            .inc();

        let text = render().unwrap();
        assert!(text.contains("packworkx_grns_posted_total"));
        assert!(text.contains("error_type=\"invalid_operation\""));
    }
}
