//! Metrics collection.
//!
//! # Metrics
//! - `referral_api_requests_total` (counter): remote calls by operation, outcome
//! - `signup_transitions_total` (counter): state machine transitions by target phase
//! - `signup_submissions_total` (counter): finished submissions by outcome
//!
//! # Design Decisions
//! - Uses the `metrics` facade only; the embedding application picks an exporter
//! - Without an installed recorder every call is a no-op

/// Record the outcome of a remote referral API call.
pub fn record_api_request(operation: &'static str, outcome: &'static str) {
    metrics::counter!(
        "referral_api_requests_total",
        "operation" => operation,
        "outcome" => outcome
    )
    .increment(1);
}

/// Record a state machine transition into `phase`.
pub fn record_transition(phase: &'static str) {
    metrics::counter!("signup_transitions_total", "phase" => phase).increment(1);
}

/// Record how a submission attempt ended.
pub fn record_submission(outcome: &'static str) {
    metrics::counter!("signup_submissions_total", "outcome" => outcome).increment(1);
}
