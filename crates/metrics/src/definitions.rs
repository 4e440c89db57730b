//! Metric name and label definitions.
//!
//! All metric names used by yuta live here so the `/metrics` output stays
//! consistent across crates.

/// HTTP request metrics
pub mod http {
    /// Total number of HTTP requests handled
    pub const REQUESTS_TOTAL: &str = "yuta_http_requests_total";
    /// Duration of HTTP requests in seconds
    pub const REQUEST_DURATION_SECONDS: &str = "yuta_http_request_duration_seconds";
    /// Number of currently in-flight HTTP requests
    pub const REQUESTS_IN_FLIGHT: &str = "yuta_http_requests_in_flight";
}

/// Chat session lifecycle metrics
pub mod sessions {
    /// Number of sessions currently relaying
    pub const ACTIVE: &str = "yuta_sessions_active";
    /// Total login attempts
    pub const LOGIN_ATTEMPTS_TOTAL: &str = "yuta_session_login_attempts_total";
    /// Total failed login attempts
    pub const LOGIN_FAILURES_TOTAL: &str = "yuta_session_login_failures_total";
    /// Sessions disabled after an unrecoverable error
    pub const DISABLED_TOTAL: &str = "yuta_sessions_disabled_total";
    /// Configured clients skipped because their type is not supported
    pub const UNSUPPORTED_TOTAL: &str = "yuta_sessions_unsupported_total";
    /// Failed sync requests against the chat server
    pub const SYNC_ERRORS_TOTAL: &str = "yuta_session_sync_errors_total";
}

/// Relay loop metrics
pub mod relay {
    /// Total inbound events observed
    pub const EVENTS_RECEIVED_TOTAL: &str = "yuta_relay_events_received_total";
    /// Events that passed every filter
    pub const EVENTS_ADMITTED_TOTAL: &str = "yuta_relay_events_admitted_total";
    /// Events dropped by a filter, labelled by reason
    pub const EVENTS_SKIPPED_TOTAL: &str = "yuta_relay_events_skipped_total";
    /// Replies delivered back to a conversation
    pub const REPLIES_SENT_TOTAL: &str = "yuta_relay_replies_sent_total";
    /// Replies that could not be delivered
    pub const REPLY_ERRORS_TOTAL: &str = "yuta_relay_reply_errors_total";
    /// Admitted events dropped because the NLU query failed or timed out
    pub const NLU_FAILURES_TOTAL: &str = "yuta_relay_nlu_failures_total";
}

/// NLU query metrics
pub mod nlu {
    /// Total NLU queries issued
    pub const QUERIES_TOTAL: &str = "yuta_nlu_queries_total";
    /// Duration of NLU queries in seconds
    pub const QUERY_DURATION_SECONDS: &str = "yuta_nlu_query_duration_seconds";
    /// NLU queries that failed, labelled by error type
    pub const QUERY_ERRORS_TOTAL: &str = "yuta_nlu_query_errors_total";
}

/// Common label keys used across metrics
pub mod labels {
    pub const ENDPOINT: &str = "endpoint";
    pub const METHOD: &str = "method";
    pub const STATUS: &str = "status";
    pub const ACCOUNT_ID: &str = "account_id";
    pub const CLIENT_TYPE: &str = "client_type";
    pub const REASON: &str = "reason";
    pub const ERROR_TYPE: &str = "error_type";
    pub const ACTION: &str = "action";
}

/// Standard histogram buckets for different metric types
pub mod buckets {
    use once_cell::sync::Lazy;

    /// HTTP request duration buckets (in seconds)
    /// Covers 1ms to 60s
    pub static HTTP_DURATION: Lazy<Vec<f64>> = Lazy::new(|| {
        vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0,
        ]
    });

    /// NLU query duration buckets (in seconds)
    /// Covers 50ms to 30s
    pub static NLU_DURATION: Lazy<Vec<f64>> = Lazy::new(|| {
        vec![
            0.05, 0.1, 0.25, 0.5, 0.75, 1.0, 1.5, 2.5, 5.0, 10.0, 20.0, 30.0,
        ]
    });
}
