//! HTTP request metrics middleware.

use std::time::Instant;

use {
    axum::{
        body::Body,
        extract::MatchedPath,
        http::Request,
        middleware::Next,
        response::Response,
    },
    yuta_metrics::{counter, gauge, histogram, http as http_metrics, labels},
};

/// Records request count, duration and in-flight gauge per route.
///
/// The endpoint label is the matched route pattern; unmatched paths share the
/// `unmatched` label so scanners cannot blow up label cardinality.
pub async fn http_metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let endpoint = endpoint_label(request.extensions().get::<MatchedPath>());

    gauge!(http_metrics::REQUESTS_IN_FLIGHT, labels::ENDPOINT => endpoint.clone(), labels::METHOD => method.clone())
        .increment(1.0);

    let response = next.run(request).await;

    let status = response.status().as_u16().to_string();
    let duration = start.elapsed().as_secs_f64();

    counter!(
        http_metrics::REQUESTS_TOTAL,
        labels::ENDPOINT => endpoint.clone(),
        labels::METHOD => method.clone(),
        labels::STATUS => status.clone()
    )
    .increment(1);

    histogram!(
        http_metrics::REQUEST_DURATION_SECONDS,
        labels::ENDPOINT => endpoint.clone(),
        labels::METHOD => method.clone(),
        labels::STATUS => status
    )
    .record(duration);

    gauge!(http_metrics::REQUESTS_IN_FLIGHT, labels::ENDPOINT => endpoint, labels::METHOD => method)
        .decrement(1.0);

    response
}

fn endpoint_label(matched: Option<&MatchedPath>) -> String {
    matched.map_or_else(|| "unmatched".to_string(), |p| p.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmatched_paths_share_a_label() {
        assert_eq!(endpoint_label(None), "unmatched");
    }
}
