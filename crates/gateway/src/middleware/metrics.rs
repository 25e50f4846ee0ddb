//! Per-route request counters and latency

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use lexdz_common::metrics::RequestMetrics;

/// Record method, matched route and status for every request
pub async fn track_metrics(req: Request, next: Next) -> Response {
    let endpoint = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| req.uri().path().to_owned());

    let metrics = RequestMetrics::start(req.method().as_str(), &endpoint);
    let response = next.run(req).await;
    metrics.finish(response.status().as_u16());

    response
}
