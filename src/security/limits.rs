//! Request size limits.

use axum::{extract::DefaultBodyLimit, Router};
use tower_http::limit::RequestBodyLimitLayer;

/// Cap request bodies at `max_body_size` bytes. Oversized requests get
/// 413 Payload Too Large before any handler runs.
pub fn apply_body_limit<S>(router: Router<S>, max_body_size: usize) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(RequestBodyLimitLayer::new(max_body_size))
}
