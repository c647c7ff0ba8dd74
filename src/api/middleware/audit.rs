//! Audit logging middleware.
//!
//! Logs every API request with client_id, method, path, and response
//! status. Runs innermost (after auth has injected ClientContext).

use axum::extract::OriginalUri;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::api::types::{ApiContext, ClientContext};

/// Record API access for the audit trail.
pub async fn log_access(req: Request<axum::body::Body>, next: Next) -> Response {
    // Nested routers see the path with the `/api` prefix stripped.
    let path = req
        .extensions()
        .get::<OriginalUri>()
        .map(|uri| uri.path().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    let action = format!("{} {path}", req.method());

    let ctx = req.extensions().get::<ApiContext>().cloned();
    let client_id = req
        .extensions()
        .get::<ClientContext>()
        .map(|c| c.client_id.clone())
        .unwrap_or_else(|| "anonymous".to_string());

    let response = next.run(req).await;

    if let Some(ctx) = ctx {
        ctx.core
            .log_access(&client_id, &action, response.status().as_u16());
    }

    response
}
