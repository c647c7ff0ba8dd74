//! Per-client rate limiting middleware.
//!
//! Applies sliding-window rate limits keyed on the authenticated client:
//! - 100 requests per minute
//! - 1000 requests per hour
//!
//! Unrecognised keys share one `invalid` bucket, so guessing keys is
//! throttled like any other client.

use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use super::auth::bearer_token;
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiKeyRegistry};

/// Extract a rate-limit key from the request.
fn rate_key(req: &Request<axum::body::Body>, keys: &ApiKeyRegistry) -> String {
    match bearer_token(req) {
        Some(token) => keys
            .authenticate(token)
            .map(|client| client.client_id)
            .unwrap_or_else(|| "invalid".to_string()),
        None => "anonymous".to_string(),
    }
}

/// Returns 429 with `Retry-After` when the caller is over its limit.
pub async fn limit(req: Request<axum::body::Body>, next: Next) -> Response {
    match limit_inner(req, next).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

async fn limit_inner(req: Request<axum::body::Body>, next: Next) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    let key = rate_key(&req, &ctx.api_keys);

    // MutexGuard is !Send, drop before .await
    {
        let mut limiter = ctx
            .rate_limiter
            .lock()
            .map_err(|_| ApiError::Internal("rate limiter lock".into()))?;

        limiter.check(&key).map_err(|retry_after| {
            tracing::warn!(key = %key, retry_after, "Rate limit exceeded");
            ApiError::RateLimited { retry_after }
        })?;
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::RateLimiter;
    use axum::body::Body;

    fn request_with(token: &str) -> Request<Body> {
        Request::builder()
            .header("Authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn rate_key_uses_client_id_for_known_key() {
        let keys = ApiKeyRegistry::from_plaintext(&["clinic-key".into()]);
        let expected = keys.authenticate("clinic-key").unwrap().client_id;
        assert_eq!(rate_key(&request_with("clinic-key"), &keys), expected);
    }

    #[test]
    fn rate_key_without_token_is_anonymous() {
        let keys = ApiKeyRegistry::from_plaintext(&["clinic-key".into()]);
        let req = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(rate_key(&req, &keys), "anonymous");
    }

    #[test]
    fn unknown_tokens_share_one_bucket() {
        let keys = ApiKeyRegistry::from_plaintext(&["clinic-key".into()]);
        let mut limiter = RateLimiter::with_limits(2, 1000);

        let mut rejected = 0;
        for i in 0..500 {
            let key = rate_key(&request_with(&format!("guess-{i}")), &keys);
            assert_eq!(key, "invalid");
            if limiter.check(&key).is_err() {
                rejected += 1;
            }
        }
        assert_eq!(rejected, 498);
        assert_eq!(limiter.tracked_clients(), 1);
    }
}
