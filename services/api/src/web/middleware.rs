//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::warn;

use crate::error::ApiError;
use crate::web::state::AppState;
use recommendations_core::ports::PortError;

/// The resolved caller identity, inserted into request extensions by
/// [`require_auth`]. Handlers read it with `Extension<UserId>`; nothing past
/// the middleware ever sees the raw credential.
#[derive(Debug, Clone)]
pub struct UserId(pub String);

/// Middleware that validates the bearer token and extracts the user id.
///
/// If valid, inserts the [`UserId`] into request extensions for handlers to use.
/// If invalid or missing, returns 401 Unauthorized with the same `{error, code}`
/// envelope every other error path uses.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // 1. Extract the Authorization header
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Port(PortError::Unauthorized))?;

    // 2. Take the token from the `Bearer <token>` scheme
    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(ApiError::Port(PortError::Unauthorized))?;

    // 3. Resolve the credential into a user id
    let user_id = state.resolver.resolve(token).map_err(|e| {
        warn!("Rejected bearer token: {:?}", e);
        ApiError::Port(PortError::Unauthorized)
    })?;

    // 4. Insert the identity into request extensions
    req.extensions_mut().insert(UserId(user_id));

    // 5. Continue to the handler
    Ok(next.run(req).await)
}
