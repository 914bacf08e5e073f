//! Middleware resolving the Bearer session token into a session context

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use tracing::info;

use crate::{AppState, error::AuthError};

/// Resolve the session and hand it to handlers as a request extension
pub async fn session_middleware(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or(AuthError::Unauthorized)?;

    let session = state
        .sessions
        .resolve_bearer(bearer.token())
        .await?
        .ok_or_else(|| {
            info!("Rejected unknown or expired session token");
            AuthError::Unauthorized
        })?;

    req.extensions_mut().insert(session);

    Ok(next.run(req).await)
}
