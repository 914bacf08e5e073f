//! Session middleware for the records service

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use tracing::info;
use uuid::Uuid;

use crate::{error::RecordsError, state::AppState};

/// Resolve the Bearer token into a [`common::session::SessionContext`] extension
pub async fn session_middleware(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, RecordsError> {
    let Some(TypedHeader(Authorization(bearer))) = bearer else {
        return Err(RecordsError::Unauthorized);
    };

    let Some(session) = state.sessions.resolve_bearer(bearer.token()).await? else {
        info!("Rejected unknown or expired session token");
        if let Ok(token) = Uuid::parse_str(bearer.token().trim()) {
            state.chats.forget(token).await;
        }
        return Err(RecordsError::Unauthorized);
    };

    req.extensions_mut().insert(session);

    Ok(next.run(req).await)
}
