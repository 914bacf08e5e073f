//! Authentication service routes

use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use chrono::{DateTime, Utc};
use common::{
    authz::{Action, Role},
    database,
    session::SessionContext,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    AppState,
    error::{AuthError, AuthResult},
    middleware::session_middleware,
    models::UserSummary,
    validation::PasswordStrength,
};

/// Request for user registration
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub confirmation: String,
    pub role: Option<String>,
}

/// Request for user login
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Response for user login
#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}

/// Request for a password strength check
#[derive(Deserialize)]
pub struct StrengthRequest {
    pub password: String,
}

/// Response for a password strength check
#[derive(Serialize)]
pub struct StrengthResponse {
    pub strength: PasswordStrength,
    pub message: &'static str,
}

/// Request for a password change
#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
    pub confirmation: String,
}

/// Request for a role change
#[derive(Deserialize)]
pub struct UpdateRoleRequest {
    pub role: String,
}

/// Trim and capitalise a username the way the login and register forms do
pub fn normalize_username(raw: &str) -> String {
    let mut chars = raw.trim().chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

fn parse_role(raw: &str) -> AuthResult<Role> {
    raw.parse().map_err(|_| AuthError::InvalidRole(raw.to_string()))
}

/// Create the router for the authentication service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/auth/logout", post(logout))
        .route("/auth/password", post(change_password))
        .route("/auth/me/role", get(my_role))
        .route("/users", get(list_users))
        .route("/users/:username/role", put(update_role))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/password/strength", post(password_strength))
        .merge(protected_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database_ok = database::health_check(&state.db_pool).await.unwrap_or(false);

    Json(json!({
        "status": if database_ok { "ok" } else { "degraded" },
        "service": "auth-service",
        "database": database_ok,
    }))
}

/// User registration endpoint
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AuthResult<impl IntoResponse> {
    let username = normalize_username(&payload.username);
    let role = match payload.role.as_deref() {
        Some(raw) => parse_role(raw)?,
        None => Role::default(),
    };

    if payload.password != payload.confirmation {
        return Err(AuthError::PasswordMismatch);
    }

    let user = state
        .auth_service
        .self_register(&username, &payload.password, role)
        .await?;

    Ok((StatusCode::CREATED, Json(UserSummary::from(&user))))
}

/// User login endpoint
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AuthResult<impl IntoResponse> {
    let username = normalize_username(&payload.username);
    let session = state
        .auth_service
        .open_session(&username, &payload.password)
        .await?;

    Ok(Json(LoginResponse {
        token: session.token.to_string(),
        username: session.username,
        role: session.role,
        expires_at: session.expires_at,
    }))
}

/// Logout endpoint
pub async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
) -> AuthResult<impl IntoResponse> {
    state.auth_service.logout(&session).await?;
    Ok(Json(json!({"message": "You have been logged out."})))
}

/// Password strength endpoint
pub async fn password_strength(
    State(state): State<AppState>,
    Json(payload): Json<StrengthRequest>,
) -> impl IntoResponse {
    let strength = state.auth_service.check_strength(&payload.password);
    Json(StrengthResponse {
        strength,
        message: strength.message(),
    })
}

/// Password change endpoint
pub async fn change_password(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Json(payload): Json<ChangePasswordRequest>,
) -> AuthResult<impl IntoResponse> {
    let updated = state
        .auth_service
        .change_own_password(
            &session,
            &payload.old_password,
            &payload.new_password,
            &payload.confirmation,
        )
        .await?;

    Ok(Json(json!({"updated": updated})))
}

/// Role of the logged-in user
pub async fn my_role(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
) -> AuthResult<impl IntoResponse> {
    session.require(Action::ViewOwnAccount)?;
    let role = state.auth_service.get_role(&session.username).await?;
    Ok(Json(json!({"username": session.username, "role": role})))
}

/// All users; admin only
pub async fn list_users(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
) -> AuthResult<impl IntoResponse> {
    let users = state.auth_service.list_users(&session).await?;
    Ok(Json(users))
}

/// Change a user's role; admin only
pub async fn update_role(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Path(username): Path<String>,
    Json(payload): Json<UpdateRoleRequest>,
) -> AuthResult<impl IntoResponse> {
    let role = parse_role(&payload.role)?;
    let username = normalize_username(&username);

    state
        .auth_service
        .update_role(&session, &username, role)
        .await?;

    Ok(Json(json!({"username": username, "role": role})))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        hasher::Hasher, repositories::UserRepository, service::AuthService,
        validation::CommonPasswords,
    };
    use axum::{
        body::{Body, to_bytes},
        http::{Request, header},
    };
    use common::{database::memory_pool, session::SessionRepository};
    use serde_json::Value;
    use tower::ServiceExt;

    async fn test_app() -> Router {
        let db_pool = memory_pool().await.unwrap();
        let sessions = SessionRepository::new(db_pool.clone());
        let auth_service = AuthService::new(
            UserRepository::new(db_pool.clone()),
            sessions.clone(),
            Hasher::with_params(1024, 1, 1).unwrap(),
            CommonPasswords::builtin(),
            chrono::Duration::hours(1),
        );
        create_router(AppState {
            db_pool,
            auth_service,
            sessions,
        })
    }

    async fn call(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = builder.body(Body::from(body.to_string())).unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn register_and_login(app: &Router, username: &str, password: &str, role: &str) -> String {
        let (status, _) = call(
            app,
            "POST",
            "/auth/register",
            None,
            json!({"username": username, "password": password, "confirmation": password, "role": role}),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = call(
            app,
            "POST",
            "/auth/login",
            None,
            json!({"username": username, "password": password}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }

    #[test]
    fn test_normalize_username() {
        assert_eq!(normalize_username("  alice123 "), "Alice123");
        assert_eq!(normalize_username("BOB"), "Bob");
        assert_eq!(normalize_username("   "), "");
    }

    #[tokio::test]
    async fn test_register_login_and_role() {
        let app = test_app().await;
        let token = register_and_login(&app, "alice123", "Secur3!pass", "admin").await;

        let (status, body) = call(&app, "GET", "/auth/me/role", Some(&token), Value::Null).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"username": "Alice123", "role": "admin"}));
    }

    #[tokio::test]
    async fn test_register_errors_are_specific() {
        let app = test_app().await;
        register_and_login(&app, "Alice123", "Secur3!pass", "user").await;

        let (status, body) = call(
            &app,
            "POST",
            "/auth/register",
            None,
            json!({"username": "Alice123", "password": "Secur3!pass", "confirmation": "Secur3!pass"}),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "duplicate_user");

        let (status, body) = call(
            &app,
            "POST",
            "/auth/register",
            None,
            json!({"username": "Bob1", "password": "Secur3!pass", "confirmation": "Secur3!pasS"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "password_mismatch");

        let (status, body) = call(
            &app,
            "POST",
            "/auth/register",
            None,
            json!({"username": "Bob1", "password": "Secur3!pass", "confirmation": "Secur3!pass", "role": "root"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "invalid_role");
    }

    #[tokio::test]
    async fn test_login_failures_are_unauthorized() {
        let app = test_app().await;
        register_and_login(&app, "Alice123", "Secur3!pass", "user").await;

        let (status, body) = call(
            &app,
            "POST",
            "/auth/login",
            None,
            json!({"username": "Alice123", "password": "nope"}),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "bad_password");

        let (status, body) = call(
            &app,
            "POST",
            "/auth/login",
            None,
            json!({"username": "Nobody", "password": "nope"}),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "unknown_user");
    }

    #[tokio::test]
    async fn test_protected_routes_need_a_session() {
        let app = test_app().await;

        let (status, _) = call(&app, "GET", "/auth/me/role", None, Value::Null).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = call(&app, "GET", "/auth/me/role", Some("garbage"), Value::Null).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_change_password_then_logout() {
        let app = test_app().await;
        let token = register_and_login(&app, "Alice123", "Secur3!pass", "user").await;

        let (status, body) = call(
            &app,
            "POST",
            "/auth/password",
            Some(&token),
            json!({"old_password": "Secur3!pass", "new_password": "NewPass9$", "confirmation": "NewPass9$"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"updated": 1}));

        let (status, _) = call(
            &app,
            "POST",
            "/auth/login",
            None,
            json!({"username": "Alice123", "password": "NewPass9$"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = call(&app, "POST", "/auth/logout", Some(&token), Value::Null).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = call(&app, "GET", "/auth/me/role", Some(&token), Value::Null).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_user_listing_is_admin_only() {
        let app = test_app().await;
        let admin = register_and_login(&app, "Admin1", "Abcdef1!", "admin").await;
        let user = register_and_login(&app, "Carol1", "Abcdef1!", "user").await;

        let (status, _) = call(&app, "GET", "/users", Some(&user), Value::Null).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = call(&app, "GET", "/users", Some(&admin), Value::Null).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);
        assert!(body[0].get("password_hash").is_none());

        let (status, _) = call(
            &app,
            "PUT",
            "/users/carol1/role",
            Some(&admin),
            json!({"role": "Analyst"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = call(&app, "GET", "/auth/me/role", Some(&user), Value::Null).await;
        assert_eq!(body["role"], "analyst");
    }

    #[tokio::test]
    async fn test_second_admin_cannot_self_register() {
        let app = test_app().await;
        register_and_login(&app, "Admin1", "Abcdef1!", "admin").await;

        let (status, body) = call(
            &app,
            "POST",
            "/auth/register",
            None,
            json!({"username": "Mallory1", "password": "Abcdef1!", "confirmation": "Abcdef1!", "role": "admin"}),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "forbidden");

        let (status, _) = call(
            &app,
            "POST",
            "/auth/login",
            None,
            json!({"username": "Mallory1", "password": "Abcdef1!"}),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_password_strength_endpoint() {
        let app = test_app().await;

        let (status, body) = call(
            &app,
            "POST",
            "/auth/password/strength",
            None,
            json!({"password": "Password1!"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["strength"], "commonly_used");

        let (_, body) = call(
            &app,
            "POST",
            "/auth/password/strength",
            None,
            json!({"password": "ABCdef123!?"}),
        )
        .await;
        assert_eq!(body["strength"], "strong");
    }
}
