//! Authentication service routes

use axum::{
    Extension, Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    AppState,
    error::{AuthError, AuthResult},
    middleware::{AuthUser, auth_middleware},
    models::{NewSession, NewUser},
    password,
    repositories::{is_unique_violation, session::token_fingerprint},
    validation::{validate_email, validate_password, validate_username},
};

/// Request for account creation
#[derive(Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub device_name: Option<String>,
    pub push_token: Option<String>,
}

/// Request for user login
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username_or_email: String,
    pub password: String,
    pub device_name: Option<String>,
    pub push_token: Option<String>,
}

/// Response carrying a freshly issued token
#[derive(Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
    pub user_id: Uuid,
}

/// Create the router for the authentication service
pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/auth/logout", post(logout))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .merge(protected)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "auth-service"
    }))
}

/// Account creation endpoint
///
/// Issues a token and persists the matching session record in one go, so a
/// fresh signup is already logged in.
pub async fn signup(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<SignupRequest>,
) -> AuthResult<impl IntoResponse> {
    validate_username(&payload.username).map_err(AuthError::BadRequest)?;
    validate_email(&payload.email).map_err(AuthError::BadRequest)?;
    validate_password(&payload.password).map_err(AuthError::BadRequest)?;

    let password_hash = password::hash_password(&payload.password).map_err(|e| {
        error!("Failed to hash password: {}", e);
        AuthError::InternalServerError
    })?;

    let new_user = NewUser {
        username: payload.username,
        email: payload.email,
        password_hash,
    };

    let user = match state.user_repository.create(&new_user).await {
        Ok(user) => user,
        Err(e) if is_unique_violation(&e) => {
            return Err(AuthError::Conflict(
                "Username or email already taken".to_string(),
            ));
        }
        Err(e) => return Err(AuthError::Database(e)),
    };

    info!("Created account for user: {}", user.username);

    let response = open_session(
        &state,
        &user,
        payload.device_name,
        payload.push_token,
        client_ip(&headers),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// User login endpoint
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> AuthResult<impl IntoResponse> {
    if payload.username_or_email.is_empty() || payload.password.is_empty() {
        return Err(AuthError::BadRequest(
            "Username and password are required".to_string(),
        ));
    }

    let limiter_key = payload.username_or_email.clone();
    if !state.rate_limiter.is_allowed(&limiter_key).await {
        return Err(AuthError::TooManyAttempts);
    }

    let user = state
        .user_repository
        .find_by_username_or_email(&payload.username_or_email)
        .await?;

    // Unknown account and wrong password are indistinguishable to the caller.
    let Some(user) = user else {
        state.rate_limiter.record_failure(&limiter_key).await;
        return Err(AuthError::Unauthorized);
    };

    let password_ok =
        password::verify_password(&payload.password, &user.password_hash).map_err(|e| {
            error!("Failed to verify password: {}", e);
            AuthError::InternalServerError
        })?;

    if !password_ok {
        state.rate_limiter.record_failure(&limiter_key).await;
        return Err(AuthError::Unauthorized);
    }

    state.rate_limiter.clear(&limiter_key).await;
    info!("Login for user: {}", user.username);

    let response = open_session(
        &state,
        &user,
        payload.device_name,
        payload.push_token,
        client_ip(&headers),
    )
    .await?;

    Ok((StatusCode::OK, Json(response)))
}

/// Logout endpoint
///
/// Marks every active session for the caller inactive. Already-issued
/// tokens stay cryptographically valid until natural expiry.
pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> AuthResult<impl IntoResponse> {
    state
        .session_repository
        .invalidate_all_for_user(user.id)
        .await?;

    Ok(Json(json!({"message": "Logged out successfully"})))
}

/// Issue a token and persist the matching session record
async fn open_session(
    state: &AppState,
    user: &crate::models::User,
    device_name: Option<String>,
    push_token: Option<String>,
    ip_address: Option<String>,
) -> AuthResult<TokenResponse> {
    let issued = state.token_service.issue(user).map_err(|e| {
        error!("Failed to issue token: {}", e);
        AuthError::InternalServerError
    })?;

    let new_session = NewSession {
        user_id: user.id,
        token_hash: token_fingerprint(&issued.token),
        device_name,
        ip_address,
        push_token,
        expires_at: issued.expires_at,
    };

    state.session_repository.create(&new_session).await?;

    Ok(TokenResponse {
        token: issued.token,
        token_type: "Bearer".to_string(),
        expires_at: issued.expires_at,
        user_id: user.id,
    })
}

/// Best-effort client IP from the X-Forwarded-For header
fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
}
