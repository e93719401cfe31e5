//! `/api/accounts` handlers.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, HeaderValue},
    response::IntoResponse,
    Json,
};

use super::{body, created, CreatedResult};
use crate::api::User;
use crate::http::dto::{AccessResponse, MessageResponse};
use crate::http::error::AppError;
use crate::http::extract::{cookie_value, REFRESH_COOKIE};
use crate::http::state::AppState;
use crate::services::accounts::{self, Credentials, Registration};

fn set_refresh_cookie(state: &AppState, token: &str, max_age: i64) -> Result<HeaderValue, AppError> {
    let secure = if state.auth.secure_cookies { "; Secure" } else { "" };
    let cookie = format!(
        "{}={}; HttpOnly; Path=/api/accounts; SameSite=Lax; Max-Age={}{}",
        REFRESH_COOKIE, token, max_age, secure
    );
    HeaderValue::from_str(&cookie)
        .map_err(|e| AppError::Internal(format!("Invalid cookie value: {}", e)))
}

/// POST /api/accounts/register
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<Registration>, JsonRejection>,
) -> CreatedResult<User> {
    let registration = body(payload)?;
    let user = accounts::register(
        state.repo(),
        &registration,
        state.auth.admin_secret_key.as_deref(),
    )
    .await?;
    created(user)
}

/// POST /api/accounts/login
///
/// Returns the access token in the body and sets the refresh cookie.
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let credentials = body(payload)?;
    let session = accounts::login(state.repo(), &state.tokens, &credentials).await?;
    let cookie = set_refresh_cookie(
        &state,
        &session.refresh,
        state.tokens.refresh_ttl().num_seconds(),
    )?;
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(AccessResponse {
            access: session.access,
            user: session.user,
        }),
    ))
}

/// POST /api/accounts/refresh
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<AccessResponse>, AppError> {
    let token = cookie_value(&headers, REFRESH_COOKIE);
    let (access, user) = accounts::refresh(state.repo(), &state.tokens, token).await?;
    Ok(Json(AccessResponse { access, user }))
}

/// POST /api/accounts/logout
pub async fn logout(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let cookie = set_refresh_cookie(&state, "", 0)?;
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(MessageResponse::new("Logged out.")),
    ))
}
