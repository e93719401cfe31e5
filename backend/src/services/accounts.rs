//! Registration, login and token exchange.

use serde::{Deserialize, Serialize};

use super::error::{ServiceError, ServiceResult};
use crate::api::{CompanyId, DepartmentId, NewUser, Role, User};
use crate::auth::{hash_password, verify_password, Principal, TokenError, TokenKind, TokenService};
use crate::db::{AccountRepository, FullRepository};

#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_role")]
    pub role: Role,
    #[serde(default)]
    pub company: Option<CompanyId>,
    #[serde(default)]
    pub department: Option<DepartmentId>,
    #[serde(default)]
    pub admin_secret: Option<String>,
}

fn default_role() -> Role {
    Role::User
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Tokens minted at login.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub access: String,
    /// Travels as a cookie, never in the body.
    #[serde(skip)]
    pub refresh: String,
    pub user: User,
}

fn token_failure(err: TokenError) -> ServiceError {
    match err {
        TokenError::Signing(message) => ServiceError::Internal(message),
        other => ServiceError::unauthorized(other.to_string()),
    }
}

/// Create an account. Admin accounts need `admin_secret` to match the
/// configured secret; with no configured secret none can be created.
pub async fn register(
    repo: &dyn FullRepository,
    registration: &Registration,
    admin_secret: Option<&str>,
) -> ServiceResult<User> {
    let email = registration.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(ServiceError::validation("A valid email is required."));
    }
    if registration.password.is_empty() {
        return Err(ServiceError::validation("password is required."));
    }
    if registration.role == Role::Admin {
        let supplied = registration.admin_secret.as_deref();
        if admin_secret.is_none() || supplied != admin_secret {
            return Err(ServiceError::validation("Invalid admin secret key."));
        }
    }
    if repo.find_user_by_email(email).await?.is_some() {
        return Err(ServiceError::validation(
            "A user with this email already exists.",
        ));
    }

    let user = repo
        .create_user(&NewUser {
            email: email.to_string(),
            password_hash: hash_password(&registration.password),
            role: registration.role,
            company: registration.company,
            department: registration.department,
        })
        .await?;
    log::info!("Registered user {} as {}", user.id, user.role);
    Ok(user)
}

/// Check credentials and mint an access/refresh pair.
pub async fn login(
    repo: &dyn FullRepository,
    tokens: &TokenService,
    credentials: &Credentials,
) -> ServiceResult<Session> {
    if credentials.email.trim().is_empty() || credentials.password.is_empty() {
        return Err(ServiceError::validation("Email and password are required."));
    }
    let user = repo
        .find_user_by_email(credentials.email.trim())
        .await?
        .ok_or_else(|| ServiceError::not_found("User not found."))?;
    if !verify_password(&credentials.password, &user.password_hash) {
        log::warn!("Failed login for user {}", user.id);
        return Err(ServiceError::unauthorized("Invalid credentials."));
    }

    let access = tokens.issue(&user, TokenKind::Access).map_err(token_failure)?;
    let refresh = tokens.issue(&user, TokenKind::Refresh).map_err(token_failure)?;
    log::info!("User {} logged in", user.id);
    Ok(Session {
        access,
        refresh,
        user,
    })
}

/// Exchange a refresh token for a new access token.
pub async fn refresh(
    repo: &dyn FullRepository,
    tokens: &TokenService,
    refresh_token: Option<&str>,
) -> ServiceResult<(String, User)> {
    let token = refresh_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ServiceError::validation("Refresh token missing."))?;
    let claims = tokens
        .verify(token, TokenKind::Refresh)
        .map_err(token_failure)?;
    let user = load_token_user(repo, claims.user_id().map_err(token_failure)?).await?;
    let access = tokens.issue(&user, TokenKind::Access).map_err(token_failure)?;
    Ok((access, user))
}

/// Resolve a bearer access token into the calling [`Principal`].
pub async fn authenticate(
    repo: &dyn FullRepository,
    tokens: &TokenService,
    bearer: &str,
) -> ServiceResult<Principal> {
    let claims = tokens
        .verify(bearer, TokenKind::Access)
        .map_err(token_failure)?;
    let user = load_token_user(repo, claims.user_id().map_err(token_failure)?).await?;
    Ok(Principal::from(&user))
}

async fn load_token_user(repo: &dyn FullRepository, id: crate::api::UserId) -> ServiceResult<User> {
    match repo.get_user(id).await {
        Ok(user) => Ok(user),
        Err(e) if e.is_not_found() => Err(ServiceError::unauthorized("User no longer exists.")),
        Err(e) => Err(e.into()),
    }
}
