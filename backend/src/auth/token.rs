//! Signed access and refresh tokens (HS256 JWT).

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::{Role, User, UserId};

/// Access tokens authenticate API calls; refresh tokens only mint new
/// access tokens.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id as a decimal string.
    pub sub: String,
    pub role: Role,
    pub typ: TokenKind,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> Result<UserId, TokenError> {
        self.sub
            .parse::<i64>()
            .map(UserId::new)
            .map_err(|_| TokenError::Invalid("subject is not a user id".to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("invalid token: {0}")]
    Invalid(String),
    #[error("expected a {expected:?} token")]
    WrongKind { expected: TokenKind },
    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Issues and verifies tokens with a shared HMAC secret.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(secret: &str, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    pub fn issue(&self, user: &User, kind: TokenKind) -> Result<String, TokenError> {
        let now = Utc::now();
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let expires = now
            .checked_add_signed(ttl)
            .ok_or_else(|| TokenError::Signing("token lifetime overflows the clock".to_string()))?;
        let claims = Claims {
            sub: user.id.to_string(),
            role: user.role,
            typ: kind,
            iat: now.timestamp(),
            exp: expires.timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Decode and check signature, expiry and kind.
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<Claims, TokenError> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|e| TokenError::Invalid(e.to_string()))?;
        if data.claims.typ != expected {
            return Err(TokenError::WrongKind { expected });
        }
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: UserId::new(42),
            email: "tech@test.com".to_string(),
            password_hash: String::new(),
            role: Role::Technician,
            company: None,
            department: None,
        }
    }

    fn service() -> TokenService {
        TokenService::new("test-secret", Duration::minutes(30), Duration::days(7))
    }

    #[test]
    fn test_issue_and_verify_access() {
        let tokens = service();
        let token = tokens.issue(&user(), TokenKind::Access).unwrap();
        let claims = tokens.verify(&token, TokenKind::Access).unwrap();
        assert_eq!(claims.user_id().unwrap(), UserId::new(42));
        assert_eq!(claims.role, Role::Technician);
        assert_eq!(claims.exp - claims.iat, 30 * 60);
    }

    #[test]
    fn test_refresh_token_is_not_an_access_token() {
        let tokens = service();
        let refresh = tokens.issue(&user(), TokenKind::Refresh).unwrap();
        let err = tokens.verify(&refresh, TokenKind::Access).unwrap_err();
        assert_eq!(
            err,
            TokenError::WrongKind {
                expected: TokenKind::Access
            }
        );
        assert!(tokens.verify(&refresh, TokenKind::Refresh).is_ok());
    }

    #[test]
    fn test_foreign_secret_rejected() {
        let token = service().issue(&user(), TokenKind::Access).unwrap();
        let other = TokenService::new("other", Duration::minutes(30), Duration::days(7));
        assert!(matches!(
            other.verify(&token, TokenKind::Access),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        // Well past the default 60s leeway.
        let tokens = TokenService::new("s", Duration::minutes(-10), Duration::days(7));
        let token = tokens.issue(&user(), TokenKind::Access).unwrap();
        assert!(tokens.verify(&token, TokenKind::Access).is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(service().verify("not.a.jwt", TokenKind::Access).is_err());
    }

    #[test]
    fn test_lifetime_past_the_clock_is_a_signing_error() {
        let tokens = TokenService::new("test-secret", Duration::MAX, Duration::days(7));
        let err = tokens.issue(&user(), TokenKind::Access).unwrap_err();
        assert!(matches!(err, TokenError::Signing(_)));
    }
}
