//! Wire-only response bodies.
//!
//! Request bodies reuse the service input types and model drafts directly.

use serde::{Deserialize, Serialize};

use crate::api::User;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
}

/// Login and refresh response; the refresh token travels as a cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessResponse {
    pub access: String,
    pub user: User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub detail: String,
}

impl MessageResponse {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}
