// SPDX-License-Identifier: Apache-2.0

use serde::Serialize;
use std::time::Duration;

/// Secrets shorter than this still start the server but log a warning.
pub const RECOMMENDED_SECRET_BYTES: usize = 32;

#[derive(Debug, Clone, Serialize)]
pub struct AuthConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub token_ttl: Duration,
    pub min_password_chars: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            jwt_issuer: "taskhub".to_string(),
            token_ttl: Duration::from_secs(86_400),
            min_password_chars: 8,
        }
    }
}

impl AuthConfig {
    #[must_use]
    pub fn has_weak_secret(&self) -> bool {
        self.jwt_secret.len() < RECOMMENDED_SECRET_BYTES
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiConfig {
    pub max_body_bytes: usize,
    pub max_upload_bytes: usize,
    pub search_limit: usize,
    pub shutdown_drain: Duration,
    pub auth: AuthConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 64 * 1024,
            max_upload_bytes: 10 * 1024 * 1024,
            search_limit: 20,
            shutdown_drain: Duration::from_millis(5000),
            auth: AuthConfig::default(),
        }
    }
}

pub fn validate_startup_config_contract(api: &ApiConfig) -> Result<(), String> {
    if api.max_body_bytes == 0 || api.max_upload_bytes == 0 {
        return Err("api size limits must be > 0".to_string());
    }
    if api.search_limit == 0 {
        return Err("search limit must be > 0".to_string());
    }
    if api.auth.jwt_secret.trim().is_empty() {
        return Err("TASKHUB_JWT_SECRET must be set to a non-empty value".to_string());
    }
    if api.auth.jwt_issuer.trim().is_empty() {
        return Err("jwt issuer must not be empty".to_string());
    }
    if api.auth.token_ttl.is_zero() {
        return Err("token ttl must be > 0".to_string());
    }
    if api.auth.min_password_chars == 0 {
        return Err("minimum password length must be > 0".to_string());
    }
    Ok(())
}
