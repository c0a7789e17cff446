// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use taskhub_core::Error;
use taskhub_model::{User, UserId};

use crate::config::AuthConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Decimal user id.
    pub sub: String,
    pub username: String,
    pub iat: u64,
    pub exp: u64,
    pub iss: String,
}

impl Claims {
    pub fn user_id(&self) -> Result<UserId, Error> {
        UserId::parse(&self.sub).map_err(|_| Error::unauthorized("token subject is not a user id"))
    }
}

fn unix_secs(at: DateTime<Utc>) -> u64 {
    u64::try_from(at.timestamp()).unwrap_or(0)
}

/// HS256 session tokens. Issue and expiry both run on the caller's `now`.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    ttl_secs: u64,
}

impl TokenService {
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.jwt_secret.as_bytes();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            issuer: config.jwt_issuer.clone(),
            ttl_secs: config.token_ttl.as_secs(),
        }
    }

    pub fn issue(&self, user: &User, now: DateTime<Utc>) -> Result<String, Error> {
        let iat = unix_secs(now);
        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            iat,
            exp: iat.saturating_add(self.ttl_secs),
            iss: self.issuer.clone(),
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| Error::internal(format!("token signing failed: {e}")))
    }

    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.validate_exp = false;
        let claims = jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| Error::unauthorized(format!("invalid token: {e}")))?;
        if claims.exp.saturating_add(validation.leeway) < unix_secs(now) {
            return Err(Error::unauthorized("token expired"));
        }
        claims.user_id()?;
        Ok(claims)
    }
}
