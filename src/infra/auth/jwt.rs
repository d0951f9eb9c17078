use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::domain::error::AppError;
use crate::domain::id::UserId;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: i64,
}

/// Mints and verifies bearer tokens carrying a user id. Grounded in the
/// original's `token.JWTTokener`; expiry is configurable rather than the
/// original's fixed 24h.
#[derive(Clone)]
pub struct Tokener {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expires: Duration,
}

impl Tokener {
    pub fn new(secret: &str, expires: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expires,
        }
    }

    pub fn create(&self, id: UserId) -> Result<String, AppError> {
        let exp = (Utc::now() + self.expires).timestamp();
        let claims = Claims {
            sub: id.as_uuid().to_string(),
            exp,
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("token mint failed: {e}")))
    }

    pub fn verify(&self, token: &str) -> Result<UserId, AppError> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map_err(|e| AppError::unauthorized(format!("invalid token: {e}")))?;
        let uuid = uuid::Uuid::parse_str(&data.claims.sub)
            .map_err(|e| AppError::unauthorized(format!("invalid token subject: {e}")))?;
        Ok(UserId::from_uuid(uuid))
    }
}
