//! Session token signing and verification

use std::fmt;

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Session lifetime: 48 hours
pub const SESSION_TTL_SECS: i64 = 48 * 60 * 60;

/// Token payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User handle
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,

    #[error("invalid token: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),

    #[error("failed to sign token: {0}")]
    Sign(#[source] jsonwebtoken::errors::Error),
}

/// Issues and verifies session tokens with one shared secret
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl_secs: i64,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl_secs", &self.ttl_secs)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        Self::with_ttl(secret, SESSION_TTL_SECS)
    }

    pub fn with_ttl(secret: &str, ttl_secs: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl_secs,
        }
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    /// Sign a fresh token for `handle`, valid from now.
    pub fn issue(&self, handle: &str) -> Result<String, TokenError> {
        self.issue_at(handle, Utc::now().timestamp())
    }

    /// Sign a token as if issued at unix time `iat`.
    pub fn issue_at(&self, handle: &str, iat: i64) -> Result<String, TokenError> {
        let claims = Claims {
            username: handle.to_owned(),
            iat,
            exp: iat + self.ttl_secs,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(TokenError::Sign)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_then_verify() {
        let tokens = TokenService::new("test-secret");
        let token = tokens.issue("inkwell").unwrap();
        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.username, "inkwell");
        assert_eq!(claims.exp - claims.iat, SESSION_TTL_SECS);
    }

    #[test]
    fn expired_token_rejected() {
        let tokens = TokenService::new("test-secret");
        let long_ago = Utc::now().timestamp() - SESSION_TTL_SECS - 60;
        let token = tokens.issue_at("inkwell", long_ago).unwrap();
        assert!(matches!(tokens.verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn wrong_secret_rejected() {
        let token = TokenService::new("one").issue("inkwell").unwrap();
        let err = TokenService::new("two").verify(&token).unwrap_err();
        assert!(matches!(err, TokenError::Invalid(_)));
        assert!(matches!(
            TokenService::new("one").verify("not-a-jwt"),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn debug_hides_keys() {
        let debug = format!("{:?}", TokenService::new("super-secret"));
        assert!(!debug.contains("super-secret"));
    }
}
