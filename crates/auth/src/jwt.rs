//! Bearer-token decoding.
//!
//! Signature verification is delegated to `jsonwebtoken`; the time-window
//! checks stay in [`crate::validate_claims`] so they remain deterministic and
//! testable without key material.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use thiserror::Error;

use crate::claims::{JwtClaims, TokenValidationError, validate_claims};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JwtError {
    #[error("token could not be decoded or its signature is invalid")]
    Invalid,

    #[error(transparent)]
    Claims(#[from] TokenValidationError),
}

/// Token validation seam consumed by the HTTP middleware.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, JwtError>;
}

/// HS256 validator over a shared secret.
pub struct Hs256JwtValidator {
    key: DecodingKey,
}

impl Hs256JwtValidator {
    pub fn new(secret: Vec<u8>) -> Self {
        Self {
            key: DecodingKey::from_secret(&secret),
        }
    }
}

impl JwtValidator for Hs256JwtValidator {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, JwtError> {
        // Claims carry RFC3339 timestamps instead of numeric `exp`/`iat`, so
        // the library's registered-claim checks are disabled; the time window
        // is enforced by `validate_claims` below.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;

        let data = jsonwebtoken::decode::<JwtClaims>(token, &self.key, &validation)
            .map_err(|_| JwtError::Invalid)?;

        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use jsonwebtoken::{EncodingKey, Header};

    use bims_core::UserId;

    use crate::Role;

    fn mint(secret: &str, issued_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> String {
        let claims = JwtClaims {
            sub: UserId::new(),
            roles: vec![Role::new("staff")],
            resident_id: None,
            issued_at,
            expires_at,
        };
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn round_trips_a_valid_token() {
        let now = Utc::now();
        let token = mint("secret", now - Duration::minutes(1), now + Duration::minutes(10));
        let validator = Hs256JwtValidator::new(b"secret".to_vec());
        let claims = validator.validate(&token, now).unwrap();
        assert_eq!(claims.roles, vec![Role::new("staff")]);
    }

    #[test]
    fn rejects_wrong_secret() {
        let now = Utc::now();
        let token = mint("secret", now - Duration::minutes(1), now + Duration::minutes(10));
        let validator = Hs256JwtValidator::new(b"other".to_vec());
        assert_eq!(validator.validate(&token, now).unwrap_err(), JwtError::Invalid);
    }

    #[test]
    fn rejects_expired_token() {
        let now = Utc::now();
        let token = mint("secret", now - Duration::minutes(20), now - Duration::minutes(5));
        let validator = Hs256JwtValidator::new(b"secret".to_vec());
        assert_eq!(
            validator.validate(&token, now).unwrap_err(),
            JwtError::Claims(TokenValidationError::Expired)
        );
    }
}
