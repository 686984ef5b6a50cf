//! Bearer token decoding and signature verification.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use thiserror::Error;

use crate::claims::{JwtClaims, TokenValidationError, validate_claims};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JwtError {
    /// Bad signature, wrong algorithm, or a payload that is not [`JwtClaims`].
    #[error("malformed or unsigned token: {0}")]
    Malformed(String),

    #[error(transparent)]
    Claims(#[from] TokenValidationError),
}

/// Turns a raw bearer token into trusted claims.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, JwtError>;
}

/// HMAC-SHA256 validator with a shared secret.
pub struct Hs256JwtValidator {
    key: DecodingKey,
    validation: Validation,
}

impl Hs256JwtValidator {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Claims carry RFC 3339 timestamps rather than `exp`/`iat`; the time
        // window is checked by `validate_claims` instead.
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Self {
            key: DecodingKey::from_secret(secret.as_ref()),
            validation,
        }
    }
}

impl core::fmt::Debug for Hs256JwtValidator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Hs256JwtValidator").finish_non_exhaustive()
    }
}

impl JwtValidator for Hs256JwtValidator {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, JwtError> {
        let data = decode::<JwtClaims>(token, &self.key, &self.validation)
            .map_err(|e| JwtError::Malformed(e.to_string()))?;
        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use jsonwebtoken::{EncodingKey, Header, encode};

    use super::*;
    use crate::{PrincipalId, Role};

    fn mint(secret: &str, claims: &JwtClaims, alg: Algorithm) -> String {
        encode(&Header::new(alg), claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    fn claims(now: DateTime<Utc>) -> JwtClaims {
        JwtClaims {
            sub: PrincipalId::new(),
            roles: vec![Role::new("viewer")],
            issued_at: now - Duration::minutes(1),
            expires_at: now + Duration::hours(1),
        }
    }

    #[test]
    fn valid_token_yields_claims() {
        let now = Utc::now();
        let c = claims(now);
        let token = mint("secret", &c, Algorithm::HS256);

        let v = Hs256JwtValidator::new("secret");
        assert_eq!(v.validate(&token, now), Ok(c));
    }

    #[test]
    fn wrong_secret_or_algorithm_is_malformed() {
        let now = Utc::now();
        let v = Hs256JwtValidator::new("secret");

        let forged = mint("other", &claims(now), Algorithm::HS256);
        assert!(matches!(v.validate(&forged, now), Err(JwtError::Malformed(_))));

        let hs512 = mint("secret", &claims(now), Algorithm::HS512);
        assert!(matches!(v.validate(&hs512, now), Err(JwtError::Malformed(_))));

        assert!(matches!(v.validate("not-a-jwt", now), Err(JwtError::Malformed(_))));
    }

    #[test]
    fn expired_token_is_rejected_after_signature_check() {
        let now = Utc::now();
        let token = mint("secret", &claims(now), Algorithm::HS256);
        let v = Hs256JwtValidator::new("secret");

        assert_eq!(
            v.validate(&token, now + Duration::hours(2)),
            Err(JwtError::Claims(TokenValidationError::Expired))
        );
    }
}
