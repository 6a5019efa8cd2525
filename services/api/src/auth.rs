//! services/api/src/auth.rs
//!
//! Bearer-token identity resolution. Tokens are HS256-signed JWTs; the only
//! claim the rest of the service cares about is `sub`, the stable user
//! identifier. Verification failures all collapse to `Unauthorized` so the
//! response never hints at why a credential was rejected.

use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use recommendations_core::ports::{PortError, PortResult};

/// JWT claims embedded in every access token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject -- the stable user identifier.
    pub sub: String,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
}

/// Resolves bearer credentials into user identifiers.
///
/// Built once at startup from the configured secret and shared across
/// requests.
#[derive(Clone)]
pub struct JwtResolver {
    decoding_key: DecodingKey,
}

impl JwtResolver {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Validates the token signature and expiration, returning the `sub`
    /// claim on success.
    pub fn resolve(&self, token: &str) -> PortResult<String> {
        let token_data = decode::<Claims>(
            token,
            &self.decoding_key,
            &Validation::default(), // HS256, validates exp
        )
        .map_err(|_| PortError::Unauthorized)?;
        Ok(token_data.claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test-secret-that-is-long-enough-for-hmac";

    fn make_token(secret: &str, sub: &str, exp_offset_secs: i64) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: sub.to_string(),
            exp: now + exp_offset_secs,
            iat: now,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("encoding should succeed")
    }

    #[test]
    fn valid_token_resolves_to_sub() {
        let resolver = JwtResolver::new(SECRET);
        let token = make_token(SECRET, "google-oauth2|12345", 900);

        let user_id = resolver.resolve(&token).expect("token should validate");
        assert_eq!(user_id, "google-oauth2|12345");
    }

    #[test]
    fn expired_token_is_unauthorized() {
        let resolver = JwtResolver::new(SECRET);
        // Expired well past the default 60-second leeway.
        let token = make_token(SECRET, "u1", -300);

        let result = resolver.resolve(&token);
        assert!(matches!(result, Err(PortError::Unauthorized)));
    }

    #[test]
    fn token_signed_with_other_secret_is_unauthorized() {
        let resolver = JwtResolver::new(SECRET);
        let token = make_token("a-completely-different-secret", "u1", 900);

        let result = resolver.resolve(&token);
        assert!(matches!(result, Err(PortError::Unauthorized)));
    }

    #[test]
    fn garbage_token_is_unauthorized() {
        let resolver = JwtResolver::new(SECRET);
        let result = resolver.resolve("not-a-jwt");
        assert!(matches!(result, Err(PortError::Unauthorized)));
    }
}
