//! Token service: issuance and verification of bearer tokens
//!
//! Tokens are compact three-segment JWTs signed with HMAC-SHA256 over a
//! server-held secret. Verification is purely cryptographic: signature
//! recomputation plus expiry check, no session lookup. A logged-out token
//! therefore stays valid until its natural expiry; session invalidation is
//! tracked separately in the sessions table.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::User;

/// Token configuration
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// Secret used to sign and verify tokens
    pub secret: String,
    /// Token lifetime in seconds (default: 24 hours)
    pub ttl_seconds: u64,
}

impl TokenConfig {
    /// Create a new TokenConfig from environment variables
    ///
    /// # Environment Variables
    /// - `TOKEN_SECRET`: signing secret (required)
    /// - `TOKEN_TTL_SECONDS`: token lifetime in seconds (default: 86400)
    pub fn from_env() -> Result<Self> {
        let secret = std::env::var("TOKEN_SECRET")
            .map_err(|_| anyhow::anyhow!("TOKEN_SECRET environment variable not set"))?;

        let ttl_seconds = std::env::var("TOKEN_TTL_SECONDS")
            .unwrap_or_else(|_| "86400".to_string())
            .parse()
            .unwrap_or(86400);

        Ok(TokenConfig {
            secret,
            ttl_seconds,
        })
    }
}

/// Token claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,
    /// Username at issuance time
    pub username: String,
    /// Issued at time (unix seconds)
    pub iat: u64,
    /// Expiration time (unix seconds)
    pub exp: u64,
}

/// A freshly issued token together with its expiry
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Token service
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_seconds: u64,
}

impl TokenService {
    /// Initialize a new token service
    pub fn new(config: &TokenConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        TokenService {
            encoding_key,
            decoding_key,
            validation,
            ttl_seconds: config.ttl_seconds,
        }
    }

    /// Issue a token for a user, expiring `ttl_seconds` from now
    pub fn issue(&self, user: &User) -> Result<IssuedToken> {
        self.issue_at(user, Utc::now())
    }

    fn issue_at(&self, user: &User, now: DateTime<Utc>) -> Result<IssuedToken> {
        let iat = now.timestamp() as u64;
        let claims = Claims {
            sub: user.id,
            username: user.username.clone(),
            iat,
            exp: iat + self.ttl_seconds,
        };

        let token = encode(
            &Header::new(jsonwebtoken::Algorithm::HS256),
            &claims,
            &self.encoding_key,
        )?;

        Ok(IssuedToken {
            token,
            expires_at: now + Duration::seconds(self.ttl_seconds as i64),
        })
    }

    /// Verify a token and return its claims
    ///
    /// Rejects on malformed input, signature mismatch, or elapsed expiry.
    /// Callers cannot distinguish the three cases; all of them surface as
    /// an unauthorized request. Session revocation state is deliberately
    /// not consulted here.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(token_data.claims)
    }

    /// Get the configured token lifetime
    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn test_user() -> User {
        User {
            id: Uuid::new_v4(),
            username: "ines".to_string(),
            email: "ines@example.com".to_string(),
            password_hash: "hash".to_string(),
            profile_image_url: None,
            is_private: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn test_service() -> TokenService {
        TokenService::new(&TokenConfig {
            secret: "unit-test-secret".to_string(),
            ttl_seconds: 3600,
        })
    }

    #[test]
    fn issued_token_verifies_to_subject() {
        let service = test_service();
        let user = test_user();

        let issued = service.issue(&user).unwrap();
        let claims = service.verify(&issued.token).unwrap();

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.username, user.username);
        assert_eq!(claims.exp, claims.iat + 3600);
    }

    #[test]
    fn tampered_signature_is_rejected() {
        let service = test_service();
        let issued = service.issue(&test_user()).unwrap();

        let (head, sig) = issued.token.rsplit_once('.').unwrap();
        let mut sig: Vec<u8> = sig.bytes().collect();
        let mid = sig.len() / 2;
        sig[mid] = if sig[mid] == b'a' { b'b' } else { b'a' };
        let forged = format!("{}.{}", head, String::from_utf8(sig).unwrap());

        assert!(service.verify(&forged).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let service = test_service();
        let user = test_user();

        // Issued far enough in the past that the expiry has elapsed.
        let stale = Utc::now() - Duration::seconds(3600 + 60);
        let issued = service.issue_at(&user, stale).unwrap();

        assert!(service.verify(&issued.token).is_err());
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        let service = test_service();

        assert!(service.verify("").is_err());
        assert!(service.verify("garbage").is_err());
        assert!(service.verify("only.two").is_err());
        assert!(service.verify("a.b.c.d").is_err());
    }

    #[test]
    #[serial]
    fn token_config_from_env() {
        unsafe {
            std::env::set_var("TOKEN_SECRET", "env-secret");
            std::env::set_var("TOKEN_TTL_SECONDS", "1200");
        }

        let config = TokenConfig::from_env().unwrap();
        assert_eq!(config.secret, "env-secret");
        assert_eq!(config.ttl_seconds, 1200);

        unsafe {
            std::env::remove_var("TOKEN_SECRET");
            std::env::remove_var("TOKEN_TTL_SECONDS");
        }
    }

    #[test]
    #[serial]
    fn token_config_requires_secret() {
        unsafe {
            std::env::remove_var("TOKEN_SECRET");
        }

        assert!(TokenConfig::from_env().is_err());
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let service = test_service();
        let other = TokenService::new(&TokenConfig {
            secret: "a-different-secret".to_string(),
            ttl_seconds: 3600,
        });

        let issued = other.issue(&test_user()).unwrap();
        assert!(service.verify(&issued.token).is_err());
    }
}
