//! Authentication middleware for bearer token verification
//!
//! Verification here is purely cryptographic (signature + expiry over the
//! shared secret); the sessions table is not consulted, so a logged-out
//! token keeps working until its natural expiry.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use anyhow::Result;
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::Deserialize;
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

/// Claims carried by an issued token (verification-side view)
#[derive(Debug, Deserialize)]
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

/// Authenticated caller resolved from a verified token
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
}

/// Stateless token verifier over the shared server secret
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    /// Build a verifier from the `TOKEN_SECRET` environment variable
    pub fn from_env() -> Result<Self> {
        let secret = std::env::var("TOKEN_SECRET")
            .map_err(|_| anyhow::anyhow!("TOKEN_SECRET environment variable not set"))?;

        Ok(Self::new(secret.as_bytes()))
    }

    /// Build a verifier from a raw secret
    pub fn new(secret: &[u8]) -> Self {
        let decoding_key = DecodingKey::from_secret(secret);
        let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        TokenVerifier {
            decoding_key,
            validation,
        }
    }

    /// Verify a token, rejecting malformed input, bad signatures, and
    /// elapsed expiry alike
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(token_data.claims)
    }
}

/// Authentication middleware
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(ApiError::Unauthorized)?;

    let claims = state
        .token_verifier
        .verify(token)
        .map_err(|_| ApiError::Unauthorized)?;

    req.extensions_mut().insert(AuthUser {
        id: claims.sub,
        username: claims.username,
    });

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde::Serialize;

    #[derive(Serialize)]
    struct TestClaims {
        sub: Uuid,
        username: String,
        iat: u64,
        exp: u64,
    }

    fn mint(secret: &[u8], exp_offset: i64) -> (Uuid, String) {
        let now = chrono::Utc::now().timestamp();
        let sub = Uuid::new_v4();
        let claims = TestClaims {
            sub,
            username: "carla".to_string(),
            iat: now as u64,
            exp: (now + exp_offset) as u64,
        };
        let token = encode(
            &Header::new(jsonwebtoken::Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret),
        )
        .unwrap();
        (sub, token)
    }

    #[test]
    fn valid_token_resolves_subject() {
        let verifier = TokenVerifier::new(b"shared-secret");
        let (sub, token) = mint(b"shared-secret", 3600);

        let claims = verifier.verify(&token).unwrap();
        assert_eq!(claims.sub, sub);
        assert_eq!(claims.username, "carla");
    }

    #[test]
    fn expired_token_is_rejected() {
        let verifier = TokenVerifier::new(b"shared-secret");
        let (_, token) = mint(b"shared-secret", -120);

        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn foreign_secret_is_rejected() {
        let verifier = TokenVerifier::new(b"shared-secret");
        let (_, token) = mint(b"other-secret", 3600);

        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn malformed_token_is_rejected() {
        let verifier = TokenVerifier::new(b"shared-secret");
        assert!(verifier.verify("definitely-not-a-token").is_err());
    }
}
