use axum::http::{header, HeaderMap};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use thiserror::Error;

use super::Claims;

/// Why a request was refused before reaching its handler
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthFailure {
    #[error("missing bearer token")]
    MissingToken,

    /// Bad scheme, bad signature, malformed or expired token
    #[error("invalid or expired token: {0}")]
    InvalidOrExpired(String),

    #[error("role '{required}' required")]
    InsufficientRole { required: String },
}

/// HS256 bearer token verifier holding the shared secret
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str, leeway_secs: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = leeway_secs;

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthFailure> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| AuthFailure::InvalidOrExpired(e.to_string()))?;

        if token_data.claims.sub.is_empty() {
            return Err(AuthFailure::InvalidOrExpired("empty subject".to_string()));
        }

        Ok(token_data.claims)
    }
}

/// Pull the token out of `Authorization: Bearer <token>`.
///
/// An absent header or an empty token is `MissingToken`; any other scheme is
/// treated as a present-but-invalid credential.
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, AuthFailure> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Err(AuthFailure::MissingToken);
    };

    let value = value
        .to_str()
        .map_err(|_| AuthFailure::InvalidOrExpired("non-ascii authorization header".to_string()))?
        .trim();

    if value.is_empty() {
        return Err(AuthFailure::MissingToken);
    }

    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") => {
            let token = token.trim();
            if token.is_empty() {
                Err(AuthFailure::MissingToken)
            } else {
                Ok(token)
            }
        }
        Some(_) => Err(AuthFailure::InvalidOrExpired(
            "authorization header must use Bearer scheme".to_string(),
        )),
        None if value.eq_ignore_ascii_case("bearer") => Err(AuthFailure::MissingToken),
        None => Err(AuthFailure::InvalidOrExpired(
            "authorization header must use Bearer scheme".to_string(),
        )),
    }
}

pub fn authorize(claims: &Claims, required_role: &str) -> Result<(), AuthFailure> {
    if claims.has_role(required_role) {
        Ok(())
    } else {
        Err(AuthFailure::InsufficientRole {
            required: required_role.to_string(),
        })
    }
}
