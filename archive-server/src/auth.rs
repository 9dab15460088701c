//! Bearer token verification.
//!
//! Tokens are HS256 JWTs minted by the external campus auth service. This
//! module only verifies signature and expiry and extracts the actor's
//! identity and role; it never issues tokens. Role claims are trusted after
//! verification, and the domain layer enforces what each role may do.

use std::fmt;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::warn;

use archive_core::{Actor, ActorRole};

use crate::AppState;

/// Claims carried by an auth-service token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Actor identity: the email address known to the archive.
    pub sub: String,
    /// Asserted role: student, advisor, or coordinator.
    pub role: String,
    /// Expiry (unix seconds); validated by `jsonwebtoken`.
    pub exp: u64,
}

#[derive(Debug)]
pub enum AuthError {
    /// Signature/expiry validation failed or the token was malformed.
    InvalidToken(String),
    /// The token verified but carried a role the archive does not know.
    UnknownRole(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidToken(e) => write!(f, "invalid bearer token: {}", e),
            Self::UnknownRole(role) => write!(f, "unknown role claim '{}'", role),
        }
    }
}

/// Verifies bearer tokens against the shared auth-service secret.
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Verify a token and extract the actor it identifies.
    pub fn verify(&self, token: &str) -> Result<Actor, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        let role = ActorRole::parse(&data.claims.role)
            .ok_or_else(|| AuthError::UnknownRole(data.claims.role.clone()))?;

        Ok(Actor::new(data.claims.sub, role))
    }
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({
            "error": "unauthorized",
            "message": message,
        })),
    )
        .into_response()
}

/// Axum middleware: require a valid bearer token and stash the verified
/// `Actor` in request extensions for handlers to extract.
pub async fn require_bearer_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let token = match header_value {
        Some(value) if value.starts_with("Bearer ") => &value[7..],
        Some(_) => {
            return Err(unauthorized(
                "Invalid Authorization header format. Expected: Bearer <token>",
            ))
        }
        None => return Err(unauthorized("Missing Authorization header")),
    };

    match state.token_verifier.verify(token) {
        Ok(actor) => {
            request.extensions_mut().insert(actor);
            Ok(next.run(request).await)
        }
        Err(e) => {
            warn!("Rejected request: {}", e);
            Err(unauthorized(&e.to_string()))
        }
    }
}
