// Admin basic-auth gate
//
// A single static credential pair from ADMIN_USERNAME / ADMIN_PASSWORD. When
// either is missing every admin request is rejected.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use sha2::{Digest, Sha256};

/// Digest of the expected `user:password` pair
#[derive(Clone)]
pub struct AdminCredentials {
    digest: Option<[u8; 32]>,
}

impl AdminCredentials {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            digest: Some(digest(format!("{username}:{password}").as_bytes())),
        }
    }

    /// Credentials that accept nothing
    pub fn disabled() -> Self {
        Self { digest: None }
    }

    pub fn from_env() -> Self {
        match (
            std::env::var("ADMIN_USERNAME"),
            std::env::var("ADMIN_PASSWORD"),
        ) {
            (Ok(username), Ok(password)) if !username.is_empty() && !password.is_empty() => {
                Self::new(&username, &password)
            }
            _ => Self::disabled(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.digest.is_some()
    }

    /// Check an `Authorization` header value
    pub fn verify(&self, authorization: &str) -> bool {
        let Some(expected) = &self.digest else {
            return false;
        };

        let Some(encoded) = authorization
            .strip_prefix("Basic ")
            .or_else(|| authorization.strip_prefix("basic "))
        else {
            return false;
        };

        match STANDARD.decode(encoded.trim()) {
            Ok(decoded) => digest(&decoded) == *expected,
            Err(_) => false,
        }
    }
}

fn digest(bytes: &[u8]) -> [u8; 32] {
    Sha256::digest(bytes).into()
}

/// Middleware rejecting requests without valid admin credentials
pub async fn require_admin(
    State(credentials): State<AdminCredentials>,
    request: Request,
    next: Next,
) -> Response {
    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .is_some_and(|value| credentials.verify(value));

    if !authorized {
        tracing::warn!(path = %request.uri().path(), "Rejected admin request");
        return (
            StatusCode::UNAUTHORIZED,
            [(header::WWW_AUTHENTICATE, "Basic realm=\"bugbash-admin\"")],
        )
            .into_response();
    }

    next.run(request).await
}
