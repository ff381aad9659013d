//! Bearer-token authentication for the portal's private routes.
//!
//! Tokens are issued by the external identity provider (sign-up, sign-in,
//! password reset all happen there) as HS256 JWTs whose `sub` is the user
//! id. The middleware verifies them against the configured [`JwtSecret`] and
//! hands the user id to handlers as an `Extension<String>`.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use log::{debug, error, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    #[serde(default)]
    pub email: Option<String>,
}

fn auth_error(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

/// Shared secret tokens are signed with. Without one every private request
/// is refused with a 500.
#[derive(Debug, Clone, Default)]
pub struct JwtSecret(Option<Arc<str>>);

impl JwtSecret {
    pub fn new(secret: Option<String>) -> Self {
        Self(secret.filter(|s| !s.is_empty()).map(Arc::from))
    }

    pub fn is_configured(&self) -> bool {
        self.0.is_some()
    }
}

/// Verifies a token and returns the user id it was issued for.
pub fn verify_token(token: &str, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )?;
    Ok(data.claims.sub)
}

pub async fn auth_middleware(
    State(secret): State<JwtSecret>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(secret) = secret.0 else {
        error!("JWT_SECRET is not configured; rejecting authenticated request");
        return auth_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Authentication is not configured",
        );
    };

    let header = match req.headers().get(AUTHORIZATION) {
        Some(value) => value.to_str().unwrap_or_default().to_string(),
        None => {
            debug!("Missing Authorization header for {}", req.uri());
            return auth_error(StatusCode::UNAUTHORIZED, "Missing Authorization header");
        }
    };

    let Some(token) = header.strip_prefix("Bearer ") else {
        return auth_error(StatusCode::UNAUTHORIZED, "Expected a Bearer token");
    };

    match verify_token(token.trim(), &secret) {
        Ok(user_id) if !user_id.is_empty() => {
            debug!("Authenticated user {}", user_id);
            req.extensions_mut().insert(user_id);
            next.run(req).await
        }
        Ok(_) => auth_error(StatusCode::UNAUTHORIZED, "Token has no subject"),
        Err(e) => {
            warn!("Rejected token: {}", e);
            auth_error(StatusCode::UNAUTHORIZED, "Invalid or expired token")
        }
    }
}

#[cfg(any(test, feature = "test_utils"))]
pub const TEST_JWT_SECRET: &str = "pena-test-secret";

/// Signs a token for `user_id` with the test secret, valid for one hour.
#[cfg(any(test, feature = "test_utils"))]
pub fn create_test_token(user_id: &str) -> String {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let claims = Claims {
        sub: user_id.to_string(),
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        email: None,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .expect("test token encodes")
}

/// Builds a JSON request authenticated as `user_id`. Pass an empty user id
/// for an anonymous request.
#[cfg(any(test, feature = "test_utils"))]
pub fn create_test_request(
    method: &str,
    uri: &str,
    user_id: &str,
    body: Option<serde_json::Value>,
) -> Request {
    use axum::body::Body;

    let mut builder = http::Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");

    if !user_id.is_empty() {
        builder = builder.header(
            AUTHORIZATION,
            format!("Bearer {}", create_test_token(user_id)),
        );
    }

    let body = match body {
        Some(json) => Body::from(json.to_string()),
        None => Body::empty(),
    };

    builder.body(body).expect("test request builds")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_secret_is_not_configured() {
        assert!(!JwtSecret::new(None).is_configured());
        assert!(!JwtSecret::new(Some(String::new())).is_configured());
        assert!(JwtSecret::new(Some(TEST_JWT_SECRET.to_string())).is_configured());
    }

    #[test]
    fn test_verify_round_trip() {
        let token = create_test_token("user-1");
        assert_eq!(verify_token(&token, TEST_JWT_SECRET).unwrap(), "user-1");
        assert!(verify_token(&token, "other-secret").is_err());
        assert!(verify_token("not-a-jwt", TEST_JWT_SECRET).is_err());
    }
}
