// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session verification.
//!
//! Sessions are issued by the surrounding product; this service only checks
//! the HS256 signature and expiry and turns the subject into an [`AuthUser`].
//! Browsers send the `session_token` cookie, API clients a bearer header.
//! When a request carries both, the bearer header is used.

use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Cookie carrying the session JWT.
pub const SESSION_COOKIE: &str = "session_token";

/// Lifetime of sessions minted by [`create_jwt`].
const SESSION_TTL_SECS: usize = 30 * 24 * 60 * 60;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Numeric user ID as a decimal string.
    pub sub: String,
    pub exp: usize,
    pub iat: usize,
}

/// The verified caller, stored as a request extension.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
}

/// Raw session token from the request, if any.
fn session_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    match bearer {
        Some(token) => Some(token.to_string()),
        None => jar
            .get(SESSION_COOKIE)
            .map(|cookie| cookie.value().to_string()),
    }
}

fn verify(token: &str, signing_key: &[u8]) -> Option<AuthUser> {
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(signing_key),
        &Validation::new(Algorithm::HS256),
    )
    .ok()?
    .claims;

    let user_id = claims.sub.parse().ok()?;
    Some(AuthUser { user_id })
}

/// Reject the request with 401 unless it carries a valid session.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let user = session_token(&jar, request.headers())
        .and_then(|token| verify(&token, &state.config.jwt_signing_key))
        .ok_or(StatusCode::UNAUTHORIZED)?;

    tracing::trace!(user_id = user.user_id, "Session verified");
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Mint a session for `user_id`. Used by tooling and tests that stand in
/// for the issuing product.
pub fn create_jwt(user_id: u64, signing_key: &[u8]) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    let iat = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;
    let claims = Claims {
        sub: user_id.to_string(),
        iat,
        exp: iat + SESSION_TTL_SECS,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use axum_extra::extract::cookie::Cookie;

    const KEY: &[u8] = b"unit-test-signing-key";

    fn bearer(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_header_preferred_over_cookie() {
        let jar = CookieJar::new().add(Cookie::new(SESSION_COOKIE, "from-cookie"));
        let token = session_token(&jar, &bearer("Bearer from-header"));
        assert_eq!(token.as_deref(), Some("from-header"));
    }

    #[test]
    fn test_cookie_used_without_bearer() {
        let jar = CookieJar::new().add(Cookie::new(SESSION_COOKIE, "from-cookie"));
        assert_eq!(
            session_token(&jar, &HeaderMap::new()).as_deref(),
            Some("from-cookie")
        );
        // A non-bearer scheme does not shadow the cookie
        assert_eq!(
            session_token(&jar, &bearer("Basic abc")).as_deref(),
            Some("from-cookie")
        );
    }

    #[test]
    fn test_no_credentials() {
        assert!(session_token(&CookieJar::new(), &HeaderMap::new()).is_none());
        assert!(session_token(&CookieJar::new(), &bearer("Bearer ")).is_none());
    }

    #[test]
    fn test_verify_round_trips_user_id() {
        let token = create_jwt(42, KEY).unwrap();
        assert_eq!(verify(&token, KEY).map(|u| u.user_id), Some(42));
        assert!(verify(&token, b"some-other-key").is_none());
    }
}
