//! HTTP Basic auth guarding the operator endpoints (state export/import)

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD, Engine};
use std::sync::Arc;

const REALM: &str = "Basic realm=\"HotShot Operator\"";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorCredentials {
    pub username: String,
    pub password: String,
}

impl OperatorCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    fn matches(&self, username: &str, password: &str) -> bool {
        // `&` keeps both comparisons running
        let user_ok = constant_time_eq(self.username.as_bytes(), username.as_bytes());
        let pass_ok = constant_time_eq(self.password.as_bytes(), password.as_bytes());
        user_ok & pass_ok
    }
}

/// Operator auth settings. `None` leaves the operator routes open.
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    pub operator: Option<OperatorCredentials>,
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl AuthConfig {
    /// Read OPERATOR_USERNAME / OPERATOR_PASSWORD. Both are needed to turn auth on.
    pub fn from_env() -> Self {
        match (non_empty_env("OPERATOR_USERNAME"), non_empty_env("OPERATOR_PASSWORD")) {
            (Some(username), Some(password)) => {
                tracing::info!("Operator authentication enabled for '{}'", username);
                Self::with_operator(username, password)
            }
            (user, pass) => {
                if user.is_some() != pass.is_some() {
                    tracing::warn!("Only one of OPERATOR_USERNAME / OPERATOR_PASSWORD is set, ignoring it");
                }
                tracing::warn!("Operator authentication DISABLED - anyone can export or import state!");
                Self::disabled()
            }
        }
    }

    pub fn with_operator(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            operator: Some(OperatorCredentials::new(username, password)),
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.operator.is_some()
    }

    /// Whether a request carrying these headers may reach operator routes
    pub fn permits(&self, headers: &HeaderMap) -> bool {
        let Some(expected) = &self.operator else {
            return true;
        };
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(decode_basic)
            .is_some_and(|(user, pass)| expected.matches(&user, &pass))
    }
}

/// Split an `Authorization: Basic <b64(user:pass)>` value into its parts
fn decode_basic(value: &str) -> Option<(String, String)> {
    let encoded = value.strip_prefix("Basic ")?;
    let raw = STANDARD.decode(encoded.trim()).ok()?;
    let text = String::from_utf8(raw).ok()?;
    let (user, pass) = text.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}

/// Compare without short-circuiting on the first differing byte
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

pub async fn operator_auth_middleware(
    State(auth): State<Arc<AuthConfig>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if auth.permits(request.headers()) {
        return next.run(request).await;
    }

    tracing::warn!("Rejected operator request to {}", request.uri().path());
    (StatusCode::UNAUTHORIZED, [(header::WWW_AUTHENTICATE, REALM)], "Unauthorized").into_response()
}
