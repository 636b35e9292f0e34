//! Shared HTTP plumbing
//!
//! Builds URLs, attaches the session identity and turns every failure into
//! a `dotask_core::Error` at the call boundary.

use std::sync::Arc;

use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use dotask_core::session::SessionStore;
use dotask_core::{Error, Result};

use crate::config::{AuthScheme, ClientConfig};

pub const USER_ID_HEADER: &str = "X-User-ID";

/// Build a readable message from an error response body.
///
/// Accepts `{"message": ..}`, `{"error": ..}` or a field-to-message map
/// (validation errors), and falls back to the status code when the body is
/// empty or not JSON.
pub(crate) fn error_message(status: StatusCode, body: &str) -> String {
    let fallback = || format!("HTTP error! status: {}", status.as_u16());
    let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(body) else {
        return fallback();
    };

    for key in ["message", "error"] {
        if let Some(Value::String(message)) = fields.get(key) {
            if !message.is_empty() {
                return message.clone();
            }
        }
    }

    let joined: Vec<String> = fields
        .values()
        .filter(|value| !value.is_null())
        .map(|value| match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect();
    if joined.is_empty() {
        fallback()
    } else {
        joined.join(", ")
    }
}

/// Thin wrapper over `reqwest::Client` bound to one server and one session
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    scheme: AuthScheme,
    session: Arc<dyn SessionStore>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig, session: Arc<dyn SessionStore>) -> Self {
        Self {
            http: Client::builder()
                .user_agent(concat!("dotask/", env!("CARGO_PKG_VERSION")))
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            scheme: config.auth_scheme,
            session,
        }
    }

    pub fn session(&self) -> &Arc<dyn SessionStore> {
        &self.session
    }

    pub fn scheme(&self) -> AuthScheme {
        self.scheme
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url(path);
        debug!("{} {}", method, url);
        self.http.request(method, url)
    }

    /// Attach the persisted identity using the configured scheme.
    ///
    /// Without a session the request goes out as is and the server decides.
    async fn identify(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let Some(session) = self.session.load().await? else {
            return Ok(request);
        };
        let (name, value) = match self.scheme {
            AuthScheme::Bearer => (
                AUTHORIZATION.as_str(),
                format!("{} {}", session.token_type, session.token),
            ),
            AuthScheme::UserId => (USER_ID_HEADER, session.user.id.to_string()),
        };
        match HeaderValue::from_str(&value) {
            Ok(value) => Ok(request.header(name, value)),
            Err(_) => Err(Error::InvalidInput(
                "stored session holds characters not allowed in a header".to_string(),
            )),
        }
    }

    /// Send an unauthenticated request; any non-2xx becomes `Error::Http`
    pub(crate) async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;
        Self::check_status(response).await
    }

    /// Send a request carrying the session identity.
    ///
    /// A 401 clears the persisted session before `Error::Unauthorized` is
    /// returned, so the caller must sign in again.
    pub(crate) async fn send_authorized(&self, request: RequestBuilder) -> Result<Response> {
        let request = self.identify(request).await?;
        let response = request
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        if response.status() == StatusCode::UNAUTHORIZED {
            let body = response.text().await.unwrap_or_default();
            warn!("Server rejected the session; signing out");
            self.session.clear().await?;
            return Err(Error::Unauthorized(error_message(
                StatusCode::UNAUTHORIZED,
                &body,
            )));
        }
        Self::check_status(response).await
    }

    async fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = error_message(status, &body);
        debug!("HTTP {}: {}", status.as_u16(), message);
        Err(Error::Http {
            status: status.as_u16(),
            message,
        })
    }

    pub(crate) async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let body = response
            .text()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| Error::Decode(e.to_string()))
    }
}
