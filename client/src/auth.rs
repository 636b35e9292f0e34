//! Auth client
//!
//! Login and registration against `/api/auth`, plus the persisted session
//! that every other request identifies itself with.

use std::sync::Arc;

use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use dotask_core::session::{Session, SessionStore, User};
use dotask_core::{Error, Result};

use crate::api::ApiClient;

pub const INVALID_CREDENTIALS: &str =
    "Invalid username/email or password. Please check your credentials.";
pub const AUTH_FAILED: &str = "Authentication failed. Please check your credentials.";
pub const SERVER_ERROR: &str = "Server error. Please try again later.";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username_or_email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(username_or_email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username_or_email: username_or_email.into(),
            password: password.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Body returned by both login and register
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    #[serde(rename = "type", default = "default_token_type")]
    pub token_type: String,
    pub id: i64,
    pub username: String,
    pub email: String,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl From<AuthResponse> for Session {
    fn from(response: AuthResponse) -> Self {
        Session::new(
            response.token,
            User {
                id: response.id,
                username: response.username,
                email: response.email,
            },
        )
        .with_token_type(response.token_type)
    }
}

fn login_error(err: Error) -> Error {
    match err {
        Error::Http { status: 400, .. } => Error::InvalidCredentials(INVALID_CREDENTIALS.to_string()),
        Error::Http { status: 401, .. } => Error::InvalidCredentials(AUTH_FAILED.to_string()),
        Error::Http { status: 500, .. } => Error::ServerUnavailable(SERVER_ERROR.to_string()),
        other => other,
    }
}

fn register_error(err: Error) -> Error {
    match err {
        Error::Http { status: 500, .. } => Error::ServerUnavailable(SERVER_ERROR.to_string()),
        other => other,
    }
}

#[derive(Clone)]
pub struct AuthClient {
    api: ApiClient,
}

impl AuthClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    fn session(&self) -> &Arc<dyn SessionStore> {
        self.api.session()
    }

    /// Exchange credentials for a session and persist it.
    ///
    /// Nothing is stored unless the server accepts the credentials.
    pub async fn login(&self, request: &LoginRequest) -> Result<User> {
        let builder = self.api.request(Method::POST, "/api/auth/login").json(request);
        let response = self.api.send(builder).await.map_err(|e| {
            warn!("Login failed for {}: {}", request.username_or_email, e);
            login_error(e)
        })?;
        let auth: AuthResponse = ApiClient::decode(response).await?;
        self.establish(auth).await
    }

    /// Create an account and sign in as it
    pub async fn register(&self, request: &RegisterRequest) -> Result<User> {
        if request.password != request.confirm_password {
            return Err(Error::InvalidInput("Passwords do not match".to_string()));
        }

        let builder = self
            .api
            .request(Method::POST, "/api/auth/register")
            .json(request);
        let response = self.api.send(builder).await.map_err(|e| {
            warn!("Registration failed for {}: {}", request.username, e);
            register_error(e)
        })?;
        let auth: AuthResponse = ApiClient::decode(response).await?;
        self.establish(auth).await
    }

    async fn establish(&self, auth: AuthResponse) -> Result<User> {
        let session = Session::from(auth);
        self.session().save(&session).await?;
        info!("Signed in as {} (id {})", session.user.username, session.user.id);
        Ok(session.user)
    }

    /// Forget the local session. The server is not contacted.
    pub async fn logout(&self) -> Result<()> {
        self.session().clear().await?;
        info!("Signed out");
        Ok(())
    }

    pub async fn is_authenticated(&self) -> bool {
        self.session().is_authenticated().await
    }

    pub async fn current_user(&self) -> Result<Option<User>> {
        Ok(self.session().load().await?.map(|session| session.user))
    }
}
