//! HTTP clients for the DoTask REST API
//!
//! `HttpTaskStore` is the network-backed `TaskStore` the task manager drives;
//! `AuthClient` signs in and out and keeps the persisted session current.

mod api;
mod auth;
mod config;
mod tasks;

#[cfg(test)]
mod fake_server;

pub use api::ApiClient;
pub use auth::{
    AuthClient, AuthResponse, LoginRequest, RegisterRequest, AUTH_FAILED, INVALID_CREDENTIALS,
    SERVER_ERROR,
};
pub use config::{AuthScheme, ClientConfig};
pub use tasks::HttpTaskStore;
