#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Remote access layer for the Clean Ninja waste-reporting backend.
//!
//! All durable state lives in a remote service. This crate maps each
//! application call onto one remote procedure ([`backend::Backend`]),
//! decodes the backend's variant-shaped payloads ([`wire`]) and
//! normalizes the outcome ([`client::ApiClient`]):
//!
//! - **Writes** (create, verify, mark cleaned) require an authenticated
//!   [`clean_ninja_session::Session`] and raise [`ApiError`] on failure.
//! - **Reads** (lists, statistics) never fail: connection or backend
//!   errors are logged and replaced with an empty list or zeroed
//!   statistics so the view stays usable.
//! - **Location checks** fall back to a deterministic local heuristic
//!   ([`fallback`]) whenever the backend cannot answer.
//!
//! Transports: [`http::HttpBackend`] talks to a deployed canister over
//! HTTP; [`memory::InMemoryBackend`] implements the same semantics
//! locally for offline use and tests. Where each network lives is
//! described by the embedded [`network`] registry and [`config`].

pub mod backend;
pub mod client;
pub mod config;
pub mod fallback;
pub mod http;
pub mod memory;
pub mod network;
pub mod wire;

use thiserror::Error;

pub use backend::{Backend, RemoteMethod};
pub use client::ApiClient;

/// Message shown to users whenever the backend cannot be reached.
pub const CONNECTION_FAILED_MESSAGE: &str = "Backend connection failed";

/// Message shown to users when a write is attempted while signed out.
pub const AUTHENTICATION_REQUIRED_MESSAGE: &str = "Authentication required";

/// Errors surfaced by write operations.
///
/// Read operations absorb these and return defaults instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// A mutation was attempted without a signed-in principal. Raised
    /// locally, before any network traffic.
    #[error("Authentication required")]
    AuthenticationRequired,

    /// The backend could not be reached or its reply could not be read.
    #[error("{message}")]
    ConnectionFailure {
        /// User-facing description (always [`CONNECTION_FAILED_MESSAGE`]).
        message: String,
    },

    /// The backend answered with a tagged error result.
    #[error("{message}")]
    BackendRejected {
        /// The backend's message, verbatim.
        message: String,
    },
}

impl ApiError {
    pub(crate) fn connection_failure() -> Self {
        Self::ConnectionFailure {
            message: CONNECTION_FAILED_MESSAGE.to_string(),
        }
    }
}

/// Errors from the transport beneath the remote access layer.
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the expected JSON shape.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The endpoint answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// The backend is not reachable at all.
    #[error("Backend unavailable: {message}")]
    Unavailable {
        /// Description of why.
        message: String,
    },
}
