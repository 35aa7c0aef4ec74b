#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Session state for the Clean Ninja client.
//!
//! A [`Session`] tracks whether the caller is authenticated and which
//! [`Principal`] they act as. The credential lifecycle itself belongs to an
//! external identity provider reached through the [`IdentityProvider`]
//! trait; the session only mirrors its outcome.
//!
//! Lifecycle:
//!
//! ```text
//! Initializing ──init()──▶ Authenticated | Anonymous
//! Anonymous ──login() ok──▶ Authenticated
//! Authenticated ──logout()──▶ Anonymous   (even if the provider fails)
//! ```
//!
//! The session is created once and shared as `Arc<Session>` with every
//! component that needs to know who the caller is.

pub mod local;

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use clean_ninja_report_models::Principal;
use thiserror::Error;

/// Lifetime requested for every interactive login: 7 days.
pub const SESSION_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Errors from identity provider operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The identity provider reported a failure.
    #[error("Identity provider error: {message}")]
    Provider {
        /// Description of what went wrong.
        message: String,
    },

    /// `login()` was called before `init()` finished.
    #[error("Session is still initializing")]
    NotReady,

    /// I/O error reading or writing stored credentials.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored credentials could not be (de)serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parameters for an interactive login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOptions {
    /// Where the identity provider's login flow lives.
    pub identity_provider_url: String,
    /// How long the resulting delegation stays valid.
    pub max_time_to_live: Duration,
}

impl LoginOptions {
    /// Creates options for `identity_provider_url` with the standard
    /// [`SESSION_TTL`].
    #[must_use]
    pub fn new(identity_provider_url: impl Into<String>) -> Self {
        Self {
            identity_provider_url: identity_provider_url.into(),
            max_time_to_live: SESSION_TTL,
        }
    }

    /// Returns the lifetime in nanoseconds, the unit identity providers
    /// expect.
    #[must_use]
    pub const fn max_time_to_live_nanos(&self) -> u128 {
        self.max_time_to_live.as_nanos()
    }
}

/// An external identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Recovers a previously established session, if one is still valid.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if stored credentials cannot be read.
    async fn restore(&self) -> Result<Option<Principal>, SessionError>;

    /// Runs the provider's interactive login flow.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the flow fails or is aborted.
    async fn login(&self, options: &LoginOptions) -> Result<Principal, SessionError>;

    /// Ends the session with the provider.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the provider could not be reached.
    async fn logout(&self) -> Result<(), SessionError>;
}

/// Where a [`Session`] is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    /// Waiting for the identity provider to report an existing session.
    Initializing,
    /// No caller identity.
    Anonymous,
    /// Acting as the given principal.
    Authenticated(Principal),
}

#[derive(Debug)]
struct SessionInner {
    phase: SessionPhase,
    last_error: Option<String>,
}

/// Authentication state shared across the client.
pub struct Session {
    provider: Arc<dyn IdentityProvider>,
    login_options: LoginOptions,
    inner: RwLock<SessionInner>,
}

impl Session {
    /// Creates a session in the [`SessionPhase::Initializing`] phase.
    #[must_use]
    pub fn new(provider: Arc<dyn IdentityProvider>, login_options: LoginOptions) -> Self {
        Self {
            provider,
            login_options,
            inner: RwLock::new(SessionInner {
                phase: SessionPhase::Initializing,
                last_error: None,
            }),
        }
    }

    /// Creates and initializes a session in one step.
    pub async fn start(provider: Arc<dyn IdentityProvider>, login_options: LoginOptions) -> Self {
        let session = Self::new(provider, login_options);
        session.init().await;
        session
    }

    /// Asks the provider for an existing session and leaves the
    /// initializing phase.
    ///
    /// A provider error is recorded in [`Session::last_error`] and the
    /// session becomes anonymous.
    pub async fn init(&self) {
        let restored = self.provider.restore().await;

        let mut inner = self.write();
        match restored {
            Ok(Some(principal)) => {
                log::info!("Restored session for {principal}");
                inner.phase = SessionPhase::Authenticated(principal);
            }
            Ok(None) => {
                log::debug!("No existing session, continuing anonymously");
                inner.phase = SessionPhase::Anonymous;
            }
            Err(e) => {
                log::error!("Session initialization error: {e}");
                inner.phase = SessionPhase::Anonymous;
                inner.last_error = Some(e.to_string());
            }
        }
    }

    /// Returns the current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.read().phase.clone()
    }

    /// Returns `true` until [`Session::init`] completes.
    #[must_use]
    pub fn is_initializing(&self) -> bool {
        matches!(self.read().phase, SessionPhase::Initializing)
    }

    /// Returns `true` while a principal is signed in.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self.read().phase, SessionPhase::Authenticated(_))
    }

    /// Returns the signed-in principal, if any.
    #[must_use]
    pub fn principal(&self) -> Option<Principal> {
        match &self.read().phase {
            SessionPhase::Authenticated(principal) => Some(principal.clone()),
            SessionPhase::Initializing | SessionPhase::Anonymous => None,
        }
    }

    /// Returns the most recent provider error, if any.
    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.read().last_error.clone()
    }

    /// Returns the options used for interactive login.
    #[must_use]
    pub const fn login_options(&self) -> &LoginOptions {
        &self.login_options
    }

    /// Runs the provider's login flow and, on success, becomes
    /// authenticated.
    ///
    /// On failure the error is recorded and returned; the phase does not
    /// change.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotReady`] while still initializing, or the
    /// provider's error if the flow fails.
    pub async fn login(&self) -> Result<Principal, SessionError> {
        if self.is_initializing() {
            return Err(SessionError::NotReady);
        }

        match self.provider.login(&self.login_options).await {
            Ok(principal) => {
                log::info!("Logged in as {principal}");
                let mut inner = self.write();
                inner.phase = SessionPhase::Authenticated(principal.clone());
                inner.last_error = None;
                Ok(principal)
            }
            Err(e) => {
                log::error!("Login error: {e}");
                self.write().last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Signs out.
    ///
    /// The session is anonymous afterwards no matter what the provider
    /// returns.
    ///
    /// # Errors
    ///
    /// Returns the provider's error, after local state has been cleared.
    pub async fn logout(&self) -> Result<(), SessionError> {
        let result = self.provider.logout().await;

        let mut inner = self.write();
        inner.phase = SessionPhase::Anonymous;
        match result {
            Ok(()) => {
                log::info!("Logged out");
                inner.last_error = None;
                Ok(())
            }
            Err(e) => {
                log::error!("Logout error: {e}");
                inner.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, SessionInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, SessionInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("login_options", &self.login_options)
            .field("inner", &*self.read())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Identity provider whose every answer is scripted by the test.
    #[derive(Default)]
    struct ScriptedProvider {
        restored: Option<Principal>,
        fail_restore: bool,
        fail_login: bool,
        fail_logout: bool,
        login_requests: Mutex<Vec<LoginOptions>>,
    }

    #[async_trait]
    impl IdentityProvider for ScriptedProvider {
        async fn restore(&self) -> Result<Option<Principal>, SessionError> {
            if self.fail_restore {
                return Err(SessionError::Provider {
                    message: "storage unavailable".to_string(),
                });
            }
            Ok(self.restored.clone())
        }

        async fn login(&self, options: &LoginOptions) -> Result<Principal, SessionError> {
            self.login_requests.lock().unwrap().push(options.clone());
            if self.fail_login {
                return Err(SessionError::Provider {
                    message: "user closed the window".to_string(),
                });
            }
            Ok(Principal::new("aaaaa-aa"))
        }

        async fn logout(&self) -> Result<(), SessionError> {
            if self.fail_logout {
                return Err(SessionError::Provider {
                    message: "network down".to_string(),
                });
            }
            Ok(())
        }
    }

    fn options() -> LoginOptions {
        LoginOptions::new("https://identity.ic0.app")
    }

    #[test]
    fn new_session_is_initializing() {
        let session = Session::new(Arc::new(ScriptedProvider::default()), options());
        assert!(session.is_initializing());
        assert!(!session.is_authenticated());
        assert_eq!(session.principal(), None);
    }

    #[test]
    fn ttl_is_seven_days_in_nanos() {
        assert_eq!(options().max_time_to_live_nanos(), 604_800_000_000_000);
    }

    #[tokio::test]
    async fn init_restores_existing_session() {
        let provider = ScriptedProvider {
            restored: Some(Principal::new("restored-principal")),
            ..Default::default()
        };
        let session = Session::start(Arc::new(provider), options()).await;
        assert!(!session.is_initializing());
        assert!(session.is_authenticated());
        assert_eq!(session.principal(), Some(Principal::new("restored-principal")));
    }

    #[tokio::test]
    async fn init_without_session_is_anonymous() {
        let session = Session::start(Arc::new(ScriptedProvider::default()), options()).await;
        assert_eq!(session.phase(), SessionPhase::Anonymous);
    }

    #[tokio::test]
    async fn init_failure_falls_back_to_anonymous() {
        let provider = ScriptedProvider {
            fail_restore: true,
            ..Default::default()
        };
        let session = Session::start(Arc::new(provider), options()).await;
        assert_eq!(session.phase(), SessionPhase::Anonymous);
        assert!(session.last_error().unwrap().contains("storage unavailable"));
    }

    #[tokio::test]
    async fn login_requires_initialization() {
        let session = Session::new(Arc::new(ScriptedProvider::default()), options());
        assert!(matches!(session.login().await, Err(SessionError::NotReady)));
    }

    #[tokio::test]
    async fn login_success_authenticates_with_seven_day_ttl() {
        let provider = Arc::new(ScriptedProvider::default());
        let session = Session::start(provider.clone(), options()).await;

        let principal = session.login().await.unwrap();
        assert_eq!(principal, Principal::new("aaaaa-aa"));
        assert!(session.is_authenticated());

        let requests = provider.login_requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].max_time_to_live, SESSION_TTL);
    }

    #[tokio::test]
    async fn login_failure_stays_anonymous() {
        let provider = ScriptedProvider {
            fail_login: true,
            ..Default::default()
        };
        let session = Session::start(Arc::new(provider), options()).await;

        assert!(session.login().await.is_err());
        assert_eq!(session.phase(), SessionPhase::Anonymous);
        assert!(session.last_error().unwrap().contains("user closed the window"));
    }

    #[tokio::test]
    async fn logout_clears_state() {
        let provider = ScriptedProvider {
            restored: Some(Principal::new("p")),
            ..Default::default()
        };
        let session = Session::start(Arc::new(provider), options()).await;
        session.logout().await.unwrap();
        assert!(!session.is_authenticated());
        assert_eq!(session.principal(), None);
    }

    #[tokio::test]
    async fn logout_clears_state_even_when_provider_fails() {
        let provider = ScriptedProvider {
            restored: Some(Principal::new("p")),
            fail_logout: true,
            ..Default::default()
        };
        let session = Session::start(Arc::new(provider), options()).await;
        assert!(session.is_authenticated());

        assert!(session.logout().await.is_err());
        assert!(!session.is_authenticated());
        assert_eq!(session.principal(), None);
        assert_eq!(session.phase(), SessionPhase::Anonymous);
    }
}
