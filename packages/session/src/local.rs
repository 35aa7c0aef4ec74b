//! File-backed developer identity provider.
//!
//! Keeps a delegation (principal plus expiry) in a JSON file so a session
//! survives restarts of the terminal client, the way a browser identity
//! client keeps its delegation in local storage. Intended for local
//! networks where no interactive identity service is available.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use clean_ninja_report_models::Principal;
use serde::{Deserialize, Serialize};

use crate::{IdentityProvider, LoginOptions, SessionError};

/// Default location of the stored delegation.
pub const DEFAULT_IDENTITY_PATH: &str = "data/identity.json";

/// A stored delegation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Delegation {
    /// The identity the delegation was issued for.
    pub principal: Principal,
    /// Which identity provider issued it.
    pub identity_provider: String,
    /// When it stops being valid.
    pub expires_at: DateTime<Utc>,
}

impl Delegation {
    /// Returns `true` if the delegation is still valid at `now`.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// Identity provider that mints and stores developer principals locally.
#[derive(Debug, Clone)]
pub struct LocalIdentityProvider {
    path: PathBuf,
}

impl LocalIdentityProvider {
    /// Creates a provider storing its delegation at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns where the delegation is stored.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_delegation(&self) -> Result<Option<Delegation>, SessionError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => Ok(Some(serde_json::from_str(&contents)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_delegation(&self, delegation: &Delegation) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(delegation)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}

impl Default for LocalIdentityProvider {
    fn default() -> Self {
        Self::new(DEFAULT_IDENTITY_PATH)
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    async fn restore(&self) -> Result<Option<Principal>, SessionError> {
        let Some(delegation) = self.read_delegation().await? else {
            return Ok(None);
        };

        if delegation.is_valid_at(Utc::now()) {
            Ok(Some(delegation.principal))
        } else {
            log::info!(
                "Stored delegation for {} expired at {}",
                delegation.principal,
                delegation.expires_at
            );
            Ok(None)
        }
    }

    async fn login(&self, options: &LoginOptions) -> Result<Principal, SessionError> {
        let ttl = chrono::Duration::from_std(options.max_time_to_live).map_err(|e| {
            SessionError::Provider {
                message: format!("invalid session lifetime: {e}"),
            }
        })?;

        // Expired delegations keep their principal; only the expiry is renewed.
        let principal = match self.read_delegation().await {
            Ok(Some(existing)) => existing.principal,
            Ok(None) => mint_principal(),
            Err(e) => {
                log::warn!("Ignoring unreadable delegation at {}: {e}", self.path.display());
                mint_principal()
            }
        };

        let delegation = Delegation {
            principal: principal.clone(),
            identity_provider: options.identity_provider_url.clone(),
            expires_at: Utc::now() + ttl,
        };
        self.write_delegation(&delegation).await?;

        log::debug!(
            "Issued delegation for {principal} via {} until {}",
            delegation.identity_provider,
            delegation.expires_at
        );

        Ok(principal)
    }

    async fn logout(&self) -> Result<(), SessionError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn mint_principal() -> Principal {
    Principal::new(uuid::Uuid::new_v4().to_string())
}
