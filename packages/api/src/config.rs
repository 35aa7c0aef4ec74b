//! Client configuration from environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `DFX_NETWORK` | `local` (`ic` selects mainnet) |
//! | `CANISTER_ID_BACKEND` | `twkfl-haaaa-aaaab-qbnpa-cai` |
//! | `CANISTER_ID_INTERNET_IDENTITY` | `rdmx6-jaaaa-aaaaa-aaadq-cai` |
//! | `CLEAN_NINJA_HOST` | the network's host |
//! | `CLEAN_NINJA_IDENTITY_PATH` | `data/identity.json` |

use std::path::PathBuf;

use clean_ninja_session::LoginOptions;
use clean_ninja_session::local::DEFAULT_IDENTITY_PATH;

use crate::network::{self, Network};

/// Backend canister used when `CANISTER_ID_BACKEND` is unset.
pub const DEFAULT_BACKEND_CANISTER_ID: &str = "twkfl-haaaa-aaaab-qbnpa-cai";

/// Identity canister used when `CANISTER_ID_INTERNET_IDENTITY` is unset.
pub const DEFAULT_INTERNET_IDENTITY_CANISTER_ID: &str = "rdmx6-jaaaa-aaaaa-aaadq-cai";

/// Everything needed to reach the backend and the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Selected network.
    pub network: Network,
    /// Base URL calls are sent to.
    pub host: String,
    /// Host set through `CLEAN_NINJA_HOST`; wins over any network's host.
    pub host_override: Option<String>,
    /// Canister id of the waste-reporting backend.
    pub backend_canister_id: String,
    /// Canister id of the identity provider on local networks.
    pub internet_identity_canister_id: String,
    /// Where the local identity provider stores its delegation.
    pub identity_path: PathBuf,
}

impl ClientConfig {
    /// Reads the configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let network = network::network_for(var("DFX_NETWORK").as_deref());
        let host_override = var("CLEAN_NINJA_HOST");
        let host = host_override.clone().unwrap_or_else(|| network.host.clone());
        let backend_canister_id = var("CANISTER_ID_BACKEND").unwrap_or_else(|| {
            log::debug!("CANISTER_ID_BACKEND not set, using {DEFAULT_BACKEND_CANISTER_ID}");
            DEFAULT_BACKEND_CANISTER_ID.to_string()
        });
        let internet_identity_canister_id = var("CANISTER_ID_INTERNET_IDENTITY")
            .unwrap_or_else(|| DEFAULT_INTERNET_IDENTITY_CANISTER_ID.to_string());
        let identity_path = var("CLEAN_NINJA_IDENTITY_PATH")
            .map_or_else(|| PathBuf::from(DEFAULT_IDENTITY_PATH), PathBuf::from);

        Self {
            network,
            host,
            host_override,
            backend_canister_id,
            internet_identity_canister_id,
            identity_path,
        }
    }

    /// Selects a different network. The host becomes that network's unless
    /// `CLEAN_NINJA_HOST` was set.
    ///
    /// Returns `None` if no network has the given id.
    #[must_use]
    pub fn with_network(mut self, id: &str) -> Option<Self> {
        let network = network::network(id)?;
        self.host = self
            .host_override
            .clone()
            .unwrap_or_else(|| network.host.clone());
        self.network = network;
        Some(self)
    }

    /// Returns the identity provider URL for this network.
    #[must_use]
    pub fn identity_provider_url(&self) -> String {
        self.network
            .identity_provider_url(&self.internet_identity_canister_id)
    }

    /// Returns the options for interactive login (7-day lifetime).
    #[must_use]
    pub fn login_options(&self) -> LoginOptions {
        LoginOptions::new(self.identity_provider_url())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_to_local_network() {
        let config = ClientConfig::from_lookup(lookup(&[]));
        assert_eq!(config.network.id, "local");
        assert_eq!(config.host, "http://localhost:8000");
        assert_eq!(config.backend_canister_id, DEFAULT_BACKEND_CANISTER_ID);
        assert_eq!(config.identity_path, PathBuf::from("data/identity.json"));
        assert_eq!(
            config.identity_provider_url(),
            "http://localhost:8000?canisterId=rdmx6-jaaaa-aaaaa-aaadq-cai"
        );
    }

    #[test]
    fn mainnet_and_overrides() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("DFX_NETWORK", "ic"),
            ("CANISTER_ID_BACKEND", "be2us-64aaa-aaaaa-qaabq-cai"),
            ("CLEAN_NINJA_HOST", "https://icp-api.io"),
        ]));
        assert_eq!(config.network.id, "ic");
        assert_eq!(config.host, "https://icp-api.io");
        assert_eq!(config.backend_canister_id, "be2us-64aaa-aaaaa-qaabq-cai");
        assert_eq!(config.login_options().identity_provider_url, "https://identity.ic0.app");
    }

    #[test]
    fn blank_values_are_ignored() {
        let config = ClientConfig::from_lookup(lookup(&[("CANISTER_ID_BACKEND", "  ")]));
        assert_eq!(config.backend_canister_id, DEFAULT_BACKEND_CANISTER_ID);
    }

    #[test]
    fn with_network_switches_host() {
        let config = ClientConfig::from_lookup(lookup(&[])).with_network("ic").unwrap();
        assert_eq!(config.host, "https://ic0.app");
        assert!(ClientConfig::from_lookup(lookup(&[])).with_network("mars").is_none());
    }

    #[test]
    fn with_network_keeps_host_override() {
        let env = lookup(&[("CLEAN_NINJA_HOST", "https://icp-api.io")]);
        let config = ClientConfig::from_lookup(env).with_network("ic").unwrap();
        assert_eq!(config.network.id, "ic");
        assert_eq!(config.host, "https://icp-api.io");
        assert_eq!(config.login_options().identity_provider_url, "https://identity.ic0.app");
    }
}
