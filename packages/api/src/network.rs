//! Compile-time registry of network configurations.
//!
//! Each network the client can talk to is defined in a TOML file under
//! `networks/`. The registry embeds these at compile time and exposes them
//! via [`all_networks`] and [`network`].

use serde::Deserialize;

/// Placeholder in [`Network::identity_provider`] replaced by the identity
/// canister id.
const IDENTITY_CANISTER_PLACEHOLDER: &str = "{internet_identity}";

/// A network configuration loaded from TOML.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Network {
    /// Unique identifier, matched against `DFX_NETWORK` (e.g., `"ic"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Base URL of the replica or boundary node.
    pub host: String,
    /// Identity provider URL template. May contain `{internet_identity}`.
    pub identity_provider: String,
    /// Whether the replica's root key must be fetched before certified
    /// calls. Only true for development replicas.
    #[serde(default)]
    pub fetch_root_key: bool,
}

impl Network {
    /// Returns the identity provider URL with the identity canister id
    /// filled in.
    #[must_use]
    pub fn identity_provider_url(&self, internet_identity_canister_id: &str) -> String {
        self.identity_provider
            .replace(IDENTITY_CANISTER_PLACEHOLDER, internet_identity_canister_id)
    }
}

// ── Compile-time embedded TOML files ────────────────────────────────

const NETWORK_TOMLS: &[(&str, &str)] = &[
    ("local", include_str!("../networks/local.toml")),
    ("ic", include_str!("../networks/ic.toml")),
];

/// Identifier of the network used when nothing else is configured.
pub const DEFAULT_NETWORK: &str = "local";

/// Returns all network configurations.
///
/// # Panics
///
/// Panics if any TOML config is malformed (this is a compile-time guarantee
/// since the configs are embedded).
#[must_use]
pub fn all_networks() -> Vec<Network> {
    NETWORK_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            toml::de::from_str(toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse network '{name}': {e}"))
        })
        .collect()
}

/// Looks up a network by id.
#[must_use]
pub fn network(id: &str) -> Option<Network> {
    all_networks().into_iter().find(|n| n.id == id)
}

/// Returns the network selected by a `DFX_NETWORK`-style value: `ic`
/// selects mainnet, anything else the local replica.
#[must_use]
pub fn network_for(dfx_network: Option<&str>) -> Network {
    let id = match dfx_network {
        Some("ic") => "ic",
        _ => DEFAULT_NETWORK,
    };
    network(id).unwrap_or_else(|| panic!("Network '{id}' missing from the embedded registry"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn loads_all_networks() {
        assert_eq!(all_networks().len(), NETWORK_TOMLS.len());
    }

    #[test]
    fn network_ids_are_unique_and_match_file_keys() {
        let mut seen = BTreeSet::new();
        for ((key, _), net) in NETWORK_TOMLS.iter().zip(all_networks()) {
            assert_eq!(*key, net.id);
            assert!(seen.insert(net.id.clone()), "Duplicate network ID: {}", net.id);
        }
    }

    #[test]
    fn mainnet_urls() {
        let ic = network_for(Some("ic"));
        assert_eq!(ic.host, "https://ic0.app");
        assert_eq!(
            ic.identity_provider_url("rdmx6-jaaaa-aaaaa-aaadq-cai"),
            "https://identity.ic0.app"
        );
        assert!(!ic.fetch_root_key);
    }

    #[test]
    fn local_identity_provider_includes_canister() {
        let local = network_for(None);
        assert_eq!(local.host, "http://localhost:8000");
        assert_eq!(
            local.identity_provider_url("rdmx6-jaaaa-aaaaa-aaadq-cai"),
            "http://localhost:8000?canisterId=rdmx6-jaaaa-aaaaa-aaadq-cai"
        );
        assert!(local.fetch_root_key);
        assert_eq!(network_for(Some("playground")).id, "local");
    }
}
