#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Terminal front-end for Clean Ninja.
//!
//! [`connect`] wires a session, a backend and a view controller together
//! from a [`ClientConfig`]; [`interactive`] runs the menu loop on top of
//! it and [`render`] turns view state into text.

pub mod interactive;
pub mod render;

use std::sync::Arc;

use clean_ninja_api::ApiClient;
use clean_ninja_api::config::ClientConfig;
use clean_ninja_api::http::HttpBackend;
use clean_ninja_api::memory::InMemoryBackend;
use clean_ninja_session::Session;
use clean_ninja_session::local::LocalIdentityProvider;
use clean_ninja_view::controller::ViewController;

/// Builds the session and view controller for `config`.
///
/// With `offline` set, reports live in an in-memory backend seeded with
/// demo data instead of the configured canister.
pub async fn connect(config: &ClientConfig, offline: bool) -> ViewController {
    let provider = Arc::new(LocalIdentityProvider::new(&config.identity_path));
    let session = Arc::new(Session::start(provider, config.login_options()).await);

    let api = if offline {
        log::info!("Running offline with demo reports");
        ApiClient::new(Arc::new(InMemoryBackend::with_demo_reports()), session)
    } else {
        let backend = HttpBackend::from_config(config);
        log::info!(
            "Using backend {} on {} ({})",
            config.backend_canister_id,
            config.network.name,
            config.host
        );
        if config.network.fetch_root_key {
            backend.probe().await;
        }
        ApiClient::new(Arc::new(backend), session)
    };

    ViewController::new(api)
}
