#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared terminal utilities for the Clean Ninja client.
//!
//! [`init_logger`] sets up `indicatif-log-bridge` so that `log::info!` and
//! friends are suspended while spinners redraw. [`spinner`] and
//! [`with_spinner`] show a spinner while a backend call is in flight.

use std::future::Future;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

pub use indicatif::MultiProgress;

/// Adds a steady-ticking spinner showing `message` to `multi`.
#[must_use]
pub fn spinner(multi: &MultiProgress, message: &str) -> ProgressBar {
    let bar = multi.add(ProgressBar::new_spinner());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message(message.to_string());
    bar
}

/// Awaits `future` behind a spinner, clearing it when done.
pub async fn with_spinner<F: Future>(multi: &MultiProgress, message: &str, future: F) -> F::Output {
    let bar = spinner(multi, message);
    let output = future.await;
    bar.finish_and_clear();
    multi.remove(&bar);
    output
}

/// Initializes the global logger wrapped in `indicatif-log-bridge` so that
/// `log::info!` and friends are suspended while spinners redraw.
///
/// Returns the [`MultiProgress`] that all spinners must be added to.
#[must_use]
pub fn init_logger() -> MultiProgress {
    let multi = MultiProgress::new();

    let logger = pretty_env_logger::formatted_builder()
        .parse_env("RUST_LOG")
        .build();
    let level = logger.filter();

    indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .ok(); // Already set (e.g., in tests)

    log::set_max_level(level);

    multi
}

#[cfg(test)]
mod tests {
    use indicatif::ProgressDrawTarget;

    use super::*;

    #[test]
    fn spinner_carries_message() {
        let multi = MultiProgress::with_draw_target(ProgressDrawTarget::hidden());
        let bar = spinner(&multi, "Loading reports...");
        assert_eq!(bar.message(), "Loading reports...");
        bar.finish_and_clear();
        assert!(bar.is_finished());
    }

    #[test]
    fn init_logger_is_idempotent() {
        let _first = init_logger();
        let _second = init_logger();
    }
}
