#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Front-end state for the Clean Ninja client.
//!
//! Everything here is independent of how it is drawn:
//!
//! - [`controller::ViewController`] owns the filters, the visible report
//!   list and the statistics, and decides which backend fetch a filter
//!   pair maps to.
//! - [`card::ReportCard`] runs the per-report verify and mark-cleaned
//!   workflow.
//! - [`form::ReportForm`] validates and submits new reports.
//! - [`stats::StatsSummary`] derives the numbers shown above the list.

pub mod card;
pub mod controller;
pub mod form;
pub mod stats;

use clean_ninja_api::ApiError;
use thiserror::Error;

/// Errors from the report form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    /// A required field is missing.
    #[error("{message}")]
    ValidationFailure {
        /// What to fix.
        message: String,
    },

    /// The attached photo is not an image or is too large.
    #[error("{message}")]
    MediaConstraintViolation {
        /// What was wrong with the file.
        message: String,
    },

    /// The attached photo could not be read.
    #[error("{message}")]
    PhotoRead {
        /// User-facing description.
        message: String,
    },

    /// The backend call failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl FormError {
    fn validation(message: &str) -> Self {
        Self::ValidationFailure {
            message: message.to_string(),
        }
    }

    fn media(message: &str) -> Self {
        Self::MediaConstraintViolation {
            message: message.to_string(),
        }
    }
}

/// Errors from report card actions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    /// The action needs a signed-in user.
    #[error("{message}")]
    AuthenticationRequired {
        /// User-facing prompt to log in.
        message: String,
    },

    /// The action is not available in the card's current state.
    #[error("{message}")]
    NotAllowed {
        /// Why not.
        message: String,
    },

    /// The backend call failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}
