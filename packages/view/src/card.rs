//! Per-report actions and display helpers.
//!
//! Verification runs as a small state machine:
//!
//! ```text
//! Idle --open_verify--> Prompt --submit--> Submitting --ok--> Verified
//!                        ^  |                   |
//!                        |  +--cancel--> Idle   |
//!                        +-------- err ---------+
//! ```
//!
//! The "already verified" check uses the card's snapshot of the
//! verification list and is advisory only. The backend decides.

use chrono::{DateTime, Utc};
use clean_ninja_report_models::{Location, Principal, Report};

use crate::ActionError;
use crate::controller::ViewController;

/// Shown when an anonymous user tries to verify.
pub const LOGIN_TO_VERIFY: &str = "Please login first to verify reports";

/// Shown when an anonymous user tries to mark a report cleaned.
pub const LOGIN_TO_MARK_CLEANED: &str = "Please login first to mark reports as cleaned";

/// Question asked before marking a report cleaned.
pub const CONFIRM_CLEANED: &str = "Are you sure this waste has been cleaned up?";

const DESCRIPTION_PREVIEW_CHARS: usize = 50;
const REPORTER_PREVIEW_CHARS: usize = 10;

/// Where a card is in the verification workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyState {
    /// Nothing in progress.
    Idle,
    /// The valid/invalid prompt is open.
    Prompt,
    /// A vote is being submitted.
    Submitting {
        /// The vote.
        is_valid: bool,
    },
    /// The vote was accepted.
    Verified,
}

/// One report in the list, with its action state.
#[derive(Debug, Clone)]
pub struct ReportCard {
    report: Report,
    verify: VerifyState,
    has_verified: bool,
    marking: bool,
}

impl ReportCard {
    /// Creates a card for `report` as seen by `viewer`.
    #[must_use]
    pub fn new(report: Report, viewer: Option<&Principal>) -> Self {
        let has_verified = viewer.is_some_and(|p| report.has_verified(p));
        Self {
            report,
            verify: VerifyState::Idle,
            has_verified,
            marking: false,
        }
    }

    /// Returns the report snapshot this card shows.
    #[must_use]
    pub const fn report(&self) -> &Report {
        &self.report
    }

    /// Returns the verification workflow state.
    #[must_use]
    pub const fn verify_state(&self) -> VerifyState {
        self.verify
    }

    /// Returns whether the viewer already appears in the verification list.
    #[must_use]
    pub const fn has_verified(&self) -> bool {
        self.has_verified
    }

    /// Returns whether the verify action is offered.
    #[must_use]
    pub const fn can_verify(&self) -> bool {
        !self.has_verified && matches!(self.verify, VerifyState::Idle | VerifyState::Prompt)
    }

    /// Returns whether the mark-cleaned action is offered.
    #[must_use]
    pub fn can_mark_cleaned(&self) -> bool {
        self.report.is_reported() && !self.marking
    }

    /// Returns the label of the verify button.
    #[must_use]
    pub const fn verify_label(&self) -> &'static str {
        match self.verify {
            VerifyState::Submitting { .. } => "Processing...",
            _ if self.has_verified => "Verified",
            _ => "Verify",
        }
    }

    /// Opens the valid/invalid prompt.
    ///
    /// # Errors
    ///
    /// * [`ActionError::AuthenticationRequired`] if nobody is signed in
    /// * [`ActionError::NotAllowed`] if the viewer already verified this
    ///   report or a vote is in flight
    pub fn open_verify(&mut self, controller: &ViewController) -> Result<(), ActionError> {
        if !controller.api().session().is_authenticated() {
            return Err(ActionError::AuthenticationRequired {
                message: LOGIN_TO_VERIFY.to_string(),
            });
        }
        if !self.can_verify() {
            return Err(ActionError::NotAllowed {
                message: "You have already verified this report".to_string(),
            });
        }
        self.verify = VerifyState::Prompt;
        Ok(())
    }

    /// Closes the prompt without voting.
    pub fn cancel_verify(&mut self) {
        if self.verify == VerifyState::Prompt {
            self.verify = VerifyState::Idle;
        }
    }

    /// Submits a vote from the open prompt and refreshes the list.
    ///
    /// On failure the prompt stays open so the vote can be retried.
    ///
    /// # Errors
    ///
    /// * [`ActionError::NotAllowed`] if the prompt is not open
    /// * [`ActionError::Api`] if the backend call fails
    pub async fn submit_verification(
        &mut self,
        controller: &ViewController,
        is_valid: bool,
        comment: Option<String>,
    ) -> Result<&'static str, ActionError> {
        if self.verify != VerifyState::Prompt {
            return Err(ActionError::NotAllowed {
                message: "Open the verification prompt first".to_string(),
            });
        }

        self.verify = VerifyState::Submitting { is_valid };
        match controller
            .api()
            .verify_report(&self.report.id, is_valid, comment)
            .await
        {
            Ok(()) => {
                self.verify = VerifyState::Verified;
                self.has_verified = true;
                controller.refresh_after_mutation().await;
                Ok(if is_valid {
                    "Report verified as valid!"
                } else {
                    "Report marked as invalid!"
                })
            }
            Err(e) => {
                log::warn!("Verification of {} failed: {e}", self.report.id);
                self.verify = VerifyState::Prompt;
                Err(e.into())
            }
        }
    }

    /// Checks that the report may be marked cleaned by the current viewer,
    /// so a front-end can ask for confirmation only when it matters.
    ///
    /// # Errors
    ///
    /// * [`ActionError::NotAllowed`] if the report is already cleaned
    /// * [`ActionError::AuthenticationRequired`] if nobody is signed in
    pub fn check_mark_cleaned(&self, controller: &ViewController) -> Result<(), ActionError> {
        if !self.can_mark_cleaned() {
            return Err(ActionError::NotAllowed {
                message: "Report has already been marked as cleaned".to_string(),
            });
        }
        if !controller.api().session().is_authenticated() {
            return Err(ActionError::AuthenticationRequired {
                message: LOGIN_TO_MARK_CLEANED.to_string(),
            });
        }
        Ok(())
    }

    /// Marks the report cleaned after `confirm` agrees, then refreshes the
    /// list. Returns `Ok(None)` if the user declined.
    ///
    /// # Errors
    ///
    /// * [`ActionError::NotAllowed`] if the report is already cleaned
    /// * [`ActionError::AuthenticationRequired`] if nobody is signed in
    /// * [`ActionError::Api`] if the backend call fails
    pub async fn mark_cleaned(
        &mut self,
        controller: &ViewController,
        confirm: impl FnOnce() -> bool + Send,
    ) -> Result<Option<&'static str>, ActionError> {
        self.check_mark_cleaned(controller)?;
        if !confirm() {
            return Ok(None);
        }

        self.marking = true;
        let result = controller.api().mark_as_cleaned(&self.report.id).await;
        self.marking = false;
        result?;

        controller.refresh_after_mutation().await;
        Ok(Some("Report marked as cleaned successfully!"))
    }
}

/// Formats how long ago a nanosecond timestamp was, relative to `now`.
#[must_use]
pub fn time_ago(timestamp_nanos: i64, now: DateTime<Utc>) -> String {
    let then = DateTime::from_timestamp_nanos(timestamp_nanos);
    let seconds = (now - then).num_seconds().max(0);
    if seconds < 60 {
        return format!("{seconds} seconds ago");
    }
    let minutes = seconds / 60;
    if minutes < 60 {
        return format!("{minutes} minutes ago");
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{hours} hours ago");
    }
    format!("{} days ago", hours / 24)
}

/// Returns a map link for a location.
#[must_use]
pub fn map_url(location: &Location) -> String {
    format!(
        "https://maps.google.com/?q={},{}",
        location.latitude, location.longitude
    )
}

/// Shortens a principal for display.
#[must_use]
pub fn short_reporter(reporter: &Principal) -> String {
    let head: String = reporter.as_str().chars().take(REPORTER_PREVIEW_CHARS).collect();
    format!("{head}...")
}

/// Returns the first 50 characters of a description, marking truncation.
#[must_use]
pub fn description_preview(description: &str) -> String {
    if description.is_empty() {
        return "No description provided".to_string();
    }
    let mut chars = description.chars();
    let head: String = chars.by_ref().take(DESCRIPTION_PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
