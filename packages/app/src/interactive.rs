//! Menu-driven terminal front-end.
//!
//! Each pass of the main loop prints the navbar, the statistics panel and
//! the filtered report list, then offers the actions available to the
//! current session.

use chrono::Utc;
use clean_ninja_cli_utils::{MultiProgress, with_spinner};
use clean_ninja_report_models::District;
use clean_ninja_view::card::{CONFIRM_CLEANED, ReportCard, VerifyState};
use clean_ninja_view::controller::ViewController;
use clean_ninja_view::form::{FilePhoto, ReportForm};
use dialoguer::{Confirm, Input, Select};

use crate::render;

/// Top-level actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Login,
    Logout,
    FilterDistrict,
    FilterStatus,
    OpenReport,
    ReportWaste,
    Refresh,
    Exit,
}

impl Action {
    const ALL: &[Self] = &[
        Self::Login,
        Self::Logout,
        Self::FilterDistrict,
        Self::FilterStatus,
        Self::OpenReport,
        Self::ReportWaste,
        Self::Refresh,
        Self::Exit,
    ];

    const fn label(self) -> &'static str {
        match self {
            Self::Login => "Login",
            Self::Logout => "Logout",
            Self::FilterDistrict => "Filter by district",
            Self::FilterStatus => "Filter by status",
            Self::OpenReport => "Open a report",
            Self::ReportWaste => "Report waste",
            Self::Refresh => "Refresh",
            Self::Exit => "Exit",
        }
    }

    /// Actions offered for the given session and list state.
    fn available(authenticated: bool, has_reports: bool) -> Vec<Self> {
        Self::ALL
            .iter()
            .copied()
            .filter(|action| match action {
                Self::Login => !authenticated,
                Self::Logout => authenticated,
                Self::OpenReport => has_reports,
                _ => true,
            })
            .collect()
    }
}

/// Actions on a single report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CardAction {
    Verify,
    MarkCleaned,
    Back,
}

impl CardAction {
    const ALL: &[Self] = &[Self::Verify, Self::MarkCleaned, Self::Back];

    fn label(self, card: &ReportCard) -> &'static str {
        match self {
            Self::Verify => card.verify_label(),
            Self::MarkCleaned if card.can_mark_cleaned() => "Mark cleaned",
            Self::MarkCleaned => "Mark cleaned (already cleaned)",
            Self::Back => "Back",
        }
    }
}

/// Steps of the report form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormAction {
    AttachPhoto,
    DetectLocation,
    SelectDistrict,
    Describe,
    Submit,
    SubmitDemo,
    Cancel,
}

impl FormAction {
    const ALL: &[Self] = &[
        Self::AttachPhoto,
        Self::DetectLocation,
        Self::SelectDistrict,
        Self::Describe,
        Self::Submit,
        Self::SubmitDemo,
        Self::Cancel,
    ];

    const fn label(self) -> &'static str {
        match self {
            Self::AttachPhoto => "Attach photo",
            Self::DetectLocation => "Detect location",
            Self::SelectDistrict => "Select district",
            Self::Describe => "Describe the waste",
            Self::Submit => "Submit report",
            Self::SubmitDemo => "Submit demo report",
            Self::Cancel => "Cancel",
        }
    }
}

/// Runs the interactive menu loop until the user exits.
///
/// # Errors
///
/// Returns an error if a terminal prompt fails.
pub async fn run(
    controller: &ViewController,
    multi: &MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = controller.api().session().clone();
    with_spinner(multi, "Loading reports...", controller.load()).await;

    loop {
        print_overview(controller, session.is_authenticated());

        let actions = Action::available(
            session.is_authenticated(),
            !controller.reports().is_empty(),
        );
        let labels: Vec<&str> = actions.iter().map(|a| a.label()).collect();
        let idx = Select::new()
            .with_prompt("What would you like to do?")
            .items(&labels)
            .default(0)
            .interact()?;

        match actions[idx] {
            Action::Login => {
                let login = session.login();
                match with_spinner(multi, "Waiting for identity provider...", login).await {
                    Ok(principal) => {
                        println!("Logged in as {principal}");
                        with_spinner(multi, "Loading reports...", controller.load()).await;
                    }
                    Err(e) => println!("Login failed: {e}"),
                }
            }
            Action::Logout => {
                if let Err(e) = session.logout().await {
                    println!("Logged out (identity provider reported: {e})");
                } else {
                    println!("Logged out");
                }
            }
            Action::FilterDistrict => {
                let choices = render::district_choices();
                let labels: Vec<&str> = choices
                    .iter()
                    .map(|c| render::district_filter_label(*c))
                    .collect();
                let current = choices
                    .iter()
                    .position(|c| *c == controller.filters().district)
                    .unwrap_or(0);
                let idx = Select::new()
                    .with_prompt("District")
                    .items(&labels)
                    .default(current)
                    .interact()?;
                with_spinner(
                    multi,
                    "Loading reports...",
                    controller.select_district(choices[idx]),
                )
                .await;
            }
            Action::FilterStatus => {
                let choices = render::status_choices();
                let labels: Vec<&str> = choices
                    .iter()
                    .map(|c| render::status_filter_label(*c))
                    .collect();
                let current = choices
                    .iter()
                    .position(|c| *c == controller.filters().status)
                    .unwrap_or(0);
                let idx = Select::new()
                    .with_prompt("Status")
                    .items(&labels)
                    .default(current)
                    .interact()?;
                with_spinner(
                    multi,
                    "Loading reports...",
                    controller.select_status(choices[idx]),
                )
                .await;
            }
            Action::OpenReport => open_report(controller, multi).await?,
            Action::ReportWaste => {
                if session.is_authenticated() {
                    report_waste(controller, multi).await?;
                } else {
                    println!("Please login first to report waste");
                }
            }
            Action::Refresh => {
                with_spinner(multi, "Loading reports...", controller.load()).await;
            }
            Action::Exit => {
                println!("Goodbye.");
                return Ok(());
            }
        }
    }
}

fn print_overview(controller: &ViewController, authenticated: bool) {
    let now = Utc::now();
    println!();
    println!("{}", render::navbar(&controller.api().session().phase()));
    println!();
    println!("{}", render::stats_panel(&controller.statistics()));
    println!();
    println!("{}", render::filters_line(controller.filters()));

    if let Some(error) = controller.error() {
        println!("  {error} (choose \"Refresh\" to try again)");
        return;
    }
    let reports = controller.reports();
    if reports.is_empty() {
        println!("  {}", render::empty_list(authenticated));
    }
    for (n, report) in reports.iter().enumerate() {
        println!("  {:>2}. {}", n + 1, render::report_line(report, now));
    }
}

async fn open_report(
    controller: &ViewController,
    multi: &MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    let reports = controller.reports();
    let now = Utc::now();
    let labels: Vec<String> = reports
        .iter()
        .map(|r| render::report_line(r, now))
        .collect();
    let idx = Select::new()
        .with_prompt("Report")
        .items(&labels)
        .default(0)
        .interact()?;

    let viewer = controller.api().session().principal();
    let mut card = ReportCard::new(reports[idx].clone(), viewer.as_ref());

    loop {
        println!();
        println!("{}", render::card_details(&card, Utc::now()));

        let labels: Vec<&str> = CardAction::ALL.iter().map(|a| a.label(&card)).collect();
        let idx = Select::new()
            .with_prompt("Action")
            .items(&labels)
            .default(0)
            .interact()?;

        match CardAction::ALL[idx] {
            CardAction::Verify => {
                if let Err(e) = card.open_verify(controller) {
                    println!("{e}");
                    continue;
                }
                verify_prompt(&mut card, controller, multi).await?;
                if card.verify_state() == VerifyState::Verified {
                    return Ok(());
                }
            }
            CardAction::MarkCleaned => {
                if let Err(e) = card.check_mark_cleaned(controller) {
                    println!("{e}");
                    continue;
                }
                let confirmed = Confirm::new()
                    .with_prompt(CONFIRM_CLEANED)
                    .default(false)
                    .interact()?;
                if !confirmed {
                    continue;
                }
                let marking = card.mark_cleaned(controller, move || confirmed);
                match with_spinner(multi, "Marking as cleaned...", marking).await {
                    Ok(Some(message)) => {
                        println!("{message}");
                        return Ok(());
                    }
                    Ok(None) => {}
                    Err(e) => println!("Error: {e}"),
                }
            }
            CardAction::Back => return Ok(()),
        }
    }
}

/// Keeps the valid/invalid prompt open until a vote succeeds or the user
/// cancels.
async fn verify_prompt(
    card: &mut ReportCard,
    controller: &ViewController,
    multi: &MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    const CHOICES: &[&str] = &["Valid Report", "Invalid Report", "Cancel"];

    while card.verify_state() == VerifyState::Prompt {
        let idx = Select::new()
            .with_prompt("Do you think this waste report is valid?")
            .items(CHOICES)
            .default(0)
            .interact()?;
        let is_valid = match idx {
            0 => true,
            1 => false,
            _ => {
                card.cancel_verify();
                break;
            }
        };

        let comment: String = Input::new()
            .with_prompt("Comment (optional)")
            .allow_empty(true)
            .interact_text()?;
        let comment = Some(comment).filter(|c| !c.trim().is_empty());

        match with_spinner(
            multi,
            "Submitting verification...",
            card.submit_verification(controller, is_valid, comment),
        )
        .await
        {
            Ok(message) => println!("{message}"),
            Err(e) => println!("Error: {e}"),
        }
    }
    Ok(())
}

async fn report_waste(
    controller: &ViewController,
    multi: &MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut form = ReportForm::new();

    loop {
        println!();
        println!("Report Waste");
        println!("{}", render::form_summary(&form));

        let labels: Vec<&str> = FormAction::ALL.iter().map(|a| a.label()).collect();
        let idx = Select::new()
            .with_prompt("Report form")
            .items(&labels)
            .default(0)
            .interact()?;

        match FormAction::ALL[idx] {
            FormAction::AttachPhoto => {
                let path: String = Input::new()
                    .with_prompt("Path to photo")
                    .interact_text()?;
                match FilePhoto::open(path.trim()).await {
                    Ok(photo) => {
                        if let Err(e) = form.attach_photo(Box::new(photo)) {
                            println!("{e}");
                        }
                    }
                    Err(e) => println!("Cannot open {}: {e}", path.trim()),
                }
            }
            FormAction::DetectLocation => {
                let latitude: f64 = Input::new()
                    .with_prompt("Latitude")
                    .default(-6.2088)
                    .interact_text()?;
                let longitude: f64 = Input::new()
                    .with_prompt("Longitude")
                    .default(106.8456)
                    .interact_text()?;
                with_spinner(
                    multi,
                    "Verifying location...",
                    form.detect_location(controller, latitude, longitude),
                )
                .await;
            }
            FormAction::SelectDistrict => {
                let labels: Vec<&str> = District::all()
                    .iter()
                    .map(|d| d.display_name())
                    .collect();
                let current = form
                    .district()
                    .and_then(|d| District::all().iter().position(|x| *x == d))
                    .unwrap_or(0);
                let idx = Select::new()
                    .with_prompt("District")
                    .items(&labels)
                    .default(current)
                    .interact()?;
                form.set_district(District::all()[idx]);
            }
            FormAction::Describe => {
                let description: String = Input::new()
                    .with_prompt("Description")
                    .with_initial_text(form.description())
                    .allow_empty(true)
                    .interact_text()?;
                form.set_description(description.trim());
            }
            FormAction::Submit => {
                match with_spinner(multi, "Submitting...", form.submit(controller)).await {
                    Ok(id) => {
                        println!("Report submitted successfully! ({id})");
                        return Ok(());
                    }
                    Err(e) => println!("Error: {e}"),
                }
            }
            FormAction::SubmitDemo => {
                match with_spinner(multi, "Submitting...", form.submit_demo(controller)).await {
                    Ok(id) => {
                        println!("Demo report created successfully! ({id})");
                        return Ok(());
                    }
                    Err(e) => println!("Error: {e}"),
                }
            }
            FormAction::Cancel => return Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_actions_follow_authentication() {
        let anonymous = Action::available(false, true);
        assert!(anonymous.contains(&Action::Login));
        assert!(!anonymous.contains(&Action::Logout));

        let signed_in = Action::available(true, true);
        assert!(signed_in.contains(&Action::Logout));
        assert!(!signed_in.contains(&Action::Login));
    }

    #[test]
    fn open_report_needs_reports() {
        assert!(!Action::available(true, false).contains(&Action::OpenReport));
        assert_eq!(Action::available(false, true).last(), Some(&Action::Exit));
    }
}
