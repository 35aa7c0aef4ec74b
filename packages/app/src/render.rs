//! Plain-text rendering of view state.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use clean_ninja_report_models::{
    District, DistrictFilter, FilterSelection, Report, ReportStatus, Statistics, StatusFilter,
};
use clean_ninja_session::SessionPhase;
use clean_ninja_view::card::{self, ReportCard};
use clean_ninja_view::form::ReportForm;
use clean_ninja_view::stats::{self, StatsSummary};

/// Top line: app name and who is signed in.
#[must_use]
pub fn navbar(phase: &SessionPhase) -> String {
    let who = match phase {
        SessionPhase::Initializing => "Loading...".to_string(),
        SessionPhase::Anonymous => "Not logged in".to_string(),
        SessionPhase::Authenticated(principal) => {
            format!("Logged in as {}", card::short_reporter(principal))
        }
    };
    format!("Clean Ninja | {who}")
}

/// Totals, completion and per-district counts.
#[must_use]
pub fn stats_panel(statistics: &Statistics) -> String {
    let summary = StatsSummary::from_statistics(statistics);
    let mut out = format!(
        "Total: {}  Reported: {}  Cleaned: {}  Completion: {}%",
        summary.total, summary.reported, summary.cleaned, summary.completion_percent
    );
    for district in District::all() {
        write!(
            out,
            "\n  {:<16} {}",
            district.display_name(),
            stats::district_count(statistics, *district)
        )
        .ok();
    }
    out
}

/// Label for a district filter choice.
#[must_use]
pub const fn district_filter_label(filter: DistrictFilter) -> &'static str {
    match filter {
        DistrictFilter::All => "All Districts",
        DistrictFilter::Only(district) => district.display_name(),
    }
}

/// Label for a status filter choice.
#[must_use]
pub const fn status_filter_label(filter: StatusFilter) -> &'static str {
    match filter {
        StatusFilter::All => "All Statuses",
        StatusFilter::Only(status) => status.label(),
    }
}

/// One line describing the active filters.
#[must_use]
pub fn filters_line(filters: FilterSelection) -> String {
    format!(
        "District: {} | Status: {}",
        district_filter_label(filters.district),
        status_filter_label(filters.status)
    )
}

/// One line per report for the list.
#[must_use]
pub fn report_line(report: &Report, now: DateTime<Utc>) -> String {
    let (valid, invalid) = report.verification_counts();
    format!(
        "[{}] {} | {} | {} | {valid} verified, {invalid} invalid",
        report.status.label(),
        card::description_preview(&report.description),
        report.district.display_name(),
        card::time_ago(report.timestamp, now),
    )
}

/// What the list area shows when there are no reports.
#[must_use]
pub fn empty_list(authenticated: bool) -> &'static str {
    if authenticated {
        "No reports found. Choose \"Report waste\" to create a new report."
    } else {
        "No reports found. Please login to create a report."
    }
}

/// Full details of a report card.
#[must_use]
pub fn card_details(card: &ReportCard, now: DateTime<Utc>) -> String {
    let report = card.report();
    let (valid, invalid) = report.verification_counts();
    let mut out = format!(
        "{}\n  Status:   {}\n  Reported: {} by {}\n  District: {}\n  Map:      {}",
        card::description_preview(&report.description),
        report.status.label(),
        card::time_ago(report.timestamp, now),
        card::short_reporter(&report.reporter),
        report.district.display_name(),
        card::map_url(&report.location),
    );
    if let Some(address) = &report.location.address {
        write!(out, "\n  Address:  {address}").ok();
    }
    write!(
        out,
        "\n  Votes:    {valid} verified, {invalid} invalid\n  Photo:    {}",
        report
            .image
            .as_ref()
            .map_or_else(|| "none".to_string(), |bytes| format!("{} bytes", bytes.len()))
    )
    .ok();
    out
}

/// Current contents of the report form.
#[must_use]
pub fn form_summary(form: &ReportForm) -> String {
    let photo = form
        .photo()
        .map_or_else(|| "none".to_string(), |p| format!("{} ({} bytes)", p.mime_type(), p.size()));
    let location = form.location().map_or_else(
        || "Click \"Detect location\" to set".to_string(),
        |l| {
            l.address.clone().unwrap_or_else(|| {
                format!("{:.6}, {:.6}", l.latitude, l.longitude)
            })
        },
    );
    let district = form
        .district()
        .map_or("not selected", District::display_name);
    let description = if form.description().is_empty() {
        "(empty)"
    } else {
        form.description()
    };
    format!(
        "  Photo:       {photo}\n  Location:    {location}\n  District:    {district}\n  Description: {description}"
    )
}

/// Filter choices in menu order, "all" first.
#[must_use]
pub fn district_choices() -> Vec<DistrictFilter> {
    std::iter::once(DistrictFilter::All)
        .chain(District::all().iter().copied().map(DistrictFilter::Only))
        .collect()
}

/// Filter choices in menu order, "all" first.
#[must_use]
pub fn status_choices() -> Vec<StatusFilter> {
    std::iter::once(StatusFilter::All)
        .chain(ReportStatus::all().iter().copied().map(StatusFilter::Only))
        .collect()
}

#[cfg(test)]
mod tests {
    use clean_ninja_report_models::{DistrictCount, Location, Principal, Verification};

    use super::*;

    fn sample() -> Report {
        Report {
            id: "report-1".to_string(),
            reporter: Principal::new("abcdefghijklmnop"),
            location: Location {
                latitude: -6.18,
                longitude: 106.82,
                address: Some("Monas".to_string()),
            },
            district: District::Central,
            description: "Overflowing bins".to_string(),
            image: None,
            timestamp: 0,
            status: ReportStatus::Reported,
            verifications: vec![Verification {
                verifier: Principal::new("bob"),
                timestamp: 0,
                is_valid: true,
                comment: None,
            }],
        }
    }

    fn epoch_plus(seconds: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(seconds, 0).unwrap()
    }

    #[test]
    fn navbar_shows_session() {
        assert_eq!(navbar(&SessionPhase::Anonymous), "Clean Ninja | Not logged in");
        assert_eq!(
            navbar(&SessionPhase::Authenticated(Principal::new("abcdefghijklmnop"))),
            "Clean Ninja | Logged in as abcdefghij..."
        );
    }

    #[test]
    fn stats_panel_lists_every_district() {
        let stats = Statistics {
            total_reports: 4,
            reported_count: 3,
            cleaned_count: 1,
            district_stats: vec![DistrictCount {
                district: District::North,
                count: 4,
            }],
        };
        let panel = stats_panel(&stats);
        assert!(panel.starts_with("Total: 4  Reported: 3  Cleaned: 1  Completion: 100%"));
        assert_eq!(panel.lines().count(), 1 + District::all().len());
        assert!(panel.contains("North Jakarta    4"));
        assert!(panel.contains("West Jakarta     0"));
    }

    #[test]
    fn report_line_summarises() {
        assert_eq!(
            report_line(&sample(), epoch_plus(120)),
            "[Reported] Overflowing bins | Central Jakarta | 2 minutes ago | 1 verified, 0 invalid"
        );
    }

    #[test]
    fn card_details_include_map_and_address() {
        let card = ReportCard::new(sample(), None);
        let details = card_details(&card, epoch_plus(30));
        assert!(details.contains("https://maps.google.com/?q=-6.18,106.82"));
        assert!(details.contains("Address:  Monas"));
        assert!(details.contains("by abcdefghij..."));
        assert!(details.contains("Photo:    none"));
    }

    #[test]
    fn filter_labels_and_choices() {
        assert_eq!(
            filters_line(FilterSelection::default()),
            "District: All Districts | Status: All Statuses"
        );
        assert_eq!(district_choices().len(), 6);
        assert_eq!(status_choices().len(), 3);
        assert_eq!(district_filter_label(district_choices()[2]), "West Jakarta");
    }

    #[test]
    fn empty_form_summary() {
        let summary = form_summary(&ReportForm::new());
        assert!(summary.contains("Photo:       none"));
        assert!(summary.contains("District:    not selected"));
        assert!(summary.contains("Description: (empty)"));
    }
}
