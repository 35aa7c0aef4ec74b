#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Waste report, verification, district and statistics types.
//!
//! These are the plain values the rest of the workspace passes around once
//! the backend's wire shapes have been decoded. The report status and the
//! verification list are owned by the backend: a [`Report`] held by the
//! client is a snapshot and is replaced wholesale after every mutation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// One of the five administrative districts of Jakarta.
///
/// The string form (`"central"`, `"west"`, ...) is also the tag name the
/// backend uses for the variant on the wire.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum District {
    /// Jakarta Pusat
    Central,
    /// Jakarta Barat
    West,
    /// Jakarta Selatan
    South,
    /// Jakarta Timur
    East,
    /// Jakarta Utara
    North,
}

impl District {
    /// Returns all variants of this enum, in menu order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Central, Self::West, Self::South, Self::East, Self::North]
    }

    /// Returns the human-readable name shown in lists and forms.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Central => "Central Jakarta",
            Self::West => "West Jakarta",
            Self::South => "South Jakarta",
            Self::East => "East Jakarta",
            Self::North => "North Jakarta",
        }
    }

    /// Parses a display name such as `"West Jakarta"` back into a district.
    ///
    /// Only the first word is significant, so `"west"` and `"West Jakarta"`
    /// both resolve to [`District::West`].
    #[must_use]
    pub fn from_display_name(name: &str) -> Option<Self> {
        let first = name.split_whitespace().next()?;
        first.to_lowercase().parse().ok()
    }
}

/// Lifecycle of a report. `Reported -> Cleaned` is the only transition.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ReportStatus {
    /// Waste has been reported and not yet cleaned up.
    Reported,
    /// Waste has been cleaned up. Terminal.
    Cleaned,
}

impl ReportStatus {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Reported, Self::Cleaned]
    }

    /// Returns the label shown on report cards.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Reported => "Reported",
            Self::Cleaned => "Cleaned",
        }
    }
}

/// Identity string of a caller as issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Principal(String);

impl Principal {
    /// Wraps an identity string.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the identity string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Principal {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Geographic position of a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// Human-readable address resolved for the coordinates, if any.
    pub address: Option<String>,
}

impl Location {
    /// Creates a location without a resolved address.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            address: None,
        }
    }
}

/// A single peer judgement on a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verification {
    /// Who submitted the verification.
    pub verifier: Principal,
    /// Submission time in nanoseconds since the Unix epoch.
    pub timestamp: i64,
    /// Whether the verifier judged the report to be genuine.
    pub is_valid: bool,
    /// Optional free-text comment.
    pub comment: Option<String>,
}

/// A geotagged waste report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Backend-assigned identifier.
    pub id: String,
    /// Who submitted the report.
    pub reporter: Principal,
    /// Where the waste was found.
    pub location: Location,
    /// District the location belongs to.
    pub district: District,
    /// Free-text description.
    pub description: String,
    /// Optional photo bytes.
    pub image: Option<Vec<u8>>,
    /// Creation time in nanoseconds since the Unix epoch.
    pub timestamp: i64,
    /// Current lifecycle status.
    pub status: ReportStatus,
    /// Verifications in submission order.
    pub verifications: Vec<Verification>,
}

impl Report {
    /// Returns `true` while the report has not been cleaned.
    #[must_use]
    pub fn is_reported(&self) -> bool {
        self.status == ReportStatus::Reported
    }

    /// Returns `(valid, invalid)` verification tallies.
    #[must_use]
    pub fn verification_counts(&self) -> (usize, usize) {
        let valid = self.verifications.iter().filter(|v| v.is_valid).count();
        (valid, self.verifications.len() - valid)
    }

    /// Returns `true` if `principal` appears in the verification list.
    ///
    /// Derived from the fetched snapshot only. The backend decides whether
    /// a repeated verification is accepted.
    #[must_use]
    pub fn has_verified(&self, principal: &Principal) -> bool {
        self.verifications.iter().any(|v| &v.verifier == principal)
    }

    /// Returns the creation time as a UTC datetime.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_nanos(self.timestamp)
    }
}

/// Result of resolving a coordinate pair to a district.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationInfo {
    /// District the coordinates fall in.
    pub district: District,
    /// Human-readable address.
    pub address: String,
    /// Whether the location was accepted as inside the service area.
    pub is_valid: bool,
}

/// Number of reports in a single district.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistrictCount {
    /// The district.
    pub district: District,
    /// Reports filed in it.
    pub count: u64,
}

/// Aggregate counts computed by the backend. Read-only on the client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    /// All reports.
    pub total_reports: u64,
    /// Reports still waiting to be cleaned.
    pub reported_count: u64,
    /// Reports that have been cleaned.
    pub cleaned_count: u64,
    /// Per-district report counts.
    pub district_stats: Vec<DistrictCount>,
}

/// District half of the list filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DistrictFilter {
    /// No district restriction.
    #[default]
    All,
    /// Only reports in this district.
    Only(District),
}

/// Status half of the list filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StatusFilter {
    /// No status restriction.
    #[default]
    All,
    /// Only reports with this status.
    Only(ReportStatus),
}

/// Error returned when a filter string names no known district or status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidFilterError {
    /// The rejected input.
    pub value: String,
}

impl std::fmt::Display for InvalidFilterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid filter value '{}'", self.value)
    }
}

impl std::error::Error for InvalidFilterError {}

impl std::str::FromStr for DistrictFilter {
    type Err = InvalidFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        s.to_lowercase()
            .parse()
            .map(Self::Only)
            .map_err(|_| InvalidFilterError {
                value: s.to_string(),
            })
    }
}

impl std::str::FromStr for StatusFilter {
    type Err = InvalidFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        s.to_lowercase()
            .parse()
            .map(Self::Only)
            .map_err(|_| InvalidFilterError {
                value: s.to_string(),
            })
    }
}

impl std::fmt::Display for DistrictFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Only(district) => write!(f, "{district}"),
        }
    }
}

impl std::fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Only(status) => write!(f, "{status}"),
        }
    }
}

/// The list view's current filter. Client-side only, never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FilterSelection {
    /// District restriction.
    pub district: DistrictFilter,
    /// Status restriction.
    pub status: StatusFilter,
}

impl FilterSelection {
    /// Creates a selection from both halves.
    #[must_use]
    pub const fn new(district: DistrictFilter, status: StatusFilter) -> Self {
        Self { district, status }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verification(verifier: &str, is_valid: bool) -> Verification {
        Verification {
            verifier: Principal::new(verifier),
            timestamp: 0,
            is_valid,
            comment: None,
        }
    }

    fn report(verifications: Vec<Verification>) -> Report {
        Report {
            id: "report-1".to_string(),
            reporter: Principal::new("reporter"),
            location: Location::new(-6.2, 106.8),
            district: District::Central,
            description: "Plastic bags by the canal".to_string(),
            image: None,
            timestamp: 1_700_000_000_000_000_000,
            status: ReportStatus::Reported,
            verifications,
        }
    }

    #[test]
    fn district_tags_are_lowercase() {
        assert_eq!(District::Central.as_ref(), "central");
        assert_eq!("north".parse::<District>().unwrap(), District::North);
        assert!("Central".parse::<District>().is_err());
    }

    #[test]
    fn district_display_name_roundtrip() {
        for district in District::all() {
            assert_eq!(
                District::from_display_name(district.display_name()),
                Some(*district)
            );
        }
        assert_eq!(District::from_display_name(""), None);
        assert_eq!(District::from_display_name("Bandung"), None);
    }

    #[test]
    fn filters_parse_all_and_tags() {
        assert_eq!("all".parse::<DistrictFilter>().unwrap(), DistrictFilter::All);
        assert_eq!(
            "South".parse::<DistrictFilter>().unwrap(),
            DistrictFilter::Only(District::South)
        );
        assert_eq!(
            "cleaned".parse::<StatusFilter>().unwrap(),
            StatusFilter::Only(ReportStatus::Cleaned)
        );
        assert!("somewhere".parse::<DistrictFilter>().is_err());
        assert_eq!(StatusFilter::Only(ReportStatus::Reported).to_string(), "reported");
    }

    #[test]
    fn counts_and_has_verified() {
        let r = report(vec![
            verification("alice", true),
            verification("bob", false),
            verification("alice", true),
        ]);
        assert_eq!(r.verification_counts(), (2, 1));
        assert!(r.has_verified(&Principal::new("bob")));
        assert!(!r.has_verified(&Principal::new("carol")));
    }

    #[test]
    fn created_at_uses_nanoseconds() {
        let r = report(Vec::new());
        assert_eq!(r.created_at().timestamp(), 1_700_000_000);
    }

    #[test]
    fn statistics_default_is_zeroed() {
        let stats = Statistics::default();
        assert_eq!(stats.total_reports, 0);
        assert!(stats.district_stats.is_empty());
    }
}
