//! Numbers shown in the statistics panel.

use clean_ninja_report_models::{District, Statistics};

/// Totals and completion percentage for the statistics panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSummary {
    /// All reports.
    pub total: u64,
    /// Reports still waiting to be cleaned.
    pub reported: u64,
    /// Reports that have been cleaned.
    pub cleaned: u64,
    /// `round((reported + cleaned) / total * 100)`, or 0 with no reports.
    pub completion_percent: u64,
}

impl StatsSummary {
    /// Derives the panel numbers from backend statistics.
    #[must_use]
    pub fn from_statistics(stats: &Statistics) -> Self {
        Self {
            total: stats.total_reports,
            reported: stats.reported_count,
            cleaned: stats.cleaned_count,
            completion_percent: completion_percent(
                stats.reported_count,
                stats.cleaned_count,
                stats.total_reports,
            ),
        }
    }
}

/// Returns `round((reported + cleaned) / total * 100)`, or 0 when `total`
/// is 0.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn completion_percent(reported: u64, cleaned: u64, total: u64) -> u64 {
    if total == 0 {
        return 0;
    }
    let ratio = reported.saturating_add(cleaned) as f64 / total as f64;
    (ratio * 100.0).round() as u64
}

/// Returns the count for `district`, or 0 if the backend did not list it.
#[must_use]
pub fn district_count(stats: &Statistics, district: District) -> u64 {
    stats
        .district_stats
        .iter()
        .find(|d| d.district == district)
        .map_or(0, |d| d.count)
}

#[cfg(test)]
mod tests {
    use clean_ninja_report_models::DistrictCount;

    use super::*;

    #[test]
    fn empty_statistics_are_zero_percent() {
        let summary = StatsSummary::from_statistics(&Statistics::default());
        assert_eq!(summary.total, 0);
        assert_eq!(summary.completion_percent, 0);
    }

    #[test]
    fn percent_rounds_to_nearest() {
        assert_eq!(completion_percent(4, 1, 5), 100);
        assert_eq!(completion_percent(1, 1, 3), 67);
        assert_eq!(completion_percent(0, 1, 8), 13);
    }

    #[test]
    fn district_count_defaults_to_zero() {
        let stats = Statistics {
            total_reports: 3,
            reported_count: 2,
            cleaned_count: 1,
            district_stats: vec![DistrictCount {
                district: District::West,
                count: 3,
            }],
        };
        assert_eq!(district_count(&stats, District::West), 3);
        assert_eq!(district_count(&stats, District::East), 0);
    }
}
