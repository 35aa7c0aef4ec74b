//! Filtered report list and statistics.
//!
//! A filter pair maps to exactly one backend fetch (see [`FetchPlan`]).
//! Every fetch is numbered when it is issued; a result is applied only if
//! its number is higher than the last applied one, so a slow response to
//! an old filter can never overwrite the answer to a newer one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use clean_ninja_api::{ApiClient, CONNECTION_FAILED_MESSAGE};
use clean_ninja_report_models::{
    District, DistrictFilter, FilterSelection, Report, ReportStatus, Statistics, StatusFilter,
};

/// Number of reports requested when no filter is active.
pub const PAGE_SIZE: u64 = 20;

/// The backend fetch a filter pair maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPlan {
    /// `getAllReports(limit, offset)`
    Page {
        /// Maximum number of reports.
        limit: u64,
        /// Reports to skip.
        offset: u64,
    },
    /// `getReportsByDistrict(district)`
    District(District),
    /// `getReportsByStatus(status)`
    Status(ReportStatus),
    /// `getReportsByDistrict(district)`, then keep only `status`.
    DistrictWithStatus(District, ReportStatus),
}

impl FetchPlan {
    /// Picks the fetch for a filter pair.
    #[must_use]
    pub const fn for_filters(filters: FilterSelection) -> Self {
        match (filters.district, filters.status) {
            (DistrictFilter::All, StatusFilter::All) => Self::Page {
                limit: PAGE_SIZE,
                offset: 0,
            },
            (DistrictFilter::Only(district), StatusFilter::All) => Self::District(district),
            (DistrictFilter::All, StatusFilter::Only(status)) => Self::Status(status),
            (DistrictFilter::Only(district), StatusFilter::Only(status)) => {
                Self::DistrictWithStatus(district, status)
            }
        }
    }

    /// Issues the fetch. Never fails; the client substitutes an empty list.
    pub async fn run(self, api: &ApiClient) -> Vec<Report> {
        match self {
            Self::Page { limit, offset } => api.get_all_reports(limit, offset).await,
            Self::District(district) => api.get_reports_by_district(district).await,
            Self::Status(status) => api.get_reports_by_status(status).await,
            Self::DistrictWithStatus(district, status) => api
                .get_reports_by_district(district)
                .await
                .into_iter()
                .filter(|r| r.status == status)
                .collect(),
        }
    }
}

#[derive(Debug, Default)]
struct ViewState {
    filters: FilterSelection,
    reports: Vec<Report>,
    statistics: Statistics,
    loading: bool,
    error: Option<String>,
    reports_applied: u64,
    statistics_applied: u64,
}

/// Owns what the report list shows.
#[derive(Debug)]
pub struct ViewController {
    api: ApiClient,
    reports_issued: AtomicU64,
    statistics_issued: AtomicU64,
    state: Mutex<ViewState>,
}

impl ViewController {
    /// Creates a controller with both filters set to "all" and nothing
    /// loaded yet.
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            reports_issued: AtomicU64::new(0),
            statistics_issued: AtomicU64::new(0),
            state: Mutex::new(ViewState::default()),
        }
    }

    /// Returns the client used for fetches and mutations.
    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    fn state(&self) -> MutexGuard<'_, ViewState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the active filters.
    #[must_use]
    pub fn filters(&self) -> FilterSelection {
        self.state().filters
    }

    /// Returns the reports currently shown.
    #[must_use]
    pub fn reports(&self) -> Vec<Report> {
        self.state().reports.clone()
    }

    /// Returns the statistics currently shown.
    #[must_use]
    pub fn statistics(&self) -> Statistics {
        self.state().statistics.clone()
    }

    /// Returns whether the most recently issued fetch is still running.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state().loading
    }

    /// Returns the error to show instead of the list, if any.
    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.state().error.clone()
    }

    /// Refreshes statistics, then the report list for the current filters.
    pub async fn load(&self) {
        {
            let mut state = self.state();
            state.error = if self.api.is_connected() {
                None
            } else {
                Some(CONNECTION_FAILED_MESSAGE.to_string())
            };
        }
        self.refresh_statistics().await;
        self.fetch_reports().await;
    }

    /// Re-runs the current fetch and statistics after a create, verify or
    /// mark-cleaned. Nothing is patched locally.
    pub async fn refresh_after_mutation(&self) {
        self.load().await;
    }

    /// Replaces both filters and refetches once.
    pub async fn apply_filters(&self, filters: FilterSelection) {
        self.state().filters = filters;
        self.fetch_reports().await;
    }

    /// Changes the district filter and refetches.
    pub async fn select_district(&self, district: DistrictFilter) {
        self.state().filters.district = district;
        self.fetch_reports().await;
    }

    /// Changes the status filter and refetches.
    pub async fn select_status(&self, status: StatusFilter) {
        self.state().filters.status = status;
        self.fetch_reports().await;
    }

    async fn refresh_statistics(&self) {
        let seq = self.statistics_issued.fetch_add(1, Ordering::SeqCst) + 1;
        let statistics = self.api.get_statistics().await;

        let mut state = self.state();
        if seq > state.statistics_applied {
            state.statistics = statistics;
            state.statistics_applied = seq;
        } else {
            log::debug!("Discarding stale statistics #{seq}");
        }
    }

    async fn fetch_reports(&self) {
        let (seq, plan) = {
            let mut state = self.state();
            let seq = self.reports_issued.fetch_add(1, Ordering::SeqCst) + 1;
            state.loading = true;
            (seq, FetchPlan::for_filters(state.filters))
        };
        log::debug!("Fetch #{seq}: {plan:?}");

        let reports = plan.run(&self.api).await;

        let mut state = self.state();
        if seq > state.reports_applied {
            log::debug!("Fetch #{seq}: showing {} reports", reports.len());
            state.reports = reports;
            state.reports_applied = seq;
        } else {
            log::debug!(
                "Discarding stale fetch #{seq} (already showing #{})",
                state.reports_applied
            );
        }
        if seq == self.reports_issued.load(Ordering::SeqCst) {
            state.loading = false;
        }
    }
}
