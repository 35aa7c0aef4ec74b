//! The backend's RPC surface.
//!
//! One trait method per remote procedure, taking and returning
//! [`crate::wire`] shapes. Implementations only move bytes; unwrapping
//! tagged results, enforcing authentication and applying read defaults is
//! the job of [`crate::client::ApiClient`].

use async_trait::async_trait;
use clean_ninja_report_models::{District, Principal, ReportStatus};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::TransportError;
use crate::wire::{
    CallResult, Nat, Opt, Tagged, WireLocation, WireLocationInfo, WireReport, WireStatistics,
};

/// Names of the remote procedures, as they appear on the wire.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString, AsRefStr,
)]
#[strum(serialize_all = "camelCase")]
pub enum RemoteMethod {
    /// `createReport(location, district, description, image)`
    CreateReport,
    /// `getAllReports(limit, offset)`
    GetAllReports,
    /// `getReport(id)`
    GetReport,
    /// `getReportsByDistrict(district)`
    GetReportsByDistrict,
    /// `getReportsByStatus(status)`
    GetReportsByStatus,
    /// `getStatistics()`
    GetStatistics,
    /// `verifyReport(id, isValid, comment)`
    VerifyReport,
    /// `markAsCleaned(id)`
    MarkAsCleaned,
    /// `verifyLocation(latitude, longitude)`
    VerifyLocation,
    /// `getUserReports(principal)`
    GetUserReports,
    /// `getMyPrincipal()`
    GetMyPrincipal,
    /// `isAuthenticated()`
    IsAuthenticated,
}

impl RemoteMethod {
    /// Returns `true` for read-only query calls.
    #[must_use]
    pub const fn is_query(self) -> bool {
        match self {
            Self::GetAllReports
            | Self::GetReport
            | Self::GetReportsByDistrict
            | Self::GetReportsByStatus
            | Self::GetStatistics
            | Self::GetUserReports
            | Self::GetMyPrincipal
            | Self::IsAuthenticated => true,
            Self::CreateReport
            | Self::VerifyReport
            | Self::MarkAsCleaned
            | Self::VerifyLocation => false,
        }
    }

    /// Returns the list-fetching methods the view layer uses.
    #[must_use]
    pub const fn list_fetches() -> &'static [Self] {
        &[
            Self::GetAllReports,
            Self::GetReportsByDistrict,
            Self::GetReportsByStatus,
        ]
    }
}

/// A reachable instance of the waste-reporting backend.
///
/// `caller` is the principal the call is made as; `None` is the anonymous
/// identity.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Files a new report, returning its id.
    async fn create_report(
        &self,
        caller: Option<&Principal>,
        location: WireLocation,
        district: Tagged<District>,
        description: String,
        image: Opt<Vec<u8>>,
    ) -> Result<CallResult<String>, TransportError>;

    /// Lists reports, newest first.
    async fn get_all_reports(
        &self,
        caller: Option<&Principal>,
        limit: Nat,
        offset: Nat,
    ) -> Result<Vec<WireReport>, TransportError>;

    /// Fetches a single report.
    async fn get_report(
        &self,
        caller: Option<&Principal>,
        id: String,
    ) -> Result<Opt<WireReport>, TransportError>;

    /// Lists reports in one district.
    async fn get_reports_by_district(
        &self,
        caller: Option<&Principal>,
        district: Tagged<District>,
    ) -> Result<Vec<WireReport>, TransportError>;

    /// Lists reports with one status.
    async fn get_reports_by_status(
        &self,
        caller: Option<&Principal>,
        status: Tagged<ReportStatus>,
    ) -> Result<Vec<WireReport>, TransportError>;

    /// Returns aggregate counts.
    async fn get_statistics(
        &self,
        caller: Option<&Principal>,
    ) -> Result<WireStatistics, TransportError>;

    /// Appends a verification to a report.
    async fn verify_report(
        &self,
        caller: Option<&Principal>,
        id: String,
        is_valid: bool,
        comment: Opt<String>,
    ) -> Result<CallResult<()>, TransportError>;

    /// Moves a report from reported to cleaned.
    async fn mark_as_cleaned(
        &self,
        caller: Option<&Principal>,
        id: String,
    ) -> Result<CallResult<()>, TransportError>;

    /// Resolves coordinates to a district and address.
    async fn verify_location(
        &self,
        caller: Option<&Principal>,
        latitude: f64,
        longitude: f64,
    ) -> Result<CallResult<WireLocationInfo>, TransportError>;

    /// Lists reports filed by `reporter`.
    async fn get_user_reports(
        &self,
        caller: Option<&Principal>,
        reporter: String,
    ) -> Result<Vec<WireReport>, TransportError>;

    /// Returns the principal the backend sees for `caller`.
    async fn get_my_principal(&self, caller: Option<&Principal>) -> Result<String, TransportError>;

    /// Returns whether the backend considers `caller` authenticated.
    async fn is_authenticated(&self, caller: Option<&Principal>) -> Result<bool, TransportError>;
}
