//! Normalizing client over a [`Backend`].
//!
//! Writes check the session first and never touch the network while
//! anonymous. Transport failures on writes become
//! [`ApiError::ConnectionFailure`]; tagged errors become
//! [`ApiError::BackendRejected`]. Reads log failures and return empty
//! defaults.

use std::sync::Arc;

use clean_ninja_report_models::{
    District, Location, LocationInfo, Principal, Report, ReportStatus, Statistics,
};
use clean_ninja_session::Session;

use crate::backend::Backend;
use crate::fallback;
use crate::wire::{CallResult, Nat, Opt, Tagged, WireLocation, WireReport};
use crate::{ApiError, TransportError};

/// Remote access layer used by the view.
#[derive(Clone)]
pub struct ApiClient {
    backend: Option<Arc<dyn Backend>>,
    session: Arc<Session>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("connected", &self.backend.is_some())
            .field("session", &self.session)
            .finish()
    }
}

fn connection_failure(op: &str, e: &TransportError) -> ApiError {
    log::error!("{op} failed: {e}");
    ApiError::connection_failure()
}

/// Logs and drops a read failure.
fn absorb<T>(op: &str, result: Result<T, TransportError>) -> Option<T> {
    result
        .map_err(|e| log::warn!("{op} failed: {e}"))
        .ok()
}

fn reports(list: Vec<WireReport>) -> Vec<Report> {
    list.into_iter().map(Report::from).collect()
}

impl ApiClient {
    /// Creates a client calling `backend` on behalf of `session`.
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>, session: Arc<Session>) -> Self {
        Self {
            backend: Some(backend),
            session,
        }
    }

    /// Creates a client with no backend. Every write fails with
    /// [`ApiError::ConnectionFailure`] and every read returns its default.
    #[must_use]
    pub const fn disconnected(session: Arc<Session>) -> Self {
        Self {
            backend: None,
            session,
        }
    }

    /// Returns the session this client acts for.
    #[must_use]
    pub const fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Returns whether a backend is configured.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.backend.is_some()
    }

    /// Resolves the caller and backend for a mutation.
    fn writer(&self) -> Result<(Principal, &Arc<dyn Backend>), ApiError> {
        let principal = self
            .session
            .principal()
            .ok_or(ApiError::AuthenticationRequired)?;
        let backend = self.backend.as_ref().ok_or_else(|| {
            log::error!("No backend configured");
            ApiError::connection_failure()
        })?;
        Ok((principal, backend))
    }

    /// Files a new report and returns its id.
    ///
    /// # Errors
    ///
    /// * [`ApiError::AuthenticationRequired`] if the session is anonymous
    /// * [`ApiError::ConnectionFailure`] if the backend cannot be reached
    /// * [`ApiError::BackendRejected`] if the backend refuses the report
    pub async fn create_report(
        &self,
        location: &Location,
        district: District,
        description: &str,
        image: Option<Vec<u8>>,
    ) -> Result<String, ApiError> {
        let (caller, backend) = self.writer()?;
        let id = backend
            .create_report(
                Some(&caller),
                WireLocation::from(location),
                Tagged(district),
                description.to_string(),
                Opt(image),
            )
            .await
            .map_err(|e| connection_failure("createReport", &e))?
            .into_result()?;
        log::info!("Created report {id} in {district}");
        Ok(id)
    }

    /// Records a verification vote on a report.
    ///
    /// # Errors
    ///
    /// Same as [`Self::create_report`].
    pub async fn verify_report(
        &self,
        id: &str,
        is_valid: bool,
        comment: Option<String>,
    ) -> Result<(), ApiError> {
        let (caller, backend) = self.writer()?;
        backend
            .verify_report(Some(&caller), id.to_string(), is_valid, Opt(comment))
            .await
            .map_err(|e| connection_failure("verifyReport", &e))?
            .into_result()?;
        log::info!("Verified {id} as {}", if is_valid { "valid" } else { "invalid" });
        Ok(())
    }

    /// Moves a report to the cleaned state.
    ///
    /// # Errors
    ///
    /// Same as [`Self::create_report`].
    pub async fn mark_as_cleaned(&self, id: &str) -> Result<(), ApiError> {
        let (caller, backend) = self.writer()?;
        backend
            .mark_as_cleaned(Some(&caller), id.to_string())
            .await
            .map_err(|e| connection_failure("markAsCleaned", &e))?
            .into_result()?;
        log::info!("Marked {id} as cleaned");
        Ok(())
    }

    /// Returns the backend for a read, or `None` after logging that the
    /// read was skipped.
    fn reader(&self, op: &str) -> Option<(&dyn Backend, Option<Principal>)> {
        let Some(backend) = self.backend.as_deref() else {
            log::debug!("{op} skipped: no backend configured");
            return None;
        };
        Some((backend, self.session.principal()))
    }

    /// Lists reports, newest first. Empty on failure.
    pub async fn get_all_reports(&self, limit: u64, offset: u64) -> Vec<Report> {
        let Some((backend, caller)) = self.reader("getAllReports") else {
            return Vec::new();
        };
        absorb(
            "getAllReports",
            backend
                .get_all_reports(caller.as_ref(), Nat(limit), Nat(offset))
                .await,
        )
        .map(reports)
        .unwrap_or_default()
    }

    /// Fetches a single report. `None` if absent or on failure.
    pub async fn get_report(&self, id: &str) -> Option<Report> {
        let (backend, caller) = self.reader("getReport")?;
        absorb(
            "getReport",
            backend.get_report(caller.as_ref(), id.to_string()).await,
        )
        .and_then(|opt| opt.0)
        .map(Report::from)
    }

    /// Lists reports in `district`. Empty on failure.
    pub async fn get_reports_by_district(&self, district: District) -> Vec<Report> {
        let Some((backend, caller)) = self.reader("getReportsByDistrict") else {
            return Vec::new();
        };
        absorb(
            "getReportsByDistrict",
            backend
                .get_reports_by_district(caller.as_ref(), Tagged(district))
                .await,
        )
        .map(reports)
        .unwrap_or_default()
    }

    /// Lists reports with `status`. Empty on failure.
    pub async fn get_reports_by_status(&self, status: ReportStatus) -> Vec<Report> {
        let Some((backend, caller)) = self.reader("getReportsByStatus") else {
            return Vec::new();
        };
        absorb(
            "getReportsByStatus",
            backend
                .get_reports_by_status(caller.as_ref(), Tagged(status))
                .await,
        )
        .map(reports)
        .unwrap_or_default()
    }

    /// Lists reports filed by `reporter`. Empty on failure.
    pub async fn get_user_reports(&self, reporter: &Principal) -> Vec<Report> {
        let Some((backend, caller)) = self.reader("getUserReports") else {
            return Vec::new();
        };
        absorb(
            "getUserReports",
            backend
                .get_user_reports(caller.as_ref(), reporter.as_str().to_string())
                .await,
        )
        .map(reports)
        .unwrap_or_default()
    }

    /// Fetches aggregate counts. Zeroed on failure.
    pub async fn get_statistics(&self) -> Statistics {
        let Some((backend, caller)) = self.reader("getStatistics") else {
            return Statistics::default();
        };
        absorb(
            "getStatistics",
            backend.get_statistics(caller.as_ref()).await,
        )
        .map(Statistics::from)
        .unwrap_or_default()
    }

    /// Asks the backend who the caller is. `None` when anonymous or
    /// unreachable.
    pub async fn get_my_principal(&self) -> Option<Principal> {
        let (backend, caller) = self.reader("getMyPrincipal")?;
        let caller = caller?;
        absorb(
            "getMyPrincipal",
            backend.get_my_principal(Some(&caller)).await,
        )
        .map(Principal::new)
    }

    /// Asks the backend whether the caller is authenticated. `false` on
    /// failure.
    pub async fn is_authenticated(&self) -> bool {
        let Some((backend, caller)) = self.reader("isAuthenticated") else {
            return false;
        };
        absorb(
            "isAuthenticated",
            backend.is_authenticated(caller.as_ref()).await,
        )
        .unwrap_or(false)
    }

    /// Resolves coordinates to a district and address.
    ///
    /// Falls back to [`fallback::location_info`] when the backend is
    /// unreachable or rejects the coordinates, so the result always names
    /// a district.
    pub async fn verify_location(&self, latitude: f64, longitude: f64) -> LocationInfo {
        let answer = match self.reader("verifyLocation") {
            Some((backend, caller)) => absorb(
                "verifyLocation",
                backend
                    .verify_location(caller.as_ref(), latitude, longitude)
                    .await,
            ),
            None => None,
        };
        match answer.map(CallResult::into_result) {
            Some(Ok(info)) => LocationInfo::from(info),
            Some(Err(e)) => {
                log::warn!("verifyLocation rejected ({latitude}, {longitude}): {e}");
                fallback::location_info(latitude, longitude)
            }
            None => fallback::location_info(latitude, longitude),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use clean_ninja_session::{IdentityProvider, LoginOptions, SessionError};

    use super::*;
    use crate::RemoteMethod;
    use crate::memory::InMemoryBackend;

    struct FixedProvider(Option<Principal>);

    #[async_trait]
    impl IdentityProvider for FixedProvider {
        async fn restore(&self) -> Result<Option<Principal>, SessionError> {
            Ok(self.0.clone())
        }

        async fn login(&self, _options: &LoginOptions) -> Result<Principal, SessionError> {
            self.0.clone().ok_or_else(|| SessionError::Provider {
                message: "cancelled".to_string(),
            })
        }

        async fn logout(&self) -> Result<(), SessionError> {
            Ok(())
        }
    }

    async fn session(principal: Option<&str>) -> Arc<Session> {
        Arc::new(
            Session::start(
                Arc::new(FixedProvider(principal.map(Principal::new))),
                LoginOptions::new("http://localhost:8000"),
            )
            .await,
        )
    }

    async fn client(principal: Option<&str>) -> (ApiClient, Arc<InMemoryBackend>) {
        let backend = Arc::new(InMemoryBackend::new());
        let client = ApiClient::new(backend.clone(), session(principal).await);
        (client, backend)
    }

    fn jakarta() -> Location {
        Location::new(-6.18, 106.82)
    }

    #[tokio::test]
    async fn anonymous_mutations_never_reach_the_backend() {
        let (client, backend) = client(None).await;

        let created = client
            .create_report(&jakarta(), District::Central, "bins", None)
            .await;
        let verified = client.verify_report("report-1", true, None).await;
        let cleaned = client.mark_as_cleaned("report-1").await;

        assert_eq!(created, Err(ApiError::AuthenticationRequired));
        assert_eq!(verified, Err(ApiError::AuthenticationRequired));
        assert_eq!(cleaned, Err(ApiError::AuthenticationRequired));
        assert_eq!(backend.total_calls(), 0);
    }

    #[tokio::test]
    async fn create_then_read_back() {
        let (client, _backend) = client(Some("alice")).await;
        let id = client
            .create_report(&jakarta(), District::Central, "bins", Some(vec![1, 2, 3]))
            .await
            .unwrap();

        let report = client.get_report(&id).await.unwrap();
        assert_eq!(report.reporter, Principal::new("alice"));
        assert_eq!(report.image, Some(vec![1, 2, 3]));
        assert_eq!(report.status, ReportStatus::Reported);
        assert_eq!(client.get_user_reports(&Principal::new("alice")).await.len(), 1);
        assert!(client.get_report("report-99").await.is_none());
    }

    #[tokio::test]
    async fn tagged_errors_surface_verbatim() {
        let (client, _backend) = client(Some("alice")).await;
        let err = client.mark_as_cleaned("report-42").await.unwrap_err();
        assert_eq!(
            err,
            ApiError::BackendRejected {
                message: "Report not found".to_string()
            }
        );
    }

    #[tokio::test]
    async fn transport_failures_become_generic_connection_errors() {
        let (client, backend) = client(Some("alice")).await;
        backend.set_available(false);

        let err = client
            .create_report(&jakarta(), District::West, "bins", None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), crate::CONNECTION_FAILED_MESSAGE);
        assert!(matches!(err, ApiError::ConnectionFailure { .. }));
    }

    #[tokio::test]
    async fn disconnected_client_fails_writes_and_defaults_reads() {
        let client = ApiClient::disconnected(session(Some("alice")).await);
        assert!(matches!(
            client.mark_as_cleaned("report-1").await,
            Err(ApiError::ConnectionFailure { .. })
        ));
        assert!(client.get_all_reports(20, 0).await.is_empty());
        assert_eq!(client.get_statistics().await, Statistics::default());
        assert!(!client.is_authenticated().await);
    }

    #[tokio::test]
    async fn reads_degrade_when_offline() {
        let (client, backend) = client(Some("alice")).await;
        client
            .create_report(&jakarta(), District::Central, "bins", None)
            .await
            .unwrap();
        backend.set_available(false);

        assert!(client.get_all_reports(20, 0).await.is_empty());
        assert!(client.get_reports_by_district(District::Central).await.is_empty());
        assert!(client.get_reports_by_status(ReportStatus::Reported).await.is_empty());
        assert_eq!(client.get_statistics().await.total_reports, 0);
        assert!(client.get_my_principal().await.is_none());
        assert_eq!(backend.calls(RemoteMethod::GetStatistics), 1);
    }

    #[tokio::test]
    async fn verify_location_uses_backend_then_falls_back() {
        let (client, backend) = client(None).await;

        let resolved = client.verify_location(-6.12, 106.85).await;
        assert_eq!(resolved.district, District::North);
        assert!(resolved.address.starts_with("North Jakarta"));

        let rejected = client.verify_location(-6.3, 106.5).await;
        assert_eq!(rejected, fallback::location_info(-6.3, 106.5));
        assert_eq!(rejected.district, District::West);

        backend.set_available(false);
        let offline = client.verify_location(-6.22, 106.82).await;
        assert_eq!(offline.district, District::South);
        assert_eq!(offline.address, "Jakarta (-6.2200, 106.8200)");
    }

    #[tokio::test]
    async fn principal_queries_follow_the_session() {
        let (anonymous, _) = client(None).await;
        assert!(anonymous.get_my_principal().await.is_none());
        assert!(!anonymous.is_authenticated().await);

        let (signed_in, _) = client(Some("alice")).await;
        assert_eq!(
            signed_in.get_my_principal().await,
            Some(Principal::new("alice"))
        );
        assert!(signed_in.is_authenticated().await);
    }
}
