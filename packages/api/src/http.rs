//! HTTP transport to a deployed backend canister.
//!
//! Every procedure is a `POST {host}/api/canister/{canister_id}/{method}`
//! whose body is the JSON array of arguments in [`crate::wire`] form. The
//! caller's principal, when there is one, travels in the
//! [`PRINCIPAL_HEADER`] header. A 2xx response carries the procedure's
//! return value as JSON; anything else is a [`TransportError`].

use async_trait::async_trait;
use clean_ninja_report_models::{District, Principal, ReportStatus};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::TransportError;
use crate::backend::{Backend, RemoteMethod};
use crate::config::ClientConfig;
use crate::wire::{
    CallResult, Nat, Opt, Tagged, WireLocation, WireLocationInfo, WireReport, WireStatistics,
};

/// Header carrying the caller's principal.
pub const PRINCIPAL_HEADER: &str = "x-principal";

/// Backend reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    host: String,
    canister_id: String,
}

impl HttpBackend {
    /// Creates a backend for `canister_id` at `host`.
    #[must_use]
    pub fn new(host: impl Into<String>, canister_id: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            host: host.into(),
            canister_id: canister_id.into(),
        }
    }

    /// Creates a backend from the client configuration.
    #[must_use]
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(&config.host, &config.backend_canister_id)
    }

    /// Returns the URL a procedure is posted to.
    #[must_use]
    pub fn method_url(&self, method: RemoteMethod) -> String {
        format!(
            "{}/api/canister/{}/{method}",
            self.host.trim_end_matches('/'),
            self.canister_id
        )
    }

    /// Checks that the replica answers its status endpoint.
    ///
    /// Development replicas must be reachable before certified calls can
    /// be verified. A failure here is only a warning; calls are still
    /// attempted and fail individually.
    pub async fn probe(&self) -> bool {
        let url = format!("{}/api/v2/status", self.host.trim_end_matches('/'));
        match self.client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => true,
            Ok(resp) => {
                log::warn!(
                    "Unable to fetch root key (HTTP {}). Check local replica",
                    resp.status()
                );
                false
            }
            Err(e) => {
                log::warn!("Unable to fetch root key. Check local replica: {e}");
                false
            }
        }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        caller: Option<&Principal>,
        method: RemoteMethod,
        args: Value,
    ) -> Result<T, TransportError> {
        let url = self.method_url(method);
        log::trace!("{method} -> {url} {args}");

        let mut request = self.client.post(&url).json(&args);
        if let Some(principal) = caller {
            request = request.header(PRINCIPAL_HEADER, principal.as_str());
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn create_report(
        &self,
        caller: Option<&Principal>,
        location: WireLocation,
        district: Tagged<District>,
        description: String,
        image: Opt<Vec<u8>>,
    ) -> Result<CallResult<String>, TransportError> {
        self.call(
            caller,
            RemoteMethod::CreateReport,
            json!([location, district, description, image]),
        )
        .await
    }

    async fn get_all_reports(
        &self,
        caller: Option<&Principal>,
        limit: Nat,
        offset: Nat,
    ) -> Result<Vec<WireReport>, TransportError> {
        self.call(caller, RemoteMethod::GetAllReports, json!([limit, offset]))
            .await
    }

    async fn get_report(
        &self,
        caller: Option<&Principal>,
        id: String,
    ) -> Result<Opt<WireReport>, TransportError> {
        self.call(caller, RemoteMethod::GetReport, json!([id])).await
    }

    async fn get_reports_by_district(
        &self,
        caller: Option<&Principal>,
        district: Tagged<District>,
    ) -> Result<Vec<WireReport>, TransportError> {
        self.call(caller, RemoteMethod::GetReportsByDistrict, json!([district]))
            .await
    }

    async fn get_reports_by_status(
        &self,
        caller: Option<&Principal>,
        status: Tagged<ReportStatus>,
    ) -> Result<Vec<WireReport>, TransportError> {
        self.call(caller, RemoteMethod::GetReportsByStatus, json!([status]))
            .await
    }

    async fn get_statistics(
        &self,
        caller: Option<&Principal>,
    ) -> Result<WireStatistics, TransportError> {
        self.call(caller, RemoteMethod::GetStatistics, json!([])).await
    }

    async fn verify_report(
        &self,
        caller: Option<&Principal>,
        id: String,
        is_valid: bool,
        comment: Opt<String>,
    ) -> Result<CallResult<()>, TransportError> {
        self.call(
            caller,
            RemoteMethod::VerifyReport,
            json!([id, is_valid, comment]),
        )
        .await
    }

    async fn mark_as_cleaned(
        &self,
        caller: Option<&Principal>,
        id: String,
    ) -> Result<CallResult<()>, TransportError> {
        self.call(caller, RemoteMethod::MarkAsCleaned, json!([id])).await
    }

    async fn verify_location(
        &self,
        caller: Option<&Principal>,
        latitude: f64,
        longitude: f64,
    ) -> Result<CallResult<WireLocationInfo>, TransportError> {
        self.call(
            caller,
            RemoteMethod::VerifyLocation,
            json!([latitude, longitude]),
        )
        .await
    }

    async fn get_user_reports(
        &self,
        caller: Option<&Principal>,
        reporter: String,
    ) -> Result<Vec<WireReport>, TransportError> {
        self.call(caller, RemoteMethod::GetUserReports, json!([reporter]))
            .await
    }

    async fn get_my_principal(&self, caller: Option<&Principal>) -> Result<String, TransportError> {
        self.call(caller, RemoteMethod::GetMyPrincipal, json!([])).await
    }

    async fn is_authenticated(&self, caller: Option<&Principal>) -> Result<bool, TransportError> {
        self.call(caller, RemoteMethod::IsAuthenticated, json!([])).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_url_joins_host_canister_and_method() {
        let backend = HttpBackend::new("http://localhost:8000/", "twkfl-haaaa-aaaab-qbnpa-cai");
        assert_eq!(
            backend.method_url(RemoteMethod::GetReportsByStatus),
            "http://localhost:8000/api/canister/twkfl-haaaa-aaaab-qbnpa-cai/getReportsByStatus"
        );
    }

    #[test]
    fn create_report_arguments_use_wire_shapes() {
        let args = json!([
            WireLocation {
                latitude: -6.18,
                longitude: 106.82,
                address: Opt(Some("Monas".to_string())),
            },
            Tagged(District::Central),
            "Overflowing bins",
            Opt::<Vec<u8>>(None),
        ]);
        assert_eq!(
            args,
            json!([
                {"latitude": -6.18, "longitude": 106.82, "address": ["Monas"]},
                {"central": null},
                "Overflowing bins",
                []
            ])
        );
    }

    #[tokio::test]
    async fn unreachable_host_is_a_transport_error() {
        // Port 9 (discard) is not expected to run an HTTP server.
        let backend = HttpBackend::new("http://127.0.0.1:9", "twkfl-haaaa-aaaab-qbnpa-cai");
        let result = backend.get_statistics(None).await;
        assert!(matches!(result, Err(TransportError::Http(_))));
    }
}
