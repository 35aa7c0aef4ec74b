//! In-process implementation of the backend.
//!
//! Holds reports in memory and applies the same rules the deployed
//! service does: anonymous callers cannot write, status only moves from
//! reported to cleaned, verifications are appended, and statistics are
//! derived on every request. Listings are newest first.
//!
//! Besides serving the front-end's offline mode, it records how often each
//! [`RemoteMethod`] was invoked, can be switched unavailable, and can delay
//! individual calls, which is what the view-layer tests rely on.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use clean_ninja_report_models::{
    District, DistrictCount, Location, LocationInfo, Principal, Report, ReportStatus,
    Statistics, Verification,
};

use crate::TransportError;
use crate::backend::{Backend, RemoteMethod};
use crate::fallback;
use crate::wire::{
    CallResult, Nat, Opt, Tagged, WireLocation, WireLocationInfo, WireReport, WireStatistics,
};

/// Principal text the backend reports for anonymous callers.
pub const ANONYMOUS_PRINCIPAL: &str = "2vxsx-fae";

/// Latitude range accepted by `verifyLocation`.
const SERVICE_AREA_LAT: (f64, f64) = (-6.40, -6.05);

/// Longitude range accepted by `verifyLocation`.
const SERVICE_AREA_LON: (f64, f64) = (106.65, 107.00);

#[derive(Debug, Default)]
struct Store {
    reports: Vec<Report>,
    next_id: u64,
    last_timestamp: i64,
}

impl Store {
    /// Returns a strictly increasing nanosecond timestamp.
    fn now(&mut self) -> i64 {
        let now = Utc::now()
            .timestamp_nanos_opt()
            .unwrap_or_else(|| self.last_timestamp.saturating_add(1));
        self.last_timestamp = now.max(self.last_timestamp.saturating_add(1));
        self.last_timestamp
    }

    fn newest_first<'a>(&'a self, keep: impl Fn(&Report) -> bool + 'a) -> Vec<WireReport> {
        self.reports
            .iter()
            .rev()
            .filter(|r| keep(r))
            .map(WireReport::from)
            .collect()
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut Report> {
        self.reports.iter_mut().find(|r| r.id == id)
    }
}

/// Backend state held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    store: Mutex<Store>,
    calls: Mutex<BTreeMap<RemoteMethod, usize>>,
    delays: Mutex<BTreeMap<RemoteMethod, VecDeque<Duration>>>,
    unavailable: AtomicBool,
}

impl InMemoryBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend holding `reports`, oldest first.
    #[must_use]
    pub fn with_reports(reports: Vec<Report>) -> Self {
        let backend = Self::new();
        {
            let mut store = backend.store();
            store.next_id = reports.len() as u64;
            store.last_timestamp = reports.iter().map(|r| r.timestamp).max().unwrap_or(0);
            store.reports = reports;
        }
        backend
    }

    /// Creates a backend pre-filled with a handful of Jakarta reports.
    #[must_use]
    pub fn with_demo_reports() -> Self {
        let backend = Self::new();
        let seed = [
            (-6.1754, 106.8272, District::Central, "Plastic waste piling up near Monas"),
            (-6.1214, 106.7741, District::North, "Styrofoam and nets washed up at the harbour"),
            (-6.2615, 106.7810, District::South, "Illegal dumping behind the market"),
            (-6.1683, 106.7588, District::West, "Overflowing bins along the canal"),
            (-6.2250, 106.9004, District::East, "Construction debris blocking the sidewalk"),
        ];
        {
            let mut store = backend.store();
            for (n, (lat, lon, district, description)) in seed.into_iter().enumerate() {
                let timestamp = store.now();
                store.next_id += 1;
                let id = format!("report-{}", store.next_id);
                store.reports.push(Report {
                    id,
                    reporter: Principal::new(format!("demo-reporter-{}", n % 2 + 1)),
                    location: Location {
                        latitude: lat,
                        longitude: lon,
                        address: Some(format!("{} (demo)", district.display_name())),
                    },
                    district,
                    description: description.to_string(),
                    image: None,
                    timestamp,
                    status: if n == 3 {
                        ReportStatus::Cleaned
                    } else {
                        ReportStatus::Reported
                    },
                    verifications: Vec::new(),
                });
            }
        }
        backend
    }

    /// Makes every subsequent call fail (or succeed again) at the
    /// transport level.
    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    /// Delays the next call of `method` by `delay`. Delays queue up per
    /// method and are consumed in call order.
    pub fn delay_next(&self, method: RemoteMethod, delay: Duration) {
        lock(&self.delays).entry(method).or_default().push_back(delay);
    }

    /// Returns how many times `method` was invoked.
    #[must_use]
    pub fn calls(&self, method: RemoteMethod) -> usize {
        lock(&self.calls).get(&method).copied().unwrap_or(0)
    }

    /// Returns the total number of invocations across all methods.
    #[must_use]
    pub fn total_calls(&self) -> usize {
        lock(&self.calls).values().sum()
    }

    /// Returns the combined invocation count of the list-fetching methods.
    #[must_use]
    pub fn list_fetches(&self) -> usize {
        RemoteMethod::list_fetches()
            .iter()
            .map(|m| self.calls(*m))
            .sum()
    }

    /// Forgets all recorded invocations.
    pub fn reset_calls(&self) {
        lock(&self.calls).clear();
    }

    /// Returns a copy of every stored report, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Report> {
        self.store().reports.clone()
    }

    fn store(&self) -> MutexGuard<'_, Store> {
        lock(&self.store)
    }

    /// Records the call, applies any queued delay and fails if the backend
    /// is switched off.
    async fn enter(&self, method: RemoteMethod) -> Result<(), TransportError> {
        *lock(&self.calls).entry(method).or_default() += 1;

        let delay = lock(&self.delays)
            .get_mut(&method)
            .and_then(VecDeque::pop_front);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.unavailable.load(Ordering::SeqCst) {
            return Err(TransportError::Unavailable {
                message: format!("{method} called while backend is offline"),
            });
        }
        Ok(())
    }

    fn statistics(&self) -> Statistics {
        let store = self.store();
        let cleaned = store
            .reports
            .iter()
            .filter(|r| r.status == ReportStatus::Cleaned)
            .count() as u64;
        let total = store.reports.len() as u64;
        Statistics {
            total_reports: total,
            reported_count: total - cleaned,
            cleaned_count: cleaned,
            district_stats: District::all()
                .iter()
                .map(|district| DistrictCount {
                    district: *district,
                    count: store
                        .reports
                        .iter()
                        .filter(|r| r.district == *district)
                        .count() as u64,
                })
                .collect(),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn within(value: f64, (min, max): (f64, f64)) -> bool {
    (min..=max).contains(&value)
}

#[async_trait]
impl Backend for InMemoryBackend {
    async fn create_report(
        &self,
        caller: Option<&Principal>,
        location: WireLocation,
        district: Tagged<District>,
        description: String,
        image: Opt<Vec<u8>>,
    ) -> Result<CallResult<String>, TransportError> {
        self.enter(RemoteMethod::CreateReport).await?;

        let Some(reporter) = caller else {
            return Ok(CallResult::Err(
                "Anonymous principals cannot create reports".to_string(),
            ));
        };
        if description.trim().is_empty() {
            return Ok(CallResult::Err("Description cannot be empty".to_string()));
        }

        let mut store = self.store();
        let timestamp = store.now();
        store.next_id += 1;
        let id = format!("report-{}", store.next_id);
        store.reports.push(Report {
            id: id.clone(),
            reporter: reporter.clone(),
            location: location.into(),
            district: district.0,
            description,
            image: image.0,
            timestamp,
            status: ReportStatus::Reported,
            verifications: Vec::new(),
        });
        log::debug!("Stored {id} for {reporter}");

        Ok(CallResult::Ok(id))
    }

    async fn get_all_reports(
        &self,
        _caller: Option<&Principal>,
        limit: Nat,
        offset: Nat,
    ) -> Result<Vec<WireReport>, TransportError> {
        self.enter(RemoteMethod::GetAllReports).await?;
        let offset = usize::try_from(offset.0).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit.0).unwrap_or(usize::MAX);
        Ok(self
            .store()
            .newest_first(|_| true)
            .into_iter()
            .skip(offset)
            .take(limit)
            .collect())
    }

    async fn get_report(
        &self,
        _caller: Option<&Principal>,
        id: String,
    ) -> Result<Opt<WireReport>, TransportError> {
        self.enter(RemoteMethod::GetReport).await?;
        let store = self.store();
        Ok(Opt(store
            .reports
            .iter()
            .find(|r| r.id == id)
            .map(WireReport::from)))
    }

    async fn get_reports_by_district(
        &self,
        _caller: Option<&Principal>,
        district: Tagged<District>,
    ) -> Result<Vec<WireReport>, TransportError> {
        self.enter(RemoteMethod::GetReportsByDistrict).await?;
        Ok(self.store().newest_first(move |r| r.district == district.0))
    }

    async fn get_reports_by_status(
        &self,
        _caller: Option<&Principal>,
        status: Tagged<ReportStatus>,
    ) -> Result<Vec<WireReport>, TransportError> {
        self.enter(RemoteMethod::GetReportsByStatus).await?;
        Ok(self.store().newest_first(move |r| r.status == status.0))
    }

    async fn get_statistics(
        &self,
        _caller: Option<&Principal>,
    ) -> Result<WireStatistics, TransportError> {
        self.enter(RemoteMethod::GetStatistics).await?;
        Ok(WireStatistics::from(&self.statistics()))
    }

    async fn verify_report(
        &self,
        caller: Option<&Principal>,
        id: String,
        is_valid: bool,
        comment: Opt<String>,
    ) -> Result<CallResult<()>, TransportError> {
        self.enter(RemoteMethod::VerifyReport).await?;

        let Some(verifier) = caller else {
            return Ok(CallResult::Err(
                "Anonymous principals cannot verify reports".to_string(),
            ));
        };

        let mut store = self.store();
        let timestamp = store.now();
        let Some(report) = store.find_mut(&id) else {
            return Ok(CallResult::Err("Report not found".to_string()));
        };
        report.verifications.push(Verification {
            verifier: verifier.clone(),
            timestamp,
            is_valid,
            comment: comment.0,
        });

        Ok(CallResult::Ok(()))
    }

    async fn mark_as_cleaned(
        &self,
        caller: Option<&Principal>,
        id: String,
    ) -> Result<CallResult<()>, TransportError> {
        self.enter(RemoteMethod::MarkAsCleaned).await?;

        if caller.is_none() {
            return Ok(CallResult::Err(
                "Anonymous principals cannot update reports".to_string(),
            ));
        }

        let mut store = self.store();
        let Some(report) = store.find_mut(&id) else {
            return Ok(CallResult::Err("Report not found".to_string()));
        };
        match report.status {
            ReportStatus::Reported => {
                report.status = ReportStatus::Cleaned;
                Ok(CallResult::Ok(()))
            }
            ReportStatus::Cleaned => Ok(CallResult::Err(
                "Report has already been marked as cleaned".to_string(),
            )),
        }
    }

    async fn verify_location(
        &self,
        _caller: Option<&Principal>,
        latitude: f64,
        longitude: f64,
    ) -> Result<CallResult<WireLocationInfo>, TransportError> {
        self.enter(RemoteMethod::VerifyLocation).await?;

        if !within(latitude, SERVICE_AREA_LAT) || !within(longitude, SERVICE_AREA_LON) {
            return Ok(CallResult::Err("Location is outside Jakarta".to_string()));
        }

        let district = fallback::district_for(latitude, longitude);
        let info = LocationInfo {
            district,
            address: format!(
                "{}, {latitude:.4}, {longitude:.4}",
                district.display_name()
            ),
            is_valid: true,
        };
        Ok(CallResult::Ok(WireLocationInfo::from(&info)))
    }

    async fn get_user_reports(
        &self,
        _caller: Option<&Principal>,
        reporter: String,
    ) -> Result<Vec<WireReport>, TransportError> {
        self.enter(RemoteMethod::GetUserReports).await?;
        Ok(self
            .store()
            .newest_first(move |r| r.reporter.as_str() == reporter))
    }

    async fn get_my_principal(&self, caller: Option<&Principal>) -> Result<String, TransportError> {
        self.enter(RemoteMethod::GetMyPrincipal).await?;
        Ok(caller.map_or_else(
            || ANONYMOUS_PRINCIPAL.to_string(),
            |p| p.as_str().to_string(),
        ))
    }

    async fn is_authenticated(&self, caller: Option<&Principal>) -> Result<bool, TransportError> {
        self.enter(RemoteMethod::IsAuthenticated).await?;
        Ok(caller.is_some())
    }
}
