//! Wire shapes of the backend's RPC interface.
//!
//! The backend speaks a JSON rendering of its interface description:
//!
//! - closed enumerations are single-key records: `{"central": null}`
//! - results are `{"ok": value}` or `{"err": "message"}`
//! - optionals are zero-or-one element arrays: `[]` or `["Jl. Sudirman"]`
//! - unbounded naturals and integers may be JSON numbers or decimal strings
//!
//! Everything here converts losslessly into the plain types of
//! [`clean_ninja_report_models`], except that naturals are narrowed to
//! `u64` and integers to `i64` (saturating).

use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::str::FromStr;

use clean_ninja_report_models::{
    District, DistrictCount, Location, LocationInfo, Principal, Report, ReportStatus,
    Statistics, Verification,
};
use serde::de::{self, IgnoredAny};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::ApiError;

// ── Tagged variants ──────────────────────────────────────────────────

/// A closed enumeration value encoded as a single-key record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tagged<T>(pub T);

impl<T: AsRef<str>> Serialize for Tagged<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.0.as_ref(), &())?;
        map.end()
    }
}

impl<'de, T: FromStr> Deserialize<'de> for Tagged<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let record = BTreeMap::<String, IgnoredAny>::deserialize(deserializer)?;
        let mut tags = record.into_keys();
        match (tags.next(), tags.next()) {
            (Some(tag), None) => tag
                .parse()
                .map(Tagged)
                .map_err(|_| de::Error::custom(format!("unknown variant tag '{tag}'"))),
            _ => Err(de::Error::custom("expected a single-key tagged record")),
        }
    }
}

// ── Optionals ────────────────────────────────────────────────────────

/// An optional value encoded as a zero-or-one element array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opt<T>(pub Option<T>);

impl<T> Default for Opt<T> {
    fn default() -> Self {
        Self(None)
    }
}

impl<T: Serialize> Serialize for Opt<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.as_slice().serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Opt<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // `null` is accepted as well as `[]`.
        let items = Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default();
        if items.len() > 1 {
            return Err(de::Error::invalid_length(items.len(), &"zero or one element"));
        }
        Ok(Self(items.into_iter().next()))
    }
}

// ── Unbounded numbers ────────────────────────────────────────────────

/// An unbounded natural narrowed to `u64` (saturating).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Nat(pub u64);

/// An unbounded integer narrowed to `i64` (saturating).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Int(pub i64);

struct NumberVisitor<T>(PhantomData<T>);

impl<'de> de::Visitor<'de> for NumberVisitor<Nat> {
    type Value = Nat;

    fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("a natural number or a decimal string")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Nat, E> {
        Ok(Nat(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Nat, E> {
        u64::try_from(v)
            .map(Nat)
            .map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Nat, E> {
        let wide: u128 = v
            .trim()
            .parse()
            .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))?;
        Ok(Nat(u64::try_from(wide).unwrap_or(u64::MAX)))
    }
}

impl<'de> de::Visitor<'de> for NumberVisitor<Int> {
    type Value = Int;

    fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("an integer or a decimal string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Int, E> {
        Ok(Int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Int, E> {
        Ok(Int(i64::try_from(v).unwrap_or(i64::MAX)))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Int, E> {
        let wide: i128 = v
            .trim()
            .parse()
            .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))?;
        let narrowed = i64::try_from(wide).unwrap_or(if wide < 0 { i64::MIN } else { i64::MAX });
        Ok(Int(narrowed))
    }
}

impl<'de> Deserialize<'de> for Nat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(NumberVisitor::<Self>(PhantomData))
    }
}

impl<'de> Deserialize<'de> for Int {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(NumberVisitor::<Self>(PhantomData))
    }
}

// ── Results ──────────────────────────────────────────────────────────

/// A tagged `{"ok": ..}` / `{"err": ".."}` result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallResult<T> {
    /// The call succeeded.
    Ok(T),
    /// The backend refused the call with a message.
    Err(String),
}

impl<T> CallResult<T> {
    /// Converts into a Rust result, turning a tagged error into
    /// [`ApiError::BackendRejected`].
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::BackendRejected`] for an `err` result.
    pub fn into_result(self) -> Result<T, ApiError> {
        match self {
            Self::Ok(value) => Ok(value),
            Self::Err(message) => Err(ApiError::BackendRejected { message }),
        }
    }
}

// ── Records ──────────────────────────────────────────────────────────

/// Wire form of [`Location`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireLocation {
    /// Latitude.
    pub latitude: f64,
    /// Longitude.
    pub longitude: f64,
    /// Optional resolved address.
    #[serde(default)]
    pub address: Opt<String>,
}

/// Wire form of [`Verification`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireVerification {
    /// Verifier principal text.
    pub verifier: String,
    /// Nanosecond timestamp.
    pub timestamp: Int,
    /// Validity judgement.
    pub is_valid: bool,
    /// Optional comment.
    #[serde(default)]
    pub comment: Opt<String>,
}

/// Wire form of [`Report`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireReport {
    /// Report identifier.
    pub id: String,
    /// Reporter principal text.
    pub reporter: String,
    /// Where the waste is.
    pub location: WireLocation,
    /// District tag.
    pub district: Tagged<District>,
    /// Description.
    pub description: String,
    /// Optional photo bytes.
    #[serde(default)]
    pub image_blob: Opt<Vec<u8>>,
    /// Nanosecond creation timestamp.
    pub timestamp: Int,
    /// Status tag.
    pub status: Tagged<ReportStatus>,
    /// Verifications in submission order.
    #[serde(default)]
    pub verifications: Vec<WireVerification>,
}

/// Wire form of [`LocationInfo`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireLocationInfo {
    /// District tag.
    pub district: Tagged<District>,
    /// Resolved address.
    pub address: String,
    /// Whether the backend accepted the location.
    pub is_valid: bool,
}

/// Wire form of [`Statistics`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireStatistics {
    /// Total reports.
    pub total_reports: Nat,
    /// Reports not yet cleaned.
    pub reported_count: Nat,
    /// Cleaned reports.
    pub cleaned_count: Nat,
    /// `(district, count)` pairs.
    #[serde(default)]
    pub district_stats: Vec<(Tagged<District>, Nat)>,
}

// ── Conversions ──────────────────────────────────────────────────────

impl From<WireLocation> for Location {
    fn from(wire: WireLocation) -> Self {
        Self {
            latitude: wire.latitude,
            longitude: wire.longitude,
            address: wire.address.0,
        }
    }
}

impl From<&Location> for WireLocation {
    fn from(location: &Location) -> Self {
        Self {
            latitude: location.latitude,
            longitude: location.longitude,
            address: Opt(location.address.clone()),
        }
    }
}

impl From<WireVerification> for Verification {
    fn from(wire: WireVerification) -> Self {
        Self {
            verifier: Principal::new(wire.verifier),
            timestamp: wire.timestamp.0,
            is_valid: wire.is_valid,
            comment: wire.comment.0,
        }
    }
}

impl From<&Verification> for WireVerification {
    fn from(verification: &Verification) -> Self {
        Self {
            verifier: verification.verifier.as_str().to_string(),
            timestamp: Int(verification.timestamp),
            is_valid: verification.is_valid,
            comment: Opt(verification.comment.clone()),
        }
    }
}

impl From<WireReport> for Report {
    fn from(wire: WireReport) -> Self {
        Self {
            id: wire.id,
            reporter: Principal::new(wire.reporter),
            location: wire.location.into(),
            district: wire.district.0,
            description: wire.description,
            image: wire.image_blob.0,
            timestamp: wire.timestamp.0,
            status: wire.status.0,
            verifications: wire.verifications.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<&Report> for WireReport {
    fn from(report: &Report) -> Self {
        Self {
            id: report.id.clone(),
            reporter: report.reporter.as_str().to_string(),
            location: (&report.location).into(),
            district: Tagged(report.district),
            description: report.description.clone(),
            image_blob: Opt(report.image.clone()),
            timestamp: Int(report.timestamp),
            status: Tagged(report.status),
            verifications: report.verifications.iter().map(Into::into).collect(),
        }
    }
}

impl From<WireLocationInfo> for LocationInfo {
    fn from(wire: WireLocationInfo) -> Self {
        Self {
            district: wire.district.0,
            address: wire.address,
            is_valid: wire.is_valid,
        }
    }
}

impl From<&LocationInfo> for WireLocationInfo {
    fn from(info: &LocationInfo) -> Self {
        Self {
            district: Tagged(info.district),
            address: info.address.clone(),
            is_valid: info.is_valid,
        }
    }
}

impl From<WireStatistics> for Statistics {
    fn from(wire: WireStatistics) -> Self {
        Self {
            total_reports: wire.total_reports.0,
            reported_count: wire.reported_count.0,
            cleaned_count: wire.cleaned_count.0,
            district_stats: wire
                .district_stats
                .into_iter()
                .map(|(district, count)| DistrictCount {
                    district: district.0,
                    count: count.0,
                })
                .collect(),
        }
    }
}

impl From<&Statistics> for WireStatistics {
    fn from(stats: &Statistics) -> Self {
        Self {
            total_reports: Nat(stats.total_reports),
            reported_count: Nat(stats.reported_count),
            cleaned_count: Nat(stats.cleaned_count),
            district_stats: stats
                .district_stats
                .iter()
                .map(|entry| (Tagged(entry.district), Nat(entry.count)))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn tagged_variant_wire_shape() {
        assert_eq!(
            serde_json::to_value(Tagged(District::South)).unwrap(),
            json!({"south": null})
        );
        let status: Tagged<ReportStatus> =
            serde_json::from_value(json!({"cleaned": null})).unwrap();
        assert_eq!(status.0, ReportStatus::Cleaned);
    }

    #[test]
    fn tagged_variant_rejects_unknown_and_multi_key() {
        assert!(serde_json::from_value::<Tagged<District>>(json!({"bekasi": null})).is_err());
        assert!(
            serde_json::from_value::<Tagged<District>>(json!({"west": null, "east": null}))
                .is_err()
        );
        assert!(serde_json::from_value::<Tagged<District>>(json!({})).is_err());
    }

    #[test]
    fn opt_accepts_empty_single_and_null() {
        assert_eq!(
            serde_json::from_value::<Opt<String>>(json!([])).unwrap(),
            Opt(None)
        );
        assert_eq!(
            serde_json::from_value::<Opt<String>>(json!(["x"])).unwrap(),
            Opt(Some("x".to_string()))
        );
        assert_eq!(
            serde_json::from_value::<Opt<String>>(json!(null)).unwrap(),
            Opt(None)
        );
        assert!(serde_json::from_value::<Opt<String>>(json!(["a", "b"])).is_err());
        assert_eq!(serde_json::to_value(Opt(Some(3))).unwrap(), json!([3]));
    }

    #[test]
    fn nat_narrows_numbers_and_strings() {
        assert_eq!(serde_json::from_value::<Nat>(json!(42)).unwrap(), Nat(42));
        assert_eq!(serde_json::from_value::<Nat>(json!("42")).unwrap(), Nat(42));
        assert_eq!(
            serde_json::from_value::<Nat>(json!("340282366920938463463374607431768211455"))
                .unwrap(),
            Nat(u64::MAX)
        );
        assert!(serde_json::from_value::<Nat>(json!(-1)).is_err());
        assert!(serde_json::from_value::<Nat>(json!("many")).is_err());
    }

    #[test]
    fn int_narrows_nanosecond_timestamps() {
        assert_eq!(
            serde_json::from_value::<Int>(json!("1717171717000000000")).unwrap(),
            Int(1_717_171_717_000_000_000)
        );
        assert_eq!(serde_json::from_value::<Int>(json!(-5)).unwrap(), Int(-5));
        assert_eq!(
            serde_json::from_value::<Int>(json!("-99999999999999999999999")).unwrap(),
            Int(i64::MIN)
        );
    }

    #[test]
    fn call_result_shapes() {
        let ok: CallResult<String> = serde_json::from_value(json!({"ok": "report-7"})).unwrap();
        assert_eq!(ok.into_result().unwrap(), "report-7");

        let unit: CallResult<()> = serde_json::from_value(json!({"ok": null})).unwrap();
        assert!(unit.into_result().is_ok());

        let err: CallResult<()> =
            serde_json::from_value(json!({"err": "Report not found"})).unwrap();
        assert_eq!(
            err.into_result(),
            Err(ApiError::BackendRejected {
                message: "Report not found".to_string()
            })
        );
    }

    #[test]
    fn decodes_backend_report() {
        let body = json!({
            "id": "report-1",
            "reporter": "2vxsx-fae",
            "location": {"latitude": -6.18, "longitude": 106.82, "address": ["Jl. Thamrin"]},
            "district": {"central": null},
            "description": "Pile of construction debris",
            "imageBlob": [[137, 80, 78, 71]],
            "timestamp": "1717171717000000000",
            "status": {"reported": null},
            "verifications": [
                {"verifier": "aaaaa-aa", "timestamp": 1_717_171_800_000_000_000_i64, "isValid": true, "comment": []}
            ]
        });

        let report: Report = serde_json::from_value::<WireReport>(body).unwrap().into();
        assert_eq!(report.district, District::Central);
        assert_eq!(report.status, ReportStatus::Reported);
        assert_eq!(report.location.address.as_deref(), Some("Jl. Thamrin"));
        assert_eq!(report.image.as_deref(), Some(&[137u8, 80, 78, 71][..]));
        assert_eq!(report.verifications.len(), 1);
        assert_eq!(report.verifications[0].verifier, Principal::new("aaaaa-aa"));
        assert_eq!(report.verifications[0].comment, None);
    }

    #[test]
    fn decodes_backend_statistics() {
        let body = json!({
            "totalReports": "5",
            "reportedCount": 3,
            "cleanedCount": "2",
            "districtStats": [[{"west": null}, 4], [{"north": null}, "1"]]
        });
        let stats: Statistics = serde_json::from_value::<WireStatistics>(body).unwrap().into();
        assert_eq!(stats.total_reports, 5);
        assert_eq!(stats.reported_count, 3);
        assert_eq!(stats.cleaned_count, 2);
        assert_eq!(
            stats.district_stats,
            vec![
                DistrictCount { district: District::West, count: 4 },
                DistrictCount { district: District::North, count: 1 },
            ]
        );
    }

    #[test]
    fn encodes_location_argument() {
        let location = Location::new(-6.2088, 106.8456);
        assert_eq!(
            serde_json::to_value(WireLocation::from(&location)).unwrap(),
            json!({"latitude": -6.2088, "longitude": 106.8456, "address": []})
        );
    }
}
