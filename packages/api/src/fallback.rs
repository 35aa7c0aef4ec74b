//! Offline location resolution.
//!
//! When the backend cannot resolve coordinates, Jakarta is partitioned by
//! fixed latitude bands, with the remainder split by longitude:
//!
//! | Latitude          | Longitude  | District |
//! |-------------------|------------|----------|
//! | (-6.20, -6.15)    | any        | central  |
//! | (-6.15, -6.10)    | any        | north    |
//! | (-6.25, -6.20)    | any        | south    |
//! | anything else     | < 106.8    | west     |
//! | anything else     | >= 106.8   | east     |
//!
//! Band edges are open, so a latitude of exactly -6.20 falls through to the
//! longitude split. The result is a pure function of its inputs and always
//! names a district.

use clean_ninja_report_models::{District, LocationInfo};

/// Longitude separating west from east outside the latitude bands.
const WEST_EAST_SPLIT_LON: f64 = 106.8;

/// Returns the district the heuristic assigns to `(latitude, longitude)`.
#[must_use]
pub fn district_for(latitude: f64, longitude: f64) -> District {
    if latitude > -6.20 && latitude < -6.15 {
        District::Central
    } else if latitude > -6.15 && latitude < -6.10 {
        District::North
    } else if latitude < -6.20 && latitude > -6.25 {
        District::South
    } else if longitude < WEST_EAST_SPLIT_LON {
        District::West
    } else {
        District::East
    }
}

/// Returns the address string synthesized for coordinates with no
/// resolved address.
#[must_use]
pub fn synthesized_address(latitude: f64, longitude: f64) -> String {
    format!("Jakarta ({latitude:.4}, {longitude:.4})")
}

/// Resolves coordinates without the backend.
#[must_use]
pub fn location_info(latitude: f64, longitude: f64) -> LocationInfo {
    LocationInfo {
        district: district_for(latitude, longitude),
        address: synthesized_address(latitude, longitude),
        is_valid: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latitude_bands() {
        assert_eq!(district_for(-6.18, 106.82), District::Central);
        assert_eq!(district_for(-6.12, 106.82), District::North);
        assert_eq!(district_for(-6.22, 106.82), District::South);
    }

    #[test]
    fn longitude_split_outside_bands() {
        assert_eq!(district_for(-6.3, 106.7), District::West);
        assert_eq!(district_for(-6.3, 106.9), District::East);
        assert_eq!(district_for(-6.05, 106.8), District::East);
    }

    #[test]
    fn band_edges_are_open() {
        assert_eq!(district_for(-6.20, 106.7), District::West);
        assert_eq!(district_for(-6.15, 106.9), District::East);
        assert_eq!(district_for(-6.25, 106.7), District::West);
    }

    #[test]
    fn fallback_is_deterministic() {
        let first = location_info(-6.2088, 106.8456);
        let second = location_info(-6.2088, 106.8456);
        assert_eq!(first, second);
        assert_eq!(first.district, District::South);
        assert_eq!(first.address, "Jakarta (-6.2088, 106.8456)");
        assert!(first.is_valid);
    }

    #[test]
    fn address_rounds_to_four_places() {
        assert_eq!(
            synthesized_address(-6.123_456, 106.987_654),
            "Jakarta (-6.1235, 106.9877)"
        );
    }
}
