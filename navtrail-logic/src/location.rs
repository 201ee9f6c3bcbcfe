use serde::{Deserialize, Serialize};

use crate::UtcDT;

/// A "part" of a location
pub type LocationComponent = f64;

/// Mean radius of the earth in meters
const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
/// A single position sample as reported by a [crate::LocationEngine]
pub struct Location {
    /// Latitude
    pub lat: LocationComponent,
    /// Longitude
    pub long: LocationComponent,
    /// The bearing in degrees, optional as GPS can't always determine it
    #[serde(default)]
    pub heading: Option<LocationComponent>,
    /// Horizontal accuracy radius in meters
    #[serde(default)]
    pub accuracy: Option<LocationComponent>,
    /// When the fix was taken
    pub timestamp: UtcDT,
}

impl Location {
    pub fn new(lat: LocationComponent, long: LocationComponent, timestamp: UtcDT) -> Self {
        Self {
            lat,
            long,
            heading: None,
            accuracy: None,
            timestamp,
        }
    }

    /// Great-circle distance to `other` in meters (haversine)
    pub fn distance_to(&self, other: &Location) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let d_lat = lat2 - lat1;
        let d_long = (other.long - self.long).to_radians();

        let a = (d_lat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (d_long / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_METERS * c
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn loc(lat: f64, long: f64) -> Location {
        Location::new(lat, long, Utc.timestamp_opt(0, 0).unwrap())
    }

    #[test]
    fn test_distance_same_point() {
        let a = loc(43.08, -77.67);
        assert!(a.distance_to(&a).abs() < f64::EPSILON);
    }

    #[test]
    fn test_distance_one_degree_longitude_at_equator() {
        let d = loc(0.0, 0.0).distance_to(&loc(0.0, 1.0));
        assert!((d - 111_195.08).abs() < 1.0, "Got {d}");
    }

    #[test]
    fn test_distance_symmetric() {
        let a = loc(51.5007, -0.1246);
        let b = loc(40.6892, -74.0445);
        let ab = a.distance_to(&b);
        let ba = b.distance_to(&a);
        assert!((ab - ba).abs() < 1e-6);
        // London to New York is roughly 5570km
        assert!((5_500_000.0..5_650_000.0).contains(&ab), "Got {ab}");
    }
}
