use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoreError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(CoreError::InvalidGeoQuery(format!(
                "latitude {latitude} out of range"
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(CoreError::InvalidGeoQuery(format!(
                "longitude {longitude} out of range"
            )));
        }
        // -0.0 and 0.0 name the same coordinate.
        Ok(Self {
            latitude: latitude + 0.0,
            longitude: longitude + 0.0,
        })
    }
}

/// Great-circle distance in kilometres.
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();
    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoRadius {
    pub center: GeoPoint,
    pub radius_km: f64,
}

impl GeoRadius {
    /// All three parts must be supplied together; none at all means no geo filter.
    pub fn from_parts(
        latitude: Option<f64>,
        longitude: Option<f64>,
        radius_km: Option<f64>,
    ) -> Result<Option<Self>, CoreError> {
        match (latitude, longitude, radius_km) {
            (None, None, None) => Ok(None),
            (Some(latitude), Some(longitude), Some(radius_km)) => {
                if !radius_km.is_finite() || radius_km <= 0.0 {
                    return Err(CoreError::InvalidGeoQuery(format!(
                        "radius {radius_km} must be positive"
                    )));
                }
                Ok(Some(Self {
                    center: GeoPoint::new(latitude, longitude)?,
                    radius_km: radius_km + 0.0,
                }))
            }
            _ => Err(CoreError::IncompleteGeoQuery),
        }
    }

    pub fn contains(&self, point: GeoPoint) -> bool {
        haversine_km(self.center, point) <= self.radius_km
    }
}
