//! Mercator projection on a sphere (MAP_PROJ = 3).

use std::f64::consts::FRAC_PI_4;

use super::projection::{normalize_lon_deg, normalize_lon_rad, MapProjection};
use crate::dataset::{AttributeValue, Attributes};

/// Mercator projection parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Mercator {
    /// Latitude of true scale (degrees)
    pub lat_ts: f64,
    /// Central meridian (degrees)
    pub lon_0: f64,
    /// Sphere radius (meters)
    pub radius: f64,
}

impl Mercator {
    pub fn new(lat_ts: f64, lon_0: f64, radius: f64) -> Self {
        Self {
            lat_ts,
            lon_0,
            radius,
        }
    }

    fn scaled_radius(&self) -> f64 {
        self.radius * self.lat_ts.to_radians().cos()
    }
}

impl MapProjection for Mercator {
    fn forward(&self, lon: f64, lat: f64) -> (f64, f64) {
        let k = self.scaled_radius();
        let dlam = normalize_lon_rad((lon - self.lon_0).to_radians());
        let phi = lat.to_radians();
        (k * dlam, k * (FRAC_PI_4 + 0.5 * phi).tan().ln())
    }

    fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let k = self.scaled_radius();
        let lat = (y / k).sinh().atan().to_degrees();
        let lon = self.lon_0 + (x / k).to_degrees();
        (normalize_lon_deg(lon), lat)
    }

    fn grid_mapping_name(&self) -> &str {
        "mercator"
    }

    fn cf_parameters(&self) -> Attributes {
        let mut attrs = Attributes::new();
        attrs.insert(
            "longitude_of_projection_origin".to_string(),
            AttributeValue::Number(self.lon_0),
        );
        attrs.insert(
            "standard_parallel".to_string(),
            AttributeValue::Number(self.lat_ts),
        );
        attrs
    }

    fn proj4_parameters(&self) -> String {
        format!("+proj=merc +lat_ts={} +lon_0={}", self.lat_ts, self.lon_0)
    }

    fn radius(&self) -> f64 {
        self.radius
    }
}
