//! North polar stereographic projection on a sphere (MAP_PROJ = 2).
//!
//! The projection plane is true to scale at `lat_ts`.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use super::projection::{normalize_lon_deg, normalize_lon_rad, MapProjection};
use crate::dataset::{AttributeValue, Attributes};

/// Polar stereographic projection parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct PolarStereographic {
    /// Latitude of true scale (degrees)
    pub lat_ts: f64,
    /// Straight vertical longitude from the pole (degrees)
    pub lon_0: f64,
    /// Sphere radius (meters)
    pub radius: f64,
    /// Scale term at the true-scale latitude
    akm1: f64,
}

impl PolarStereographic {
    pub fn new(lat_ts: f64, lon_0: f64, radius: f64) -> Self {
        let phits = lat_ts.to_radians();
        let akm1 = if (phits.abs() - FRAC_PI_2).abs() >= 1e-10 {
            phits.cos() / (FRAC_PI_4 - 0.5 * phits).tan()
        } else {
            2.0
        };
        Self {
            lat_ts,
            lon_0,
            radius,
            akm1,
        }
    }
}

impl MapProjection for PolarStereographic {
    fn forward(&self, lon: f64, lat: f64) -> (f64, f64) {
        let phi = lat.to_radians();
        let dlam = normalize_lon_rad((lon - self.lon_0).to_radians());

        let r = self.radius * self.akm1 * (FRAC_PI_4 - 0.5 * phi).tan();
        (r * dlam.sin(), -r * dlam.cos())
    }

    fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let rh = x.hypot(y) / self.radius;
        if rh <= 1e-10 {
            return (self.lon_0, 90.0);
        }

        let c = 2.0 * (rh / self.akm1).atan();
        let phi = c.cos().asin();
        let lon = self.lon_0 + x.atan2(-y).to_degrees();

        (normalize_lon_deg(lon), phi.to_degrees())
    }

    fn grid_mapping_name(&self) -> &str {
        "polar_stereographic"
    }

    fn cf_parameters(&self) -> Attributes {
        let mut attrs = Attributes::new();
        attrs.insert(
            "straight_vertical_longitude_from_pole".to_string(),
            AttributeValue::Number(self.lon_0),
        );
        attrs.insert(
            "latitude_of_projection_origin".to_string(),
            AttributeValue::Number(90.0),
        );
        attrs.insert(
            "standard_parallel".to_string(),
            AttributeValue::Number(self.lat_ts),
        );
        attrs
    }

    fn proj4_parameters(&self) -> String {
        format!(
            "+proj=stere +lat_0=90 +lat_ts={} +lon_0={}",
            self.lat_ts, self.lon_0
        )
    }

    fn radius(&self) -> f64 {
        self.radius
    }
}
