//! Lambert Conformal Conic projection on a sphere.
//!
//! WRF uses this projection (MAP_PROJ = 1) for most mid-latitude domains.
//! The cone is tangent when both standard parallels coincide and secant
//! otherwise.

use std::f64::consts::FRAC_PI_4;

use super::projection::{normalize_lon_deg, normalize_lon_rad, MapProjection};
use crate::dataset::{AttributeValue, Attributes};
use crate::error::{Result, WrfError};

/// Lambert Conformal Conic projection parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct LambertConformal {
    /// First standard parallel (degrees)
    pub lat_1: f64,
    /// Second standard parallel (degrees)
    pub lat_2: f64,
    /// Latitude of the projection origin (degrees)
    pub lat_0: f64,
    /// Central meridian (degrees)
    pub lon_0: f64,
    /// Sphere radius (meters)
    pub radius: f64,
    /// Cone constant
    n: f64,
    /// Scaled cone constant F
    f: f64,
    /// Polar radius of the origin latitude (meters)
    rho0: f64,
}

impl LambertConformal {
    pub fn new(lat_1: f64, lat_2: f64, lat_0: f64, lon_0: f64, radius: f64) -> Result<Self> {
        let phi1 = lat_1.to_radians();
        let phi2 = lat_2.to_radians();
        let phi0 = lat_0.to_radians();

        let n = if (phi1 - phi2).abs() < 1e-10 {
            phi1.sin()
        } else {
            (phi1.cos() / phi2.cos()).ln()
                / ((FRAC_PI_4 + phi2 / 2.0).tan() / (FRAC_PI_4 + phi1 / 2.0).tan()).ln()
        };
        if n.abs() < 1e-10 || !n.is_finite() {
            return Err(WrfError::invalid(format!(
                "Degenerate Lambert cone for standard parallels {} and {}",
                lat_1, lat_2
            )));
        }

        let f = phi1.cos() * (FRAC_PI_4 + phi1 / 2.0).tan().powf(n) / n;
        let rho0 = radius * f / (FRAC_PI_4 + phi0 / 2.0).tan().powf(n);

        Ok(Self {
            lat_1,
            lat_2,
            lat_0,
            lon_0,
            radius,
            n,
            f,
            rho0,
        })
    }

    /// The cone constant
    pub fn cone_constant(&self) -> f64 {
        self.n
    }
}

impl MapProjection for LambertConformal {
    fn forward(&self, lon: f64, lat: f64) -> (f64, f64) {
        let phi = lat.to_radians();
        let dlam = normalize_lon_rad((lon - self.lon_0).to_radians());

        let rho = self.radius * self.f / (FRAC_PI_4 + phi / 2.0).tan().powf(self.n);
        let theta = self.n * dlam;

        (rho * theta.sin(), self.rho0 - rho * theta.cos())
    }

    fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let sign = self.n.signum();
        let dy = self.rho0 - y;
        let rho = sign * x.hypot(dy);

        if rho == 0.0 {
            return (self.lon_0, sign * 90.0);
        }

        let theta = (sign * x).atan2(sign * dy);
        let phi = 2.0 * (self.radius * self.f / rho).powf(1.0 / self.n).atan()
            - std::f64::consts::FRAC_PI_2;
        let lon = self.lon_0 + (theta / self.n).to_degrees();

        (normalize_lon_deg(lon), phi.to_degrees())
    }

    fn grid_mapping_name(&self) -> &str {
        "lambert_conformal_conic"
    }

    fn cf_parameters(&self) -> Attributes {
        let mut attrs = Attributes::new();
        attrs.insert(
            "standard_parallel".to_string(),
            AttributeValue::NumberArray(vec![self.lat_1, self.lat_2]),
        );
        attrs.insert(
            "longitude_of_central_meridian".to_string(),
            AttributeValue::Number(self.lon_0),
        );
        attrs.insert(
            "latitude_of_projection_origin".to_string(),
            AttributeValue::Number(self.lat_0),
        );
        attrs
    }

    fn proj4_parameters(&self) -> String {
        format!(
            "+proj=lcc +lat_1={} +lat_2={} +lat_0={} +lon_0={}",
            self.lat_1, self.lat_2, self.lat_0, self.lon_0
        )
    }

    fn radius(&self) -> f64 {
        self.radius
    }
}
