//! Coordinate reference systems for WRF grids.
//!
//! A [`Projection`] is the physical CRS of a real-data WRF run. Idealized
//! runs have none, which callers represent as `Option::None`.

use std::f64::consts::PI;

use super::lambert::LambertConformal;
use super::mercator::Mercator;
use super::stereographic::PolarStereographic;
use crate::dataset::{AttributeValue, Attributes};

/// Trait for spherical map projections
pub trait MapProjection {
    /// Project longitude/latitude (degrees) to easting/northing (meters)
    fn forward(&self, lon: f64, lat: f64) -> (f64, f64);

    /// Unproject easting/northing (meters) to longitude/latitude (degrees)
    fn inverse(&self, x: f64, y: f64) -> (f64, f64);

    /// The CF `grid_mapping_name`
    fn grid_mapping_name(&self) -> &str;

    /// Projection-specific CF grid mapping attributes
    fn cf_parameters(&self) -> Attributes;

    /// Projection-specific PROJ parameters
    fn proj4_parameters(&self) -> String;

    /// Radius of the reference sphere
    fn radius(&self) -> f64;
}

/// A map projection of one of the supported families
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    LambertConformal(LambertConformal),
    PolarStereographic(PolarStereographic),
    Mercator(Mercator),
}

impl Projection {
    fn inner(&self) -> &dyn MapProjection {
        match self {
            Projection::LambertConformal(p) => p,
            Projection::PolarStereographic(p) => p,
            Projection::Mercator(p) => p,
        }
    }

    /// Transform WGS84 longitude/latitude into this projection
    pub fn forward(&self, lon: f64, lat: f64) -> (f64, f64) {
        self.inner().forward(lon, lat)
    }

    /// Transform projected coordinates back to WGS84 longitude/latitude
    pub fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        self.inner().inverse(x, y)
    }

    pub fn grid_mapping_name(&self) -> &str {
        self.inner().grid_mapping_name()
    }

    /// The full PROJ string for this CRS
    pub fn to_proj4(&self) -> String {
        let inner = self.inner();
        format!(
            "{} +x_0=0 +y_0=0 +a={r} +b={r} +units=m +no_defs",
            inner.proj4_parameters(),
            r = inner.radius()
        )
    }

    /// CF grid mapping attributes describing this CRS
    pub fn to_cf(&self) -> Attributes {
        let inner = self.inner();
        let mut attrs = inner.cf_parameters();
        attrs.insert(
            "grid_mapping_name".to_string(),
            AttributeValue::from(inner.grid_mapping_name()),
        );
        attrs.insert("false_easting".to_string(), AttributeValue::Number(0.0));
        attrs.insert("false_northing".to_string(), AttributeValue::Number(0.0));
        attrs.insert(
            "earth_radius".to_string(),
            AttributeValue::Number(inner.radius()),
        );
        attrs.insert(
            "proj4_params".to_string(),
            AttributeValue::Text(self.to_proj4()),
        );
        attrs
    }
}

/// Wrap an angle in radians into [-pi, pi]
pub(crate) fn normalize_lon_rad(mut lam: f64) -> f64 {
    while lam > PI {
        lam -= 2.0 * PI;
    }
    while lam < -PI {
        lam += 2.0 * PI;
    }
    lam
}

/// Wrap a longitude in degrees into [-180, 180]
pub(crate) fn normalize_lon_deg(mut lon: f64) -> f64 {
    while lon > 180.0 {
        lon -= 360.0;
    }
    while lon < -180.0 {
        lon += 360.0;
    }
    lon
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::EARTH_RADIUS;

    #[test]
    fn test_normalize() {
        assert!((normalize_lon_deg(190.0) + 170.0).abs() < 1e-12);
        assert!((normalize_lon_deg(-540.0) + 180.0).abs() < 1e-12);
        assert!((normalize_lon_rad(3.0 * PI / 2.0) + PI / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_cf_attributes() {
        let crs = Projection::Mercator(Mercator::new(0.0, 20.0, EARTH_RADIUS));
        let cf = crs.to_cf();
        assert_eq!(
            cf["grid_mapping_name"],
            AttributeValue::Text("mercator".to_string())
        );
        assert_eq!(cf["earth_radius"], AttributeValue::Number(6_370_000.0));
        assert_eq!(
            crs.to_proj4(),
            "+proj=merc +lat_ts=0 +lon_0=20 +x_0=0 +y_0=0 +a=6370000 +b=6370000 +units=m +no_defs"
        );
    }
}
