//! WRF grid reconstruction.
//!
//! WRF output describes its horizontal grid through a handful of scalar
//! global attributes. This module turns them into a map projection and the
//! analytic 1-D projection coordinates of the mass and staggered grids.

pub mod lambert;
pub mod mercator;
pub mod projection;
pub mod stereographic;

pub use lambert::LambertConformal;
pub use mercator::Mercator;
pub use projection::{MapProjection, Projection};
pub use stereographic::PolarStereographic;

use tracing::debug;

use crate::dataset::{AttributeValue, Dataset};
use crate::error::{Result, WrfError};

/// Radius of the spherical earth assumed by WRF (meters)
pub const EARTH_RADIUS: f64 = 6_370_000.0;

/// The `MAP_PROJ` values WRF writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionKind {
    /// Idealized run on a Cartesian grid
    Idealized,
    LambertConformal,
    PolarStereographic,
    Mercator,
}

impl ProjectionKind {
    /// Interpret a `MAP_PROJ` attribute
    pub fn from_attribute(value: &AttributeValue) -> Result<Self> {
        let code = value.as_f64().filter(|v| v.fract() == 0.0);
        match code.map(|v| v as i64) {
            Some(0) => Ok(ProjectionKind::Idealized),
            Some(1) => Ok(ProjectionKind::LambertConformal),
            Some(2) => Ok(ProjectionKind::PolarStereographic),
            Some(3) => Ok(ProjectionKind::Mercator),
            _ => Err(WrfError::NotImplemented {
                message: format!("WRF proj not implemented yet: {}", describe(value)),
            }),
        }
    }

    /// Specialize the common parameter set for this projection family
    pub fn params(self, base: ProjectionParams) -> ProjectionParams {
        match self {
            ProjectionKind::Idealized => base,
            ProjectionKind::LambertConformal => ProjectionParams::lambert(base),
            ProjectionKind::PolarStereographic => ProjectionParams::polar_stereographic(base),
            ProjectionKind::Mercator => ProjectionParams::mercator(base),
        }
    }
}

fn describe(value: &AttributeValue) -> String {
    match value {
        AttributeValue::Text(s) => s.clone(),
        AttributeValue::Number(v) => v.to_string(),
        AttributeValue::NumberArray(v) => format!("{:?}", v),
    }
}

/// The projection parameter record, mirroring PROJ's keyword set
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionParams {
    /// PROJ projection name; `None` for idealized runs
    pub proj: Option<&'static str>,
    pub x_0: f64,
    pub y_0: f64,
    pub a: f64,
    pub b: f64,
    pub lat_1: Option<f64>,
    pub lat_2: Option<f64>,
    pub lat_0: Option<f64>,
    pub lon_0: Option<f64>,
    pub lat_ts: Option<f64>,
    pub center_lon: Option<f64>,
}

impl ProjectionParams {
    /// Parameters shared by all families, before specialization
    pub fn base(truelat1: f64, truelat2: f64, moad_cen_lat: f64, stand_lon: f64, cen_lon: f64) -> Self {
        Self {
            proj: None,
            x_0: 0.0,
            y_0: 0.0,
            a: EARTH_RADIUS,
            b: EARTH_RADIUS,
            lat_1: Some(truelat1),
            lat_2: Some(truelat2),
            lat_0: Some(moad_cen_lat),
            lon_0: Some(stand_lon),
            lat_ts: None,
            center_lon: Some(cen_lon),
        }
    }

    pub fn lambert(base: Self) -> Self {
        Self {
            proj: Some("lcc"),
            center_lon: None,
            ..base
        }
    }

    pub fn polar_stereographic(base: Self) -> Self {
        Self {
            proj: Some("stere"),
            lat_ts: base.lat_1,
            lat_0: Some(90.0),
            lat_1: None,
            lat_2: None,
            center_lon: None,
            ..base
        }
    }

    pub fn mercator(base: Self) -> Self {
        Self {
            proj: Some("merc"),
            lat_ts: base.lat_1,
            lon_0: base.center_lon,
            lat_0: None,
            lat_1: None,
            lat_2: None,
            center_lon: None,
            ..base
        }
    }

    /// Build the CRS these parameters describe; `None` for idealized runs
    pub fn to_projection(&self) -> Result<Option<Projection>> {
        let require = |value: Option<f64>, key: &str| {
            value.ok_or_else(|| {
                WrfError::invalid(format!("Projection parameter {} is not set", key))
            })
        };
        let projection = match self.proj {
            None => return Ok(None),
            Some("lcc") => Projection::LambertConformal(LambertConformal::new(
                require(self.lat_1, "lat_1")?,
                require(self.lat_2, "lat_2")?,
                require(self.lat_0, "lat_0")?,
                require(self.lon_0, "lon_0")?,
                self.a,
            )?),
            Some("stere") => Projection::PolarStereographic(PolarStereographic::new(
                require(self.lat_ts, "lat_ts")?,
                require(self.lon_0, "lon_0")?,
                self.a,
            )),
            Some("merc") => Projection::Mercator(Mercator::new(
                require(self.lat_ts, "lat_ts")?,
                require(self.lon_0, "lon_0")?,
                self.a,
            )),
            Some(other) => {
                return Err(WrfError::NotImplemented {
                    message: format!("Unknown projection: {}", other),
                })
            }
        };
        Ok(Some(projection))
    }
}

/// The CRS and projection coordinates of a WRF grid
#[derive(Debug, Clone, PartialEq)]
pub struct GridParameters {
    /// Physical CRS; `None` for idealized runs
    pub crs: Option<Projection>,
    pub south_north: Vec<f64>,
    pub west_east: Vec<f64>,
    pub south_north_stag: Vec<f64>,
    pub west_east_stag: Vec<f64>,
}

impl GridParameters {
    /// Coordinate values for one of the four horizontal dimensions
    pub fn coordinate(&self, dim: &str) -> Option<&[f64]> {
        match dim {
            "south_north" => Some(&self.south_north),
            "west_east" => Some(&self.west_east),
            "south_north_stag" => Some(&self.south_north_stag),
            "west_east_stag" => Some(&self.west_east_stag),
            _ => None,
        }
    }
}

/// Get the WRF projection and dimension coordinates out of the dataset.
///
/// Requires the `CEN_LON`, `CEN_LAT`, `DX`, `DY`, `MAP_PROJ`, `TRUELAT1`,
/// `MOAD_CEN_LAT` and `STAND_LON` global attributes and the `west_east` and
/// `south_north` dimensions. `TRUELAT2` falls back to `TRUELAT1`.
pub fn wrf_grid_from_dataset(ds: &Dataset) -> Result<GridParameters> {
    let cen_lon = ds.require_global_f64("CEN_LON")?;
    let cen_lat = ds.require_global_f64("CEN_LAT")?;
    let dx = ds.require_global_f64("DX")?;
    let dy = ds.require_global_f64("DY")?;
    let map_proj = ds
        .global_attr("MAP_PROJ")
        .ok_or_else(|| WrfError::MissingAttribute {
            name: "MAP_PROJ".to_string(),
        })?;
    let truelat1 = ds.require_global_f64("TRUELAT1")?;
    let truelat2 = ds.global_f64("TRUELAT2").unwrap_or(truelat1);
    let moad_cen_lat = ds.require_global_f64("MOAD_CEN_LAT")?;
    let stand_lon = ds.require_global_f64("STAND_LON")?;

    let kind = ProjectionKind::from_attribute(map_proj)?;
    let params = kind.params(ProjectionParams::base(
        truelat1,
        truelat2,
        moad_cen_lat,
        stand_lon,
        cen_lon,
    ));

    let crs = params.to_projection()?;
    let (e, n) = match &crs {
        Some(crs) => crs.forward(cen_lon, cen_lat),
        None => (cen_lon, cen_lat),
    };

    let nx = ds
        .dim_size("west_east")
        .ok_or_else(|| WrfError::not_found("Dimension west_east not found"))?;
    let ny = ds
        .dim_size("south_north")
        .ok_or_else(|| WrfError::not_found("Dimension south_north not found"))?;

    // lower-left corner of the mass grid
    let x0 = -((nx as f64) - 1.0) / 2.0 * dx + e;
    let y0 = -((ny as f64) - 1.0) / 2.0 * dy + n;

    debug!(
        projection = ?kind,
        nx = nx,
        ny = ny,
        x0 = x0,
        y0 = y0,
        "Derived WRF grid"
    );

    Ok(GridParameters {
        crs,
        south_north: (0..ny).map(|i| y0 + i as f64 * dy).collect(),
        west_east: (0..nx).map(|j| x0 + j as f64 * dx).collect(),
        south_north_stag: (0..=ny).map(|i| y0 + (i as f64 - 0.5) * dy).collect(),
        west_east_stag: (0..=nx).map(|j| x0 + (j as f64 - 0.5) * dx).collect(),
    })
}
