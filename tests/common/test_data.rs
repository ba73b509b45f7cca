//! Test data generation utilities.
//!
//! Builds in-memory datasets with the variable layout, attributes and
//! staggering of a raw `wrfout` file. Latitudes and longitudes are generated
//! from the grid the global attributes describe, so the projection
//! coordinates derived by the pipeline can be checked against them.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use ndarray::{ArrayD, Dimension, IxDyn};
use wrfcf::{wrf_grid_from_dataset, AttributeValue, Attributes, Dataset, Variable, VariableData};

pub const NT: usize = 2;
pub const NZ: usize = 3;
pub const NY: usize = 4;
pub const NX: usize = 5;

/// Raw perturbation potential temperature of the lowest level
pub const SURFACE_T: f64 = 208.78415;

pub const TIMES: [&str; NT] = ["2005-08-28_12:00:00", "2005-08-28_13:00:00"];

/// The reference instant named in the `XTIME` description
pub fn simulation_start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2005, 8, 28)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// The instants encoded in [`TIMES`]
pub fn expected_times() -> Vec<NaiveDateTime> {
    (0..NT)
        .map(|t| simulation_start() + Duration::hours(12 + t as i64))
        .collect()
}

/// Length of a raw WRF dimension on the test grid
pub fn dim_len(dim: &str) -> usize {
    match dim {
        "Time" => NT,
        "bottom_top" => NZ,
        "bottom_top_stag" => NZ + 1,
        "south_north" => NY,
        "south_north_stag" => NY + 1,
        "west_east" => NX,
        "west_east_stag" => NX + 1,
        other => panic!("Unknown test dimension {}", other),
    }
}

/// Global attributes describing the grid for a `MAP_PROJ` code.
///
/// Codes other than 1, 2 and 3 get the idealized parameter set, so
/// unsupported codes can be exercised too.
pub fn grid_attrs(map_proj: i64) -> Attributes {
    // (CEN_LAT, CEN_LON, TRUELAT1, TRUELAT2, MOAD_CEN_LAT, STAND_LON, DX)
    let (cen_lat, cen_lon, truelat1, truelat2, moad_cen_lat, stand_lon, dx) = match map_proj {
        1 => (34.83, -81.03, 30.0, 60.0, 34.83, -98.0, 30000.0),
        2 => (60.0, -100.0, 60.0, 60.0, 60.0, -100.0, 30000.0),
        3 => (20.0, 150.0, 10.0, 10.0, 20.0, 150.0, 30000.0),
        _ => (0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1000.0),
    };

    let mut attrs = Attributes::new();
    for (key, value) in [
        ("CEN_LAT", cen_lat),
        ("CEN_LON", cen_lon),
        ("TRUELAT1", truelat1),
        ("TRUELAT2", truelat2),
        ("MOAD_CEN_LAT", moad_cen_lat),
        ("STAND_LON", stand_lon),
        ("DX", dx),
        ("DY", dx),
        ("MAP_PROJ", map_proj as f64),
        ("HYBRID_OPT", 2.0),
    ] {
        attrs.insert(key.to_string(), AttributeValue::Number(value));
    }
    attrs.insert(
        "TITLE".to_string(),
        AttributeValue::from(" OUTPUT FROM WRF V4.3 MODEL"),
    );
    attrs
}

/// A numeric field on the test grid, filled from its index
pub fn field(dims: &[&str], f: impl Fn(&[usize]) -> f64) -> Variable {
    let shape: Vec<usize> = dims.iter().map(|d| dim_len(d)).collect();
    let array = ArrayD::from_shape_fn(IxDyn(&shape), |idx| f(idx.slice()));
    Variable::from_f64(dims.to_vec(), array).unwrap()
}

fn described(mut var: Variable, pairs: &[(&str, &str)]) -> Variable {
    for (key, value) in pairs {
        var.attrs.insert(key.to_string(), AttributeValue::from(*value));
    }
    var
}

fn times_variable() -> Variable {
    let raw: Vec<Vec<u8>> = TIMES.iter().map(|t| t.as_bytes().to_vec()).collect();
    let array = ArrayD::from_shape_vec(IxDyn(&[NT]), raw).unwrap();
    Variable::new(vec!["Time"], VariableData::Bytes(array)).unwrap()
}

fn xtime_variable() -> Variable {
    let array = ArrayD::from_shape_vec(IxDyn(&[NT]), expected_times()).unwrap();
    let xtime = Variable::new(vec!["Time"], VariableData::DateTime(array)).unwrap();
    described(
        xtime,
        &[
            ("description", "minutes since 2005-08-28 00:00:00"),
            ("units", "minutes since 2005-08-28 00:00:00"),
        ],
    )
}

/// A raw WRF dataset on a `NY` x `NX` grid with `NZ` levels and `NT` times.
///
/// Coordinates are marked the way the loader marks them: time variables
/// and latitude/longitude fields.
pub fn create_wrf_dataset(map_proj: i64) -> Dataset {
    let mut ds = Dataset::with_attrs(grid_attrs(map_proj));
    let mass = ["Time", "bottom_top", "south_north", "west_east"];
    let surface = ["Time", "south_north", "west_east"];

    ds.insert("Times", times_variable()).unwrap();
    ds.insert("XTIME", xtime_variable()).unwrap();

    ds.insert(
        "ZNU",
        field(&["Time", "bottom_top"], |i| 1.0 - (i[1] as f64 + 0.5) / NZ as f64),
    )
    .unwrap();
    ds.insert(
        "ZNW",
        field(&["Time", "bottom_top_stag"], |i| 1.0 - i[1] as f64 / NZ as f64),
    )
    .unwrap();

    let t = field(&mass, |i| SURFACE_T - 10.0 * i[1] as f64);
    ds.insert(
        "T",
        described(t, &[("units", "K"), ("description", "perturbation potential temperature (theta-t0)")]),
    )
    .unwrap();
    ds.insert("P", described(field(&mass, |_| 500.0), &[("units", "Pa")]))
        .unwrap();
    ds.insert(
        "PB",
        described(field(&mass, |i| 95000.0 - 10000.0 * i[1] as f64), &[("units", "Pa")]),
    )
    .unwrap();

    let stag_z = ["Time", "bottom_top_stag", "south_north", "west_east"];
    ds.insert(
        "PH",
        described(
            field(&stag_z, |i| 981.0 * i[1] as f64),
            &[("units", "m2 s-2"), ("stagger", "Z")],
        ),
    )
    .unwrap();
    ds.insert(
        "PHB",
        described(
            field(&stag_z, |i| 9810.0 * i[1] as f64),
            &[("units", "m2 s-2"), ("stagger", "Z")],
        ),
    )
    .unwrap();

    let u = field(&["Time", "bottom_top", "south_north", "west_east_stag"], |i| {
        i[3] as f64
    });
    ds.insert("U", described(u, &[("units", "m s-1"), ("stagger", "X")]))
        .unwrap();
    let v = field(&["Time", "bottom_top", "south_north_stag", "west_east"], |_| 2.0);
    ds.insert("V", described(v, &[("units", "m s-1"), ("stagger", "Y")]))
        .unwrap();
    ds.insert("U10", described(field(&surface, |_| 3.0), &[("units", "m s-1")]))
        .unwrap();
    ds.insert("V10", described(field(&surface, |_| 4.0), &[("units", "m s-1")]))
        .unwrap();
    ds.insert("SINALPHA", field(&surface, |_| 0.0)).unwrap();
    ds.insert("COSALPHA", field(&surface, |_| 1.0)).unwrap();

    ds.insert("HGT", described(field(&surface, |_| 120.0), &[("units", "meters")]))
        .unwrap();
    ds.insert("LANDMASK", described(field(&surface, |_| 1.0), &[("units", "flag")]))
        .unwrap();
    ds.insert(
        "QVAPOR",
        described(field(&mass, |_| 0.012), &[("units", "kg/kg")]),
    )
    .unwrap();

    add_lat_lon(&mut ds);
    ds.set_coords(["Times", "XTIME", "XLAT", "XLONG", "XLAT_U", "XLONG_U"]);
    ds
}

/// Latitude and longitude on the mass and x-staggered grids.
///
/// Grids without a physical projection get zeros.
fn add_lat_lon(ds: &mut Dataset) {
    let grid = wrf_grid_from_dataset(ds).ok();
    let crs = grid.as_ref().and_then(|g| g.crs.clone());

    for (suffix, x_dim) in [("", "west_east"), ("_U", "west_east_stag")] {
        let dims = ["Time", "south_north", x_dim];
        let lon_lat = |i: &[usize]| match (&grid, &crs) {
            (Some(grid), Some(crs)) => {
                let x = grid.coordinate(x_dim).unwrap()[i[2]];
                let y = grid.south_north[i[1]];
                crs.inverse(x, y)
            }
            _ => (0.0, 0.0),
        };
        let lat = field(&dims, |i| lon_lat(i).1);
        let lon = field(&dims, |i| lon_lat(i).0);
        ds.insert(
            format!("XLAT{}", suffix),
            described(lat, &[("units", "degrees_north"), ("description", "LATITUDE, SOUTH IS NEGATIVE")]),
        )
        .unwrap();
        ds.insert(
            format!("XLONG{}", suffix),
            described(lon, &[("units", "degrees_east"), ("description", "LONGITUDE, WEST IS NEGATIVE")]),
        )
        .unwrap();
    }
}
