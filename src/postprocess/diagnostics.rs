//! Derived diagnostic fields.
//!
//! WRF splits several state fields into a base state plus a perturbation
//! and stores winds relative to the model grid. These helpers rebuild the
//! physical quantities. Each diagnostic is skipped when any of its source
//! fields is missing.

use tracing::debug;

use crate::dataset::{AttributeValue, Attributes, Dataset, Variable};
use crate::destagger::destag_variable;
use crate::error::Result;

/// Base state of the perturbation potential temperature (K)
pub const BASE_POTENTIAL_TEMPERATURE: f64 = 300.0;

/// Standard gravity used by WRF (m s-2)
pub const GRAVITY: f64 = 9.81;

/// Name of the scalar grid-mapping coordinate
pub const GRID_MAPPING_NAME: &str = "wrf_projection";

fn attrs(pairs: &[(&str, &str)]) -> Attributes {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), AttributeValue::from(*v)))
        .collect()
}

fn all_present(ds: &Dataset, names: &[&str]) -> bool {
    names.iter().all(|name| ds.contains(name))
}

fn remove_all(ds: &mut Dataset, names: &[&str]) {
    for name in names {
        ds.remove(name);
    }
}

/// Compute the base diagnostics, dropping their components when `drop` is set.
///
/// Earth-relative winds are always kept alongside the grid-relative ones.
pub fn calc_base_diagnostics(mut ds: Dataset, drop: bool) -> Result<Dataset> {
    if let Some(t) = ds.get("T") {
        let theta = t
            .map_f64(|v| v + BASE_POTENTIAL_TEMPERATURE)?
            .with_attrs(attrs(&[
                ("units", "K"),
                ("standard_name", "air_potential_temperature"),
            ]));
        ds.insert("air_potential_temperature", theta)?;
        if drop {
            remove_all(&mut ds, &["T"]);
        }
    }

    if all_present(&ds, &["P", "PB"]) {
        let p = ds.variable("P")?;
        let units = p.units().unwrap_or("Pa").to_string();
        let pressure = p.add(ds.variable("PB")?)?.with_attrs(attrs(&[
            ("units", units.as_str()),
            ("standard_name", "air_pressure"),
        ]));
        ds.insert("air_pressure", pressure)?;
        if drop {
            remove_all(&mut ds, &["P", "PB"]);
        }
    }

    if all_present(&ds, &["PH", "PHB"]) {
        let ph = ds.variable("PH")?;
        let stagger = ph
            .attrs
            .get("stagger")
            .and_then(AttributeValue::as_str)
            .unwrap_or("Z")
            .to_string();
        let geopotential = ph.add(ds.variable("PHB")?)?;
        let height = geopotential.scale(1.0 / GRAVITY)?.with_attrs(attrs(&[
            ("units", "m"),
            ("standard_name", "geopotential_height"),
            ("stagger", stagger.as_str()),
        ]));
        let geopotential = geopotential.with_attrs(attrs(&[
            ("units", "m**2 s**-2"),
            ("standard_name", "geopotential"),
            ("stagger", stagger.as_str()),
        ]));
        ds.insert("geopotential", geopotential)?;
        ds.insert("geopotential_height", height)?;
        if drop {
            remove_all(&mut ds, &["PH", "PHB"]);
        }
    }

    if all_present(&ds, &["U", "V", "SINALPHA", "COSALPHA"]) {
        let u = ds.variable("U")?;
        let v = ds.variable("V")?;
        if u.has_dim("west_east_stag") && v.has_dim("south_north_stag") {
            let u = destag_variable(u, Some("west_east_stag"), None)?;
            let v = destag_variable(v, Some("south_north_stag"), None)?;
            let (east, north) = rotate_to_earth(&ds, &u, &v)?;
            ds.insert("wind_east", east.with_attrs(wind_attrs("eastward_wind")))?;
            ds.insert("wind_north", north.with_attrs(wind_attrs("northward_wind")))?;
        } else {
            debug!("U/V are not on the staggered grid, skipping earth-relative winds");
        }
    }

    if all_present(&ds, &["U10", "V10", "SINALPHA", "COSALPHA"]) {
        let (east, north) = rotate_to_earth(&ds, ds.variable("U10")?, ds.variable("V10")?)?;
        ds.insert("wind_east_10", east.with_attrs(wind_attrs("eastward_wind")))?;
        ds.insert("wind_north_10", north.with_attrs(wind_attrs("northward_wind")))?;
    }

    Ok(ds)
}

fn wind_attrs(standard_name: &str) -> Attributes {
    attrs(&[
        ("units", "m s-1"),
        ("standard_name", standard_name),
        ("grid_mapping", GRID_MAPPING_NAME),
    ])
}

/// Rotate grid-relative winds with the local map rotation angle
fn rotate_to_earth(ds: &Dataset, u: &Variable, v: &Variable) -> Result<(Variable, Variable)> {
    let sina = ds.variable("SINALPHA")?;
    let cosa = ds.variable("COSALPHA")?;
    let east = u.mul(cosa)?.sub(&v.mul(sina)?)?;
    let north = v.mul(cosa)?.add(&u.mul(sina)?)?;
    Ok((east, north))
}
