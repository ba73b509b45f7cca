//! Dimension collapsing, coordinate reassignment and renaming.

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::WrfConfig;
use crate::dataset::Dataset;
use crate::error::Result;

/// Drop the leading time axis from lat/lon and vertical coordinates.
///
/// Lat/lon coordinates with three dimensions and vertical coordinates with
/// two are replaced by their first time step and promoted to coordinates.
/// This assumes a static domain and is wrong for moving nests.
pub fn collapse_time_dim(mut ds: Dataset, config: &WrfConfig) -> Result<Dataset> {
    let lat_lon = config.lat_lon_coords();
    let vertical: Vec<&str> = config.vertical_coords.iter().map(String::as_str).collect();

    let present: Vec<String> = ds
        .variable_names()
        .into_iter()
        .filter(|name| lat_lon.contains(name.as_str()) || vertical.contains(&name.as_str()))
        .collect();
    ds.set_coords(present.iter().map(String::as_str));

    for name in present {
        let Some(var) = ds.get(&name) else {
            continue;
        };
        let time_varying = (lat_lon.contains(name.as_str()) && var.ndim() == 3)
            || (vertical.contains(&name.as_str()) && var.ndim() == 2);
        if !time_varying {
            continue;
        }
        let leading = var.dims()[0].clone();
        let collapsed = var.index_along(&leading, 0)?;
        debug!(coordinate = %name, dim = %leading, "Collapsing time dimension");
        ds.insert_coord(name, collapsed)?;
    }
    Ok(ds)
}

/// Make configured variables the coordinate of a differently named dimension.
///
/// `ZNU` becomes the `bottom_top` coordinate, for example. Pairs whose
/// source variable is absent are skipped, as are sources that do not lie
/// along exactly their target dimension.
pub fn assign_coord_to_dim_of_different_name(mut ds: Dataset, config: &WrfConfig) -> Result<Dataset> {
    for (source, dim) in &config.assign_coord_to_dim_map {
        let fits = match ds.get(source) {
            Some(var) => var.dims() == std::slice::from_ref(dim),
            None => continue,
        };
        if !fits {
            debug!(variable = %source, dim = %dim, "Skipping coordinate with unexpected dimensions");
            continue;
        }
        if let Some(var) = ds.remove(source) {
            ds.insert_coord(dim.clone(), var)?;
        }
    }
    Ok(ds)
}

/// Rename the dimensions listed in the configured map that are present.
///
/// Variables named like a renamed dimension follow it.
pub fn rename_dims(ds: Dataset, config: &WrfConfig) -> Result<Dataset> {
    let sizes = ds.sizes();
    let names: BTreeMap<String, String> = config
        .rename_dim_map
        .iter()
        .filter(|(old, _)| sizes.contains_key(*old))
        .map(|(old, new)| (old.clone(), new.clone()))
        .collect();
    if names.is_empty() {
        return Ok(ds);
    }
    ds.rename(&names)
}
