//! Projection coordinates and the grid-mapping variable.

use tracing::{debug, warn};

use super::diagnostics::GRID_MAPPING_NAME;
use crate::config::WrfConfig;
use crate::dataset::{AttributeValue, Dataset, Variable};
use crate::error::{Result, WrfError};
use crate::grid::wrf_grid_from_dataset;

/// Add projected horizontal dimension coordinates and the CRS.
///
/// Datasets lacking the projection attributes or horizontal dimensions are
/// returned unchanged after a warning. Idealized runs get dimension
/// coordinates but no CRS.
pub fn include_projection_coordinates(mut ds: Dataset, config: &WrfConfig) -> Result<Dataset> {
    let grid = match wrf_grid_from_dataset(&ds) {
        Ok(grid) => grid,
        Err(err @ (WrfError::MissingAttribute { .. } | WrfError::DataNotFound { .. })) => {
            warn!(
                error = %err,
                "Unable to create coordinate values and CRS due to insufficient dimensions or projection metadata"
            );
            return Ok(ds);
        }
        Err(err) => return Err(err),
    };

    let horizontal_dims: Vec<&String> = config
        .horizontal_dims
        .iter()
        .filter(|dim| ds.has_dim(dim))
        .collect();

    for dim in &horizontal_dims {
        let Some(values) = grid.coordinate(dim) else {
            debug!(dim = %dim, "No projection coordinate for dimension");
            continue;
        };
        let attrs = config.cf_attribute_map.get(*dim).cloned().unwrap_or_default();
        ds.insert_coord(
            dim.as_str(),
            Variable::from_vec(dim, values.to_vec()).with_attrs(attrs),
        )?;
    }

    if let Some(crs) = grid.crs {
        let attrs = crs.to_cf();
        ds.insert_coord(GRID_MAPPING_NAME, Variable::scalar_crs(crs).with_attrs(attrs))?;

        let mapped: Vec<String> = ds
            .data_vars()
            .filter(|(_, var)| var.dims().iter().any(|d| horizontal_dims.contains(&d)))
            .map(|(name, _)| name.clone())
            .collect();
        for name in mapped {
            if let Some(var) = ds.get_mut(&name) {
                var.attrs.insert(
                    "grid_mapping".to_string(),
                    AttributeValue::from(GRID_MAPPING_NAME),
                );
            }
        }
    }

    Ok(ds)
}
