//! Pipeline orchestration.
//!
//! `postprocess` runs the stages in a fixed order:
//! 1. CF attributes
//! 2. unit harmonization
//! 3. time-axis collapse
//! 4. coordinate-to-dimension reassignment
//! 5. time decoding (optional)
//! 6. diagnostics (optional)
//! 7. projection coordinates
//! 8. dimension renaming
//!
//! Diagnostics read raw WRF names, so they run before renaming and before
//! any destaggering. Projection coordinates need the collapsed sizes.

use std::collections::BTreeMap;
use std::time::Instant;

use tracing::info;

use crate::config::WrfConfig;
use crate::dataset::Dataset;
use crate::destagger::destagger_dataset;
use crate::error::Result;
use crate::logging::{generate_run_id, log_stage};
use crate::postprocess::{
    assign_coord_to_dim_of_different_name, calc_base_diagnostics, collapse_time_dim,
    decode_times, include_projection_coordinates, make_units_pint_friendly, modify_attrs_to_cf,
    rename_dims,
};

/// Switches for the optional postprocessing stages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostprocessOptions {
    /// Decode `Times` into a `Time` coordinate
    pub decode_times: bool,
    /// Compute potential temperature, pressure, geopotential and winds
    pub calculate_diagnostic_variables: bool,
    /// Remove the fields the diagnostics were computed from
    pub drop_diagnostic_variable_components: bool,
}

impl Default for PostprocessOptions {
    fn default() -> Self {
        Self {
            decode_times: true,
            calculate_diagnostic_variables: true,
            drop_diagnostic_variable_components: true,
        }
    }
}

/// Run the full postprocessing pipeline on a raw WRF dataset
pub fn postprocess(ds: Dataset, config: &WrfConfig, options: PostprocessOptions) -> Result<Dataset> {
    let start = Instant::now();
    let run_id = generate_run_id();
    let run = run_id.as_str();

    let ds = log_stage("modify_attrs_to_cf", run, || Ok(modify_attrs_to_cf(ds, config)))?;
    let ds = log_stage("make_units_pint_friendly", run, || {
        Ok(make_units_pint_friendly(ds, config))
    })?;
    let ds = log_stage("collapse_time_dim", run, || collapse_time_dim(ds, config))?;
    let ds = log_stage("assign_coord_to_dim_of_different_name", run, || {
        assign_coord_to_dim_of_different_name(ds, config)
    })?;
    let ds = if options.decode_times {
        log_stage("decode_times", run, || decode_times(ds))?
    } else {
        ds
    };
    let ds = if options.calculate_diagnostic_variables {
        log_stage("calc_base_diagnostics", run, || {
            calc_base_diagnostics(ds, options.drop_diagnostic_variable_components)
        })?
    } else {
        ds
    };
    let ds = log_stage("include_projection_coordinates", run, || {
        include_projection_coordinates(ds, config)
    })?;
    let ds = log_stage("rename_dims", run, || rename_dims(ds, config))?;

    info!(
        operation = "postprocess",
        run_id = run,
        variables = ds.variable_names().len(),
        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Postprocessing completed"
    );
    Ok(ds)
}

/// Destagger every staggered data variable.
///
/// Callable before or after [`postprocess`]. With no mapping, every
/// dimension ending in `_stag` is destaggered.
pub fn destagger(
    ds: &Dataset,
    staggered_to_unstaggered_dims: Option<&BTreeMap<String, String>>,
) -> Result<Dataset> {
    let run_id = generate_run_id();
    log_stage("destagger", &run_id, || {
        destagger_dataset(ds, staggered_to_unstaggered_dims)
    })
}

/// A configuration bound to the pipeline entry points
#[derive(Debug, Clone, Copy)]
pub struct Postprocessor<'a> {
    config: &'a WrfConfig,
    options: PostprocessOptions,
}

impl<'a> Postprocessor<'a> {
    pub fn new(config: &'a WrfConfig) -> Self {
        Self {
            config,
            options: PostprocessOptions::default(),
        }
    }

    pub fn with_options(mut self, options: PostprocessOptions) -> Self {
        self.options = options;
        self
    }

    pub fn postprocess(&self, ds: Dataset) -> Result<Dataset> {
        postprocess(ds, self.config, self.options)
    }

    pub fn destagger(
        &self,
        ds: &Dataset,
        staggered_to_unstaggered_dims: Option<&BTreeMap<String, String>>,
    ) -> Result<Dataset> {
        destagger(ds, staggered_to_unstaggered_dims)
    }
}
