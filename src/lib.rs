//! # wrfcf
//!
//! Postprocessing of raw WRF model output into CF-conventions datasets.
//!
//! The library takes a [`Dataset`] as produced from a `wrfout` file and
//! rewrites it so downstream tooling finds standard dimension names,
//! coordinate variables, units and projection metadata.
//!
//! ## Key Features
//!
//! - **CF attributes and units**: attribute blocks and unit spellings come from
//!   bundled lookup tables that can be overlaid with a JSON file
//! - **Grid reconstruction**: the map projection and analytic projection
//!   coordinates are derived from the scalar grid attributes
//! - **Time decoding**: packed `Times` strings become a calendar `Time` coordinate
//! - **Diagnostics**: potential temperature, pressure, geopotential and
//!   earth-relative winds are computed from their raw components
//! - **Destaggering**: Arakawa C-grid fields are averaged onto cell centres
//!
//! ## Architecture
//!
//! - **Data model** ([`dataset`]): named-dimension variables and datasets
//! - **Stages** ([`postprocess`], [`destagger`], [`grid`]): pure transformations
//! - **Orchestration** ([`pipeline`]): the fixed stage order
//! - **I/O** (`data_loader`, feature `netcdf`): reading `wrfout` files

pub mod config;
#[cfg(feature = "netcdf")]
pub mod data_loader;
pub mod dataset;
pub mod destagger;
pub mod error;
pub mod grid;
pub mod logging;
pub mod pipeline;
pub mod postprocess;

pub use config::WrfConfig;
pub use dataset::{AttributeValue, Attributes, DataArray, Dataset, Variable, VariableData};
pub use destagger::{
    destag_variable, destagger_data_array, destagger_dataset, drop_attrs,
    rename_staggered_coordinate,
};
pub use error::{Result, WrfError};
pub use grid::{wrf_grid_from_dataset, GridParameters, Projection, ProjectionKind};
pub use logging::{init_tracing, log_error, log_timed_operation};
pub use pipeline::{destagger, postprocess, PostprocessOptions, Postprocessor};
