//! The individual postprocessing stages.
//!
//! Every stage takes the dataset by value and returns the transformed
//! dataset. A stage that fails consumes its input, so no partially
//! updated dataset is ever visible to the caller. See [`crate::pipeline`]
//! for the fixed order in which they run.

pub mod attributes;
pub mod diagnostics;
pub mod dims;
pub mod projection_coords;
pub mod time;

pub use attributes::{make_units_pint_friendly, modify_attrs_to_cf};
pub use diagnostics::calc_base_diagnostics;
pub use dims::{assign_coord_to_dim_of_different_name, collapse_time_dim, rename_dims};
pub use projection_coords::include_projection_coordinates;
pub use time::{decode_times, parse_wrf_time};
