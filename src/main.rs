//! wrfcf - postprocess a raw WRF output file into a CF-compliant dataset
//!
//! Opens the file, runs the postprocessing pipeline and prints a JSON
//! summary of the resulting dataset to stdout.

use anyhow::Context;
use clap::Parser;
use serde_json::{json, Value};
use tracing::info;

use wrfcf::config::{validate_log_level, Args};
use wrfcf::data_loader::open_wrf_dataset;
use wrfcf::{
    destagger, init_tracing, log_error, log_timed_operation, Dataset, PostprocessOptions,
    Postprocessor, VariableData, WrfConfig,
};

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    validate_log_level(&args.log_level)?;
    init_tracing(&args.log_level);

    info!("Starting wrfcf v{}", env!("CARGO_PKG_VERSION"));

    let loaded;
    let config = match &args.config {
        Some(path) => {
            loaded = WrfConfig::from_file(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            &loaded
        }
        None => WrfConfig::builtin(),
    };

    let ds = log_timed_operation("load", || open_wrf_dataset(&args.netcdf_file, config))
        .with_context(|| format!("Failed to open {}", args.netcdf_file.display()))?;

    let options = PostprocessOptions {
        decode_times: !args.no_decode_times,
        calculate_diagnostic_variables: !args.no_diagnostics,
        drop_diagnostic_variable_components: !args.keep_components,
    };
    let mut ds = Postprocessor::new(config)
        .with_options(options)
        .postprocess(ds)
        .map_err(|e| {
            log_error(&e, "postprocess");
            e
        })?;

    if args.destagger {
        ds = destagger(&ds, None)?;
    }
    info!(variables = ds.variable_names().len(), "Writing dataset summary");

    println!("{}", serde_json::to_string_pretty(&summarize(&ds))?);
    Ok(())
}

/// JSON description of a dataset's structure
fn summarize(ds: &Dataset) -> Value {
    let describe = |name: &String| {
        let var = ds.get(name);
        json!({
            "dims": var.map(|v| v.dims().to_vec()).unwrap_or_default(),
            "dtype": var.map(|v| v.data().kind()).unwrap_or("unknown"),
            "attrs": var.map(|v| v.attrs.clone()).unwrap_or_default(),
            "grid_mapping_name": var.and_then(|v| match v.data() {
                VariableData::Crs(crs) => Some(crs.grid_mapping_name().to_string()),
                _ => None,
            }),
        })
    };

    let coords: serde_json::Map<String, Value> = ds
        .coord_names()
        .iter()
        .map(|name| (name.clone(), describe(name)))
        .collect();
    let data_vars: serde_json::Map<String, Value> = ds
        .data_var_names()
        .iter()
        .map(|name| (name.clone(), describe(name)))
        .collect();

    json!({
        "dims": ds.sizes(),
        "coords": coords,
        "data_vars": data_vars,
        "attrs": ds.attrs,
    })
}
