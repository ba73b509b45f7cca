//! NetCDF loading of raw WRF output.
//!
//! Reads a `wrfout` file into a [`Dataset`]: numeric variables as `f64`,
//! character variables as one byte string per leading index, and all
//! global and variable attributes. Well-known time and lat/lon variables
//! are promoted to coordinates and `XTIME` style "minutes since" values are
//! decoded to calendar times.

use chrono::{Duration, NaiveDateTime};
use ndarray::{ArrayD, IxDyn};
use netcdf::{Attribute, Variable as NetCDFVariable};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::config::WrfConfig;
use crate::dataset::{AttributeValue, Attributes, Dataset, Variable, VariableData};
use crate::error::{Result, WrfError};
use crate::logging::log_data_load_stats;

/// Open a raw WRF NetCDF file
pub fn open_wrf_dataset(path: &Path, config: &WrfConfig) -> Result<Dataset> {
    if !path.exists() {
        return Err(WrfError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("File not found: {}", path.display()),
        )));
    }

    let file = netcdf::open(path)?;
    info!("Opened NetCDF file: {}", path.display());

    let mut attrs = Attributes::new();
    for attr in file.attributes() {
        attrs.insert(attr.name().to_string(), convert_attribute(&attr)?);
    }
    let mut ds = Dataset::with_attrs(attrs);

    for var in file.variables() {
        let name = var.name();
        let Some(data) = read_variable(&var)? else {
            warn!("Skipping unsupported variable: {}", name);
            continue;
        };

        let mut dims: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();
        if matches!(data, VariableData::Bytes(_)) {
            // the trailing string-length axis was folded into the strings
            dims.pop();
        }

        let mut variable = Variable::new(dims, data)?;
        for attr in var.attributes() {
            variable
                .attrs
                .insert(attr.name().to_string(), convert_attribute(&attr)?);
        }
        let variable = decode_relative_times(variable)?;
        ds.insert(name, variable)?;
    }

    let coords: Vec<String> = config
        .time_coords
        .iter()
        .chain(&config.latitude_coords)
        .chain(&config.longitude_coords)
        .filter(|name| ds.contains(name))
        .cloned()
        .collect();
    debug!(coords = ?coords, "Promoting coordinate variables");
    ds.set_coords(coords.iter().map(String::as_str));

    let dim_details = ds
        .sizes()
        .iter()
        .map(|(dim, size)| format!("{}={}", dim, size))
        .collect::<Vec<_>>()
        .join(", ");
    log_data_load_stats(&path.display().to_string(), &ds.variable_names(), &dim_details);

    Ok(ds)
}

/// Read a variable's values; `None` for types we do not handle
fn read_variable(var: &NetCDFVariable) -> Result<Option<VariableData>> {
    use netcdf::types::{BasicType, VariableType};

    let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
    let values: Vec<f64> = match var.vartype() {
        VariableType::Basic(BasicType::Char) => return read_chars(var, &shape).map(Some),
        VariableType::Basic(BasicType::Byte) => var
            .get_values::<i8, _>(..)?
            .into_iter()
            .map(f64::from)
            .collect(),
        VariableType::Basic(BasicType::Short) => var
            .get_values::<i16, _>(..)?
            .into_iter()
            .map(f64::from)
            .collect(),
        VariableType::Basic(BasicType::Int) => var
            .get_values::<i32, _>(..)?
            .into_iter()
            .map(f64::from)
            .collect(),
        VariableType::Basic(BasicType::Float) => var
            .get_values::<f32, _>(..)?
            .into_iter()
            .map(f64::from)
            .collect(),
        VariableType::Basic(BasicType::Double) => var.get_values::<f64, _>(..)?,
        _ => return Ok(None),
    };
    Ok(Some(VariableData::Float(ArrayD::from_shape_vec(
        IxDyn(&shape),
        values,
    )?)))
}

/// Fold the trailing character axis into one byte string per element
fn read_chars(var: &NetCDFVariable, shape: &[usize]) -> Result<VariableData> {
    fold_chars(var.get_raw_values(..)?, shape)
}

fn fold_chars(raw: Vec<u8>, shape: &[usize]) -> Result<VariableData> {
    let Some((&width, outer)) = shape.split_last() else {
        return Ok(VariableData::Bytes(ArrayD::from_elem(IxDyn(&[]), raw)));
    };
    let count: usize = outer.iter().product();
    if raw.len() != count * width {
        return Err(WrfError::invalid(format!(
            "Expected {} characters for shape {:?}, found {}",
            count * width,
            shape,
            raw.len()
        )));
    }
    let strings: Vec<Vec<u8>> = if width == 0 {
        vec![Vec::new(); count]
    } else {
        raw.chunks(width).map(<[u8]>::to_vec).collect()
    };
    Ok(VariableData::Bytes(ArrayD::from_shape_vec(
        IxDyn(outer),
        strings,
    )?))
}

/// Decode `<unit> since <date>` numeric values into calendar times
fn decode_relative_times(var: Variable) -> Result<Variable> {
    let Some((step, epoch)) = var.units().and_then(parse_relative_units) else {
        return Ok(var);
    };
    let Some(values) = var.as_f64() else {
        return Ok(var);
    };
    let times = values.mapv(|v| epoch + Duration::milliseconds((v * step) as i64));
    var.with_data(VariableData::DateTime(times))
}

/// Milliseconds per unit and the reference instant of a CF time unit
fn parse_relative_units(units: &str) -> Option<(f64, NaiveDateTime)> {
    let (unit, reference) = units.split_once(" since ")?;
    let step = match unit.trim() {
        "days" | "day" => 86_400_000.0,
        "hours" | "hour" => 3_600_000.0,
        "minutes" | "minute" => 60_000.0,
        "seconds" | "second" => 1_000.0,
        _ => return None,
    };
    let reference = reference.trim();
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d_%H:%M:%S", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(reference, format).ok())
        .map(|epoch| (step, epoch))
}

/// Convert a NetCDF attribute to our AttributeValue enum
fn convert_attribute(attr: &Attribute) -> Result<AttributeValue> {
    use netcdf::AttributeValue as NcAttributeValue;

    let value = attr.value()?;

    let converted = match value {
        NcAttributeValue::Str(s) => AttributeValue::Text(s),
        NcAttributeValue::Uchar(v) => AttributeValue::Number(v as f64),
        NcAttributeValue::Schar(v) => AttributeValue::Number(v as f64),
        NcAttributeValue::Short(v) => AttributeValue::Number(v as f64),
        NcAttributeValue::Int(v) => AttributeValue::Number(v as f64),
        NcAttributeValue::Float(v) => AttributeValue::Number(v as f64),
        NcAttributeValue::Double(v) => AttributeValue::Number(v),
        NcAttributeValue::Shorts(v) => numbers(v),
        NcAttributeValue::Ints(v) => numbers(v),
        NcAttributeValue::Floats(v) => numbers(v),
        NcAttributeValue::Doubles(v) => AttributeValue::NumberArray(v),
        other => AttributeValue::Text(format!("{:?}", other)),
    };
    Ok(converted)
}

fn numbers<T: Into<f64>>(values: Vec<T>) -> AttributeValue {
    AttributeValue::NumberArray(values.into_iter().map(Into::into).collect())
}
