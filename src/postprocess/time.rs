//! Decoding of WRF time strings into a `Time` coordinate.

use chrono::NaiveDateTime;
use tracing::debug;

use crate::dataset::{AttributeValue, Attributes, Dataset, Variable, VariableData};
use crate::error::{Result, WrfError};

/// Layout of the `Times` character variable
pub const WRF_TIME_FORMAT: &str = "%Y-%m-%d_%H:%M:%S";

/// Accepted when the WRF layout does not match
pub const ISO_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Layout of the `XTIME` description attribute
pub const XTIME_DESCRIPTION_FORMAT: &str = "minutes since %Y-%m-%d %H:%M:%S";

/// Parse one fixed-width WRF time string.
///
/// Trailing NUL padding and whitespace are ignored.
pub fn parse_wrf_time(raw: &[u8]) -> Result<NaiveDateTime> {
    let text = String::from_utf8_lossy(raw);
    let text = text.trim_end_matches(|c: char| c == '\0' || c.is_whitespace());
    NaiveDateTime::parse_from_str(text, WRF_TIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(text, ISO_TIME_FORMAT))
        .map_err(|_| WrfError::TimeParse {
            value: text.to_string(),
        })
}

fn time_attrs() -> Attributes {
    let mut attrs = Attributes::new();
    attrs.insert("long_name".to_string(), AttributeValue::from("Time"));
    attrs.insert("standard_name".to_string(), AttributeValue::from("time"));
    attrs
}

fn decode_time_strings(times: &Variable) -> Result<Variable> {
    let VariableData::Bytes(raw) = times.data() else {
        return Err(WrfError::TypeMismatch {
            param: "Times".to_string(),
            expected: "byte strings".to_string(),
            found: times.data().kind().to_string(),
        });
    };
    let parsed: Vec<NaiveDateTime> = raw
        .iter()
        .map(|entry| parse_wrf_time(entry))
        .collect::<Result<_>>()?;
    let array = ndarray::ArrayD::from_shape_vec(raw.raw_dim(), parsed)?;
    Variable::new(times.dims().to_vec(), VariableData::DateTime(array))
}

/// Name of a calendar coordinate a previous run already decoded, if any
fn decoded_time_coord(ds: &Dataset) -> Option<String> {
    let decoded = time_attrs();
    ds.coords()
        .find(|(_, var)| {
            var.is_datetime()
                && decoded
                    .iter()
                    .all(|(key, value)| var.attrs.get(key) == Some(value))
        })
        .map(|(name, _)| name.clone())
}

/// Attach a decoded `Time` coordinate.
///
/// `Times` is the source of truth; an already decoded `XTIME` is used when
/// it is missing. A decoded `XTIME` coordinate is then turned into the
/// elapsed time since the instant named in its `description`. A dataset
/// that already carries a decoded time coordinate, under any name, is
/// returned unchanged.
pub fn decode_times(mut ds: Dataset) -> Result<Dataset> {
    if let Some(name) = decoded_time_coord(&ds) {
        debug!(coord = %name, "Time coordinate already decoded");
        return Ok(ds);
    }

    let time = if let Some(times) = ds.get("Times") {
        decode_time_strings(times)?
    } else if let Some(xtime) = ds.get("XTIME") {
        let Some(values) = xtime.as_datetime() else {
            return Err(WrfError::MissingTimeSource {
                message: "XTIME is present but not decoded to calendar times; \
                          decode times when reading the file"
                    .to_string(),
            });
        };
        Variable::new(xtime.dims().to_vec(), VariableData::DateTime(values.clone()))?
    } else {
        return Err(WrfError::MissingTimeSource {
            message: "Neither Times nor XTIME is present".to_string(),
        });
    };
    ds.insert_coord("Time", time.with_attrs(time_attrs()))?;

    if ds.is_coord("XTIME") {
        let elapsed = xtime_as_elapsed(ds.variable("XTIME")?)?;
        if let Some(elapsed) = elapsed {
            debug!("Converting XTIME to elapsed time");
            ds.insert_coord("XTIME", elapsed)?;
        }
    }
    Ok(ds)
}

/// `XTIME` minus the instant in its description; `None` unless calendar-typed
fn xtime_as_elapsed(xtime: &Variable) -> Result<Option<Variable>> {
    let Some(values) = xtime.as_datetime() else {
        return Ok(None);
    };
    let description = xtime
        .attrs
        .get("description")
        .and_then(AttributeValue::as_str)
        .ok_or_else(|| WrfError::MissingAttribute {
            name: "XTIME.description".to_string(),
        })?;
    let epoch = NaiveDateTime::parse_from_str(description.trim(), XTIME_DESCRIPTION_FORMAT)
        .map_err(|_| WrfError::TimeParse {
            value: description.to_string(),
        })?;
    let elapsed = values.mapv(|t| t - epoch);
    xtime.with_data(VariableData::TimeDelta(elapsed)).map(Some)
}
