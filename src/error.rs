//! Error types for wrfcf.
//!
//! The variants separate the failure classes a caller may want to branch on:
//! missing structural metadata, unsupported features, shape/type mismatches
//! during destaggering and time parsing failures.

use thiserror::Error;

/// The main error type for wrfcf operations.
#[derive(Error, Debug)]
pub enum WrfError {
    /// A required global attribute is absent
    #[error("Missing attribute: {name}")]
    MissingAttribute { name: String },

    /// Functionality that is deliberately unsupported
    #[error("Not implemented: {message}")]
    NotImplemented { message: String },

    /// An input of the wrong kind was supplied
    #[error("Parameter {param} must be {expected}, not {found}")]
    TypeMismatch {
        param: String,
        expected: String,
        found: String,
    },

    /// An argument has an unusable value
    #[error("Invalid value: {message}")]
    InvalidValue { message: String },

    /// A destagger request on a variable without a staggered dimension
    #[error(
        "No dimension available to destagger. This variable does not appear to be staggered."
    )]
    NotStaggered,

    /// A time string matched none of the accepted formats
    #[error("Unable to parse time string: {value:?}")]
    TimeParse { value: String },

    /// Neither `Times` nor a decoded `XTIME` is available
    #[error("Missing time source: {message}")]
    MissingTimeSource { message: String },

    /// Data not found errors
    #[error("Data not found: {message}")]
    DataNotFound { message: String },

    /// Array shape errors
    #[error("Shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// NetCDF file operation errors
    #[cfg(feature = "netcdf")]
    #[error("NetCDF error: {0}")]
    NetCdf(#[from] netcdf::Error),
}

/// Convenience type alias for Results with WrfError
pub type Result<T> = std::result::Result<T, WrfError>;

impl WrfError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        WrfError::InvalidValue {
            message: message.into(),
        }
    }

    pub(crate) fn not_found(message: impl Into<String>) -> Self {
        WrfError::DataNotFound {
            message: message.into(),
        }
    }
}
