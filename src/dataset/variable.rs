//! Named-dimension variables.
//!
//! A [`Variable`] is a dense array with one dimension name per axis, an
//! attribute map and an opaque encoding map. Arithmetic between variables
//! broadcasts by dimension name rather than by axis position.

use chrono::{Duration, NaiveDateTime};
use ndarray::{Array1, ArrayD, Axis, IxDyn, Slice, Zip};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Result, WrfError};
use crate::grid::Projection;

/// Possible attribute values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// String attribute
    Text(String),
    /// Numeric attribute (stored as f64 for simplicity)
    Number(f64),
    /// Array of numbers
    NumberArray(Vec<f64>),
}

impl AttributeValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric value, taking the first element of single-valued arrays
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Number(v) => Some(*v),
            AttributeValue::NumberArray(v) if v.len() == 1 => Some(v[0]),
            _ => None,
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Text(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Number(value)
    }
}

impl From<Vec<f64>> for AttributeValue {
    fn from(value: Vec<f64>) -> Self {
        AttributeValue::NumberArray(value)
    }
}

/// String-keyed attribute map with deterministic iteration order
pub type Attributes = BTreeMap<String, AttributeValue>;

/// The values held by a variable
#[derive(Debug, Clone, PartialEq)]
pub enum VariableData {
    /// Numeric data
    Float(ArrayD<f64>),
    /// Fixed-width byte strings, one per element
    Bytes(ArrayD<Vec<u8>>),
    /// Calendar timestamps
    DateTime(ArrayD<NaiveDateTime>),
    /// Elapsed durations
    TimeDelta(ArrayD<Duration>),
    /// A scalar holding a coordinate reference system
    Crs(Projection),
}

macro_rules! map_array {
    ($data:expr, $arr:ident => $body:expr) => {
        match $data {
            VariableData::Float($arr) => VariableData::Float($body),
            VariableData::Bytes($arr) => VariableData::Bytes($body),
            VariableData::DateTime($arr) => VariableData::DateTime($body),
            VariableData::TimeDelta($arr) => VariableData::TimeDelta($body),
            VariableData::Crs(crs) => VariableData::Crs(crs.clone()),
        }
    };
}

impl VariableData {
    pub fn shape(&self) -> Vec<usize> {
        match self {
            VariableData::Float(a) => a.shape().to_vec(),
            VariableData::Bytes(a) => a.shape().to_vec(),
            VariableData::DateTime(a) => a.shape().to_vec(),
            VariableData::TimeDelta(a) => a.shape().to_vec(),
            VariableData::Crs(_) => Vec::new(),
        }
    }

    /// Short name of the element type, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            VariableData::Float(_) => "float64",
            VariableData::Bytes(_) => "bytes",
            VariableData::DateTime(_) => "datetime",
            VariableData::TimeDelta(_) => "timedelta",
            VariableData::Crs(_) => "crs",
        }
    }

    fn slice_axis(&self, axis: usize, start: usize, end: usize) -> VariableData {
        let slice = Slice::from(start..end);
        map_array!(self, a => a.slice_axis(Axis(axis), slice).to_owned())
    }

    fn index_axis(&self, axis: usize, index: usize) -> VariableData {
        map_array!(self, a => a.index_axis(Axis(axis), index).to_owned())
    }
}

/// A dense array with named dimensions, attributes and encoding
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    dims: Vec<String>,
    data: VariableData,
    /// Variable attributes
    pub attrs: Attributes,
    /// Encoding hints, passed through untouched
    pub encoding: Attributes,
}

impl Variable {
    /// Create a variable, checking that one dimension name is given per axis
    pub fn new<S: Into<String>>(dims: Vec<S>, data: VariableData) -> Result<Self> {
        let dims: Vec<String> = dims.into_iter().map(Into::into).collect();
        let shape = data.shape();
        if dims.len() != shape.len() {
            return Err(WrfError::invalid(format!(
                "{} dimension names given for {}-dimensional data",
                dims.len(),
                shape.len()
            )));
        }
        for (i, dim) in dims.iter().enumerate() {
            if dims[..i].contains(dim) {
                return Err(WrfError::invalid(format!("Duplicate dimension name: {}", dim)));
            }
        }
        Ok(Self {
            dims,
            data,
            attrs: Attributes::new(),
            encoding: Attributes::new(),
        })
    }

    /// Create a numeric variable
    pub fn from_f64<S: Into<String>>(dims: Vec<S>, array: ArrayD<f64>) -> Result<Self> {
        Self::new(dims, VariableData::Float(array))
    }

    /// Create a 1-D numeric variable from a vector
    pub fn from_vec(dim: &str, values: Vec<f64>) -> Self {
        Self {
            dims: vec![dim.to_string()],
            data: VariableData::Float(Array1::from(values).into_dyn()),
            attrs: Attributes::new(),
            encoding: Attributes::new(),
        }
    }

    /// A scalar variable carrying a projection definition
    pub fn scalar_crs(projection: Projection) -> Self {
        Self {
            dims: Vec::new(),
            data: VariableData::Crs(projection),
            attrs: Attributes::new(),
            encoding: Attributes::new(),
        }
    }

    pub fn with_attrs(mut self, attrs: Attributes) -> Self {
        self.attrs = attrs;
        self
    }

    pub fn with_encoding(mut self, encoding: Attributes) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn dims(&self) -> &[String] {
        &self.dims
    }

    pub fn data(&self) -> &VariableData {
        &self.data
    }

    pub fn shape(&self) -> Vec<usize> {
        self.data.shape()
    }

    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    pub fn has_dim(&self, dim: &str) -> bool {
        self.dims.iter().any(|d| d == dim)
    }

    pub fn axis_of(&self, dim: &str) -> Option<usize> {
        self.dims.iter().position(|d| d == dim)
    }

    /// Size of the named dimension
    pub fn size_of(&self, dim: &str) -> Option<usize> {
        self.axis_of(dim).map(|axis| self.shape()[axis])
    }

    /// Dimension name to size mapping
    pub fn sizes(&self) -> BTreeMap<String, usize> {
        self.dims.iter().cloned().zip(self.shape()).collect()
    }

    pub fn as_f64(&self) -> Option<&ArrayD<f64>> {
        match &self.data {
            VariableData::Float(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<&ArrayD<NaiveDateTime>> {
        match &self.data {
            VariableData::DateTime(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_timedelta(&self) -> Option<&ArrayD<Duration>> {
        match &self.data {
            VariableData::TimeDelta(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_crs(&self) -> Option<&Projection> {
        match &self.data {
            VariableData::Crs(p) => Some(p),
            _ => None,
        }
    }

    pub fn is_datetime(&self) -> bool {
        matches!(self.data, VariableData::DateTime(_))
    }

    /// The `units` attribute, if it is text
    pub fn units(&self) -> Option<&str> {
        self.attrs.get("units").and_then(AttributeValue::as_str)
    }

    /// Replace the data, keeping dimension names, attributes and encoding
    pub fn with_data(&self, data: VariableData) -> Result<Variable> {
        let mut out = Variable::new(self.dims.clone(), data)?;
        out.attrs = self.attrs.clone();
        out.encoding = self.encoding.clone();
        Ok(out)
    }

    /// Take the half-open range `[start, end)` along a dimension
    pub fn slice_along(&self, dim: &str, start: usize, end: usize) -> Result<Variable> {
        let axis = self.require_axis(dim)?;
        let size = self.shape()[axis];
        if start > end || end > size {
            return Err(WrfError::invalid(format!(
                "Slice {}..{} out of bounds for dimension {} of size {}",
                start, end, dim, size
            )));
        }
        Ok(Variable {
            dims: self.dims.clone(),
            data: self.data.slice_axis(axis, start, end),
            attrs: self.attrs.clone(),
            encoding: self.encoding.clone(),
        })
    }

    /// Select one index along a dimension, dropping that dimension
    pub fn index_along(&self, dim: &str, index: usize) -> Result<Variable> {
        let axis = self.require_axis(dim)?;
        let size = self.shape()[axis];
        if index >= size {
            return Err(WrfError::invalid(format!(
                "Index {} out of bounds for dimension {} of size {}",
                index, dim, size
            )));
        }
        let mut dims = self.dims.clone();
        dims.remove(axis);
        Ok(Variable {
            dims,
            data: self.data.index_axis(axis, index),
            attrs: self.attrs.clone(),
            encoding: self.encoding.clone(),
        })
    }

    /// Rename one dimension; a no-op if the dimension is absent
    pub fn rename_dim(mut self, old: &str, new: &str) -> Self {
        for dim in self.dims.iter_mut() {
            if dim == old {
                *dim = new.to_string();
            }
        }
        self
    }

    pub fn add(&self, other: &Variable) -> Result<Variable> {
        self.zip_with(other, |a, b| a + b)
    }

    pub fn sub(&self, other: &Variable) -> Result<Variable> {
        self.zip_with(other, |a, b| a - b)
    }

    pub fn mul(&self, other: &Variable) -> Result<Variable> {
        self.zip_with(other, |a, b| a * b)
    }

    /// Multiply every element by `factor`, dropping attributes
    pub fn scale(&self, factor: f64) -> Result<Variable> {
        self.map_f64(|v| v * factor)
    }

    /// Apply `f` to every element, dropping attributes
    pub fn map_f64(&self, f: impl Fn(f64) -> f64) -> Result<Variable> {
        let array = self.require_f64()?;
        Variable::from_f64(self.dims.clone(), array.mapv(f))
    }

    /// Elementwise binary operation, broadcasting by dimension name.
    ///
    /// The result carries `self`'s dimensions first, followed by any
    /// dimensions only `other` has. Attributes are not propagated.
    pub fn zip_with(&self, other: &Variable, f: impl Fn(f64, f64) -> f64) -> Result<Variable> {
        let lhs = self.require_f64()?;
        let rhs = other.require_f64()?;

        let mut dims = self.dims.clone();
        let mut shape = lhs.shape().to_vec();
        for (dim, &size) in other.dims.iter().zip(rhs.shape()) {
            match self.axis_of(dim) {
                Some(axis) if shape[axis] != size => {
                    return Err(WrfError::invalid(format!(
                        "Conflicting sizes for dimension {}: {} and {}",
                        dim, shape[axis], size
                    )));
                }
                Some(_) => {}
                None => {
                    dims.push(dim.clone());
                    shape.push(size);
                }
            }
        }

        let lhs = align(lhs, &self.dims, &dims, &shape)?;
        let rhs = align(rhs, &other.dims, &dims, &shape)?;
        let data = Zip::from(&lhs).and(&rhs).map_collect(|&a, &b| f(a, b));
        Variable::from_f64(dims, data)
    }

    fn require_axis(&self, dim: &str) -> Result<usize> {
        self.axis_of(dim).ok_or_else(|| {
            WrfError::invalid(format!("{} not in {:?}", dim, self.dims))
        })
    }

    fn require_f64(&self) -> Result<&ArrayD<f64>> {
        self.as_f64().ok_or_else(|| {
            WrfError::invalid(format!(
                "Arithmetic requires numeric data, found {}",
                self.data.kind()
            ))
        })
    }
}

/// Permute and broadcast `array` (labelled by `from`) onto the target layout.
fn align(
    array: &ArrayD<f64>,
    from: &[String],
    to: &[String],
    shape: &[usize],
) -> Result<ArrayD<f64>> {
    let mut order: Vec<usize> = (0..from.len()).collect();
    order.sort_by_key(|&axis| to.iter().position(|d| d == &from[axis]));

    let mut view = array.view().permuted_axes(order);
    for (i, dim) in to.iter().enumerate() {
        if !from.contains(dim) {
            view = view.insert_axis(Axis(i));
        }
    }

    view.broadcast(IxDyn(shape))
        .map(|v| v.to_owned())
        .ok_or_else(|| {
            WrfError::invalid(format!("Cannot broadcast {:?} onto {:?}", from, to))
        })
}
