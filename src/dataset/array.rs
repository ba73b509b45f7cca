//! A single labeled array together with its coordinates.

use std::collections::BTreeMap;

use super::{Dataset, Variable};
use crate::error::{Result, WrfError};

/// One variable plus the coordinate variables that describe it
#[derive(Debug, Clone, PartialEq)]
pub struct DataArray {
    /// Optional name of the array
    pub name: Option<String>,
    variable: Variable,
    coords: BTreeMap<String, Variable>,
}

impl DataArray {
    /// Create a data array; every coordinate must only use the array's dimensions
    pub fn new(variable: Variable, coords: BTreeMap<String, Variable>) -> Result<Self> {
        for (name, coord) in &coords {
            for dim in coord.dims() {
                match (variable.size_of(dim), coord.size_of(dim)) {
                    (Some(a), Some(c)) if a == c => {}
                    (None, _) => {
                        return Err(WrfError::invalid(format!(
                            "Coordinate {} has dimension {} not present on the array {:?}",
                            name,
                            dim,
                            variable.dims()
                        )));
                    }
                    (Some(a), c) => {
                        return Err(WrfError::invalid(format!(
                            "Coordinate {} has size {:?} along {}, the array has {}",
                            name, c, dim, a
                        )));
                    }
                }
            }
        }
        Ok(Self {
            name: None,
            variable,
            coords,
        })
    }

    /// Extract a named variable with every dataset coordinate that fits it
    pub fn from_dataset(ds: &Dataset, name: &str) -> Result<Self> {
        let variable = ds.variable(name)?.clone();
        let coords = ds
            .coords()
            .filter(|(coord_name, _)| coord_name.as_str() != name)
            .filter(|(_, coord)| coord.dims().iter().all(|d| variable.has_dim(d)))
            .map(|(coord_name, coord)| (coord_name.clone(), coord.clone()))
            .collect();
        let mut array = Self::new(variable, coords)?;
        array.name = Some(name.to_string());
        Ok(array)
    }

    pub fn variable(&self) -> &Variable {
        &self.variable
    }

    pub fn dims(&self) -> &[String] {
        self.variable.dims()
    }

    pub fn coords(&self) -> &BTreeMap<String, Variable> {
        &self.coords
    }

    pub fn coord(&self, name: &str) -> Option<&Variable> {
        self.coords.get(name)
    }
}
