//! Minimal labeled-array data model.
//!
//! This module provides the dataset shape the postprocessing stages operate
//! on: named variables with named dimensions, a coordinate marker set and
//! global attributes. Dimension sizes are derived from the variables.

pub mod array;
pub mod variable;

pub use array::DataArray;
pub use variable::{AttributeValue, Attributes, Variable, VariableData};

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Result, WrfError};

/// An ordered collection of named variables plus global attributes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    variables: BTreeMap<String, Variable>,
    coord_names: BTreeSet<String>,
    /// Global attributes
    pub attrs: Attributes,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attrs(attrs: Attributes) -> Self {
        Self {
            attrs,
            ..Self::default()
        }
    }

    /// Dimension sizes over all variables
    pub fn sizes(&self) -> BTreeMap<String, usize> {
        let mut sizes = BTreeMap::new();
        for var in self.variables.values() {
            sizes.extend(var.sizes());
        }
        sizes
    }

    pub fn dim_size(&self, dim: &str) -> Option<usize> {
        self.variables.values().find_map(|v| v.size_of(dim))
    }

    pub fn has_dim(&self, dim: &str) -> bool {
        self.dim_size(dim).is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Variable> {
        self.variables.get_mut(name)
    }

    /// Get a variable with error handling
    pub fn variable(&self, name: &str) -> Result<&Variable> {
        self.variables
            .get(name)
            .ok_or_else(|| WrfError::not_found(format!("Variable not found: {}", name)))
    }

    /// Insert or replace a variable, keeping its coordinate status.
    ///
    /// Fails if a dimension of `var` conflicts in size with the same
    /// dimension on another variable.
    pub fn insert(&mut self, name: impl Into<String>, var: Variable) -> Result<()> {
        let name = name.into();
        for (dim, size) in var.sizes() {
            let existing = self
                .variables
                .iter()
                .filter(|(other, _)| **other != name)
                .find_map(|(_, v)| v.size_of(&dim));
            if let Some(existing) = existing {
                if existing != size {
                    return Err(WrfError::invalid(format!(
                        "Variable {} has size {} along {}, but the dataset has {}",
                        name, size, dim, existing
                    )));
                }
            }
        }
        self.variables.insert(name, var);
        Ok(())
    }

    /// Insert a variable and mark it as a coordinate
    pub fn insert_coord(&mut self, name: impl Into<String>, var: Variable) -> Result<()> {
        let name = name.into();
        self.insert(name.clone(), var)?;
        self.coord_names.insert(name);
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Option<Variable> {
        self.coord_names.remove(name);
        self.variables.remove(name)
    }

    /// Promote existing variables to coordinates; unknown names are ignored
    pub fn set_coords<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) {
        for name in names {
            if self.variables.contains_key(name) {
                self.coord_names.insert(name.to_string());
            }
        }
    }

    pub fn is_coord(&self, name: &str) -> bool {
        self.coord_names.contains(name)
    }

    pub fn variables(&self) -> impl Iterator<Item = (&String, &Variable)> {
        self.variables.iter()
    }

    pub fn variable_names(&self) -> Vec<String> {
        self.variables.keys().cloned().collect()
    }

    pub fn coords(&self) -> impl Iterator<Item = (&String, &Variable)> {
        self.variables
            .iter()
            .filter(|(name, _)| self.coord_names.contains(*name))
    }

    pub fn coord_names(&self) -> Vec<String> {
        self.coord_names.iter().cloned().collect()
    }

    pub fn data_vars(&self) -> impl Iterator<Item = (&String, &Variable)> {
        self.variables
            .iter()
            .filter(|(name, _)| !self.coord_names.contains(*name))
    }

    pub fn data_var_names(&self) -> Vec<String> {
        self.data_vars().map(|(name, _)| name.clone()).collect()
    }

    /// Rename dimensions and variables in one step.
    ///
    /// Any variable or dimension named by a key of `names` takes the mapped
    /// name, so a dimension coordinate follows its dimension.
    pub fn rename(&self, names: &BTreeMap<String, String>) -> Result<Dataset> {
        let mut out = Dataset::with_attrs(self.attrs.clone());
        for (name, var) in &self.variables {
            let new_name = names.get(name).unwrap_or(name).clone();
            if out.variables.contains_key(&new_name) {
                return Err(WrfError::invalid(format!(
                    "Renaming {} to {} collides with an existing variable",
                    name, new_name
                )));
            }
            let mut renamed = var.clone();
            for dim in var.dims() {
                if let Some(new_dim) = names.get(dim) {
                    renamed = renamed.rename_dim(dim, new_dim);
                }
            }
            out.variables.insert(new_name.clone(), renamed);
            if self.coord_names.contains(name) {
                out.coord_names.insert(new_name);
            }
        }
        Ok(out)
    }

    pub fn global_attr(&self, name: &str) -> Option<&AttributeValue> {
        self.attrs.get(name)
    }

    pub fn global_f64(&self, name: &str) -> Option<f64> {
        self.attrs.get(name).and_then(AttributeValue::as_f64)
    }

    /// A numeric global attribute that must be present
    pub fn require_global_f64(&self, name: &str) -> Result<f64> {
        self.global_f64(name)
            .ok_or_else(|| WrfError::MissingAttribute {
                name: name.to_string(),
            })
    }
}
