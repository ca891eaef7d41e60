//! In-memory SOFA dataset: dimensions, variables and global attributes.

use std::collections::BTreeMap;

use ndarray::{ArrayD, ArrayViewD};

use crate::access::Selection;
use crate::axis::Axis;
use crate::dimension::Dimensions;
use crate::error::{FormatError, Result};
use crate::metadata::Metadata;
use crate::variable::Variable;

/// A complete dataset as held between open and save.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    dimensions: Dimensions,
    variables: BTreeMap<String, Variable>,
    metadata: Metadata,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dimensions(&self) -> &Dimensions {
        &self.dimensions
    }

    /// Defines an axis. See [`Dimensions::create`].
    pub fn create_dimension(&mut self, axis: Axis, size: usize) -> Result<()> {
        self.dimensions.create(axis, size)
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    /// Creates a zero-filled variable over `dims`.
    ///
    /// # Errors
    ///
    /// [`FormatError::VariableExists`] if the name is taken,
    /// [`FormatError::UndefinedDimensions`] if an axis is not defined.
    pub fn create_variable(&mut self, name: &str, dims: &[Axis]) -> Result<&mut Variable> {
        if self.variables.contains_key(name) {
            return Err(FormatError::VariableExists(name.to_string()));
        }
        let variable = Variable::zeros(name, dims, &self.dimensions)?;
        tracing::debug!(name, dims = ?dims, shape = ?variable.shape(), "Created variable");
        Ok(self.variables.entry(name.to_string()).or_insert(variable))
    }

    /// Adds a fully formed variable, e.g. one parsed from a container.
    pub fn insert_variable(&mut self, variable: Variable) -> Result<()> {
        if self.variables.contains_key(variable.name()) {
            return Err(FormatError::VariableExists(variable.name().to_string()));
        }
        let missing = self.dimensions.missing(variable.dims());
        if !missing.is_empty() {
            return Err(FormatError::UndefinedDimensions {
                variable: variable.name().to_string(),
                missing,
            });
        }
        for (axis, len) in variable.dims().iter().zip(variable.shape()) {
            if self.dimensions.get(*axis) != Some(*len) {
                return Err(FormatError::mismatch(
                    variable.name(),
                    format!("axis {axis} has length {len}, dimension is {:?}", self.dimensions.get(*axis)),
                ));
            }
        }
        self.variables.insert(variable.name().to_string(), variable);
        Ok(())
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn variable(&self, name: &str) -> Result<&Variable> {
        self.variables
            .get(name)
            .ok_or_else(|| FormatError::VariableNotInitialized(name.to_string()))
    }

    pub fn variable_mut(&mut self, name: &str) -> Result<&mut Variable> {
        self.variables
            .get_mut(name)
            .ok_or_else(|| FormatError::VariableNotInitialized(name.to_string()))
    }

    pub fn variables(&self) -> impl Iterator<Item = &Variable> + '_ {
        self.variables.values()
    }

    pub fn variable_names(&self) -> Vec<&str> {
        self.variables.keys().map(String::as_str).collect()
    }

    /// Reads a region of variable `name`.
    pub fn get_values(
        &self,
        name: &str,
        selection: &Selection,
        dim_order: Option<&[Axis]>,
    ) -> Result<ArrayD<f64>> {
        self.variable(name)?
            .get(&self.dimensions, selection, dim_order)
    }

    /// Writes a region of variable `name`.
    pub fn set_values(
        &mut self,
        name: &str,
        values: ArrayViewD<'_, f64>,
        selection: &Selection,
        dim_order: Option<&[Axis]>,
        repeat_along: &[Axis],
    ) -> Result<()> {
        self.variable_mut(name)?
            .set(values, selection, dim_order, repeat_along)
    }
}
