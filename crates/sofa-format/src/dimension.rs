//! Dimension registry: append-only axis sizes of an open dataset.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::axis::Axis;
use crate::error::{FormatError, Result};

/// Sizes of the named axes of a dataset.
///
/// Creation is append-only: once an axis has a size it keeps it for the
/// lifetime of the dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dimensions {
    sizes: BTreeMap<Axis, usize>,
}

impl Dimensions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defines `axis` with `size`.
    ///
    /// Defining an axis again with the same size is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::InvalidDimensionSize`] for a zero size or a
    /// size that contradicts a pinned axis (`I` = 1, `C` = 3), and
    /// [`FormatError::DimensionExists`] when the axis already has another size.
    pub fn create(&mut self, axis: Axis, size: usize) -> Result<()> {
        if size == 0 {
            return Err(FormatError::InvalidDimensionSize {
                axis,
                size,
                reason: "size must be positive",
            });
        }
        if let Some(fixed) = axis.fixed_size() {
            if size != fixed {
                return Err(FormatError::InvalidDimensionSize {
                    axis,
                    size,
                    reason: "axis has a pinned size",
                });
            }
        }
        match self.sizes.get(&axis) {
            Some(&existing) if existing == size => {
                tracing::debug!(%axis, size, "Dimension already defined");
                Ok(())
            }
            Some(&existing) => Err(FormatError::DimensionExists {
                axis,
                existing,
                requested: size,
            }),
            None => {
                tracing::debug!(%axis, size, "Defining dimension");
                self.sizes.insert(axis, size);
                Ok(())
            }
        }
    }

    /// Size of `axis`, or `None` if it has not been defined.
    pub fn get(&self, axis: Axis) -> Option<usize> {
        self.sizes.get(&axis).copied()
    }

    pub fn contains(&self, axis: Axis) -> bool {
        self.sizes.contains_key(&axis)
    }

    /// Axes from `axes` that have not been defined yet.
    pub fn missing(&self, axes: &[Axis]) -> Vec<Axis> {
        axes.iter().copied().filter(|a| !self.contains(*a)).collect()
    }

    /// Iterates `(axis, size)` pairs in container order.
    pub fn iter(&self) -> impl Iterator<Item = (Axis, usize)> + '_ {
        self.sizes.iter().map(|(a, s)| (*a, *s))
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }
}
