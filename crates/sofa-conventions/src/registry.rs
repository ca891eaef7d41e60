//! Lookup of conventions by name.

use std::collections::BTreeMap;

use sofa_format::{keys, Metadata};

use crate::catalog;
use crate::convention::Convention;
use crate::error::{ConventionError, Result};

/// Convention used when neither the dataset's convention name nor its data
/// type selects one.
pub const FALLBACK_CONVENTION: &str = "GeneralFIR";

/// Conventions keyed by name.
///
/// Built once and passed to each session; a session keeps its own copy of
/// the resolved [`Convention`].
#[derive(Debug, Clone, Default)]
pub struct ConventionRegistry {
    conventions: BTreeMap<String, Convention>,
}

impl ConventionRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in convention.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        for convention in catalog::builtin() {
            registry.register(convention);
        }
        registry
    }

    /// Adds `convention`, returning the one it replaces.
    pub fn register(&mut self, convention: Convention) -> Option<Convention> {
        self.conventions
            .insert(convention.name().to_string(), convention)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.conventions.contains_key(name)
    }

    /// # Errors
    ///
    /// Returns [`ConventionError::UnknownConvention`] for an unregistered name.
    pub fn get(&self, name: &str) -> Result<&Convention> {
        self.conventions
            .get(name)
            .ok_or_else(|| ConventionError::UnknownConvention(name.to_string()))
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.conventions.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Convention> + '_ {
        self.conventions.values()
    }

    pub fn len(&self) -> usize {
        self.conventions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conventions.is_empty()
    }

    /// Picks the convention of an existing dataset.
    ///
    /// `SOFAConventions` wins when registered; otherwise
    /// `General<DataType>`, then [`FALLBACK_CONVENTION`].
    pub fn resolve(&self, metadata: &Metadata) -> Result<&Convention> {
        if let Some(name) = metadata.get(keys::SOFA_CONVENTIONS) {
            if let Some(convention) = self.conventions.get(name) {
                return Ok(convention);
            }
            tracing::warn!(convention = name, "Unknown convention, falling back on data type");
        }
        if let Some(data_type) = metadata.get(keys::DATA_TYPE) {
            let general = format!("General{}", data_type.trim());
            if let Some(convention) = self.conventions.get(&general) {
                return Ok(convention);
            }
            tracing::warn!(data_type, "No general convention for data type");
        }
        self.get(FALLBACK_CONVENTION)
    }
}
