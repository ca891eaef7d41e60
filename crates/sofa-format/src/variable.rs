//! Variables: named arrays laid out over dataset axes.

use std::collections::BTreeMap;

use ndarray::{ArrayD, ArrayViewD, IxDyn};

use crate::access::{self, Selection};
use crate::axis::Axis;
use crate::dimension::Dimensions;
use crate::error::{FormatError, Result};

/// A numeric variable with its axis layout and string attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    name: String,
    dims: Vec<Axis>,
    data: ArrayD<f64>,
    attributes: BTreeMap<String, String>,
}

impl Variable {
    /// Creates a zero-filled variable over `dims`.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::UndefinedDimensions`] if any axis in `dims`
    /// has no size in `dimensions`.
    pub fn zeros(name: &str, dims: &[Axis], dimensions: &Dimensions) -> Result<Self> {
        let missing = dimensions.missing(dims);
        if !missing.is_empty() {
            return Err(FormatError::UndefinedDimensions {
                variable: name.to_string(),
                missing,
            });
        }
        let shape: Vec<usize> = dims.iter().filter_map(|a| dimensions.get(*a)).collect();
        Ok(Self {
            name: name.to_string(),
            dims: dims.to_vec(),
            data: ArrayD::zeros(IxDyn(&shape)),
            attributes: BTreeMap::new(),
        })
    }

    /// Assembles a variable from stored parts, checking that `data` has one
    /// axis per entry of `dims`.
    pub fn from_parts(
        name: &str,
        dims: Vec<Axis>,
        data: ArrayD<f64>,
        attributes: BTreeMap<String, String>,
    ) -> Result<Self> {
        if data.ndim() != dims.len() {
            return Err(FormatError::MalformedVariable {
                name: name.to_string(),
                details: format!("{} axes declared, data has {}", dims.len(), data.ndim()),
            });
        }
        Ok(Self {
            name: name.to_string(),
            dims,
            data,
            attributes,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dims(&self) -> &[Axis] {
        &self.dims
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn data(&self) -> &ArrayD<f64> {
        &self.data
    }

    /// Whether the variable varies over measurements (has `M`, not `I`).
    pub fn varies(&self) -> bool {
        self.dims.contains(&Axis::M)
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn set_attribute(&mut self, key: &str, value: impl Into<String>) {
        self.attributes.insert(key.to_string(), value.into());
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    /// Reads a region. See [`access::read`].
    pub fn get(
        &self,
        dimensions: &Dimensions,
        selection: &Selection,
        dim_order: Option<&[Axis]>,
    ) -> Result<ArrayD<f64>> {
        access::read(&self.name, &self.data, &self.dims, dimensions, selection, dim_order)
    }

    /// Writes a region. See [`access::write`].
    pub fn set(
        &mut self,
        values: ArrayViewD<'_, f64>,
        selection: &Selection,
        dim_order: Option<&[Axis]>,
        repeat_along: &[Axis],
    ) -> Result<()> {
        access::write(
            &self.name,
            &mut self.data,
            &self.dims,
            values,
            selection,
            dim_order,
            repeat_along,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    fn dims() -> Dimensions {
        let mut d = Dimensions::new();
        d.create(Axis::I, 1).unwrap();
        d.create(Axis::C, 3).unwrap();
        d.create(Axis::M, 2).unwrap();
        d
    }

    #[test]
    fn test_zeros_shape() {
        let v = Variable::zeros("ListenerPosition", &[Axis::I, Axis::C], &dims()).unwrap();
        assert_eq!(v.shape(), &[1, 3]);
        assert!(!v.varies());
        assert!(v.data().iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_zeros_undefined_dimension() {
        let err = Variable::zeros("Data.IR", &[Axis::M, Axis::R, Axis::N], &dims()).unwrap_err();
        match err {
            FormatError::UndefinedDimensions { variable, missing } => {
                assert_eq!(variable, "Data.IR");
                assert_eq!(missing, vec![Axis::R, Axis::N]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_set_then_get() {
        let d = dims();
        let mut v = Variable::zeros("SourcePosition", &[Axis::M, Axis::C], &d).unwrap();
        let pos = arr1(&[1.0, 2.0, 3.0]).into_dyn();
        v.set(pos.view(), &Selection::new().at(Axis::M, 1), None, &[])
            .unwrap();
        let out = v.get(&d, &Selection::new().at(Axis::M, 1), None).unwrap();
        assert_eq!(out, pos);
        let first = v.get(&d, &Selection::new().at(Axis::M, 0), None).unwrap();
        assert_eq!(first, arr1(&[0.0, 0.0, 0.0]).into_dyn());
    }

    #[test]
    fn test_attributes() {
        let mut v = Variable::zeros("SourcePosition", &[Axis::I, Axis::C], &dims()).unwrap();
        v.set_attribute("Type", "spherical");
        v.set_attribute("Units", "degree, degree, meter");
        assert_eq!(v.attribute("Type"), Some("spherical"));
        assert_eq!(v.attribute("Missing"), None);
        assert_eq!(v.attributes().len(), 2);
    }

    #[test]
    fn test_from_parts_rank_check() {
        let data = ArrayD::<f64>::zeros(IxDyn(&[1, 3]));
        assert!(Variable::from_parts("x", vec![Axis::I], data, BTreeMap::new()).is_err());
    }
}
