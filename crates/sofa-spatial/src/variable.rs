//! Coordinate variables: `<Object><Descriptor>` arrays tagged with a
//! coordinate system and units.

use ndarray::{ArrayD, ArrayViewD};
use sofa_format::access::{self, Index};
use sofa_format::axis::with_measurement_alias;
use sofa_format::{Axis, Dataset, Selection, Variable};

use crate::coordinates::{convert, select_converted, AngleUnit, Representation, System};
use crate::error::{Result, SpatialError};
use crate::frame;
use crate::object::{Descriptor, ObjectKind};

/// Attribute holding the coordinate system of a variable.
pub const TYPE_ATTRIBUTE: &str = "Type";
/// Attribute holding the units of a variable.
pub const UNITS_ATTRIBUTE: &str = "Units";

/// Writes the `Type` and `Units` attributes of `variable`; `units` defaults
/// to the system's default units.
pub fn stamp_system(variable: &mut Variable, system: System, units: Option<&str>) {
    variable.set_attribute(TYPE_ATTRIBUTE, system.as_str());
    variable.set_attribute(UNITS_ATTRIBUTE, units.unwrap_or(system.default_units()));
}

/// Reads the representation recorded on `variable`, if it has a `Type`.
pub fn recorded_representation(variable: &Variable) -> Result<Option<Representation>> {
    let Some(ty) = variable.attribute(TYPE_ATTRIBUTE) else {
        return Ok(None);
    };
    let system: System = ty
        .parse()
        .map_err(|_| SpatialError::UnsupportedCoordinateConversion {
            variable: variable.name().to_string(),
            system: ty.to_string(),
        })?;
    let angle_unit = match (system, variable.attribute(UNITS_ATTRIBUTE)) {
        (System::Spherical, Some(units)) => AngleUnit::from_units(units)?,
        (System::Spherical, None) => AngleUnit::Degree,
        (System::Cartesian, _) => AngleUnit::Radian,
    };
    Ok(Some(Representation::new(system, angle_unit)))
}

/// Options for reading coordinate values.
///
/// Unset fields mean: whole variable, stored axis order, stored system,
/// stored (or degree) angle unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub selection: Selection,
    pub dim_order: Option<Vec<Axis>>,
    pub system: Option<System>,
    pub angle_unit: Option<AngleUnit>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_dim_order(mut self, dim_order: &[Axis]) -> Self {
        self.dim_order = Some(dim_order.to_vec());
        self
    }

    pub fn with_system(mut self, system: System) -> Self {
        self.system = Some(system);
        self
    }

    pub fn with_angle_unit(mut self, angle_unit: AngleUnit) -> Self {
        self.angle_unit = Some(angle_unit);
        self
    }
}

/// Handle on one coordinate variable of a spatial object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coordinates {
    kind: ObjectKind,
    descriptor: Descriptor,
}

impl Coordinates {
    pub fn new(kind: ObjectKind, descriptor: Descriptor) -> Self {
        Self { kind, descriptor }
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn descriptor(&self) -> Descriptor {
        self.descriptor
    }

    pub fn name(&self) -> String {
        self.descriptor.variable_name(self.kind)
    }

    pub fn exists(&self, dataset: &Dataset) -> bool {
        dataset.has_variable(&self.name())
    }

    /// Creates the variable with its standard axes, tagged Cartesian.
    pub fn initialize(&self, dataset: &mut Dataset, varies: bool) -> Result<()> {
        let dims = self.kind.standard_dims(varies);
        let variable = dataset.create_variable(&self.name(), &dims)?;
        stamp_system(variable, System::Cartesian, None);
        Ok(())
    }

    /// System and angle unit of the stored values.
    ///
    /// An `Up` variable without its own `Type` shares the one of `View`;
    /// a variable with neither is Cartesian.
    pub fn representation(&self, dataset: &Dataset) -> Result<Representation> {
        let variable = dataset.variable(&self.name())?;
        if let Some(rep) = recorded_representation(variable)? {
            return Ok(rep);
        }
        if self.descriptor == Descriptor::Up {
            let view = Descriptor::View.variable_name(self.kind);
            if let Ok(view) = dataset.variable(&view) {
                if let Some(rep) = recorded_representation(view)? {
                    return Ok(rep);
                }
            }
        }
        Ok(Representation::cartesian())
    }

    pub fn system(&self, dataset: &Dataset) -> Result<System> {
        Ok(self.representation(dataset)?.system)
    }

    /// The `Units` attribute, following the same fallback as
    /// [`Coordinates::representation`].
    pub fn units(&self, dataset: &Dataset) -> Result<String> {
        let variable = dataset.variable(&self.name())?;
        if let Some(units) = variable.attribute(UNITS_ATTRIBUTE) {
            return Ok(units.to_string());
        }
        if self.descriptor == Descriptor::Up {
            let view = Descriptor::View.variable_name(self.kind);
            if let Some(units) = dataset
                .variable(&view)
                .ok()
                .and_then(|v| v.attribute(UNITS_ATTRIBUTE))
            {
                return Ok(units.to_string());
            }
        }
        Ok(self.system(dataset)?.default_units().to_string())
    }

    /// Re-tags the variable. Stored values are not converted.
    pub fn set_system(
        &self,
        dataset: &mut Dataset,
        system: System,
        units: Option<&str>,
    ) -> Result<()> {
        let variable = dataset.variable_mut(&self.name())?;
        stamp_system(variable, system, units);
        Ok(())
    }

    /// Reads values in the variable's own frame.
    pub fn get_values(&self, dataset: &Dataset, query: &Query) -> Result<ArrayD<f64>> {
        let name = self.name();
        let variable = dataset.variable(&name)?;
        let own = self.representation(dataset)?;
        let target = Representation::new(
            query.system.unwrap_or(own.system),
            query.angle_unit.unwrap_or(match own.system {
                System::Spherical => own.angle_unit,
                System::Cartesian => AngleUnit::Degree,
            }),
        );
        if !own.differs(&target) {
            return Ok(variable.get(
                dataset.dimensions(),
                &query.selection,
                query.dim_order.as_deref(),
            )?);
        }
        select_converted(
            &name,
            variable.data(),
            variable.dims(),
            dataset.dimensions(),
            &query.selection,
            query.dim_order.as_deref(),
            own,
            target,
        )
    }

    /// Writes values given in `system`/`angle_unit` (defaulting to the
    /// stored representation), converting them first.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::PartialTriple`] if a conversion is needed but
    /// `selection` narrows the `C` axis.
    #[allow(clippy::too_many_arguments)]
    pub fn set_values(
        &self,
        dataset: &mut Dataset,
        values: ArrayViewD<'_, f64>,
        selection: &Selection,
        dim_order: Option<&[Axis]>,
        repeat_along: &[Axis],
        system: Option<System>,
        angle_unit: Option<AngleUnit>,
    ) -> Result<()> {
        let name = self.name();
        let own = self.representation(dataset)?;
        let given_system = system.unwrap_or(own.system);
        let given = Representation::new(
            given_system,
            angle_unit.unwrap_or(if given_system == own.system {
                own.angle_unit
            } else {
                AngleUnit::Degree
            }),
        );
        if !given.differs(&own) {
            dataset.set_values(&name, values, selection, dim_order, repeat_along)?;
            return Ok(());
        }

        match selection.get(Axis::C) {
            None | Some(Index::All) => {}
            Some(Index::At(_)) => return Err(SpatialError::PartialTriple { len: 1 }),
            Some(Index::Range(r)) if r.len() != 3 => {
                return Err(SpatialError::PartialTriple { len: r.len() })
            }
            Some(Index::Range(_)) => {}
        }

        let value_dims = match dim_order {
            Some(order) => order.to_vec(),
            None => {
                let variable = dataset.variable(&name)?;
                let repeat = with_measurement_alias(repeat_along);
                with_measurement_alias(&access::default_order(variable.dims(), selection))
                    .into_iter()
                    .filter(|a| !repeat.contains(a))
                    .collect()
            }
        };
        let converted = convert(
            &values.to_owned(),
            &value_dims,
            given.system,
            own.system,
            given.angle_unit,
            own.angle_unit,
        )?;
        dataset.set_values(&name, converted.view(), selection, dim_order, repeat_along)?;
        Ok(())
    }

    /// Values in the global frame. See [`frame::relative_values`].
    pub fn global_values(&self, dataset: &Dataset, query: &Query) -> Result<ArrayD<f64>> {
        frame::relative_values(dataset, self, None, query)
    }

    /// Values in the frame of `reference`. See [`frame::relative_values`].
    pub fn relative_values(
        &self,
        dataset: &Dataset,
        reference: Option<ObjectKind>,
        query: &Query,
    ) -> Result<ArrayD<f64>> {
        frame::relative_values(dataset, self, reference, query)
    }
}
