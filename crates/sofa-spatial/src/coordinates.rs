//! Coordinate systems, angle units and whole-array conversion.
//!
//! Spherical triples are `(azimuth, elevation, radius)`:
//! - **Azimuth**: counter-clockwise from +x in the horizontal plane, (−π, π]
//! - **Elevation**: 0 on the horizontal plane, +π/2 straight up
//! - **Radius**: distance from the origin, ≥ 0
//!
//! Conversions operate on arrays of any rank as long as the caller names the
//! axes; the `C` axis holds the triple.

use std::fmt;
use std::str::FromStr;

use ndarray::{ArrayD, Axis as NdAxis, Slice};
use serde::{Deserialize, Serialize};
use sofa_format::access::{self, Selection};
use sofa_format::{Axis, Dimensions};

use crate::error::{Result, SpatialError};

/// Coordinate representation of a variable, stored in its `Type` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum System {
    Cartesian,
    Spherical,
}

impl System {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cartesian => "cartesian",
            Self::Spherical => "spherical",
        }
    }

    /// The `Units` attribute written when none is given.
    pub fn default_units(&self) -> &'static str {
        match self {
            Self::Cartesian => "meter",
            Self::Spherical => "degree, degree, meter",
        }
    }
}

impl fmt::Display for System {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for System {
    type Err = SpatialError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cartesian" => Ok(Self::Cartesian),
            "spherical" => Ok(Self::Spherical),
            _ => Err(SpatialError::UnknownSystem(s.to_string())),
        }
    }
}

/// Unit of the two angular components of a spherical triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AngleUnit {
    Degree,
    Radian,
}

impl AngleUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Degree => "degree",
            Self::Radian => "radian",
        }
    }

    /// Parses the angle unit from a `Units` attribute such as
    /// `"degree, degree, meter"`; only the first token is considered.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::UnsupportedUnit`] if the first token is not a
    /// known degree or radian spelling.
    pub fn from_units(units: &str) -> Result<Self> {
        let token = first_unit(units).to_lowercase();
        match token.as_str() {
            "degree" | "degrees" | "deg" | "°" => Ok(Self::Degree),
            "radian" | "radians" | "rad" => Ok(Self::Radian),
            _ => Err(SpatialError::UnsupportedUnit(units.to_string())),
        }
    }

    /// Multiplier turning a value in `self` into a value in `target`.
    pub fn factor_to(&self, target: AngleUnit) -> f64 {
        match (self, target) {
            (Self::Degree, Self::Radian) => std::f64::consts::PI / 180.0,
            (Self::Radian, Self::Degree) => 180.0 / std::f64::consts::PI,
            _ => 1.0,
        }
    }
}

impl fmt::Display for AngleUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AngleUnit {
    type Err = SpatialError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_units(s)
    }
}

fn unit_tokens(units: &str) -> impl DoubleEndedIterator<Item = &str> {
    units
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
}

/// First token of a unit list (the angle unit of a spherical triple).
pub fn first_unit(units: &str) -> &str {
    unit_tokens(units).next().unwrap_or("")
}

/// Last token of a unit list (the length unit).
pub fn last_unit(units: &str) -> &str {
    unit_tokens(units).next_back().unwrap_or("")
}

/// Whether the length unit of `units` is a spelling of meter.
pub fn is_meter(units: &str) -> bool {
    matches!(
        last_unit(units).to_lowercase().as_str(),
        "meter" | "meters" | "metre" | "metres" | "m"
    )
}

/// Spherical `(azimuth, elevation, radius)` in radians to Cartesian.
pub fn sph2cart(azimuth: f64, elevation: f64, radius: f64) -> (f64, f64, f64) {
    let x = radius * azimuth.cos() * elevation.cos();
    let y = radius * azimuth.sin() * elevation.cos();
    let z = radius * elevation.sin();
    (x, y, z)
}

/// Cartesian to spherical `(azimuth, elevation, radius)` in radians.
///
/// Azimuth lies in `(-π, π]`. A zero radius divides by one instead; the
/// angles of the origin carry no meaning.
pub fn cart2sph(x: f64, y: f64, z: f64) -> (f64, f64, f64) {
    let radius = (x * x + y * y + z * z).sqrt();
    let azimuth = match y.atan2(x) {
        // y == -0.0 behind the origin
        a if a == -std::f64::consts::PI => std::f64::consts::PI,
        a => a,
    };
    let elevation = (z / if radius != 0.0 { radius } else { 1.0 }).asin();
    (azimuth, elevation, radius)
}

/// Position of the `C` axis, which must hold whole triples.
fn coordinate_axis(coords: &ArrayD<f64>, dims: &[Axis]) -> Result<usize> {
    let c = dims
        .iter()
        .position(|d| *d == Axis::C)
        .filter(|c| *c < coords.ndim())
        .ok_or_else(|| SpatialError::MissingCoordinateAxis {
            dims: dims.to_vec(),
        })?;
    let len = coords.len_of(NdAxis(c));
    if len != 3 {
        return Err(SpatialError::PartialTriple { len });
    }
    Ok(c)
}

/// Rescales the two angular slots of every triple from `from` to `to`.
///
/// # Errors
///
/// Returns [`SpatialError::MissingCoordinateAxis`] if `dims` has no `C` and
/// [`SpatialError::PartialTriple`] if `C` does not hold three components.
pub fn convert_angle_units(
    coords: &ArrayD<f64>,
    dims: &[Axis],
    from: AngleUnit,
    to: AngleUnit,
) -> Result<ArrayD<f64>> {
    let c = coordinate_axis(coords, dims)?;
    let mut out = coords.clone();
    if from != to {
        let factor = from.factor_to(to);
        out.slice_axis_mut(NdAxis(c), Slice::from(0..2))
            .mapv_inplace(|v| v * factor);
    }
    Ok(out)
}

/// Converts an array of triples between systems and angle units.
///
/// Spherical input is normalized to radians before the trigonometric
/// transform; spherical output is produced in radians and then rescaled to
/// `to_unit`. Angle units are ignored on the Cartesian side.
///
/// # Errors
///
/// Returns [`SpatialError::MissingCoordinateAxis`] if `dims` has no `C`.
pub fn convert(
    coords: &ArrayD<f64>,
    dims: &[Axis],
    from: System,
    to: System,
    from_unit: AngleUnit,
    to_unit: AngleUnit,
) -> Result<ArrayD<f64>> {
    let c = coordinate_axis(coords, dims)?;
    match (from, to) {
        (System::Cartesian, System::Cartesian) => Ok(coords.clone()),
        (System::Spherical, System::Spherical) => {
            convert_angle_units(coords, dims, from_unit, to_unit)
        }
        (System::Cartesian, System::Spherical) => {
            let mut out = coords.clone();
            for mut lane in out.lanes_mut(NdAxis(c)) {
                let (az, el, r) = cart2sph(lane[0], lane[1], lane[2]);
                lane[0] = az;
                lane[1] = el;
                lane[2] = r;
            }
            convert_angle_units(&out, dims, AngleUnit::Radian, to_unit)
        }
        (System::Spherical, System::Cartesian) => {
            let mut out = convert_angle_units(coords, dims, from_unit, AngleUnit::Radian)?;
            for mut lane in out.lanes_mut(NdAxis(c)) {
                let (x, y, z) = sph2cart(lane[0], lane[1], lane[2]);
                lane[0] = x;
                lane[1] = y;
                lane[2] = z;
            }
            Ok(out)
        }
    }
}

/// A coordinate representation: system plus angle unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Representation {
    pub system: System,
    pub angle_unit: AngleUnit,
}

impl Representation {
    pub fn new(system: System, angle_unit: AngleUnit) -> Self {
        Self { system, angle_unit }
    }

    pub fn cartesian() -> Self {
        Self::new(System::Cartesian, AngleUnit::Radian)
    }

    /// Whether converting from `self` to `other` changes any value.
    pub fn differs(&self, other: &Representation) -> bool {
        self.system != other.system
            || (self.system == System::Spherical && self.angle_unit != other.angle_unit)
    }
}

/// Selects from a labeled array and converts the result.
///
/// An index on `C` is applied after conversion since it needs whole triples.
pub fn select_converted(
    name: &str,
    data: &ArrayD<f64>,
    dims: &[Axis],
    dimensions: &Dimensions,
    selection: &Selection,
    dim_order: Option<&[Axis]>,
    from: Representation,
    to: Representation,
) -> Result<ArrayD<f64>> {
    let Some(c_index) = selection.get(Axis::C).cloned() else {
        let order = dim_order
            .map(<[Axis]>::to_vec)
            .unwrap_or_else(|| access::default_order(dims, selection));
        let values = access::read(name, data, dims, dimensions, selection, Some(&order))?;
        return convert(&values, &order, from.system, to.system, from.angle_unit, to.angle_unit);
    };

    let without_c = selection.without(Axis::C);
    let final_order = dim_order
        .map(<[Axis]>::to_vec)
        .unwrap_or_else(|| access::default_order(dims, selection));
    let mut read_order = vec![Axis::C];
    read_order.extend(final_order.iter().copied().filter(|a| *a != Axis::C));

    let values = access::read(name, data, dims, dimensions, &without_c, Some(&read_order))?;
    let converted = convert(
        &values,
        &read_order,
        from.system,
        to.system,
        from.angle_unit,
        to.angle_unit,
    )?;
    let mut c_only = Selection::new();
    c_only.insert(Axis::C, c_index);
    Ok(access::read(
        name,
        &converted,
        &read_order,
        dimensions,
        &c_only,
        Some(&final_order),
    )?)
}
