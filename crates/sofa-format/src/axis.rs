//! The closed vocabulary of dimension names used by SOFA datasets.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FormatError;

/// A named dimension of a SOFA dataset.
///
/// The single-letter names are the ones stored in the container:
///
/// | axis | meaning                                   | size          |
/// |------|-------------------------------------------|---------------|
/// | `I`  | scalar, constant across measurements      | always 1      |
/// | `C`  | coordinate triple                         | always 3      |
/// | `M`  | measurements                              | variable      |
/// | `R`  | receivers                                 | variable      |
/// | `E`  | emitters                                  | variable      |
/// | `N`  | samples (or frequency bins) per measurement | variable    |
/// | `S`  | longest string                            | variable      |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Axis {
    I,
    C,
    M,
    R,
    E,
    N,
    S,
}

impl Axis {
    /// Every axis, in container order.
    pub const ALL: [Axis; 7] = [
        Axis::I,
        Axis::C,
        Axis::M,
        Axis::R,
        Axis::E,
        Axis::N,
        Axis::S,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::I => "I",
            Self::C => "C",
            Self::M => "M",
            Self::R => "R",
            Self::E => "E",
            Self::N => "N",
            Self::S => "S",
        }
    }

    /// The size an axis is pinned to, if any.
    pub const fn fixed_size(&self) -> Option<usize> {
        match self {
            Self::I => Some(1),
            Self::C => Some(3),
            _ => None,
        }
    }

    /// The I/M alias partner: the scalar axis stands in for the measurement
    /// axis and vice versa.
    pub const fn alias(&self) -> Option<Axis> {
        match self {
            Self::I => Some(Self::M),
            Self::M => Some(Self::I),
            _ => None,
        }
    }

    /// Human readable description, used by `info` style listings.
    pub fn description(&self) -> &'static str {
        match self {
            Self::I => "scalar",
            Self::C => "coordinates",
            Self::M => "measurements",
            Self::R => "receivers",
            Self::E => "emitters",
            Self::N => "samples",
            Self::S => "string length",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Axis {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "I" => Ok(Self::I),
            "C" => Ok(Self::C),
            "M" => Ok(Self::M),
            "R" => Ok(Self::R),
            "E" => Ok(Self::E),
            "N" => Ok(Self::N),
            "S" => Ok(Self::S),
            other => Err(FormatError::UnknownAxis(other.to_string())),
        }
    }
}

/// Replaces the scalar axis with the measurement axis.
///
/// Used wherever a variable's axes are compared against caller-supplied
/// measurement-axis terms.
pub fn with_measurement_alias(axes: &[Axis]) -> Vec<Axis> {
    axes.iter()
        .map(|a| if *a == Axis::I { Axis::M } else { *a })
        .collect()
}
