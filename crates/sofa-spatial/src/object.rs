//! Spatial objects, their anchors and coordinate variable layouts.

use std::fmt;
use std::str::FromStr;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use sofa_format::Axis;

use crate::error::{Result, SpatialError};

/// One of the four spatial objects of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ObjectKind {
    Listener,
    Source,
    Receiver,
    Emitter,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 4] = [
        ObjectKind::Listener,
        ObjectKind::Source,
        ObjectKind::Receiver,
        ObjectKind::Emitter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Listener => "Listener",
            Self::Source => "Source",
            Self::Receiver => "Receiver",
            Self::Emitter => "Emitter",
        }
    }

    /// The object whose frame this one is expressed in; `None` for the
    /// global frame.
    pub const fn anchor(&self) -> Option<ObjectKind> {
        match self {
            Self::Receiver => Some(Self::Listener),
            Self::Emitter => Some(Self::Source),
            Self::Listener | Self::Source => None,
        }
    }

    /// The per-transducer count axis, for objects that have one.
    pub const fn local_axis(&self) -> Option<Axis> {
        match self {
            Self::Receiver => Some(Axis::R),
            Self::Emitter => Some(Axis::E),
            Self::Listener | Self::Source => None,
        }
    }

    /// Axes of a coordinate variable of this object.
    ///
    /// `(I|M, C)` without a local axis, `(R|E, C, I|M)` with one.
    pub fn standard_dims(&self, varies: bool) -> Vec<Axis> {
        let measurement = if varies { Axis::M } else { Axis::I };
        match self.local_axis() {
            None => vec![measurement, Axis::C],
            Some(local) => vec![local, Axis::C, measurement],
        }
    }

    /// Name of the attribute describing the object, e.g. `ListenerDescription`.
    pub fn description_key(&self) -> String {
        format!("{}Description", self.as_str())
    }
}

const fn anchors_are_global(kind: ObjectKind) -> bool {
    match kind.anchor() {
        None => true,
        Some(anchor) => matches!(anchor.anchor(), None) && matches!(anchor.local_axis(), None),
    }
}

// Anchors sit directly in the global frame and have no local axis.
const _: () = assert!(
    anchors_are_global(ObjectKind::Listener)
        && anchors_are_global(ObjectKind::Source)
        && anchors_are_global(ObjectKind::Receiver)
        && anchors_are_global(ObjectKind::Emitter)
);

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectKind {
    type Err = SpatialError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| SpatialError::UnknownObject(s.to_string()))
    }
}

/// The three coordinate variables an object can own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Descriptor {
    Position,
    View,
    Up,
}

impl Descriptor {
    pub const ALL: [Descriptor; 3] = [Descriptor::Position, Descriptor::View, Descriptor::Up];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Position => "Position",
            Self::View => "View",
            Self::Up => "Up",
        }
    }

    /// Positions are translated between frames; View and Up are directions.
    pub fn is_position(&self) -> bool {
        matches!(self, Self::Position)
    }

    /// The pose of an object that declares nothing: origin, +x, +z.
    pub fn default_vector(&self) -> Vector3<f64> {
        match self {
            Self::Position => Vector3::zeros(),
            Self::View => Vector3::x(),
            Self::Up => Vector3::z(),
        }
    }

    /// Full variable name, e.g. `ReceiverPosition`.
    pub fn variable_name(&self, kind: ObjectKind) -> String {
        format!("{}{}", kind.as_str(), self.as_str())
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Descriptor {
    type Err = SpatialError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| SpatialError::UnknownObject(s.to_string()))
    }
}
