//! Room types and their extra variables.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sofa_format::{keys, Axis, Dataset};
use sofa_spatial::variable::stamp_system;
use sofa_spatial::System;

use crate::error::{ConventionError, Result};

/// Acoustic environment of the measurements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoomType {
    #[serde(rename = "free field")]
    FreeField,
    #[serde(rename = "reverberant")]
    Reverberant,
    /// A cuboid room given by two opposite corners.
    #[serde(rename = "shoebox")]
    Shoebox,
}

pub const CORNER_A: &str = "RoomCornerA";
pub const CORNER_B: &str = "RoomCornerB";

impl RoomType {
    pub const ALL: [RoomType; 3] = [RoomType::FreeField, RoomType::Reverberant, RoomType::Shoebox];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FreeField => "free field",
            Self::Reverberant => "reverberant",
            Self::Shoebox => "shoebox",
        }
    }

    /// Coordinate variables this room type adds.
    pub fn corner_variables(&self) -> &'static [&'static str] {
        match self {
            Self::Shoebox => &[CORNER_A, CORNER_B],
            Self::FreeField | Self::Reverberant => &[],
        }
    }

    /// Adds the room attributes and variables to `dataset`.
    ///
    /// `varying` names the corner variables laid out along `M`.
    pub fn initialize(
        &self,
        dataset: &mut Dataset,
        varying: &[&str],
        description: Option<&str>,
    ) -> Result<()> {
        if *self == Self::FreeField {
            return Ok(());
        }
        let metadata = dataset.metadata_mut();
        match description {
            Some(text) => metadata.set(keys::ROOM_DESCRIPTION, text),
            None => {
                metadata.create(keys::ROOM_DESCRIPTION, "");
            }
        }
        for name in self.corner_variables() {
            let measurement = if varying.contains(name) { Axis::M } else { Axis::I };
            let variable = dataset.create_variable(name, &[measurement, Axis::C])?;
            stamp_system(variable, System::Cartesian, None);
        }
        tracing::debug!(room = %self, "Initialized room");
        Ok(())
    }
}

impl fmt::Display for RoomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoomType {
    type Err = ConventionError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().replace(['_', '-'], " ");
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| ConventionError::UnknownRoomType(s.to_string()))
    }
}
