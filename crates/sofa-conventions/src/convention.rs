//! Conventions: a named rule set plus the defaults a dataset starts from.

use std::collections::BTreeMap;

use ndarray::{arr1, Array2};
use serde::{Deserialize, Serialize};
use sofa_format::{keys, Axis, Dataset, Metadata, Selection};
use sofa_spatial::{Coordinates, Descriptor, ObjectKind, System};

use crate::datatype::DataType;
use crate::error::Result;
use crate::room::RoomType;
use crate::rule::{ObjectSettings, Rule, RuleSet};

/// Value of the `Conventions` attribute of every dataset.
pub const CONVENTIONS_VALUE: &str = "SOFA";
/// Value of the `Version` attribute written on creation.
pub const FORMAT_VERSION: &str = "1.0";
pub const DEFAULT_LICENSE: &str = "No license provided, ask the author for permission";

/// Defaults for one spatial object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectDefaults {
    /// Count used when none is given and the local dimension is undefined.
    pub count: Option<usize>,
    pub position: [f64; 3],
    /// System the default `position` is expressed and stored in.
    pub system: System,
    /// Cartesian.
    pub view: [f64; 3],
    /// Cartesian.
    pub up: [f64; 3],
    /// Per-transducer positions written when the local count matches.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub local_positions: Vec<[f64; 3]>,
}

impl Default for ObjectDefaults {
    fn default() -> Self {
        Self {
            count: None,
            position: [0.0, 0.0, 0.0],
            system: System::Cartesian,
            view: [1.0, 0.0, 0.0],
            up: [0.0, 0.0, 1.0],
            local_positions: Vec::new(),
        }
    }
}

impl ObjectDefaults {
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with_position(mut self, position: [f64; 3], system: System) -> Self {
        self.position = position;
        self.system = system;
        self
    }

    pub fn with_view(mut self, view: [f64; 3]) -> Self {
        self.view = view;
        self
    }

    pub fn with_local_positions(mut self, positions: Vec<[f64; 3]>) -> Self {
        self.local_positions = positions;
        self
    }

    pub fn vector(&self, descriptor: Descriptor) -> [f64; 3] {
        match descriptor {
            Descriptor::Position => self.position,
            Descriptor::View => self.view,
            Descriptor::Up => self.up,
        }
    }
}

/// A named dataset profile.
///
/// Every convention starts from [`RuleSet::baseline`]; builders only add
/// rules on top of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Convention {
    name: String,
    version: String,
    data_type: DataType,
    room_type: RoomType,
    rules: RuleSet,
    objects: BTreeMap<ObjectKind, ObjectDefaults>,
    default_data: BTreeMap<String, f64>,
    /// Extra global attributes created empty.
    metadata_keys: Vec<String>,
}

impl Convention {
    pub fn new(name: impl Into<String>, version: impl Into<String>, data_type: DataType) -> Self {
        let objects = ObjectKind::ALL
            .into_iter()
            .map(|kind| {
                let defaults = match kind {
                    ObjectKind::Listener | ObjectKind::Source => ObjectDefaults::default().with_count(1),
                    ObjectKind::Receiver | ObjectKind::Emitter => ObjectDefaults::default(),
                };
                (kind, defaults)
            })
            .collect();
        Self {
            name: name.into(),
            version: version.into(),
            data_type,
            room_type: RoomType::FreeField,
            rules: RuleSet::baseline(),
            objects,
            default_data: BTreeMap::from([("SamplingRate".to_string(), 48000.0)]),
            metadata_keys: Vec::new(),
        }
    }

    pub fn with_room_type(mut self, room_type: RoomType) -> Self {
        self.room_type = room_type;
        self
    }

    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules = self.rules.with(rule);
        self
    }

    pub fn with_object(mut self, kind: ObjectKind, defaults: ObjectDefaults) -> Self {
        self.objects.insert(kind, defaults);
        self
    }

    pub fn with_default_data(mut self, key: &str, value: f64) -> Self {
        self.default_data.insert(key.to_string(), value);
        self
    }

    pub fn with_metadata_key(mut self, key: &str) -> Self {
        self.metadata_keys.push(key.to_string());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn room_type(&self) -> RoomType {
        self.room_type
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn default_data(&self) -> &BTreeMap<String, f64> {
        &self.default_data
    }

    pub fn defaults(&self, kind: ObjectKind) -> ObjectDefaults {
        self.objects.get(&kind).cloned().unwrap_or_default()
    }

    /// Evaluates every rule against `settings`.
    pub fn validate(&self, settings: &ObjectSettings) -> Result<()> {
        self.rules.validate(settings)
    }

    /// Writes the identifying attributes and creates the descriptive ones
    /// that are still missing.
    pub fn add_metadata(&self, metadata: &mut Metadata) {
        metadata.set(keys::CONVENTIONS, CONVENTIONS_VALUE);
        metadata.set(keys::VERSION, FORMAT_VERSION);
        metadata.set(keys::SOFA_CONVENTIONS, self.name.as_str());
        metadata.set(keys::SOFA_CONVENTIONS_VERSION, self.version.as_str());
        metadata.set(keys::DATA_TYPE, self.data_type.as_str());
        metadata.set(keys::ROOM_TYPE, self.room_type.as_str());
        metadata.set(keys::API_NAME, "sofa-rs");
        metadata.set(keys::API_VERSION, env!("CARGO_PKG_VERSION"));
        for key in [
            keys::TITLE,
            keys::DATE_CREATED,
            keys::DATE_MODIFIED,
            keys::AUTHOR_CONTACT,
            keys::ORGANIZATION,
        ] {
            metadata.create(key, "");
        }
        metadata.create(keys::LICENSE, DEFAULT_LICENSE);
        for key in &self.metadata_keys {
            metadata.create(key, "");
        }
    }

    /// Writes the default pose of `kind` into its existing coordinate
    /// variables, repeated over measurements and transducers.
    pub fn apply_defaults(&self, dataset: &mut Dataset, kind: ObjectKind) -> Result<()> {
        let defaults = self.defaults(kind);
        let repeat: Vec<Axis> = kind
            .standard_dims(false)
            .into_iter()
            .filter(|a| *a != Axis::C)
            .collect();

        for descriptor in Descriptor::ALL {
            let coords = Coordinates::new(kind, descriptor);
            if !coords.exists(dataset) {
                continue;
            }
            let system = match descriptor {
                Descriptor::Position => defaults.system,
                Descriptor::View | Descriptor::Up => System::Cartesian,
            };
            coords.set_system(dataset, system, None)?;
            let value = arr1(&defaults.vector(descriptor)).into_dyn();
            coords.set_values(
                dataset,
                value.view(),
                &Selection::new(),
                Some(&[Axis::C]),
                &repeat,
                None,
                None,
            )?;
        }

        let position = Coordinates::new(kind, Descriptor::Position);
        if let Some(local) = kind.local_axis() {
            let count = dataset.dimensions().get(local);
            if !defaults.local_positions.is_empty()
                && count == Some(defaults.local_positions.len())
                && position.exists(dataset)
            {
                let values = Array2::from(defaults.local_positions.clone()).into_dyn();
                position.set_values(
                    dataset,
                    values.view(),
                    &Selection::new(),
                    Some(&[local, Axis::C]),
                    &[Axis::I],
                    None,
                    None,
                )?;
            }
        }
        tracing::debug!(convention = %self.name, object = %kind, "Applied default pose");
        Ok(())
    }
}
