//! Dataset sessions: create or open, initialize, query, save.

use std::path::{Path, PathBuf};

use ndarray::ArrayD;
use sofa_conventions::{
    Convention, ConventionError, ConventionRegistry, ObjectSettings, RoomType, Rule,
};
use sofa_format::{keys, Axis, Dataset, Metadata, SofaReader, SofaWriter};
use sofa_spatial::{frame, Coordinates, Descriptor, ObjectKind, Pose, Query};

use crate::error::{Result, SofaError};

/// Format of the `DateCreated` and `DateModified` attributes.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Whether a session may write back to its file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    ReadOnly,
    ReadWrite,
}

/// One open dataset and the convention it follows.
///
/// The session owns its dataset exclusively; nothing reaches the file until
/// [`Database::save`] or [`Database::close`]. Changes made to the file by
/// anyone else while a session is open are not detected.
#[derive(Debug, Clone)]
pub struct Database {
    dataset: Dataset,
    convention: Convention,
    path: PathBuf,
    mode: AccessMode,
}

impl Database {
    /// Starts a new dataset following `convention` with `measurements`
    /// measurements.
    ///
    /// # Errors
    ///
    /// Returns [`ConventionError::UnknownConvention`] if `registry` lacks
    /// `convention`, or a format error for a zero measurement count.
    pub fn create(
        path: impl AsRef<Path>,
        registry: &ConventionRegistry,
        convention: &str,
        measurements: usize,
    ) -> Result<Self> {
        let convention = registry.get(convention)?.clone();
        let mut dataset = Dataset::new();
        dataset.create_dimension(Axis::I, 1)?;
        dataset.create_dimension(Axis::C, 3)?;
        dataset.create_dimension(Axis::M, measurements)?;

        let metadata = dataset.metadata_mut();
        convention.add_metadata(metadata);
        metadata.set(keys::DATE_CREATED, timestamp());

        let path = path.as_ref().to_path_buf();
        tracing::info!(
            path = %path.display(),
            convention = convention.name(),
            measurements,
            "Created dataset"
        );
        Ok(Self {
            dataset,
            convention,
            path,
            mode: AccessMode::ReadWrite,
        })
    }

    /// Reads a dataset and resolves its convention through `registry`.
    pub fn open(
        path: impl AsRef<Path>,
        registry: &ConventionRegistry,
        mode: AccessMode,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let dataset = SofaReader::open(&path)?.into_dataset();
        let convention = registry.resolve(dataset.metadata())?.clone();
        tracing::info!(
            path = %path.display(),
            convention = convention.name(),
            ?mode,
            "Opened dataset"
        );
        Ok(Self {
            dataset,
            convention,
            path,
            mode,
        })
    }

    /// Stamps `DateModified` and writes the dataset to its path.
    ///
    /// # Errors
    ///
    /// Returns [`SofaError::ReadOnly`] for a read-only session.
    pub fn save(&mut self) -> Result<()> {
        if self.mode == AccessMode::ReadOnly {
            return Err(SofaError::ReadOnly(self.path.clone()));
        }
        self.dataset
            .metadata_mut()
            .set(keys::DATE_MODIFIED, timestamp());
        SofaWriter::write(&self.dataset, &self.path)?;
        tracing::info!(path = %self.path.display(), "Saved dataset");
        Ok(())
    }

    /// Ends the session, saving first unless it is read-only.
    pub fn close(mut self) -> Result<()> {
        if self.mode == AccessMode::ReadWrite {
            self.save()?;
        }
        tracing::debug!(path = %self.path.display(), "Closed dataset");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    pub fn convention(&self) -> &Convention {
        &self.convention
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn dataset_mut(&mut self) -> &mut Dataset {
        &mut self.dataset
    }

    pub fn metadata(&self) -> &Metadata {
        self.dataset.metadata()
    }

    pub fn metadata_mut(&mut self) -> &mut Metadata {
        self.dataset.metadata_mut()
    }

    pub fn dimension(&self, axis: Axis) -> Option<usize> {
        self.dataset.dimensions().get(axis)
    }

    /// Descriptors of `kind` already present, split into fixed and varying.
    fn existing(&self, kind: ObjectKind) -> (Vec<Descriptor>, Vec<Descriptor>) {
        let mut fixed = Vec::new();
        let mut varying = Vec::new();
        for descriptor in Descriptor::ALL {
            if let Ok(variable) = self.dataset.variable(&descriptor.variable_name(kind)) {
                if variable.varies() {
                    varying.push(descriptor);
                } else {
                    fixed.push(descriptor);
                }
            }
        }
        (fixed, varying)
    }

    /// Count of `kind`: explicit, else the defined local dimension, else the
    /// convention default.
    fn resolve_count(&self, kind: ObjectKind, count: Option<usize>) -> Result<usize> {
        let Some(axis) = kind.local_axis() else {
            return Ok(count.unwrap_or(1));
        };
        count
            .or_else(|| self.dimension(axis))
            .or(self.convention.defaults(kind).count)
            .ok_or_else(|| ConventionError::MissingCount { object: kind, axis }.into())
    }

    /// Declares the coordinate variables of `kind` and writes its defaults.
    ///
    /// `fixed` descriptors are laid out over `I`, `varying` ones over `M`.
    /// The configuration is validated against the convention before
    /// anything is created.
    ///
    /// # Errors
    ///
    /// - [`ConventionError::ValidationFailed`] naming `Position required`
    ///   when Position is neither given nor present, or naming every
    ///   convention rule the configuration breaks.
    /// - [`ConventionError::MissingCount`] when a Receiver or Emitter count
    ///   cannot be determined.
    pub fn initialize_object(
        &mut self,
        kind: ObjectKind,
        fixed: &[Descriptor],
        varying: &[Descriptor],
        count: Option<usize>,
    ) -> Result<()> {
        let (mut all_fixed, mut all_varying) = self.existing(kind);
        all_fixed.extend(fixed.iter().filter(|d| !varying.contains(*d)));
        all_varying.extend(varying);

        let position = Rule::position_required();
        let declared = ObjectSettings::new(kind, 0)
            .with_fixed(&all_fixed)
            .with_varying(&all_varying);
        if !position.check(&declared) {
            return Err(ConventionError::ValidationFailed {
                object: kind,
                rules: vec![position.name],
            }
            .into());
        }

        let count = self.resolve_count(kind, count)?;
        let settings = ObjectSettings { count, ..declared };
        self.convention.validate(&settings)?;

        if let Some(axis) = kind.local_axis() {
            self.dataset.create_dimension(axis, count)?;
        }
        self.dataset.metadata_mut().create(&kind.description_key(), "");
        for descriptor in settings.declared() {
            let coords = Coordinates::new(kind, descriptor);
            if !coords.exists(&self.dataset) {
                coords.initialize(&mut self.dataset, settings.varies(descriptor))?;
            }
        }
        self.convention.apply_defaults(&mut self.dataset, kind)?;
        tracing::info!(object = %kind, count, declared = ?settings.declared(), "Initialized object");
        Ok(())
    }

    /// Creates the measurement data variables of the convention's data type.
    ///
    /// `varying` names data variables laid out over `M`, e.g. `Delay`.
    pub fn initialize_data(
        &mut self,
        sample_count: usize,
        varying: &[&str],
        string_length: Option<usize>,
    ) -> Result<()> {
        self.convention.data_type().initialize(
            &mut self.dataset,
            sample_count,
            varying,
            string_length,
            self.convention.default_data(),
        )?;
        Ok(())
    }

    /// The room type recorded in the dataset, else the convention's.
    pub fn room_type(&self) -> Result<RoomType> {
        match self.metadata().get(keys::ROOM_TYPE) {
            Some(value) => Ok(value.parse()?),
            None => Ok(self.convention.room_type()),
        }
    }

    /// Creates the room attributes and corner variables.
    pub fn initialize_room(&mut self, varying: &[&str], description: Option<&str>) -> Result<()> {
        let room = self.room_type()?;
        room.initialize(&mut self.dataset, varying, description)?;
        Ok(())
    }

    pub fn coordinates(&self, kind: ObjectKind, descriptor: Descriptor) -> Coordinates {
        Coordinates::new(kind, descriptor)
    }

    /// Global pose of `kind`. See [`frame::pose`].
    pub fn pose(&self, kind: ObjectKind, query: &Query) -> Result<Pose> {
        Ok(frame::pose(&self.dataset, kind, query)?)
    }

    pub fn global_values(
        &self,
        kind: ObjectKind,
        descriptor: Descriptor,
        query: &Query,
    ) -> Result<ArrayD<f64>> {
        Ok(Coordinates::new(kind, descriptor).global_values(&self.dataset, query)?)
    }

    /// Values of `kind`'s `descriptor` in the frame of `reference`.
    pub fn relative_values(
        &self,
        kind: ObjectKind,
        descriptor: Descriptor,
        reference: ObjectKind,
        query: &Query,
    ) -> Result<ArrayD<f64>> {
        Ok(Coordinates::new(kind, descriptor).relative_values(
            &self.dataset,
            Some(reference),
            query,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sofa_format::FormatError;

    fn database(convention: &str) -> Database {
        let registry = ConventionRegistry::with_builtin();
        Database::create("unused.sofa", &registry, convention, 3).unwrap()
    }

    #[test]
    fn test_create_writes_metadata() {
        let db = database("GeneralTF");
        assert_eq!(db.metadata().get("Conventions"), Some("SOFA"));
        assert_eq!(db.metadata().get("SOFAConventions"), Some("GeneralTF"));
        assert_eq!(db.metadata().get("DataType"), Some("TF"));
        let created = db.metadata().get("DateCreated").unwrap();
        assert!(chrono::NaiveDateTime::parse_from_str(created, TIMESTAMP_FORMAT).is_ok());
        assert_eq!(db.dimension(Axis::M), Some(3));
        assert_eq!(db.dimension(Axis::C), Some(3));
    }

    #[test]
    fn test_create_unknown_convention() {
        let registry = ConventionRegistry::with_builtin();
        assert!(matches!(
            Database::create("x.sofa", &registry, "NoSuchThing", 1),
            Err(SofaError::Convention(ConventionError::UnknownConvention(_)))
        ));
    }

    #[test]
    fn test_position_required() {
        let mut db = database("GeneralFIR");
        let err = db
            .initialize_object(ObjectKind::Listener, &[Descriptor::View], &[], None)
            .unwrap_err();
        match err {
            SofaError::Convention(ConventionError::ValidationFailed { rules, .. }) => {
                assert_eq!(rules, vec!["Position required".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!db.dataset().has_variable("ListenerView"));
    }

    #[test]
    fn test_missing_count() {
        let mut db = database("GeneralFIR");
        assert!(matches!(
            db.initialize_object(ObjectKind::Receiver, &[Descriptor::Position], &[], None),
            Err(SofaError::Convention(ConventionError::MissingCount {
                object: ObjectKind::Receiver,
                axis: Axis::R
            }))
        ));
    }

    #[test]
    fn test_failed_validation_creates_nothing() {
        let mut db = database("SimpleFreeFieldHRIR");
        let err = db
            .initialize_object(
                ObjectKind::Emitter,
                &[Descriptor::Position, Descriptor::Up],
                &[],
                Some(3),
            )
            .unwrap_err();
        match err {
            SofaError::Convention(ConventionError::ValidationFailed { rules, .. }) => {
                assert_eq!(rules, vec!["Up requires View", "Emitter count == 1"]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(db.dimension(Axis::E), None);
        assert!(!db.metadata().contains("EmitterDescription"));
    }

    #[test]
    fn test_varying_descriptor_uses_measurements() {
        let mut db = database("GeneralFIR");
        db.initialize_object(
            ObjectKind::Source,
            &[Descriptor::Position],
            &[Descriptor::Position, Descriptor::View],
            None,
        )
        .unwrap();
        let var = db.dataset().variable("SourcePosition").unwrap();
        assert_eq!(var.dims(), &[Axis::M, Axis::C]);
        assert!(db.metadata().contains("SourceDescription"));
        let view = db.dataset().variable("SourceView").unwrap().data();
        assert_eq!(view[[2, 0]], 1.0);
    }

    #[test]
    fn test_count_conflicts_with_dimension() {
        let mut db = database("GeneralFIR");
        db.dataset_mut().create_dimension(Axis::R, 4).unwrap();
        assert!(matches!(
            db.initialize_object(ObjectKind::Receiver, &[Descriptor::Position], &[], Some(2)),
            Err(SofaError::Format(FormatError::DimensionExists { .. }))
        ));
        db.initialize_object(ObjectKind::Receiver, &[Descriptor::Position], &[], None)
            .unwrap();
        assert_eq!(
            db.dataset().variable("ReceiverPosition").unwrap().shape(),
            &[4, 3, 1]
        );
    }

    #[test]
    fn test_room_type_from_metadata() {
        let mut db = database("GeneralFIR");
        db.metadata_mut().set("RoomType", "shoebox");
        db.initialize_room(&[], Some("booth")).unwrap();
        assert!(db.dataset().has_variable("RoomCornerA"));
        assert_eq!(db.metadata().get("RoomDescription"), Some("booth"));

        db.metadata_mut().set("RoomType", "anechoic chamber");
        assert!(matches!(
            db.room_type(),
            Err(SofaError::Convention(ConventionError::UnknownRoomType(_)))
        ));
    }
}
