//! Measurement data layouts (`DataType`).

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use ndarray::ArrayD;
use serde::{Deserialize, Serialize};
use sofa_format::{Axis, Dataset, FormatError, Selection};

use crate::error::{ConventionError, Result};

pub const UNITS_ATTRIBUTE: &str = "Units";
pub const LONG_NAME_ATTRIBUTE: &str = "LongName";

/// The kind of measurement data a dataset holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// Impulse responses per receiver.
    #[serde(rename = "FIR")]
    Fir,
    /// Impulse responses per receiver and emitter.
    #[serde(rename = "FIRE")]
    Fire,
    /// Complex transfer functions over a frequency axis.
    #[serde(rename = "TF")]
    Tf,
    /// Cascaded second-order sections, six coefficients per section.
    #[serde(rename = "SOS")]
    Sos,
}

/// One data variable of a layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataVariable {
    /// Short name, e.g. `IR`; the dataset variable is `Data.IR`.
    pub key: &'static str,
    pub name: &'static str,
    /// Axes when constant across measurements.
    pub fixed: &'static [Axis],
    /// Axes when varying along `M`, if that differs from `fixed`.
    pub varying: Option<&'static [Axis]>,
    pub units: Option<&'static str>,
    pub long_name: Option<&'static str>,
}

impl DataVariable {
    const fn new(key: &'static str, name: &'static str, fixed: &'static [Axis]) -> Self {
        Self {
            key,
            name,
            fixed,
            varying: None,
            units: None,
            long_name: None,
        }
    }

    const fn or_varying(mut self, varying: &'static [Axis]) -> Self {
        self.varying = Some(varying);
        self
    }

    const fn with_units(mut self, units: &'static str) -> Self {
        self.units = Some(units);
        self
    }

    const fn with_long_name(mut self, long_name: &'static str) -> Self {
        self.long_name = Some(long_name);
        self
    }

    /// Axes for the requested variance.
    pub fn dims(&self, varies: bool) -> &'static [Axis] {
        match (varies, self.varying) {
            (true, Some(varying)) => varying,
            _ => self.fixed,
        }
    }
}

const SAMPLING_RATE: DataVariable = DataVariable::new("SamplingRate", "Data.SamplingRate", &[Axis::I])
    .or_varying(&[Axis::M])
    .with_units("hertz");

const FIR_LAYOUT: &[DataVariable] = &[
    DataVariable::new("IR", "Data.IR", &[Axis::M, Axis::R, Axis::N]),
    DataVariable::new("Delay", "Data.Delay", &[Axis::I, Axis::R]).or_varying(&[Axis::M, Axis::R]),
    SAMPLING_RATE,
];

const FIRE_LAYOUT: &[DataVariable] = &[
    DataVariable::new("IR", "Data.IR", &[Axis::M, Axis::R, Axis::E, Axis::N]),
    DataVariable::new("Delay", "Data.Delay", &[Axis::I, Axis::R, Axis::E])
        .or_varying(&[Axis::M, Axis::R, Axis::E]),
    SAMPLING_RATE,
];

const TF_LAYOUT: &[DataVariable] = &[
    DataVariable::new("Real", "Data.Real", &[Axis::M, Axis::R, Axis::N]),
    DataVariable::new("Imag", "Data.Imag", &[Axis::M, Axis::R, Axis::N]),
    DataVariable::new("N", "N", &[Axis::N])
        .with_units("hertz")
        .with_long_name("frequency"),
];

const SOS_LAYOUT: &[DataVariable] = &[
    DataVariable::new("SOS", "Data.SOS", &[Axis::M, Axis::R, Axis::N]),
    DataVariable::new("Delay", "Data.Delay", &[Axis::I, Axis::R]).or_varying(&[Axis::M, Axis::R]),
    SAMPLING_RATE,
];

impl DataType {
    pub const ALL: [DataType; 4] = [DataType::Fir, DataType::Fire, DataType::Tf, DataType::Sos];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fir => "FIR",
            Self::Fire => "FIRE",
            Self::Tf => "TF",
            Self::Sos => "SOS",
        }
    }

    pub fn layout(&self) -> &'static [DataVariable] {
        match self {
            Self::Fir => FIR_LAYOUT,
            Self::Fire => FIRE_LAYOUT,
            Self::Tf => TF_LAYOUT,
            Self::Sos => SOS_LAYOUT,
        }
    }

    /// Data variables that may vary along `M`.
    pub fn varying_keys(&self) -> Vec<&'static str> {
        self.layout()
            .iter()
            .filter(|v| v.varying.is_some())
            .map(|v| v.key)
            .collect()
    }

    /// # Errors
    ///
    /// Returns [`ConventionError::InvalidSampleCount`] for SOS data whose
    /// sample count is not a whole number of sections.
    pub fn check_sample_count(&self, count: usize) -> Result<()> {
        const SOS_SECTION: usize = 6;
        if *self == Self::Sos && count % SOS_SECTION != 0 {
            return Err(ConventionError::InvalidSampleCount {
                data_type: self.as_str().to_string(),
                count,
                multiple: SOS_SECTION,
            });
        }
        Ok(())
    }

    /// Creates the `N` (and optional `S`) dimension and every data
    /// variable, then writes the non-zero entries of `defaults`.
    ///
    /// `varying` names the data variables (by key, e.g. `Delay`) laid out
    /// along `M` instead of `I`. Nothing is created unless every dimension
    /// and variable can be.
    pub fn initialize(
        &self,
        dataset: &mut Dataset,
        sample_count: usize,
        varying: &[&str],
        string_length: Option<usize>,
        defaults: &BTreeMap<String, f64>,
    ) -> Result<()> {
        self.check_sample_count(sample_count)?;
        let mut planned = dataset.dimensions().clone();
        if let Some(len) = string_length {
            planned.create(Axis::S, len)?;
        }
        planned.create(Axis::N, sample_count)?;
        for spec in self.layout() {
            if dataset.has_variable(spec.name) {
                return Err(FormatError::VariableExists(spec.name.to_string()).into());
            }
            let missing = planned.missing(spec.dims(varying.contains(&spec.key)));
            if !missing.is_empty() {
                return Err(FormatError::UndefinedDimensions {
                    variable: spec.name.to_string(),
                    missing,
                }
                .into());
            }
        }

        if let Some(len) = string_length {
            dataset.create_dimension(Axis::S, len)?;
        }
        dataset.create_dimension(Axis::N, sample_count)?;

        for spec in self.layout() {
            let dims = spec.dims(varying.contains(&spec.key));
            let variable = dataset.create_variable(spec.name, dims)?;
            if let Some(units) = spec.units {
                variable.set_attribute(UNITS_ATTRIBUTE, units);
            }
            if let Some(long_name) = spec.long_name {
                variable.set_attribute(LONG_NAME_ATTRIBUTE, long_name);
            }
            match defaults.get(spec.key) {
                Some(value) if *value != 0.0 => {
                    let scalar = ArrayD::from_elem(vec![], *value);
                    dataset.set_values(spec.name, scalar.view(), &Selection::new(), None, &[])?;
                }
                _ => {}
            }
        }
        tracing::debug!(data_type = %self, sample_count, "Initialized measurement data");
        Ok(())
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = ConventionError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConventionError::UnknownDataType(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> Dataset {
        let mut ds = Dataset::new();
        ds.create_dimension(Axis::I, 1).unwrap();
        ds.create_dimension(Axis::M, 4).unwrap();
        ds.create_dimension(Axis::R, 2).unwrap();
        ds
    }

    fn defaults() -> BTreeMap<String, f64> {
        BTreeMap::from([("SamplingRate".to_string(), 48000.0), ("Delay".to_string(), 0.0)])
    }

    #[test]
    fn test_fir_layout() {
        let mut ds = dataset();
        DataType::Fir
            .initialize(&mut ds, 256, &["Delay"], None, &defaults())
            .unwrap();
        assert_eq!(ds.dimensions().get(Axis::N), Some(256));
        assert_eq!(ds.variable("Data.IR").unwrap().shape(), &[4, 2, 256]);
        assert_eq!(ds.variable("Data.Delay").unwrap().dims(), &[Axis::M, Axis::R]);

        let rate = ds.variable("Data.SamplingRate").unwrap();
        assert_eq!(rate.dims(), &[Axis::I]);
        assert_eq!(rate.attribute("Units"), Some("hertz"));
        assert_eq!(rate.data()[[0]], 48000.0);
    }

    #[test]
    fn test_tf_frequency_axis() {
        let mut ds = dataset();
        DataType::Tf
            .initialize(&mut ds, 129, &[], Some(16), &defaults())
            .unwrap();
        assert_eq!(ds.dimensions().get(Axis::S), Some(16));
        let n = ds.variable("N").unwrap();
        assert_eq!(n.dims(), &[Axis::N]);
        assert_eq!(n.attribute("LongName"), Some("frequency"));
        assert!(ds.has_variable("Data.Imag"));
        assert!(!ds.has_variable("Data.SamplingRate"));
    }

    #[test]
    fn test_sos_needs_whole_sections() {
        let mut ds = dataset();
        assert!(matches!(
            DataType::Sos.initialize(&mut ds, 13, &[], None, &defaults()),
            Err(ConventionError::InvalidSampleCount {
                count: 13,
                multiple: 6,
                ..
            })
        ));
        assert!(!ds.dimensions().contains(Axis::N));
        DataType::Sos
            .initialize(&mut ds, 12, &[], None, &defaults())
            .unwrap();
    }

    #[test]
    fn test_fire_needs_emitters() {
        let mut ds = dataset();
        assert!(DataType::Fire
            .initialize(&mut ds, 8, &[], None, &defaults())
            .is_err());
    }

    #[test]
    fn test_failed_initialize_leaves_dimensions_untouched() {
        let mut ds = Dataset::new();
        ds.create_dimension(Axis::I, 1).unwrap();
        ds.create_dimension(Axis::M, 4).unwrap();
        let before = ds.dimensions().clone();

        assert!(matches!(
            DataType::Fir.initialize(&mut ds, 256, &[], Some(16), &defaults()),
            Err(ConventionError::Format(FormatError::UndefinedDimensions { .. }))
        ));
        assert_eq!(ds.dimensions(), &before);
        assert!(!ds.has_variable("Data.IR"));

        ds.create_dimension(Axis::R, 2).unwrap();
        DataType::Fir
            .initialize(&mut ds, 512, &[], Some(32), &defaults())
            .unwrap();
        assert_eq!(ds.dimensions().get(Axis::N), Some(512));
        assert_eq!(ds.dimensions().get(Axis::S), Some(32));
        assert_eq!(ds.variable("Data.IR").unwrap().shape(), &[4, 2, 512]);
    }

    #[test]
    fn test_taken_variable_name_creates_nothing() {
        let mut ds = dataset();
        ds.create_variable("Data.Delay", &[Axis::I, Axis::R]).unwrap();
        assert!(matches!(
            DataType::Fir.initialize(&mut ds, 64, &[], None, &defaults()),
            Err(ConventionError::Format(FormatError::VariableExists(_)))
        ));
        assert!(!ds.dimensions().contains(Axis::N));
        assert!(!ds.has_variable("Data.IR"));
    }

    #[test]
    fn test_parse() {
        assert_eq!("fire".parse::<DataType>().unwrap(), DataType::Fire);
        assert_eq!(DataType::Sos.varying_keys(), vec!["Delay", "SamplingRate"]);
        assert!(matches!(
            "IIR".parse::<DataType>(),
            Err(ConventionError::UnknownDataType(_))
        ));
    }
}
