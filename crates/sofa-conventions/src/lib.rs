//! # sofa-conventions
//!
//! Conventions fix which spatial objects and data variables a SOFA dataset
//! holds, the counts they may take, and the values they start from.
//!
//! - **[`rule`]**: named structural rules and rule sets, with every failing
//!   rule reported at once.
//! - **[`convention`]**: a rule set plus default poses, counts, data values
//!   and metadata.
//! - **[`catalog`]**: the built-in conventions.
//! - **[`registry`]**: name lookup and the fallback used when opening a
//!   dataset.
//! - **[`datatype`]** and **[`room`]**: data variable and room layouts.
//!
//! ## Example
//! ```rust
//! use sofa_conventions::{ConventionRegistry, ObjectSettings};
//! use sofa_spatial::{Descriptor, ObjectKind};
//!
//! let registry = ConventionRegistry::with_builtin();
//! let hrir = registry.get("SimpleFreeFieldHRIR").unwrap();
//!
//! let emitters = ObjectSettings::new(ObjectKind::Emitter, 2).with_fixed(&[Descriptor::Position]);
//! let err = hrir.validate(&emitters).unwrap_err();
//! assert!(err.to_string().contains("Emitter count == 1"));
//! ```

pub mod catalog;
pub mod convention;
pub mod datatype;
pub mod error;
pub mod registry;
pub mod room;
pub mod rule;

pub use convention::{Convention, ObjectDefaults};
pub use datatype::{DataType, DataVariable};
pub use error::{ConventionError, Result};
pub use registry::{ConventionRegistry, FALLBACK_CONVENTION};
pub use room::RoomType;
pub use rule::{ObjectSettings, Rule, RuleKind, RuleSet};
