//! # sofa
//!
//! Sessions over SOFA datasets: create a file following a convention,
//! declare its spatial objects and measurement data, query poses and
//! relative coordinates, and save it back.
//!
//! The lower layers are re-exported as [`format`], [`spatial`] and
//! [`conventions`].
//!
//! ## Example
//! ```rust
//! use sofa::conventions::ConventionRegistry;
//! use sofa::spatial::{Descriptor, ObjectKind, Query};
//! use sofa::Database;
//!
//! let registry = ConventionRegistry::with_builtin();
//! let mut db = Database::create("hrtf.sofa", &registry, "SimpleFreeFieldHRIR", 2).unwrap();
//! db.initialize_object(
//!     ObjectKind::Listener,
//!     &[Descriptor::Position, Descriptor::View, Descriptor::Up],
//!     &[],
//!     None,
//! )
//! .unwrap();
//! db.initialize_object(ObjectKind::Receiver, &[Descriptor::Position], &[], Some(2))
//!     .unwrap();
//!
//! let ears = db
//!     .global_values(ObjectKind::Receiver, Descriptor::Position, &Query::new())
//!     .unwrap();
//! assert_eq!(ears.shape(), &[2, 3, 1]);
//! ```

pub mod database;
pub mod error;

pub use database::{AccessMode, Database, TIMESTAMP_FORMAT};
pub use error::{Result, SofaError};

pub use sofa_conventions as conventions;
pub use sofa_format as format;
pub use sofa_spatial as spatial;
