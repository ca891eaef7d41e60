//! # sofa-spatial
//!
//! Coordinate handling for the spatial objects of a SOFA dataset.
//!
//! ## Architecture
//!
//! - **[`object`]**: The four objects (Listener, Source, Receiver, Emitter),
//!   their anchors and the layout of their `Position`/`View`/`Up` variables.
//! - **[`coordinates`]**: Cartesian and spherical systems, angle units and
//!   whole-array conversion.
//! - **[`rotation`]**: Orientation matrices from view/up pairs.
//! - **[`variable`]**: [`Coordinates`], a typed handle on one coordinate
//!   variable, and the [`Query`] options for reading it.
//! - **[`frame`]**: Global poses and values expressed relative to another
//!   object.
//!
//! ## Example
//! ```rust
//! use ndarray::arr1;
//! use sofa_format::{Axis, Dataset, Selection};
//! use sofa_spatial::{Coordinates, Descriptor, ObjectKind, Query};
//!
//! let mut ds = Dataset::new();
//! ds.create_dimension(Axis::I, 1).unwrap();
//! ds.create_dimension(Axis::C, 3).unwrap();
//! ds.create_dimension(Axis::M, 1).unwrap();
//! ds.create_dimension(Axis::R, 1).unwrap();
//!
//! let listener = Coordinates::new(ObjectKind::Listener, Descriptor::Position);
//! listener.initialize(&mut ds, false).unwrap();
//! listener
//!     .set_values(
//!         &mut ds,
//!         arr1(&[1.0, 0.0, 0.0]).into_dyn().view(),
//!         &Selection::new(),
//!         Some(&[Axis::C]),
//!         &[Axis::I],
//!         None,
//!         None,
//!     )
//!     .unwrap();
//!
//! let ear = Coordinates::new(ObjectKind::Receiver, Descriptor::Position);
//! ear.initialize(&mut ds, false).unwrap();
//! let global = ear
//!     .global_values(&ds, &Query::new().with_dim_order(&[Axis::R, Axis::M, Axis::C]))
//!     .unwrap();
//! assert_eq!(global[[0, 0, 0]], 1.0);
//! ```

pub mod coordinates;
pub mod error;
pub mod frame;
pub mod object;
pub mod rotation;
pub mod variable;

pub use coordinates::{AngleUnit, Representation, System};
pub use error::{Result, SpatialError};
pub use frame::{pose, relative_values, Pose};
pub use object::{Descriptor, ObjectKind};
pub use rotation::{rotation_from_view_up, Frame};
pub use variable::{Coordinates, Query};
