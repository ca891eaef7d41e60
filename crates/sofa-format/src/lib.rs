//! # sofa-format
//!
//! Named-dimension datasets for spatially oriented acoustic measurements,
//! and the chunked container used to persist them.
//!
//! ## Data model
//!
//! A [`Dataset`] holds:
//! - **Dimensions**: sizes of the named axes `I`, `C`, `M`, `R`, `E`, `N`, `S`
//! - **Variables**: `f64` arrays laid out over those axes, with `Type` and
//!   `Units` style string attributes
//! - **Metadata**: global string attributes such as `SOFAConventions`
//!
//! Values are read and written by axis name through a [`Selection`], with
//! the scalar axis `I` standing in for the measurement axis `M`.
//!
//! ## Example
//! ```rust
//! use ndarray::arr1;
//! use sofa_format::{Axis, Dataset, Selection};
//!
//! let mut ds = Dataset::new();
//! ds.create_dimension(Axis::I, 1).unwrap();
//! ds.create_dimension(Axis::C, 3).unwrap();
//! ds.create_dimension(Axis::M, 4).unwrap();
//! ds.create_variable("ListenerView", &[Axis::I, Axis::C]).unwrap();
//! ds.set_values(
//!     "ListenerView",
//!     arr1(&[1.0, 0.0, 0.0]).into_dyn().view(),
//!     &Selection::new(),
//!     Some(&[Axis::C]),
//!     &[Axis::M],
//! )
//! .unwrap();
//! let per_measurement = ds
//!     .get_values("ListenerView", &Selection::new(), Some(&[Axis::M, Axis::C]))
//!     .unwrap();
//! assert_eq!(per_measurement.shape(), &[4, 3]);
//! ```

pub mod access;
pub mod axis;
pub mod chunk;
pub mod dataset;
pub mod dimension;
pub mod error;
pub mod header;
pub mod metadata;
pub mod reader;
pub mod variable;
pub mod writer;

pub use access::{Index, Selection};
pub use axis::Axis;
pub use chunk::{ChunkEntry, ChunkType};
pub use dataset::Dataset;
pub use dimension::Dimensions;
pub use error::{FormatError, Result};
pub use header::SofaHeader;
pub use metadata::{keys, Metadata};
pub use reader::SofaReader;
pub use variable::Variable;
pub use writer::SofaWriter;
