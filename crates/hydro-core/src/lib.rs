//! Core types and traits for the Hydro block task driver.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by every other crate in the workspace: block
//! and slot identifiers, block geometry, parameter input, package
//! descriptors, and the error types for each subsystem.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod geometry;
pub mod id;
pub mod params;
pub mod slot;

pub use error::{ConfigError, ExchangeError, KernelError, SlotError, TaskError};
pub use geometry::{BlockGeometry, FieldLayout, Side, IDN, IEN, IM1, NHYDRO};
pub use id::BlockId;
pub use params::{Packages, ParamValue, ParameterInput, StateDescriptor};
pub use slot::SlotKey;

/// Floating-point type used for all field data.
pub type Real = f64;
