//! Reference Euler physics for the Hydro task driver.
//!
//! Everything here is a collaborator: the driver only sees the
//! [`FluxKernel`](hydro_kernel::FluxKernel),
//! [`DerivedFields`](hydro_kernel::DerivedFields) and
//! [`TimestepEstimator`](hydro_kernel::TimestepEstimator) traits.
//!
//! - [`eos`]: adiabatic and isothermal equations of state with floors.
//! - [`RusanovFlux`]: local Lax-Friedrichs fluxes, donor-cell or PLM.
//! - [`PrimitiveRecovery`]: derived `[rho, v, p]` fields.
//! - [`CflTimestep`]: per-block stability limit.
//! - [`Problem`]: initial conditions.
//! - [`HydroPackage`]: reads `<hydro>` and wires the above together.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod cfl;
pub mod eos;
pub mod package;
pub mod pgen;
pub mod recovery;
pub mod rusanov;

pub use cfl::CflTimestep;
pub use eos::{AdiabaticGas, EquationOfState, Floors, IsothermalGas, State};
pub use package::{HydroPackage, PACKAGE};
pub use pgen::Problem;
pub use recovery::PrimitiveRecovery;
pub use rusanov::{Reconstruction, RusanovFlux};
