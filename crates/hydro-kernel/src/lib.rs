//! Physics kernel traits for Hydro.
//!
//! The task driver never computes physics itself. It calls three
//! collaborators through the traits defined here:
//!
//! - [`FluxKernel`]: face fluxes of one block from one state slot, in a
//!   direct or a scratch-memory variant ([`KernelVariant`]).
//! - [`DerivedFields`]: auxiliary fields recomputed after each stage.
//! - [`TimestepEstimator`]: the block's stability-limited timestep.
//!
//! [`Physics`] bundles one of each for the driver.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod derived;
pub mod flux;
pub mod guard;
pub mod timestep;

use std::sync::Arc;

use hydro_core::FieldLayout;

pub use derived::DerivedFields;
pub use flux::{FluxContext, FluxKernel, KernelVariant};
pub use guard::ensure_finite;
pub use timestep::TimestepEstimator;

/// The set of physics collaborators a driver runs with.
#[derive(Clone)]
pub struct Physics {
    /// Face flux computation.
    pub flux: Arc<dyn FluxKernel>,
    /// Derived-field recomputation.
    pub derived: Arc<dyn DerivedFields>,
    /// Per-block timestep estimation.
    pub timestep: Arc<dyn TimestepEstimator>,
}

impl Physics {
    /// Bundle three kernels.
    pub fn new(
        flux: Arc<dyn FluxKernel>,
        derived: Arc<dyn DerivedFields>,
        timestep: Arc<dyn TimestepEstimator>,
    ) -> Self {
        Self {
            flux,
            derived,
            timestep,
        }
    }

    /// Storage layout these kernels expect on every slot.
    pub fn layout(&self) -> FieldLayout {
        FieldLayout {
            nvar: self.flux.nvar(),
            nderived: self.derived.nderived(),
        }
    }
}

impl std::fmt::Debug for Physics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Physics")
            .field("flux", &self.flux.name())
            .field("derived", &self.derived.name())
            .field("timestep", &self.timestep.name())
            .finish()
    }
}
