//! Test utilities and mock kernels for Hydro development.
//!
//! Provides mock implementations of the kernel traits
//! ([`FluxKernel`], [`DerivedFields`], [`TimestepEstimator`]) and
//! fixtures in [`fixtures`] for building small meshes and inputs.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::sync::atomic::{AtomicUsize, Ordering};

use hydro_core::{BlockGeometry, KernelError, Real};
use hydro_kernel::{DerivedFields, FluxContext, FluxKernel, TimestepEstimator};
use hydro_slots::{ScratchRegion, StateSlot};

/// Writes zero flux on every face, so the divergence is zero everywhere.
pub struct ZeroFluxKernel {
    nvar: usize,
}

impl ZeroFluxKernel {
    pub fn new(nvar: usize) -> Self {
        Self { nvar }
    }
}

impl FluxKernel for ZeroFluxKernel {
    fn name(&self) -> &str {
        "zero-flux"
    }

    fn nvar(&self) -> usize {
        self.nvar
    }

    fn calculate_fluxes(
        &self,
        slot: &mut StateSlot,
        _ctx: &FluxContext<'_>,
    ) -> Result<(), KernelError> {
        slot.fluxes_mut().fill(0.0);
        Ok(())
    }
}

/// Zero-flux kernel that counts invocations of each variant.
///
/// The scratch variant claims `ncells` values so tests can observe that
/// the scratch region was sized before the call.
pub struct CountingKernel {
    nvar: usize,
    direct: AtomicUsize,
    scratch: AtomicUsize,
}

impl CountingKernel {
    pub fn new(nvar: usize) -> Self {
        Self {
            nvar,
            direct: AtomicUsize::new(0),
            scratch: AtomicUsize::new(0),
        }
    }

    pub fn direct_calls(&self) -> usize {
        self.direct.load(Ordering::SeqCst)
    }

    pub fn scratch_calls(&self) -> usize {
        self.scratch.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.direct_calls() + self.scratch_calls()
    }
}

impl FluxKernel for CountingKernel {
    fn name(&self) -> &str {
        "counting"
    }

    fn nvar(&self) -> usize {
        self.nvar
    }

    fn scratch_len(&self, geometry: &BlockGeometry) -> usize {
        geometry.ncells_total()
    }

    fn calculate_fluxes(
        &self,
        slot: &mut StateSlot,
        _ctx: &FluxContext<'_>,
    ) -> Result<(), KernelError> {
        self.direct.fetch_add(1, Ordering::SeqCst);
        slot.fluxes_mut().fill(0.0);
        Ok(())
    }

    fn calculate_fluxes_with_scratch(
        &self,
        slot: &mut StateSlot,
        ctx: &FluxContext<'_>,
        scratch: &mut ScratchRegion,
    ) -> Result<(), KernelError> {
        self.scratch.fetch_add(1, Ordering::SeqCst);
        let requested = ctx.geometry().ncells_total();
        let remaining = scratch.remaining();
        scratch
            .alloc(requested)
            .ok_or(KernelError::ScratchExhausted {
                requested,
                remaining,
            })?;
        slot.fluxes_mut().fill(0.0);
        Ok(())
    }
}

/// Always fails with [`KernelError::InvalidInput`].
pub struct FailingKernel {
    nvar: usize,
}

impl FailingKernel {
    pub fn new(nvar: usize) -> Self {
        Self { nvar }
    }
}

impl FluxKernel for FailingKernel {
    fn name(&self) -> &str {
        "failing"
    }

    fn nvar(&self) -> usize {
        self.nvar
    }

    fn calculate_fluxes(
        &self,
        _slot: &mut StateSlot,
        _ctx: &FluxContext<'_>,
    ) -> Result<(), KernelError> {
        Err(KernelError::InvalidInput {
            reason: "failing kernel".into(),
        })
    }
}

/// Leaves derived fields untouched.
pub struct NoopDerived {
    nderived: usize,
}

impl NoopDerived {
    pub fn new(nderived: usize) -> Self {
        Self { nderived }
    }
}

impl DerivedFields for NoopDerived {
    fn name(&self) -> &str {
        "noop"
    }

    fn nderived(&self) -> usize {
        self.nderived
    }

    fn fill_derived(
        &self,
        _slot: &mut StateSlot,
        _geometry: &BlockGeometry,
    ) -> Result<(), KernelError> {
        Ok(())
    }
}

/// Returns the same timestep for every block and counts calls.
pub struct ConstTimestep {
    dt: Real,
    calls: AtomicUsize,
}

impl ConstTimestep {
    pub fn new(dt: Real) -> Self {
        Self {
            dt,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TimestepEstimator for ConstTimestep {
    fn name(&self) -> &str {
        "const"
    }

    fn estimate_timestep(
        &self,
        _slot: &StateSlot,
        _geometry: &BlockGeometry,
    ) -> Result<Real, KernelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.dt)
    }
}
