//! The [`FluxKernel`] trait and its two execution variants.

use hydro_core::{BlockGeometry, KernelError};
use hydro_slots::{ScratchRegion, StateSlot};

/// Stage information passed to a flux kernel.
#[derive(Clone, Copy, Debug)]
pub struct FluxContext<'a> {
    geometry: &'a BlockGeometry,
    stage: usize,
    nstages: usize,
}

impl<'a> FluxContext<'a> {
    /// Context for stage `stage` (1-based) of `nstages`.
    pub fn new(geometry: &'a BlockGeometry, stage: usize, nstages: usize) -> Self {
        Self {
            geometry,
            stage,
            nstages,
        }
    }

    /// Block geometry.
    pub fn geometry(&self) -> &BlockGeometry {
        self.geometry
    }

    /// Current stage, 1-based.
    pub fn stage(&self) -> usize {
        self.stage
    }

    /// Number of stages in the step.
    pub fn nstages(&self) -> usize {
        self.nstages
    }

    /// Whether this is a predictor stage of a multi-stage scheme.
    pub fn is_predictor(&self) -> bool {
        self.nstages > 1 && self.stage < self.nstages
    }
}

/// Computes x1 face fluxes of one block from one state slot.
///
/// # Contract
///
/// - Reads conserved data (ghosts included) of `slot` and writes
///   `slot`'s flux buffer for every face `0..=nx`.
/// - Pure per-block function: no access to other blocks.
/// - Both variants must produce identical fluxes; the scratch variant
///   only changes where intermediates live.
///
/// # Examples
///
/// A kernel that assigns a constant flux, which has zero divergence:
///
/// ```
/// use hydro_core::KernelError;
/// use hydro_kernel::{FluxContext, FluxKernel};
/// use hydro_slots::StateSlot;
///
/// struct Uniform(f64);
///
/// impl FluxKernel for Uniform {
///     fn name(&self) -> &str { "uniform" }
///     fn nvar(&self) -> usize { 1 }
///     fn calculate_fluxes(
///         &self,
///         slot: &mut StateSlot,
///         _ctx: &FluxContext<'_>,
///     ) -> Result<(), KernelError> {
///         slot.fluxes_mut().fill(self.0);
///         Ok(())
///     }
/// }
///
/// assert_eq!(Uniform(1.0).scratch_len(&hydro_core::BlockGeometry {
///     nx: 8, nghost: 2, x_min: 0.0, dx: 0.1,
/// }), 0);
/// ```
pub trait FluxKernel: Send + Sync + 'static {
    /// Human-readable name for logs and errors.
    fn name(&self) -> &str;

    /// Number of conserved variables the kernel evolves.
    fn nvar(&self) -> usize;

    /// Scratch values needed by the scratch variant on `geometry`.
    fn scratch_len(&self, _geometry: &BlockGeometry) -> usize {
        0
    }

    /// Direct variant: compute fluxes without scratch memory.
    fn calculate_fluxes(&self, slot: &mut StateSlot, ctx: &FluxContext<'_>)
        -> Result<(), KernelError>;

    /// Scratch variant. Defaults to the direct variant.
    fn calculate_fluxes_with_scratch(
        &self,
        slot: &mut StateSlot,
        ctx: &FluxContext<'_>,
        _scratch: &mut ScratchRegion,
    ) -> Result<(), KernelError> {
        self.calculate_fluxes(slot, ctx)
    }
}

/// Which flux variant a block runs, fixed when the task graph is built.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KernelVariant {
    /// [`FluxKernel::calculate_fluxes`].
    Direct,
    /// [`FluxKernel::calculate_fluxes_with_scratch`].
    Scratch,
}

impl KernelVariant {
    /// Select from the package's `use_scratch` flag.
    pub fn from_use_scratch(use_scratch: bool) -> Self {
        if use_scratch {
            Self::Scratch
        } else {
            Self::Direct
        }
    }

    /// Run `kernel` in this variant.
    ///
    /// The scratch region is reset and grown to the kernel's declared
    /// requirement before the scratch variant runs.
    pub fn run(
        self,
        kernel: &dyn FluxKernel,
        slot: &mut StateSlot,
        ctx: &FluxContext<'_>,
        scratch: &mut ScratchRegion,
    ) -> Result<(), KernelError> {
        match self {
            Self::Direct => kernel.calculate_fluxes(slot, ctx),
            Self::Scratch => {
                scratch.reset();
                scratch.reserve_total(kernel.scratch_len(ctx.geometry()));
                kernel.calculate_fluxes_with_scratch(slot, ctx, scratch)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hydro_core::FieldLayout;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Writes 1.0 directly, 2.0 through scratch.
    struct Marker {
        direct: AtomicUsize,
        scratch: AtomicUsize,
    }

    impl FluxKernel for Marker {
        fn name(&self) -> &str {
            "marker"
        }
        fn nvar(&self) -> usize {
            1
        }
        fn scratch_len(&self, geometry: &BlockGeometry) -> usize {
            geometry.ncells_total()
        }
        fn calculate_fluxes(
            &self,
            slot: &mut StateSlot,
            _ctx: &FluxContext<'_>,
        ) -> Result<(), KernelError> {
            self.direct.fetch_add(1, Ordering::Relaxed);
            slot.fluxes_mut().fill(1.0);
            Ok(())
        }
        fn calculate_fluxes_with_scratch(
            &self,
            slot: &mut StateSlot,
            ctx: &FluxContext<'_>,
            scratch: &mut ScratchRegion,
        ) -> Result<(), KernelError> {
            self.scratch.fetch_add(1, Ordering::Relaxed);
            let n = ctx.geometry().ncells_total();
            let remaining = scratch.remaining();
            scratch
                .alloc(n)
                .ok_or(KernelError::ScratchExhausted {
                    requested: n,
                    remaining,
                })?
                .fill(2.0);
            slot.fluxes_mut().fill(2.0);
            Ok(())
        }
    }

    fn geom() -> BlockGeometry {
        BlockGeometry {
            nx: 4,
            nghost: 2,
            x_min: 0.0,
            dx: 0.25,
        }
    }

    #[test]
    fn variant_selects_entry_point() {
        let k = Marker {
            direct: AtomicUsize::new(0),
            scratch: AtomicUsize::new(0),
        };
        let g = geom();
        let ctx = FluxContext::new(&g, 1, 2);
        let mut slot = StateSlot::new(FieldLayout { nvar: 1, nderived: 0 }, &g);
        let mut scratch = ScratchRegion::default();

        KernelVariant::from_use_scratch(false)
            .run(&k, &mut slot, &ctx, &mut scratch)
            .unwrap();
        assert!(slot.fluxes().iter().all(|&f| f == 1.0));

        KernelVariant::from_use_scratch(true)
            .run(&k, &mut slot, &ctx, &mut scratch)
            .unwrap();
        assert!(slot.fluxes().iter().all(|&f| f == 2.0));
        assert_eq!(k.direct.load(Ordering::Relaxed), 1);
        assert_eq!(k.scratch.load(Ordering::Relaxed), 1);
        // Scratch was grown to the declared requirement.
        assert_eq!(scratch.capacity(), g.ncells_total());
    }

    #[test]
    fn predictor_stage_detection() {
        let g = geom();
        assert!(FluxContext::new(&g, 1, 2).is_predictor());
        assert!(!FluxContext::new(&g, 2, 2).is_predictor());
        assert!(!FluxContext::new(&g, 1, 1).is_predictor());
    }
}
