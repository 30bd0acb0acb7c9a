//! Per-block timestep estimation.

use hydro_core::{BlockGeometry, KernelError, Real};
use hydro_slots::StateSlot;

/// Derives a stability-limited candidate `dt` for one block.
///
/// Runs on the final stage only, after derived fields are filled. The
/// result is recorded on the block; reducing it to a step-wide `dt` is
/// the caller's concern.
pub trait TimestepEstimator: Send + Sync + 'static {
    /// Human-readable name for logs and errors.
    fn name(&self) -> &str;

    /// Candidate timestep for this block. Must be positive.
    fn estimate_timestep(&self, slot: &StateSlot, geometry: &BlockGeometry)
        -> Result<Real, KernelError>;
}
