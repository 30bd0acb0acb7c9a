//! Derived-field recomputation.

use hydro_core::{BlockGeometry, KernelError};
use hydro_slots::StateSlot;

/// Recomputes auxiliary (non-evolved) fields from conserved data.
///
/// Called once per block per stage, after physical boundary conditions,
/// so ghost cells hold valid data and may be included.
pub trait DerivedFields: Send + Sync + 'static {
    /// Human-readable name for logs and errors.
    fn name(&self) -> &str;

    /// Number of derived variables written into each slot.
    fn nderived(&self) -> usize;

    /// Overwrite `slot`'s derived buffer from its conserved buffer.
    fn fill_derived(&self, slot: &mut StateSlot, geometry: &BlockGeometry)
        -> Result<(), KernelError>;
}
