//! Mesh-wide reduction of per-block timestep estimates.

use hydro_core::{Real, TaskError};
use hydro_mesh::{lock_block, BlockHandle};

/// Combines the estimates recorded on each block into the next `dt`.
pub trait TimestepReduction: Send + Sync {
    /// Take every block's estimate and reduce them.
    ///
    /// Returns `None` when no block recorded an estimate. Estimates are
    /// cleared so a stale value never feeds a later step.
    fn reduce(&self, blocks: &[BlockHandle]) -> Result<Option<Real>, TaskError>;
}

/// Minimum over blocks.
#[derive(Clone, Copy, Debug, Default)]
pub struct MinReduction;

impl TimestepReduction for MinReduction {
    fn reduce(&self, blocks: &[BlockHandle]) -> Result<Option<Real>, TaskError> {
        let mut min: Option<Real> = None;
        for handle in blocks {
            if let Some(dt) = lock_block(handle)?.take_block_timestep() {
                min = Some(min.map_or(dt, |m| m.min(dt)));
            }
        }
        Ok(min)
    }
}
