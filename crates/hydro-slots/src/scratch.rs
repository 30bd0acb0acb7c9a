//! Per-block scratch memory for flux kernels.
//!
//! The scratch flux variant stages intermediate arrays (primitive
//! states, wave speeds) here instead of recomputing them per face. The
//! bump pointer is reset before each kernel call; the backing
//! allocation lives as long as the block.

use hydro_core::Real;

/// Bump-allocated scratch region reset between kernel calls.
#[derive(Clone, Debug, Default)]
pub struct ScratchRegion {
    buf: Vec<Real>,
    offset: usize,
}

impl ScratchRegion {
    /// Create a scratch region holding `capacity` values.
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: vec![0.0; capacity],
            offset: 0,
        }
    }

    /// Grow the backing storage to at least `capacity` values.
    ///
    /// Never shrinks. Only called between kernel invocations.
    pub fn reserve_total(&mut self, capacity: usize) {
        if capacity > self.buf.len() {
            self.buf.resize(capacity, 0.0);
        }
    }

    /// Allocate `count` contiguous values, zero-initialised.
    ///
    /// Returns `None` if insufficient capacity remains.
    pub fn alloc(&mut self, count: usize) -> Option<&mut [Real]> {
        let new_offset = self.offset.checked_add(count)?;
        if new_offset > self.buf.len() {
            return None;
        }
        let start = self.offset;
        self.offset = new_offset;
        self.buf[start..new_offset].fill(0.0);
        Some(&mut self.buf[start..new_offset])
    }

    /// Reset the bump pointer.
    pub fn reset(&mut self) {
        self.offset = 0;
    }

    /// Total capacity in values.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Values used since last reset.
    pub fn used(&self) -> usize {
        self.offset
    }

    /// Remaining available values.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.offset
    }
}
