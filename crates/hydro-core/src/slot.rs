//! Stable keys for the per-block state slots.

use std::fmt;

/// Name of a state slot held by a block.
///
/// `Base` is the block's current solution. `Stage(s)` holds the
/// intermediate result of integration stage `s`. `RateOfChange` holds
/// `dU/dt`, the negated flux divergence, and is shared by all stages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SlotKey {
    /// The block's current state.
    Base,
    /// Intermediate state written by stage `s` (`1 <= s < nstages`).
    Stage(u32),
    /// `dU/dt` for the stage being computed.
    RateOfChange,
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base => write!(f, "base"),
            Self::Stage(s) => write!(f, "stage{s}"),
            Self::RateOfChange => write!(f, "dUdt"),
        }
    }
}
