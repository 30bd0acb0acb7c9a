//! Error types for the Hydro block task driver.
//!
//! Organised by subsystem: configuration, slot storage, physics kernels,
//! boundary exchange, and the [`TaskError`] wrapper every task returns.

use thiserror::Error;

use crate::geometry::Side;
use crate::id::BlockId;
use crate::slot::SlotKey;

/// Errors detected while reading or validating parameter input.
///
/// All configuration errors are fatal before the first step runs.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// A parameter the driver cannot run without is absent.
    #[error("required parameter <{block}>/{key} is missing")]
    MissingRequired {
        /// Input block name (e.g. `"hydro"`).
        block: String,
        /// Key within the block (e.g. `"eos"`).
        key: String,
    },
    /// A parameter is present but cannot be used.
    #[error("invalid value '{value}' for <{block}>/{key}: {reason}")]
    InvalidValue {
        /// Input block name.
        block: String,
        /// Key within the block.
        key: String,
        /// The raw value as given.
        value: String,
        /// Why the value was rejected.
        reason: String,
    },
    /// Malformed line in a parameter file.
    #[error("parse error on line {line}: {reason}")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// Description of the problem.
        reason: String,
    },
    /// Integrator coefficients or timestep are unusable.
    #[error("invalid integrator: {reason}")]
    Integrator {
        /// Description of the violated invariant.
        reason: String,
    },
    /// Mesh decomposition is inconsistent.
    #[error("invalid mesh: {reason}")]
    Mesh {
        /// Description of the violated invariant.
        reason: String,
    },
}

/// Errors from the per-block slot store.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SlotError {
    /// The slot has not been created on this block.
    #[error("slot '{0}' does not exist")]
    Missing(SlotKey),
    /// Two slots that must share a shape do not.
    #[error("slot '{key}' has {found} values, expected {expected}")]
    ShapeMismatch {
        /// The offending slot.
        key: SlotKey,
        /// Expected buffer length.
        expected: usize,
        /// Actual buffer length.
        found: usize,
    },
    /// An operation needs two distinct slots but got the same one twice.
    #[error("slot '{0}' cannot be both source and target")]
    Aliased(SlotKey),
}

/// Errors from physics kernels (fluxes, derived fields, timestep).
#[derive(Clone, Debug, PartialEq, Error)]
pub enum KernelError {
    /// A kernel produced NaN or infinity.
    #[error("non-finite value in variable {var} at cell {cell}")]
    NonFinite {
        /// Variable index.
        var: usize,
        /// Storage cell (or face) index.
        cell: usize,
    },
    /// The block's scratch region is too small for the kernel.
    #[error("scratch exhausted: requested {requested} values, {remaining} remaining")]
    ScratchExhausted {
        /// Values requested.
        requested: usize,
        /// Values still available.
        remaining: usize,
    },
    /// The input state cannot be processed (e.g. too few ghost cells).
    #[error("invalid kernel input: {reason}")]
    InvalidInput {
        /// Description of the problem.
        reason: String,
    },
}

/// Errors from the ghost-cell exchange protocol.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ExchangeError {
    /// `send` targeted a slot whose receiver never ran `start-receive`.
    #[error("block {block} slot '{slot}' is not armed to receive on its {side:?} face")]
    NotArmed {
        /// The receiving block.
        block: BlockId,
        /// Face of the receiving block.
        side: Side,
        /// Slot being exchanged.
        slot: SlotKey,
    },
    /// Neighbour data did not arrive in time.
    #[error("block {block} timed out waiting for '{slot}' on its {side:?} face")]
    Timeout {
        /// The waiting block.
        block: BlockId,
        /// Face being waited on.
        side: Side,
        /// Slot being exchanged.
        slot: SlotKey,
    },
    /// The mailbox was torn down while a block waited on it.
    #[error("mailbox for block {block} disconnected")]
    Disconnected {
        /// The waiting block.
        block: BlockId,
    },
    /// A message for another slot arrived first.
    #[error("block {block} expected '{expected}' but received '{found}'")]
    SlotMismatch {
        /// The receiving block.
        block: BlockId,
        /// Slot being exchanged.
        expected: SlotKey,
        /// Slot carried by the message.
        found: SlotKey,
    },
    /// `set` ran before the matching `receive` completed.
    #[error("block {block} has no received '{slot}' data on its {side:?} face")]
    NotReceived {
        /// The block being filled.
        block: BlockId,
        /// Face with missing data.
        side: Side,
        /// Slot being exchanged.
        slot: SlotKey,
    },
    /// A message length does not match the receiving ghost layer.
    #[error("block {block} received {found} values, expected {expected}")]
    BufferSize {
        /// The receiving block.
        block: BlockId,
        /// Expected length.
        expected: usize,
        /// Received length.
        found: usize,
    },
}

/// Failure of a single task in the task graph.
///
/// Any task error is fatal for the whole step.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum TaskError {
    /// Slot lookup or shape failure.
    #[error(transparent)]
    Slot(#[from] SlotError),
    /// Physics kernel failure.
    #[error(transparent)]
    Kernel(#[from] KernelError),
    /// Boundary exchange failure.
    #[error(transparent)]
    Exchange(#[from] ExchangeError),
    /// A block's lock was poisoned by a panicking task.
    #[error("block {block} is poisoned")]
    BlockPoisoned {
        /// The poisoned block.
        block: BlockId,
    },
}
