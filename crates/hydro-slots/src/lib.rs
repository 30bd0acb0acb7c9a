//! Per-block state slot storage for Hydro.
//!
//! Each block owns a [`SlotStore`]: an indexed arena of [`StateSlot`]s
//! addressed by [`SlotKey`](hydro_core::SlotKey). Slots are created
//! lazily by cloning the base state on the first stage of a step and are
//! overwritten, not reallocated, on later steps.
//!
//! ```text
//! SlotStore
//! ├── index: SlotKey → position      (IndexMap, insertion ordered)
//! └── slots: Vec<StateSlot>
//!     └── StateSlot
//!         ├── data     nvar × ncells      conserved, ghosts included
//!         ├── fluxes   nvar × (nx + 1)    x1 face fluxes
//!         ├── derived  nderived × ncells  auxiliary fields
//!         └── comm     BoundaryState      in-flight exchange markers
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod scratch;
pub mod slot;
pub mod store;

pub use scratch::ScratchRegion;
pub use slot::{BoundaryState, StateSlot};
pub use store::SlotStore;
