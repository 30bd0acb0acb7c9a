//! Block decomposition, ghost-cell exchange and physical boundary
//! conditions for Hydro.
//!
//! The [`Mesh`] owns the ordered block list. Each [`MeshBlock`] sits
//! behind an `Arc<Mutex<_>>` so tasks on different threads can reach it;
//! the lock only makes shared access sound. Which task touches which
//! slot, and when, is decided entirely by the task graph.
//!
//! Ghost data moves through a [`BoundaryMailbox`] in four phases, see
//! [`exchange`]. Faces without a neighbouring block get a physical
//! boundary condition from [`bc`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod bc;
pub mod block;
pub mod config;
pub mod exchange;
pub mod mesh;

pub use bc::apply_boundary_conditions;
pub use block::{lock_block, with_block, BlockHandle, BlockList, MeshBlock, Neighbor};
pub use config::{BoundaryKind, MeshConfig};
pub use exchange::{BoundaryMailbox, GhostMessage};
pub use mesh::Mesh;
