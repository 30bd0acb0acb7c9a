//! A single mesh block and its shared handle.

use std::sync::{Arc, Mutex, MutexGuard};

use smallvec::SmallVec;

use hydro_core::{BlockGeometry, BlockId, FieldLayout, Packages, Real, Side, TaskError};
use hydro_slots::{ScratchRegion, SlotStore, StateSlot};

use crate::config::BoundaryKind;

/// What lies beyond one face of a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Neighbor {
    /// Another block; ghost data comes from the exchange.
    Block(BlockId),
    /// The domain edge; ghost data comes from a boundary condition.
    Physical(BoundaryKind),
}

/// Shared handle to a block.
pub type BlockHandle = Arc<Mutex<MeshBlock>>;

/// Ordered block list.
pub type BlockList = Vec<BlockHandle>;

/// Lock a block, mapping a poisoned lock to [`TaskError::BlockPoisoned`].
pub fn lock_block(handle: &BlockHandle) -> Result<MutexGuard<'_, MeshBlock>, TaskError> {
    handle.lock().map_err(|e| TaskError::BlockPoisoned {
        block: e.get_ref().id(),
    })
}

/// Lock a block and run `f` on it.
pub fn with_block<R, F>(handle: &BlockHandle, f: F) -> Result<R, TaskError>
where
    F: FnOnce(&mut MeshBlock) -> Result<R, TaskError>,
{
    let mut block = lock_block(handle)?;
    f(&mut block)
}

/// One spatial subdomain of the mesh.
///
/// Owns its state slots, its scratch memory and its timestep estimate.
/// The block list (and therefore block lifetime) belongs to [`Mesh`](crate::Mesh).
#[derive(Debug)]
pub struct MeshBlock {
    id: BlockId,
    geometry: BlockGeometry,
    neighbors: [Neighbor; 2],
    slots: SlotStore,
    scratch: ScratchRegion,
    packages: Arc<Packages>,
    new_dt: Option<Real>,
}

impl MeshBlock {
    /// Create a block with a zero-filled base slot.
    pub fn new(
        id: BlockId,
        geometry: BlockGeometry,
        neighbors: [Neighbor; 2],
        layout: FieldLayout,
        packages: Arc<Packages>,
    ) -> Self {
        Self {
            id,
            geometry,
            neighbors,
            slots: SlotStore::new(StateSlot::new(layout, &geometry)),
            scratch: ScratchRegion::default(),
            packages,
            new_dt: None,
        }
    }

    /// Block id.
    pub fn id(&self) -> BlockId {
        self.id
    }

    /// Cell geometry.
    pub fn geometry(&self) -> &BlockGeometry {
        &self.geometry
    }

    /// What lies beyond `side`.
    pub fn neighbor(&self, side: Side) -> Neighbor {
        self.neighbors[side.index()]
    }

    /// Faces shared with another block, inner first.
    pub fn block_neighbors(&self) -> SmallVec<[(Side, BlockId); 2]> {
        Side::ALL
            .into_iter()
            .filter_map(|side| match self.neighbor(side) {
                Neighbor::Block(id) => Some((side, id)),
                Neighbor::Physical(_) => None,
            })
            .collect()
    }

    /// Faces on the domain edge, inner first.
    pub fn physical_sides(&self) -> SmallVec<[(Side, BoundaryKind); 2]> {
        Side::ALL
            .into_iter()
            .filter_map(|side| match self.neighbor(side) {
                Neighbor::Physical(kind) => Some((side, kind)),
                Neighbor::Block(_) => None,
            })
            .collect()
    }

    /// State slots.
    pub fn slots(&self) -> &SlotStore {
        &self.slots
    }

    /// Mutable state slots.
    pub fn slots_mut(&mut self) -> &mut SlotStore {
        &mut self.slots
    }

    /// Slots, scratch and geometry borrowed together for a flux kernel.
    pub fn kernel_parts(&mut self) -> (&mut SlotStore, &mut ScratchRegion, &BlockGeometry) {
        (&mut self.slots, &mut self.scratch, &self.geometry)
    }

    /// Package table shared with every other block.
    pub fn packages(&self) -> &Packages {
        &self.packages
    }

    /// Record this block's candidate timestep.
    pub fn set_block_timestep(&mut self, dt: Real) {
        self.new_dt = Some(dt);
    }

    /// Candidate timestep recorded since the last take.
    pub fn block_timestep(&self) -> Option<Real> {
        self.new_dt
    }

    /// Take the candidate timestep, leaving none recorded.
    pub fn take_block_timestep(&mut self) -> Option<Real> {
        self.new_dt.take()
    }
}
