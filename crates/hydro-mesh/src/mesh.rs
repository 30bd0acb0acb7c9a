//! The block list and its topology.

use std::sync::{Arc, Mutex};

use hydro_core::{BlockGeometry, BlockId, ConfigError, FieldLayout, Packages, TaskError};

use crate::block::{lock_block, BlockHandle, BlockList, MeshBlock, Neighbor};
use crate::config::{BoundaryKind, MeshConfig};
use crate::exchange::BoundaryMailbox;

/// A one-dimensional mesh split into equally sized blocks.
///
/// Blocks are ordered by x1; block `b` neighbours `b - 1` on its inner
/// face and `b + 1` on its outer face. With periodic boundaries the
/// first and last blocks are joined, so a single periodic block is its
/// own neighbour on both faces.
#[derive(Debug)]
pub struct Mesh {
    config: MeshConfig,
    layout: FieldLayout,
    blocks: BlockList,
    mailbox: Arc<BoundaryMailbox>,
    packages: Arc<Packages>,
}

impl Mesh {
    /// Validate `config` and build every block with a zeroed base slot.
    pub fn new(
        config: MeshConfig,
        layout: FieldLayout,
        packages: Arc<Packages>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        if layout.nvar == 0 {
            return Err(ConfigError::Mesh {
                reason: "field layout has no conserved variables".into(),
            });
        }
        let nblocks = config.nblocks();
        let dx = config.dx();
        let blocks = (0..nblocks)
            .map(|b| {
                let geometry = BlockGeometry {
                    nx: config.block_nx,
                    nghost: config.nghost,
                    x_min: config.x_min + (b * config.block_nx) as f64 * dx,
                    dx,
                };
                let neighbors = [
                    inner_neighbor(&config, b),
                    outer_neighbor(&config, b, nblocks),
                ];
                let id = BlockId(b as u32);
                Arc::new(Mutex::new(MeshBlock::new(
                    id,
                    geometry,
                    neighbors,
                    layout,
                    Arc::clone(&packages),
                )))
            })
            .collect();
        tracing::debug!(
            nblocks,
            nx = config.nx,
            nghost = config.nghost,
            inner = %config.inner_bc,
            outer = %config.outer_bc,
            "mesh built"
        );
        Ok(Self {
            mailbox: Arc::new(BoundaryMailbox::new(nblocks)),
            config,
            layout,
            blocks,
            packages,
        })
    }

    /// Mesh configuration.
    pub fn config(&self) -> &MeshConfig {
        &self.config
    }

    /// Field layout shared by every block.
    pub fn layout(&self) -> FieldLayout {
        self.layout
    }

    /// Ordered block list.
    pub fn blocks(&self) -> &BlockList {
        &self.blocks
    }

    /// Handle for one block.
    pub fn block(&self, id: BlockId) -> Option<&BlockHandle> {
        self.blocks.get(id.index())
    }

    /// Number of blocks.
    pub fn nblocks(&self) -> usize {
        self.blocks.len()
    }

    /// Ghost-exchange mailbox.
    pub fn mailbox(&self) -> &Arc<BoundaryMailbox> {
        &self.mailbox
    }

    /// Package table.
    pub fn packages(&self) -> &Arc<Packages> {
        &self.packages
    }

    /// Run `f` on every block in order, stopping at the first error.
    pub fn for_each_block<F>(&self, mut f: F) -> Result<(), TaskError>
    where
        F: FnMut(&mut MeshBlock) -> Result<(), TaskError>,
    {
        for handle in &self.blocks {
            let mut block = lock_block(handle)?;
            f(&mut block)?;
        }
        Ok(())
    }
}

fn inner_neighbor(config: &MeshConfig, b: usize) -> Neighbor {
    match (b, config.inner_bc) {
        (0, BoundaryKind::Periodic) => Neighbor::Block(BlockId((config.nblocks() - 1) as u32)),
        (0, kind) => Neighbor::Physical(kind),
        (b, _) => Neighbor::Block(BlockId((b - 1) as u32)),
    }
}

fn outer_neighbor(config: &MeshConfig, b: usize, nblocks: usize) -> Neighbor {
    if b + 1 < nblocks {
        return Neighbor::Block(BlockId((b + 1) as u32));
    }
    match config.outer_bc {
        BoundaryKind::Periodic => Neighbor::Block(BlockId(0)),
        kind => Neighbor::Physical(kind),
    }
}
