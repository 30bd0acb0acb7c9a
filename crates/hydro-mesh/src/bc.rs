//! Physical boundary conditions on domain-edge faces.

use hydro_core::{BlockGeometry, Side, SlotKey, TaskError, IM1};
use hydro_slots::StateSlot;

use crate::block::MeshBlock;
use crate::config::BoundaryKind;

/// Fill the ghost cells of `slot` on every physical face of `block`.
///
/// Faces shared with another block are left alone; they are filled by
/// the exchange. Periodic faces never appear here because the mesh turns
/// them into block neighbours.
pub fn apply_boundary_conditions(block: &mut MeshBlock, slot: SlotKey) -> Result<(), TaskError> {
    let geometry = *block.geometry();
    let sides = block.physical_sides();
    let state = block.slots_mut().get_mut(slot)?;
    for (side, kind) in sides {
        match kind {
            BoundaryKind::Outflow => outflow(state, &geometry, side),
            BoundaryKind::Reflecting => reflect(state, &geometry, side),
            BoundaryKind::Periodic => {}
        }
    }
    tracing::trace!(block = %block.id(), %slot, "physical boundaries applied");
    Ok(())
}

fn outflow(state: &mut StateSlot, geometry: &BlockGeometry, side: Side) {
    let edge = match side {
        Side::Inner => geometry.nghost,
        Side::Outer => geometry.nghost + geometry.nx - 1,
    };
    for v in 0..state.nvar() {
        let field = state.var_mut(v);
        let value = field[edge];
        field[geometry.ghosts(side)].fill(value);
    }
}

fn reflect(state: &mut StateSlot, geometry: &BlockGeometry, side: Side) {
    let ng = geometry.nghost;
    let last = ng + geometry.nx - 1;
    for v in 0..state.nvar() {
        let sign = if v == IM1 { -1.0 } else { 1.0 };
        let field = state.var_mut(v);
        for g in geometry.ghosts(side) {
            let mirror = match side {
                Side::Inner => 2 * ng - 1 - g,
                Side::Outer => 2 * last + 1 - g,
            };
            field[g] = sign * field[mirror];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Neighbor;
    use hydro_core::{BlockId, FieldLayout, Packages, Real};
    use std::sync::Arc;

    fn block(inner: Neighbor, outer: Neighbor) -> MeshBlock {
        let geometry = BlockGeometry {
            nx: 4,
            nghost: 2,
            x_min: 0.0,
            dx: 0.25,
        };
        let layout = FieldLayout {
            nvar: 3,
            nderived: 0,
        };
        let mut b = MeshBlock::new(
            BlockId(0),
            geometry,
            [inner, outer],
            layout,
            Arc::new(Packages::new()),
        );
        let base = b.slots_mut().base_mut();
        for v in 0..3 {
            for i in 2..6 {
                base.var_mut(v)[i] = (10 * v + i) as Real;
            }
        }
        b
    }

    #[test]
    fn outflow_copies_edge_cells() {
        let mut b = block(
            Neighbor::Physical(BoundaryKind::Outflow),
            Neighbor::Physical(BoundaryKind::Outflow),
        );
        apply_boundary_conditions(&mut b, SlotKey::Base).unwrap();
        let rho = b.slots().base().var(0);
        assert_eq!(rho, &[2.0, 2.0, 2.0, 3.0, 4.0, 5.0, 5.0, 5.0]);
    }

    #[test]
    fn reflecting_mirrors_and_flips_momentum() {
        let mut b = block(
            Neighbor::Physical(BoundaryKind::Reflecting),
            Neighbor::Physical(BoundaryKind::Reflecting),
        );
        apply_boundary_conditions(&mut b, SlotKey::Base).unwrap();
        let base = b.slots().base();
        assert_eq!(base.var(0), &[3.0, 2.0, 2.0, 3.0, 4.0, 5.0, 5.0, 4.0]);
        assert_eq!(
            base.var(IM1),
            &[-13.0, -12.0, 12.0, 13.0, 14.0, 15.0, -15.0, -14.0]
        );
    }

    #[test]
    fn block_faces_are_left_alone() {
        let mut b = block(
            Neighbor::Block(BlockId(1)),
            Neighbor::Physical(BoundaryKind::Outflow),
        );
        apply_boundary_conditions(&mut b, SlotKey::Base).unwrap();
        let rho = b.slots().base().var(0);
        assert_eq!(&rho[0..2], &[0.0, 0.0]);
        assert_eq!(&rho[6..8], &[5.0, 5.0]);
    }

    #[test]
    fn missing_slot_is_an_error() {
        let mut b = block(
            Neighbor::Physical(BoundaryKind::Outflow),
            Neighbor::Physical(BoundaryKind::Outflow),
        );
        assert!(matches!(
            apply_boundary_conditions(&mut b, SlotKey::Stage(1)),
            Err(TaskError::Slot(_))
        ));
    }
}
