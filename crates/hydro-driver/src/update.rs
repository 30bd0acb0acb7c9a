//! Flux divergence, stage update and the per-block kernel tasks.
//!
//! The mesh-wide functions visit blocks in list order and stop at the
//! first failure. Only interior cells are written; ghost cells of the
//! target are refreshed later by the exchange and boundary conditions.

use hydro_core::{Real, SlotError, SlotKey, TaskError};
use hydro_kernel::{FluxContext, KernelVariant, Physics};
use hydro_mesh::{lock_block, BlockHandle, MeshBlock};

/// `dst = -(F[i+1] - F[i]) / dx` from the fluxes stored on `src`.
pub fn flux_divergence(blocks: &[BlockHandle], src: SlotKey, dst: SlotKey) -> Result<(), TaskError> {
    if src == dst {
        return Err(SlotError::Aliased(dst).into());
    }
    for handle in blocks {
        let mut block = lock_block(handle)?;
        let geometry = *block.geometry();
        block.slots_mut().with_target(dst, |store, out| {
            let input = store.get(src)?;
            check_shape(dst, input.data().len(), out.data().len())?;
            for v in 0..out.nvar() {
                let flux = input.flux(v);
                let rate = out.var_mut(v);
                for (k, i) in geometry.interior().enumerate() {
                    rate[i] = -(flux[k + 1] - flux[k]) / geometry.dx;
                }
            }
            Ok::<(), TaskError>(())
        })??;
    }
    Ok(())
}

/// `dst = src + beta * dt * rate` on interior cells.
///
/// When `src` and `dst` name the same slot the update is done in place.
pub fn update_container(
    blocks: &[BlockHandle],
    src: SlotKey,
    rate: SlotKey,
    beta: Real,
    dt: Real,
    dst: SlotKey,
) -> Result<(), TaskError> {
    if rate == dst {
        return Err(SlotError::Aliased(dst).into());
    }
    let weight = beta * dt;
    for handle in blocks {
        let mut block = lock_block(handle)?;
        let interior = block.geometry().interior();
        block.slots_mut().with_target(dst, |store, out| {
            let du = store.get(rate)?;
            check_shape(rate, out.data().len(), du.data().len())?;
            if src != dst {
                let input = store.get(src)?;
                check_shape(src, out.data().len(), input.data().len())?;
                for v in 0..out.nvar() {
                    out.var_mut(v)[interior.clone()]
                        .copy_from_slice(&input.var(v)[interior.clone()]);
                }
            }
            for v in 0..out.nvar() {
                let du = du.var(v);
                let u = out.var_mut(v);
                for i in interior.clone() {
                    u[i] += weight * du[i];
                }
            }
            Ok::<(), TaskError>(())
        })??;
    }
    Ok(())
}

fn check_shape(key: SlotKey, expected: usize, found: usize) -> Result<(), SlotError> {
    if expected == found {
        Ok(())
    } else {
        Err(SlotError::ShapeMismatch {
            key,
            expected,
            found,
        })
    }
}

/// Compute face fluxes of `slot` on one block.
pub fn calculate_fluxes(
    block: &mut MeshBlock,
    physics: &Physics,
    variant: KernelVariant,
    slot: SlotKey,
    stage: usize,
    nstages: usize,
) -> Result<(), TaskError> {
    let (slots, scratch, geometry) = block.kernel_parts();
    let state = slots.get_mut(slot)?;
    let ctx = FluxContext::new(geometry, stage, nstages);
    variant.run(&*physics.flux, state, &ctx, scratch)?;
    Ok(())
}

/// Recompute derived fields of `slot` on one block.
pub fn fill_derived(block: &mut MeshBlock, physics: &Physics, slot: SlotKey) -> Result<(), TaskError> {
    let geometry = *block.geometry();
    let state = block.slots_mut().get_mut(slot)?;
    physics.derived.fill_derived(state, &geometry)?;
    Ok(())
}

/// Estimate and record the block timestep from `slot`.
pub fn estimate_timestep(
    block: &mut MeshBlock,
    physics: &Physics,
    slot: SlotKey,
) -> Result<(), TaskError> {
    let dt = physics
        .timestep
        .estimate_timestep(block.slots().get(slot)?, block.geometry())?;
    block.set_block_timestep(dt);
    Ok(())
}
