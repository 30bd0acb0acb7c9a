//! Ghost-cell exchange between neighbouring blocks.
//!
//! A slot's ghost layers are refreshed in four phases, each a separate
//! task so that other work can be scheduled in between:
//!
//! 1. [`start_receiving`]: arm the slot on one block. Never blocks.
//! 2. [`send_boundary_buffers`]: pack each block's edge cells and post
//!    them to the neighbour's mailbox. Fails if the neighbour is not armed.
//! 3. [`receive_boundary_buffers`]: wait for every expected message and
//!    stash it on the receiving slot.
//! 4. [`set_boundaries`]: unpack stashed data into the ghost cells.
//!
//! [`clear_boundary`] resets the markers so the slot can be exchanged
//! again. Messages are tagged with their slot; a message for the wrong
//! slot is an error rather than silently applied.
//!
//! No phase holds two block locks at once, and no lock is held while
//! waiting on the mailbox.

use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use hydro_core::{BlockId, ExchangeError, Real, Side, SlotKey, TaskError};

use crate::block::{lock_block, BlockHandle, MeshBlock};

/// Packed edge cells travelling from one block to a neighbour.
#[derive(Clone, Debug, PartialEq)]
pub struct GhostMessage {
    /// Slot the data belongs to.
    pub slot: SlotKey,
    /// Sending block.
    pub from: BlockId,
    /// Variable-major values, `nvar * nghost` long.
    pub data: Vec<Real>,
}

/// One unbounded FIFO per (block, receiving face).
#[derive(Debug)]
pub struct BoundaryMailbox {
    channels: Vec<(Sender<GhostMessage>, Receiver<GhostMessage>)>,
}

impl BoundaryMailbox {
    /// Create mailboxes for `nblocks` blocks.
    pub fn new(nblocks: usize) -> Self {
        let channels = (0..nblocks * Side::ALL.len())
            .map(|_| crossbeam_channel::unbounded())
            .collect();
        Self { channels }
    }

    fn channel(
        &self,
        block: BlockId,
        side: Side,
    ) -> Result<&(Sender<GhostMessage>, Receiver<GhostMessage>), ExchangeError> {
        self.channels
            .get(block.index() * Side::ALL.len() + side.index())
            .ok_or(ExchangeError::Disconnected { block })
    }

    /// Deliver `msg` to `to`'s `side` face. Never blocks.
    pub fn post(&self, to: BlockId, side: Side, msg: GhostMessage) -> Result<(), ExchangeError> {
        let (tx, _) = self.channel(to, side)?;
        tx.send(msg)
            .map_err(|_| ExchangeError::Disconnected { block: to })
    }

    /// Wait up to `timeout` for the next message on `block`'s `side` face.
    pub fn wait(
        &self,
        block: BlockId,
        side: Side,
        slot: SlotKey,
        timeout: Duration,
    ) -> Result<GhostMessage, ExchangeError> {
        let (_, rx) = self.channel(block, side)?;
        rx.recv_timeout(timeout).map_err(|e| match e {
            RecvTimeoutError::Timeout => ExchangeError::Timeout { block, side, slot },
            RecvTimeoutError::Disconnected => ExchangeError::Disconnected { block },
        })
    }

    /// Messages queued on `block`'s `side` face.
    pub fn pending(&self, block: BlockId, side: Side) -> usize {
        self.channel(block, side).map_or(0, |(_, rx)| rx.len())
    }

    /// Discard every queued message, returning how many were dropped.
    ///
    /// Used after a failed step so stale data cannot leak into the next.
    pub fn drain(&self) -> usize {
        self.channels
            .iter()
            .map(|(_, rx)| rx.try_iter().count())
            .sum()
    }
}

/// Arm `slot` on `block` to receive neighbour data.
pub fn start_receiving(block: &mut MeshBlock, slot: SlotKey) -> Result<(), TaskError> {
    block.slots_mut().get_mut(slot)?.comm_mut().arm();
    tracing::trace!(block = %block.id(), %slot, "start receive");
    Ok(())
}

/// Reset `slot`'s exchange markers on `block`.
pub fn clear_boundary(block: &mut MeshBlock, slot: SlotKey) -> Result<(), TaskError> {
    block.slots_mut().get_mut(slot)?.comm_mut().clear();
    tracing::trace!(block = %block.id(), %slot, "clear boundary");
    Ok(())
}

struct Outgoing {
    to: BlockId,
    side: Side,
    msg: GhostMessage,
}

fn find(blocks: &[BlockHandle], id: BlockId) -> Result<&BlockHandle, ExchangeError> {
    blocks
        .get(id.index())
        .ok_or(ExchangeError::Disconnected { block: id })
}

/// Pack and post `slot`'s edge cells from every block to its neighbours.
///
/// All receivers are checked for an armed slot before anything is
/// posted, so a failure leaves the mailbox untouched.
pub fn send_boundary_buffers(
    blocks: &[BlockHandle],
    mailbox: &BoundaryMailbox,
    slot: SlotKey,
) -> Result<(), TaskError> {
    let mut outgoing = Vec::new();
    for handle in blocks {
        let mut block = lock_block(handle)?;
        let id = block.id();
        let geometry = *block.geometry();
        let neighbors = block.block_neighbors();
        let state = block.slots_mut().get_mut(slot)?;
        for (side, to) in neighbors {
            let cells = geometry.send_cells(side);
            let mut data = Vec::with_capacity(state.nvar() * cells.len());
            for v in 0..state.nvar() {
                data.extend_from_slice(&state.var(v)[cells.clone()]);
            }
            outgoing.push(Outgoing {
                to,
                side: side.opposite(),
                msg: GhostMessage { slot, from: id, data },
            });
        }
        state.comm_mut().mark_sent();
    }

    for out in &outgoing {
        let receiver = lock_block(find(blocks, out.to)?)?;
        let armed = receiver
            .slots()
            .get(slot)
            .map(|s| s.comm().is_armed())
            .unwrap_or(false);
        if !armed {
            return Err(ExchangeError::NotArmed {
                block: out.to,
                side: out.side,
                slot,
            }
            .into());
        }
    }

    let count = outgoing.len();
    for out in outgoing {
        mailbox.post(out.to, out.side, out.msg)?;
    }
    tracing::trace!(%slot, messages = count, "boundary buffers sent");
    Ok(())
}

/// Wait for every block's expected neighbour messages for `slot`.
pub fn receive_boundary_buffers(
    blocks: &[BlockHandle],
    mailbox: &BoundaryMailbox,
    slot: SlotKey,
    timeout: Duration,
) -> Result<(), TaskError> {
    for handle in blocks {
        let (id, neighbors, expected) = {
            let block = lock_block(handle)?;
            let nvar = block.slots().get(slot)?.nvar();
            (
                block.id(),
                block.block_neighbors(),
                nvar * block.geometry().nghost,
            )
        };
        for (side, _) in neighbors {
            let msg = mailbox.wait(id, side, slot, timeout)?;
            if msg.slot != slot {
                return Err(ExchangeError::SlotMismatch {
                    block: id,
                    expected: slot,
                    found: msg.slot,
                }
                .into());
            }
            if msg.data.len() != expected {
                return Err(ExchangeError::BufferSize {
                    block: id,
                    expected,
                    found: msg.data.len(),
                }
                .into());
            }
            let mut block = lock_block(handle)?;
            block
                .slots_mut()
                .get_mut(slot)?
                .comm_mut()
                .deliver(side, msg.data);
        }
    }
    tracing::trace!(%slot, "boundary buffers received");
    Ok(())
}

/// Unpack received data into the ghost cells of `slot` on every block.
pub fn set_boundaries(blocks: &[BlockHandle], slot: SlotKey) -> Result<(), TaskError> {
    for handle in blocks {
        let mut block = lock_block(handle)?;
        let id = block.id();
        let geometry = *block.geometry();
        let neighbors = block.block_neighbors();
        let state = block.slots_mut().get_mut(slot)?;
        let ng = geometry.nghost;
        for (side, _) in neighbors {
            let data = state
                .comm_mut()
                .take(side)
                .ok_or(ExchangeError::NotReceived {
                    block: id,
                    side,
                    slot,
                })?;
            for v in 0..state.nvar() {
                let values = &data[v * ng..(v + 1) * ng];
                let field = state.var_mut(v);
                for (i, value) in geometry.ghosts(side).zip(values) {
                    field[i] = *value;
                }
            }
        }
    }
    tracing::trace!(%slot, "boundaries set");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BoundaryKind, MeshConfig};
    use crate::mesh::Mesh;
    use hydro_core::{FieldLayout, Packages};
    use std::sync::Arc;

    const WAIT: Duration = Duration::from_millis(200);

    fn mesh(nblocks: usize, bc: BoundaryKind) -> Mesh {
        let config = MeshConfig {
            nx: 4 * nblocks,
            block_nx: 4,
            nghost: 2,
            x_min: 0.0,
            x_max: 1.0,
            inner_bc: bc,
            outer_bc: bc,
        };
        let layout = FieldLayout {
            nvar: 2,
            nderived: 0,
        };
        let mesh = Mesh::new(config, layout, Arc::new(Packages::new())).unwrap();
        // Fill interior cells with 100*block + cell so ghosts are traceable.
        mesh.for_each_block(|b| {
            let interior = b.geometry().interior();
            let id = b.id().0 as Real;
            let base = b.slots_mut().base_mut();
            for v in 0..2 {
                for i in interior.clone() {
                    base.var_mut(v)[i] = 100.0 * id + i as Real + 0.5 * v as Real;
                }
            }
            Ok(())
        })
        .unwrap();
        mesh
    }

    fn arm_all(mesh: &Mesh, slot: SlotKey) {
        mesh.for_each_block(|b| start_receiving(b, slot)).unwrap();
    }

    #[test]
    fn full_exchange_fills_ghosts() {
        let m = mesh(2, BoundaryKind::Outflow);
        let slot = SlotKey::Base;
        arm_all(&m, slot);
        send_boundary_buffers(m.blocks(), m.mailbox(), slot).unwrap();
        receive_boundary_buffers(m.blocks(), m.mailbox(), slot, WAIT).unwrap();
        set_boundaries(m.blocks(), slot).unwrap();

        let left = m.blocks()[0].lock().unwrap();
        // Outer ghosts of block 0 hold the first two interior cells of block 1.
        assert_eq!(&left.slots().base().var(0)[6..8], &[102.0, 103.0]);
        assert_eq!(&left.slots().base().var(1)[6..8], &[102.5, 103.5]);
        drop(left);
        let right = m.blocks()[1].lock().unwrap();
        // Inner ghosts of block 1 hold the last two interior cells of block 0.
        assert_eq!(&right.slots().base().var(0)[0..2], &[4.0, 5.0]);
        // Physical faces are untouched by the exchange.
        assert_eq!(&right.slots().base().var(0)[6..8], &[0.0, 0.0]);
    }

    #[test]
    fn single_periodic_block_wraps_onto_itself() {
        let m = mesh(1, BoundaryKind::Periodic);
        let slot = SlotKey::Base;
        arm_all(&m, slot);
        send_boundary_buffers(m.blocks(), m.mailbox(), slot).unwrap();
        receive_boundary_buffers(m.blocks(), m.mailbox(), slot, WAIT).unwrap();
        set_boundaries(m.blocks(), slot).unwrap();
        let b = m.blocks()[0].lock().unwrap();
        assert_eq!(&b.slots().base().var(0)[0..2], &[4.0, 5.0]);
        assert_eq!(&b.slots().base().var(0)[6..8], &[2.0, 3.0]);
    }

    #[test]
    fn send_without_arming_fails_and_posts_nothing() {
        let m = mesh(2, BoundaryKind::Outflow);
        let err = send_boundary_buffers(m.blocks(), m.mailbox(), SlotKey::Base).unwrap_err();
        assert!(matches!(
            err,
            TaskError::Exchange(ExchangeError::NotArmed { .. })
        ));
        assert_eq!(m.mailbox().pending(BlockId(0), Side::Outer), 0);
        assert_eq!(m.mailbox().pending(BlockId(1), Side::Inner), 0);
    }

    #[test]
    fn set_before_receive_fails() {
        let m = mesh(2, BoundaryKind::Outflow);
        let err = set_boundaries(m.blocks(), SlotKey::Base).unwrap_err();
        assert!(matches!(
            err,
            TaskError::Exchange(ExchangeError::NotReceived { .. })
        ));
    }

    #[test]
    fn receive_times_out_without_sender() {
        let m = mesh(2, BoundaryKind::Outflow);
        arm_all(&m, SlotKey::Base);
        let err = receive_boundary_buffers(
            m.blocks(),
            m.mailbox(),
            SlotKey::Base,
            Duration::from_millis(5),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            TaskError::Exchange(ExchangeError::Timeout { .. })
        ));
    }

    #[test]
    fn wrong_slot_message_is_rejected() {
        let m = mesh(2, BoundaryKind::Outflow);
        m.for_each_block(|b| {
            b.slots_mut().ensure_cloned(SlotKey::Stage(1), SlotKey::Base)?;
            Ok(())
        })
        .unwrap();
        arm_all(&m, SlotKey::Stage(1));
        send_boundary_buffers(m.blocks(), m.mailbox(), SlotKey::Stage(1)).unwrap();
        let err = receive_boundary_buffers(m.blocks(), m.mailbox(), SlotKey::Base, WAIT)
            .unwrap_err();
        assert!(matches!(
            err,
            TaskError::Exchange(ExchangeError::SlotMismatch { .. })
        ));
    }

    #[test]
    fn clear_resets_markers_and_drain_empties_mailbox() {
        let m = mesh(2, BoundaryKind::Outflow);
        arm_all(&m, SlotKey::Base);
        send_boundary_buffers(m.blocks(), m.mailbox(), SlotKey::Base).unwrap();
        m.for_each_block(|b| clear_boundary(b, SlotKey::Base)).unwrap();
        let b = m.blocks()[0].lock().unwrap();
        assert!(!b.slots().base().comm().is_armed());
        assert!(!b.slots().base().comm().is_sent());
        drop(b);
        assert_eq!(m.mailbox().drain(), 2);
        assert_eq!(m.mailbox().drain(), 0);
    }

    #[test]
    fn unknown_block_is_disconnected() {
        let mailbox = BoundaryMailbox::new(1);
        let msg = GhostMessage {
            slot: SlotKey::Base,
            from: BlockId(0),
            data: vec![],
        };
        assert_eq!(
            mailbox.post(BlockId(3), Side::Inner, msg),
            Err(ExchangeError::Disconnected { block: BlockId(3) })
        );
    }
}
