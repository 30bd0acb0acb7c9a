//! A single named state buffer and its exchange markers.

use hydro_core::{BlockGeometry, FieldLayout, Real, Side, NHYDRO};

/// In-flight boundary-communication state of one slot.
///
/// Set by the four exchange phases and reset by `clear`:
/// `armed` by start-receive, `sent` by send, `inbox` by receive
/// (consumed by set).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BoundaryState {
    armed: bool,
    sent: bool,
    inbox: [Option<Vec<Real>>; 2],
}

impl BoundaryState {
    /// Arm receive buffers. Never blocks.
    pub fn arm(&mut self) {
        self.armed = true;
    }

    /// Whether start-receive has run since the last clear.
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Record that this slot's boundary data has been sent.
    pub fn mark_sent(&mut self) {
        self.sent = true;
    }

    /// Whether send has run since the last clear.
    pub fn is_sent(&self) -> bool {
        self.sent
    }

    /// Store neighbour data received on `side`.
    pub fn deliver(&mut self, side: Side, data: Vec<Real>) {
        self.inbox[side.index()] = Some(data);
    }

    /// Whether data for `side` is waiting to be unpacked.
    pub fn has_received(&self, side: Side) -> bool {
        self.inbox[side.index()].is_some()
    }

    /// Take received data for `side`, leaving the inbox empty.
    pub fn take(&mut self, side: Side) -> Option<Vec<Real>> {
        self.inbox[side.index()].take()
    }

    /// Reset all in-flight markers so the slot can be exchanged again.
    pub fn clear(&mut self) {
        self.armed = false;
        self.sent = false;
        self.inbox = [None, None];
    }
}

/// Field data of one block at one pipeline stage.
///
/// All buffers are variable-major: variable `v`, cell `i` lives at
/// `v * ncells + i`. Cloning a slot copies data, fluxes and derived
/// fields; [`StateSlot::overwrite_from`] does the same into existing
/// allocations.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StateSlot {
    nvar: usize,
    nderived: usize,
    ncells: usize,
    nfaces: usize,
    data: Vec<Real>,
    fluxes: Vec<Real>,
    derived: Vec<Real>,
    comm: BoundaryState,
}

impl StateSlot {
    /// Zero-filled slot sized for `layout` on `geometry`.
    pub fn new(layout: FieldLayout, geometry: &BlockGeometry) -> Self {
        let ncells = geometry.ncells_total();
        let nfaces = geometry.nfaces();
        Self {
            nvar: layout.nvar,
            nderived: layout.nderived,
            ncells,
            nfaces,
            data: vec![0.0; layout.nvar * ncells],
            fluxes: vec![0.0; layout.nvar * nfaces],
            derived: vec![0.0; layout.nderived * ncells],
            comm: BoundaryState::default(),
        }
    }

    /// Number of conserved variables.
    pub fn nvar(&self) -> usize {
        self.nvar
    }

    /// Number of derived variables.
    pub fn nderived(&self) -> usize {
        self.nderived
    }

    /// Cells per variable, ghosts included.
    pub fn ncells(&self) -> usize {
        self.ncells
    }

    /// Faces per variable.
    pub fn nfaces(&self) -> usize {
        self.nfaces
    }

    /// Conserved variable `v` over all cells.
    pub fn var(&self, v: usize) -> &[Real] {
        &self.data[v * self.ncells..(v + 1) * self.ncells]
    }

    /// Mutable conserved variable `v`.
    pub fn var_mut(&mut self, v: usize) -> &mut [Real] {
        &mut self.data[v * self.ncells..(v + 1) * self.ncells]
    }

    /// Flux of variable `v` through every face.
    pub fn flux(&self, v: usize) -> &[Real] {
        &self.fluxes[v * self.nfaces..(v + 1) * self.nfaces]
    }

    /// Mutable flux of variable `v`.
    pub fn flux_mut(&mut self, v: usize) -> &mut [Real] {
        &mut self.fluxes[v * self.nfaces..(v + 1) * self.nfaces]
    }

    /// Derived variable `d` over all cells.
    pub fn derived(&self, d: usize) -> &[Real] {
        &self.derived[d * self.ncells..(d + 1) * self.ncells]
    }

    /// Mutable derived variable `d`.
    pub fn derived_mut(&mut self, d: usize) -> &mut [Real] {
        &mut self.derived[d * self.ncells..(d + 1) * self.ncells]
    }

    /// Whole conserved buffer.
    pub fn data(&self) -> &[Real] {
        &self.data
    }

    /// Whole mutable conserved buffer.
    pub fn data_mut(&mut self) -> &mut [Real] {
        &mut self.data
    }

    /// Whole flux buffer.
    pub fn fluxes(&self) -> &[Real] {
        &self.fluxes
    }

    /// Whole mutable flux buffer.
    pub fn fluxes_mut(&mut self) -> &mut [Real] {
        &mut self.fluxes
    }

    /// Mutable flux and read-only conserved buffers at once.
    pub fn split_fluxes_mut(&mut self) -> (&[Real], &mut [Real]) {
        (&self.data, &mut self.fluxes)
    }

    /// Mutable derived and read-only conserved buffers at once.
    pub fn split_derived_mut(&mut self) -> (&[Real], &mut [Real]) {
        (&self.data, &mut self.derived)
    }

    /// Conserved variables of cell `i`, unused trailing entries zero.
    pub fn cell(&self, i: usize) -> [Real; NHYDRO] {
        let mut u = [0.0; NHYDRO];
        for (v, slot) in u.iter_mut().enumerate().take(self.nvar) {
            *slot = self.data[v * self.ncells + i];
        }
        u
    }

    /// Overwrite cell `i` with the leading `nvar` entries of `u`.
    pub fn set_cell(&mut self, i: usize, u: &[Real; NHYDRO]) {
        for (v, &value) in u.iter().enumerate().take(self.nvar) {
            self.data[v * self.ncells + i] = value;
        }
    }

    /// Exchange markers.
    pub fn comm(&self) -> &BoundaryState {
        &self.comm
    }

    /// Mutable exchange markers.
    pub fn comm_mut(&mut self) -> &mut BoundaryState {
        &mut self.comm
    }

    /// Copy every buffer from `other` into this slot's existing allocations.
    ///
    /// Exchange markers are reset, not copied.
    pub fn overwrite_from(&mut self, other: &StateSlot) {
        self.nvar = other.nvar;
        self.nderived = other.nderived;
        self.ncells = other.ncells;
        self.nfaces = other.nfaces;
        self.data.clone_from(&other.data);
        self.fluxes.clone_from(&other.fluxes);
        self.derived.clone_from(&other.derived);
        self.comm.clear();
    }

    /// Whether `other` has the same buffer shapes.
    pub fn same_shape(&self, other: &StateSlot) -> bool {
        self.nvar == other.nvar
            && self.nderived == other.nderived
            && self.ncells == other.ncells
            && self.nfaces == other.nfaces
    }
}
