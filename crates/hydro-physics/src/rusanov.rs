//! Rusanov (local Lax-Friedrichs) fluxes for the 1-D Euler equations.

use std::str::FromStr;
use std::sync::Arc;

use hydro_core::{BlockGeometry, KernelError, Real, IM1, NHYDRO};
use hydro_kernel::{ensure_finite, FluxContext, FluxKernel};
use hydro_slots::{ScratchRegion, StateSlot};

use crate::eos::{load, EquationOfState, State};

/// Spatial reconstruction of face states from cell averages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reconstruction {
    /// Piecewise constant: face states are the adjacent cell values.
    DonorCell,
    /// Piecewise linear with minmod-limited slopes on primitives.
    Plm,
}

impl Reconstruction {
    /// Ghost cells needed on each side.
    pub fn ghosts_needed(self) -> usize {
        match self {
            Self::DonorCell => 1,
            Self::Plm => 2,
        }
    }
}

impl FromStr for Reconstruction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dc" => Ok(Self::DonorCell),
            "plm" => Ok(Self::Plm),
            other => Err(format!("unknown reconstruction '{other}' (expected dc or plm)")),
        }
    }
}

fn minmod(a: Real, b: Real) -> Real {
    if a * b <= 0.0 {
        0.0
    } else if a.abs() < b.abs() {
        a
    } else {
        b
    }
}

/// Rusanov flux with optional piecewise-linear reconstruction.
///
/// On the predictor stage of a multi-stage step the kernel always uses
/// donor-cell reconstruction; the configured reconstruction applies to
/// the final stage.
///
/// The scratch variant computes each cell's primitive state once into
/// the block's scratch region. The direct variant recomputes primitives
/// per face. Both feed the same face solver, so their fluxes are
/// bit-identical.
#[derive(Clone, Debug)]
pub struct RusanovFlux {
    eos: Arc<dyn EquationOfState>,
    reconstruction: Reconstruction,
}

impl RusanovFlux {
    /// Rusanov kernel over `eos`.
    pub fn new(eos: Arc<dyn EquationOfState>, reconstruction: Reconstruction) -> Self {
        Self {
            eos,
            reconstruction,
        }
    }

    /// Configured reconstruction.
    pub fn reconstruction(&self) -> Reconstruction {
        self.reconstruction
    }

    fn reconstruction_for(&self, ctx: &FluxContext<'_>) -> Reconstruction {
        if ctx.is_predictor() {
            Reconstruction::DonorCell
        } else {
            self.reconstruction
        }
    }

    fn check_input(
        &self,
        slot: &StateSlot,
        geometry: &BlockGeometry,
        recon: Reconstruction,
    ) -> Result<(), KernelError> {
        if slot.nvar() != self.eos.nvar() {
            return Err(KernelError::InvalidInput {
                reason: format!(
                    "slot has {} variables, {} EOS evolves {}",
                    slot.nvar(),
                    self.eos.name(),
                    self.eos.nvar()
                ),
            });
        }
        if geometry.nghost < recon.ghosts_needed() {
            return Err(KernelError::InvalidInput {
                reason: format!(
                    "{recon:?} reconstruction needs {} ghost cells, block has {}",
                    recon.ghosts_needed(),
                    geometry.nghost
                ),
            });
        }
        Ok(())
    }

    fn face_states<P>(&self, prim: &P, recon: Reconstruction, left: usize) -> (State, State)
    where
        P: Fn(usize) -> State,
    {
        let right = left + 1;
        let (wl, wr) = (prim(left), prim(right));
        match recon {
            Reconstruction::DonorCell => (wl, wr),
            Reconstruction::Plm => {
                let (wll, wrr) = (prim(left - 1), prim(right + 1));
                let mut l = wl;
                let mut r = wr;
                for v in 0..NHYDRO {
                    l[v] += 0.5 * minmod(wl[v] - wll[v], wr[v] - wl[v]);
                    r[v] -= 0.5 * minmod(wr[v] - wl[v], wrr[v] - wr[v]);
                }
                self.eos.apply_floors(&mut l);
                self.eos.apply_floors(&mut r);
                (l, r)
            }
        }
    }

    fn riemann(&self, wl: &State, wr: &State) -> State {
        let eos = &*self.eos;
        let (ul, ur) = (eos.primitive_to_conserved(wl), eos.primitive_to_conserved(wr));
        let (fl, fr) = (eos.flux(wl), eos.flux(wr));
        let smax = (wl[IM1].abs() + eos.sound_speed(wl)).max(wr[IM1].abs() + eos.sound_speed(wr));
        let mut f = [0.0; NHYDRO];
        for v in 0..NHYDRO {
            f[v] = 0.5 * (fl[v] + fr[v]) - 0.5 * smax * (ur[v] - ul[v]);
        }
        f
    }

    fn sweep<P>(
        &self,
        prim: P,
        geometry: &BlockGeometry,
        recon: Reconstruction,
        nvar: usize,
        fluxes: &mut [Real],
    ) where
        P: Fn(usize) -> State,
    {
        let nfaces = geometry.nfaces();
        for k in 0..nfaces {
            let left = geometry.nghost + k - 1;
            let (wl, wr) = self.face_states(&prim, recon, left);
            let f = self.riemann(&wl, &wr);
            for (v, value) in f.iter().enumerate().take(nvar) {
                fluxes[v * nfaces + k] = *value;
            }
        }
    }
}

impl FluxKernel for RusanovFlux {
    fn name(&self) -> &str {
        "rusanov"
    }

    fn nvar(&self) -> usize {
        self.eos.nvar()
    }

    fn scratch_len(&self, geometry: &BlockGeometry) -> usize {
        NHYDRO * geometry.ncells_total()
    }

    fn calculate_fluxes(
        &self,
        slot: &mut StateSlot,
        ctx: &FluxContext<'_>,
    ) -> Result<(), KernelError> {
        let geometry = ctx.geometry();
        let recon = self.reconstruction_for(ctx);
        self.check_input(slot, geometry, recon)?;
        let (nvar, ncells, nfaces) = (slot.nvar(), slot.ncells(), slot.nfaces());
        let (data, fluxes) = slot.split_fluxes_mut();
        let eos = &*self.eos;
        let prim = |i: usize| eos.conserved_to_primitive(&load(data, nvar, ncells, i));
        self.sweep(prim, geometry, recon, nvar, fluxes);
        ensure_finite(slot.fluxes(), nfaces)
    }

    fn calculate_fluxes_with_scratch(
        &self,
        slot: &mut StateSlot,
        ctx: &FluxContext<'_>,
        scratch: &mut ScratchRegion,
    ) -> Result<(), KernelError> {
        let geometry = ctx.geometry();
        let recon = self.reconstruction_for(ctx);
        self.check_input(slot, geometry, recon)?;
        let (nvar, ncells, nfaces) = (slot.nvar(), slot.ncells(), slot.nfaces());

        let requested = NHYDRO * ncells;
        let remaining = scratch.remaining();
        let w = scratch
            .alloc(requested)
            .ok_or(KernelError::ScratchExhausted {
                requested,
                remaining,
            })?;

        let (data, fluxes) = slot.split_fluxes_mut();
        for i in 0..ncells {
            let wi = self
                .eos
                .conserved_to_primitive(&load(data, nvar, ncells, i));
            for (v, value) in wi.iter().enumerate() {
                w[v * ncells + i] = *value;
            }
        }
        let w: &[Real] = w;
        let prim = |i: usize| [w[i], w[ncells + i], w[2 * ncells + i]];
        self.sweep(prim, geometry, recon, nvar, fluxes);
        ensure_finite(slot.fluxes(), nfaces)
    }
}
