//! CFL-limited timestep from recovered primitives.

use std::sync::Arc;

use hydro_core::{BlockGeometry, KernelError, Real, IDN, IEN, IM1, NHYDRO};
use hydro_kernel::TimestepEstimator;
use hydro_slots::StateSlot;

use crate::eos::EquationOfState;

/// `dt = cfl * dx / max(|v| + c_s)` over interior cells.
///
/// Reads the derived `[rho, v, p]` fields, so it must run after
/// [`PrimitiveRecovery`](crate::PrimitiveRecovery) on the same slot.
#[derive(Clone, Debug)]
pub struct CflTimestep {
    eos: Arc<dyn EquationOfState>,
    cfl: Real,
}

impl CflTimestep {
    /// Estimator with Courant number `cfl`.
    pub fn new(eos: Arc<dyn EquationOfState>, cfl: Real) -> Self {
        Self { eos, cfl }
    }

    /// Courant number.
    pub fn cfl(&self) -> Real {
        self.cfl
    }
}

impl TimestepEstimator for CflTimestep {
    fn name(&self) -> &str {
        "cfl"
    }

    fn estimate_timestep(
        &self,
        slot: &StateSlot,
        geometry: &BlockGeometry,
    ) -> Result<Real, KernelError> {
        if slot.nderived() < NHYDRO {
            return Err(KernelError::InvalidInput {
                reason: "CFL timestep needs recovered primitives".into(),
            });
        }
        let (rho, v, p) = (slot.derived(IDN), slot.derived(IM1), slot.derived(IEN));
        let mut max_speed: Real = 0.0;
        for i in geometry.interior() {
            let w = [rho[i], v[i], p[i]];
            max_speed = max_speed.max(w[IM1].abs() + self.eos.sound_speed(&w));
        }
        if !(max_speed.is_finite() && max_speed > 0.0) {
            return Err(KernelError::InvalidInput {
                reason: format!("maximum signal speed {max_speed} cannot limit dt"),
            });
        }
        Ok(self.cfl * geometry.dx / max_speed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eos::{Floors, IsothermalGas};
    use hydro_core::FieldLayout;

    fn geom() -> BlockGeometry {
        BlockGeometry {
            nx: 4,
            nghost: 2,
            x_min: 0.0,
            dx: 0.5,
        }
    }

    fn slot_with_velocity(v: impl Fn(usize) -> Real) -> StateSlot {
        let g = geom();
        let mut slot = StateSlot::new(
            FieldLayout {
                nvar: 2,
                nderived: 3,
            },
            &g,
        );
        slot.derived_mut(IDN).fill(1.0);
        for i in 0..g.ncells_total() {
            slot.derived_mut(IM1)[i] = v(i);
        }
        slot
    }

    #[test]
    fn fastest_interior_cell_limits_dt() {
        let eos = Arc::new(IsothermalGas::new(1.0, Floors::default()));
        let est = CflTimestep::new(eos, 0.4);
        // Ghost cell 0 is much faster but ignored.
        let slot = slot_with_velocity(|i| match i {
            0 => 100.0,
            3 => -3.0,
            _ => 0.5,
        });
        let dt = est.estimate_timestep(&slot, &geom()).unwrap();
        assert!((dt - 0.4 * 0.5 / 4.0).abs() < 1e-15);
    }

    #[test]
    fn missing_primitives_is_invalid() {
        let eos = Arc::new(IsothermalGas::new(1.0, Floors::default()));
        let g = geom();
        let slot = StateSlot::new(
            FieldLayout {
                nvar: 2,
                nderived: 0,
            },
            &g,
        );
        assert!(CflTimestep::new(eos, 0.3)
            .estimate_timestep(&slot, &g)
            .is_err());
    }
}
