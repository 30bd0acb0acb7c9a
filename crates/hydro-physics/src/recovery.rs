//! Primitive-variable recovery as the derived-field step.

use std::sync::Arc;

use hydro_core::{BlockGeometry, KernelError, NHYDRO};
use hydro_kernel::{ensure_finite, DerivedFields};
use hydro_slots::StateSlot;

use crate::eos::{load, EquationOfState};

/// Fills `[rho, v, p]` derived fields from conserved data on every cell,
/// ghosts included.
#[derive(Clone, Debug)]
pub struct PrimitiveRecovery {
    eos: Arc<dyn EquationOfState>,
}

impl PrimitiveRecovery {
    /// Recovery through `eos`.
    pub fn new(eos: Arc<dyn EquationOfState>) -> Self {
        Self { eos }
    }
}

impl DerivedFields for PrimitiveRecovery {
    fn name(&self) -> &str {
        "primitive-recovery"
    }

    fn nderived(&self) -> usize {
        NHYDRO
    }

    fn fill_derived(
        &self,
        slot: &mut StateSlot,
        _geometry: &BlockGeometry,
    ) -> Result<(), KernelError> {
        if slot.nderived() < NHYDRO {
            return Err(KernelError::InvalidInput {
                reason: format!(
                    "slot has {} derived fields, primitive recovery needs {NHYDRO}",
                    slot.nderived()
                ),
            });
        }
        let (nvar, ncells) = (slot.nvar(), slot.ncells());
        let (data, derived) = slot.split_derived_mut();
        for i in 0..ncells {
            let w = self.eos.conserved_to_primitive(&load(data, nvar, ncells, i));
            for (d, value) in w.iter().enumerate() {
                derived[d * ncells + i] = *value;
            }
        }
        ensure_finite(&derived[..NHYDRO * ncells], ncells)
    }
}
