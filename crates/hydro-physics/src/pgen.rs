//! Problem generators: initial conditions for the base slot.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use hydro_core::{BlockGeometry, BlockId, ConfigError, ParameterInput, Real};
use hydro_slots::StateSlot;

use crate::eos::{EquationOfState, State};

const BLOCK: &str = "problem";

/// Initial condition selected by `<problem> name`.
#[derive(Clone, Debug, PartialEq)]
pub enum Problem {
    /// Constant primitive state.
    Uniform {
        /// Primitive `[rho, v, p]`.
        state: State,
    },
    /// Sod shock tube: `left` for `x < x0`, `right` otherwise.
    Sod {
        /// Interface position.
        x0: Real,
        /// Primitive state left of the interface.
        left: State,
        /// Primitive state right of the interface.
        right: State,
    },
    /// Uniform state with seeded random density noise.
    ///
    /// Each block draws from its own ChaCha8 stream seeded with
    /// `seed ^ block_id`, so output depends on the decomposition but is
    /// reproducible for a fixed one.
    Perturbed {
        /// Mean primitive state.
        state: State,
        /// Relative density amplitude in `[0, 1)`.
        amplitude: Real,
        /// RNG seed.
        seed: u64,
    },
}

impl Problem {
    /// Sod's standard left/right states with the interface at `x0`.
    pub fn sod(x0: Real) -> Self {
        Self::Sod {
            x0,
            left: [1.0, 0.0, 1.0],
            right: [0.125, 0.0, 0.1],
        }
    }

    /// Read `<problem>`; defaults to a uniform gas at rest.
    pub fn from_params(pin: &ParameterInput) -> Result<Self, ConfigError> {
        let name: String = pin.get_or(BLOCK, "name", "uniform".to_string())?;
        let uniform = [
            pin.get_real_or(BLOCK, "rho", 1.0)?,
            pin.get_real_or(BLOCK, "v", 0.0)?,
            pin.get_real_or(BLOCK, "p", 1.0)?,
        ];
        let problem = match name.as_str() {
            "uniform" => Self::Uniform { state: uniform },
            "sod" => Self::sod(pin.get_real_or(BLOCK, "x0", 0.5)?),
            "perturbed" => Self::Perturbed {
                state: uniform,
                amplitude: pin.get_real_or(BLOCK, "amplitude", 0.01)?,
                seed: pin.get_or(BLOCK, "seed", 0u64)?,
            },
            other => {
                return Err(ConfigError::InvalidValue {
                    block: BLOCK.into(),
                    key: "name".into(),
                    value: other.into(),
                    reason: "expected uniform, sod or perturbed".into(),
                })
            }
        };
        problem.validate()?;
        Ok(problem)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let states: Vec<&State> = match self {
            Self::Uniform { state } => vec![state],
            Self::Sod { left, right, .. } => vec![left, right],
            Self::Perturbed {
                state, amplitude, ..
            } => {
                if !(0.0..1.0).contains(amplitude) {
                    return Err(ConfigError::InvalidValue {
                        block: BLOCK.into(),
                        key: "amplitude".into(),
                        value: amplitude.to_string(),
                        reason: "must lie in [0, 1)".into(),
                    });
                }
                vec![state]
            }
        };
        for w in states {
            if !(w[0] > 0.0 && w[2] > 0.0) {
                return Err(ConfigError::InvalidValue {
                    block: BLOCK.into(),
                    key: "rho".into(),
                    value: format!("{w:?}"),
                    reason: "density and pressure must be positive".into(),
                });
            }
        }
        Ok(())
    }

    /// Write the initial condition into every cell of `slot`.
    pub fn generate(
        &self,
        eos: &dyn EquationOfState,
        block: BlockId,
        geometry: &BlockGeometry,
        slot: &mut StateSlot,
    ) {
        let ncells = geometry.ncells_total();
        match self {
            Self::Uniform { state } => {
                let u = eos.primitive_to_conserved(state);
                (0..ncells).for_each(|i| slot.set_cell(i, &u));
            }
            Self::Sod { x0, left, right } => {
                for i in 0..ncells {
                    let w = if geometry.x_center(i) < *x0 { left } else { right };
                    slot.set_cell(i, &eos.primitive_to_conserved(w));
                }
            }
            Self::Perturbed {
                state,
                amplitude,
                seed,
            } => {
                let mut rng = ChaCha8Rng::seed_from_u64(seed ^ u64::from(block.0));
                for i in 0..ncells {
                    let noise: Real = rng.random::<f64>() * 2.0 - 1.0;
                    let w = [state[0] * (1.0 + amplitude * noise), state[1], state[2]];
                    slot.set_cell(i, &eos.primitive_to_conserved(&w));
                }
            }
        }
        tracing::debug!(block = %block, problem = ?self, "initial condition generated");
    }
}
