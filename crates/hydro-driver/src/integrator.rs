//! Multi-stage integrator coefficients and stage slot naming.

use std::fmt;

use hydro_core::{ConfigError, Real, SlotKey};

/// Stage count, per-stage blend weights and the step's `dt`.
///
/// Stage `s` (1-based) computes `stage[s] = stage[s-1] + beta[s] * dt * dudt`.
/// Stage names resolve through [`StageIntegrator::stage_slot`]: stages `0`
/// and `nstages` are the block's base state, the stages in between are
/// scratch slots `Stage(s)`.
#[derive(Clone, PartialEq)]
pub struct StageIntegrator {
    name: String,
    beta: Vec<Real>,
    dt: Real,
}

impl StageIntegrator {
    /// Integrator with explicit weights. `dt` may be zero until the
    /// first timestep estimate is available.
    pub fn new(name: impl Into<String>, beta: Vec<Real>, dt: Real) -> Result<Self, ConfigError> {
        if beta.is_empty() {
            return Err(ConfigError::Integrator {
                reason: "at least one stage is required".into(),
            });
        }
        if let Some(b) = beta.iter().find(|b| !b.is_finite()) {
            return Err(ConfigError::Integrator {
                reason: format!("stage weight {b} is not finite"),
            });
        }
        let mut integrator = Self {
            name: name.into(),
            beta,
            dt: 0.0,
        };
        integrator.set_dt(dt)?;
        Ok(integrator)
    }

    /// Single-stage forward Euler: `beta = [1]`.
    pub fn rk1(dt: Real) -> Result<Self, ConfigError> {
        Self::new("rk1", vec![1.0], dt)
    }

    /// Two-stage van Leer predictor-corrector: `beta = [0.5, 1]`.
    pub fn vl2(dt: Real) -> Result<Self, ConfigError> {
        Self::new("vl2", vec![0.5, 1.0], dt)
    }

    /// Preset by name (`rk1` or `vl2`).
    pub fn from_name(name: &str, dt: Real) -> Result<Self, ConfigError> {
        match name {
            "rk1" => Self::rk1(dt),
            "vl2" => Self::vl2(dt),
            other => Err(ConfigError::Integrator {
                reason: format!("unknown integrator '{other}' (expected rk1 or vl2)"),
            }),
        }
    }

    /// Preset or custom name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of stages.
    pub fn nstages(&self) -> usize {
        self.beta.len()
    }

    /// Weight of stage `s` (1-based), `None` outside `1..=nstages`.
    pub fn beta(&self, s: usize) -> Option<Real> {
        s.checked_sub(1).and_then(|i| self.beta.get(i)).copied()
    }

    /// All weights in stage order.
    pub fn betas(&self) -> &[Real] {
        &self.beta
    }

    /// Timestep of the current step.
    pub fn dt(&self) -> Real {
        self.dt
    }

    /// Replace `dt`. Only called between steps.
    pub fn set_dt(&mut self, dt: Real) -> Result<(), ConfigError> {
        if !(dt.is_finite() && dt >= 0.0) {
            return Err(ConfigError::Integrator {
                reason: format!("dt {dt} must be finite and non-negative"),
            });
        }
        self.dt = dt;
        Ok(())
    }

    /// Slot holding stage `s`.
    pub fn stage_slot(&self, s: usize) -> SlotKey {
        if s == 0 || s >= self.nstages() {
            SlotKey::Base
        } else {
            SlotKey::Stage(s as u32)
        }
    }

    /// Intermediate stage slots, created lazily on the first stage.
    pub fn intermediate_slots(&self) -> impl Iterator<Item = SlotKey> {
        (1..self.nstages()).map(|s| SlotKey::Stage(s as u32))
    }
}

impl fmt::Debug for StageIntegrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageIntegrator")
            .field("name", &self.name)
            .field("nstages", &self.nstages())
            .field("beta", &self.beta)
            .field("dt", &self.dt)
            .finish()
    }
}
