//! Driver configuration read from `<parthenon/time>`.

use std::time::Duration;

use hydro_core::{ConfigError, ParameterInput, Real};

use crate::integrator::StageIntegrator;

/// Input block holding time-integration settings.
pub const TIME_BLOCK: &str = "parthenon/time";

/// Validated driver settings.
#[derive(Clone, Debug, PartialEq)]
pub struct DriverConfig {
    /// Stage weights and the current `dt`.
    pub integrator: StageIntegrator,
    /// Longest a receive task waits for neighbour data.
    pub exchange_timeout: Duration,
    /// Stop once simulation time reaches this value.
    pub tlim: Option<Real>,
    /// Stop after this many cycles.
    pub nlim: Option<u64>,
}

impl DriverConfig {
    /// Default receive timeout in milliseconds.
    pub const DEFAULT_EXCHANGE_TIMEOUT_MS: u64 = 5000;

    /// Settings for `integrator` with the default timeout and no limits.
    pub fn new(integrator: StageIntegrator) -> Self {
        Self {
            integrator,
            exchange_timeout: Duration::from_millis(Self::DEFAULT_EXCHANGE_TIMEOUT_MS),
            tlim: None,
            nlim: None,
        }
    }

    /// Read `<parthenon/time>`.
    ///
    /// Keys: `integrator` (`rk1` or `vl2`, default `vl2`), `dt` (initial
    /// timestep, default 0 meaning "estimate from the initial state"),
    /// `exchange_timeout_ms`, `tlim`, `nlim`.
    pub fn from_params(pin: &ParameterInput) -> Result<Self, ConfigError> {
        let name: String = pin.get_or(TIME_BLOCK, "integrator", "vl2".to_string())?;
        let dt = pin.get_real_or(TIME_BLOCK, "dt", 0.0)?;
        let timeout_ms = pin.get_or(
            TIME_BLOCK,
            "exchange_timeout_ms",
            Self::DEFAULT_EXCHANGE_TIMEOUT_MS,
        )?;
        let tlim = match pin.get(TIME_BLOCK, "tlim") {
            Some(_) => Some(pin.get_required::<Real>(TIME_BLOCK, "tlim")?),
            None => None,
        };
        let nlim = match pin.get(TIME_BLOCK, "nlim") {
            Some(_) => Some(pin.get_required::<u64>(TIME_BLOCK, "nlim")?),
            None => None,
        };
        let config = Self {
            integrator: StageIntegrator::from_name(&name, dt)?,
            exchange_timeout: Duration::from_millis(timeout_ms),
            tlim,
            nlim,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check limits and timeout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &str, value: String, reason: &str| ConfigError::InvalidValue {
            block: TIME_BLOCK.into(),
            key: key.into(),
            value,
            reason: reason.into(),
        };
        if self.exchange_timeout.is_zero() {
            return Err(invalid(
                "exchange_timeout_ms",
                "0".into(),
                "must be positive",
            ));
        }
        if let Some(tlim) = self.tlim {
            if !(tlim.is_finite() && tlim > 0.0) {
                return Err(invalid("tlim", tlim.to_string(), "must be finite and positive"));
            }
        }
        Ok(())
    }
}
