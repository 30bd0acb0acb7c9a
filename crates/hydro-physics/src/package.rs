//! The `hydro` package: reads `<hydro>` input and assembles the physics.

use std::sync::Arc;

use hydro_core::{ConfigError, FieldLayout, ParamValue, ParameterInput, Real, StateDescriptor};
use hydro_kernel::Physics;

use crate::cfl::CflTimestep;
use crate::eos::{AdiabaticGas, EquationOfState, Floors, IsothermalGas};
use crate::recovery::PrimitiveRecovery;
use crate::rusanov::{Reconstruction, RusanovFlux};

/// Package label and input block name.
pub const PACKAGE: &str = "hydro";

/// Validated `<hydro>` configuration.
#[derive(Clone, Debug)]
pub struct HydroPackage {
    eos: Arc<dyn EquationOfState>,
    cfl: Real,
    reconstruction: Reconstruction,
    use_scratch: bool,
}

fn invalid(key: &str, value: impl ToString, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        block: PACKAGE.into(),
        key: key.into(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

impl HydroPackage {
    /// Courant number used when `<hydro>/cfl` is absent.
    pub const DEFAULT_CFL: Real = 0.3;
    /// Adiabatic index used when `<hydro>/gamma` is absent.
    pub const DEFAULT_GAMMA: Real = 5.0 / 3.0;

    /// Read and validate `<hydro>`.
    ///
    /// `eos` is required (`adiabatic` or `isothermal`). Everything else,
    /// `cfl` included, has a default; the driver warns about a missing `cfl`.
    pub fn initialize(pin: &ParameterInput) -> Result<Self, ConfigError> {
        let eos_name: String = pin.get_required(PACKAGE, "eos")?;
        let defaults = Floors::default();
        let floors = Floors {
            density: pin.get_real_or(PACKAGE, "dfloor", defaults.density)?,
            pressure: pin.get_real_or(PACKAGE, "pfloor", defaults.pressure)?,
        };
        if !(floors.density > 0.0) {
            return Err(invalid("dfloor", floors.density, "must be positive"));
        }
        if !(floors.pressure > 0.0) {
            return Err(invalid("pfloor", floors.pressure, "must be positive"));
        }

        let eos: Arc<dyn EquationOfState> = match eos_name.as_str() {
            "adiabatic" => {
                let gamma = pin.get_real_or(PACKAGE, "gamma", Self::DEFAULT_GAMMA)?;
                if !(gamma > 1.0) {
                    return Err(invalid("gamma", gamma, "must exceed 1"));
                }
                Arc::new(AdiabaticGas::new(gamma, floors))
            }
            "isothermal" => {
                let cs = pin.get_real_or(PACKAGE, "iso_sound_speed", 1.0)?;
                if !(cs > 0.0) {
                    return Err(invalid("iso_sound_speed", cs, "must be positive"));
                }
                Arc::new(IsothermalGas::new(cs, floors))
            }
            other => {
                return Err(invalid("eos", other, "expected adiabatic or isothermal"));
            }
        };

        let cfl = pin.get_real_or(PACKAGE, "cfl", Self::DEFAULT_CFL)?;
        if !(cfl > 0.0 && cfl <= 1.0) {
            return Err(invalid("cfl", cfl, "must lie in (0, 1]"));
        }

        let package = Self {
            eos,
            cfl,
            reconstruction: pin.get_or(PACKAGE, "reconstruction", Reconstruction::Plm)?,
            use_scratch: pin.get_bool_or(PACKAGE, "use_scratch", false)?,
        };
        tracing::debug!(
            eos = package.eos.name(),
            cfl,
            reconstruction = ?package.reconstruction,
            use_scratch = package.use_scratch,
            "hydro package initialized"
        );
        Ok(package)
    }

    /// Equation of state.
    pub fn eos(&self) -> &Arc<dyn EquationOfState> {
        &self.eos
    }

    /// Courant number.
    pub fn cfl(&self) -> Real {
        self.cfl
    }

    /// Face reconstruction.
    pub fn reconstruction(&self) -> Reconstruction {
        self.reconstruction
    }

    /// Whether blocks run the scratch flux variant.
    pub fn use_scratch(&self) -> bool {
        self.use_scratch
    }

    /// Slot layout the physics expects.
    pub fn layout(&self) -> FieldLayout {
        self.physics().layout()
    }

    /// Package descriptor shared with every block.
    pub fn descriptor(&self) -> StateDescriptor {
        let mut d = StateDescriptor::new(PACKAGE);
        d.add_param("eos", ParamValue::Str(self.eos.name().into()));
        d.add_param("cfl", ParamValue::Real(self.cfl));
        d.add_param("use_scratch", ParamValue::Bool(self.use_scratch));
        d.add_param(
            "reconstruction",
            ParamValue::Str(
                match self.reconstruction {
                    Reconstruction::DonorCell => "dc",
                    Reconstruction::Plm => "plm",
                }
                .into(),
            ),
        );
        d
    }

    /// Rusanov fluxes, primitive recovery and CFL timestep over this EOS.
    pub fn physics(&self) -> Physics {
        Physics::new(
            Arc::new(RusanovFlux::new(Arc::clone(&self.eos), self.reconstruction)),
            Arc::new(PrimitiveRecovery::new(Arc::clone(&self.eos))),
            Arc::new(CflTimestep::new(Arc::clone(&self.eos), self.cfl)),
        )
    }
}
