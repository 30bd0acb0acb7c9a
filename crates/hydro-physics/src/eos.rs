//! Equations of state for the 1-D Euler equations.
//!
//! Conserved states are `[rho, rho*v, E]` and primitive states
//! `[rho, v, p]`, both as `[Real; NHYDRO]`. The isothermal gas evolves
//! only the first two conserved variables; its energy slot stays zero.

use std::fmt;

use hydro_core::{Real, IDN, IEN, IM1, NHYDRO};

/// A cell state in conserved or primitive form.
pub type State = [Real; NHYDRO];

/// Gather cell `i` from a variable-major conserved buffer.
pub(crate) fn load(data: &[Real], nvar: usize, ncells: usize, i: usize) -> State {
    let mut u = [0.0; NHYDRO];
    for (v, value) in u.iter_mut().enumerate().take(nvar) {
        *value = data[v * ncells + i];
    }
    u
}

/// Lower bounds applied whenever primitives are recovered.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Floors {
    /// Density floor.
    pub density: Real,
    /// Pressure floor.
    pub pressure: Real,
}

impl Default for Floors {
    fn default() -> Self {
        Self {
            density: 1e-10,
            pressure: 1e-10,
        }
    }
}

/// Closure relation between conserved and primitive variables.
pub trait EquationOfState: Send + Sync + fmt::Debug + 'static {
    /// Name for logs.
    fn name(&self) -> &str;

    /// Number of conserved variables evolved (2 or 3).
    fn nvar(&self) -> usize;

    /// Density and pressure floors.
    fn floors(&self) -> Floors;

    /// Recover `[rho, v, p]` from conserved variables, applying floors.
    fn conserved_to_primitive(&self, u: &State) -> State;

    /// Build conserved variables from `[rho, v, p]`.
    fn primitive_to_conserved(&self, w: &State) -> State;

    /// Adiabatic or isothermal sound speed of a primitive state.
    fn sound_speed(&self, w: &State) -> Real;

    /// Physical x1 flux of a primitive state.
    fn flux(&self, w: &State) -> State;

    /// Clamp a reconstructed primitive state to the floors.
    fn apply_floors(&self, w: &mut State) {
        let floors = self.floors();
        w[IDN] = w[IDN].max(floors.density);
        w[IEN] = w[IEN].max(floors.pressure);
    }
}

// ── Adiabatic ─────────────────────────────────────────────────────

/// Ideal gas with constant adiabatic index.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AdiabaticGas {
    gamma: Real,
    floors: Floors,
}

impl AdiabaticGas {
    /// Ideal gas with adiabatic index `gamma` (> 1).
    pub fn new(gamma: Real, floors: Floors) -> Self {
        Self { gamma, floors }
    }

    /// Adiabatic index.
    pub fn gamma(&self) -> Real {
        self.gamma
    }
}

impl EquationOfState for AdiabaticGas {
    fn name(&self) -> &str {
        "adiabatic"
    }

    fn nvar(&self) -> usize {
        3
    }

    fn floors(&self) -> Floors {
        self.floors
    }

    fn conserved_to_primitive(&self, u: &State) -> State {
        let rho = u[IDN].max(self.floors.density);
        let v = u[IM1] / rho;
        let p = (self.gamma - 1.0) * (u[IEN] - 0.5 * rho * v * v);
        [rho, v, p.max(self.floors.pressure)]
    }

    fn primitive_to_conserved(&self, w: &State) -> State {
        let (rho, v, p) = (w[IDN], w[IM1], w[IEN]);
        [rho, rho * v, p / (self.gamma - 1.0) + 0.5 * rho * v * v]
    }

    fn sound_speed(&self, w: &State) -> Real {
        (self.gamma * w[IEN] / w[IDN]).sqrt()
    }

    fn flux(&self, w: &State) -> State {
        let (rho, v, p) = (w[IDN], w[IM1], w[IEN]);
        let energy = p / (self.gamma - 1.0) + 0.5 * rho * v * v;
        [rho * v, rho * v * v + p, (energy + p) * v]
    }
}

// ── Isothermal ────────────────────────────────────────────────────

/// Gas at fixed temperature: `p = rho * cs^2`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IsothermalGas {
    sound_speed: Real,
    floors: Floors,
}

impl IsothermalGas {
    /// Isothermal gas with sound speed `cs` (> 0).
    pub fn new(sound_speed: Real, floors: Floors) -> Self {
        Self {
            sound_speed,
            floors,
        }
    }
}

impl EquationOfState for IsothermalGas {
    fn name(&self) -> &str {
        "isothermal"
    }

    fn nvar(&self) -> usize {
        2
    }

    fn floors(&self) -> Floors {
        self.floors
    }

    fn conserved_to_primitive(&self, u: &State) -> State {
        let rho = u[IDN].max(self.floors.density);
        let p = rho * self.sound_speed * self.sound_speed;
        [rho, u[IM1] / rho, p.max(self.floors.pressure)]
    }

    fn primitive_to_conserved(&self, w: &State) -> State {
        [w[IDN], w[IDN] * w[IM1], 0.0]
    }

    fn sound_speed(&self, _w: &State) -> Real {
        self.sound_speed
    }

    fn flux(&self, w: &State) -> State {
        let (rho, v) = (w[IDN], w[IM1]);
        let p = rho * self.sound_speed * self.sound_speed;
        [rho * v, rho * v * v + p, 0.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: &State, b: &State) -> bool {
        a.iter().zip(b).all(|(x, y)| (x - y).abs() <= 1e-12 * (1.0 + y.abs()))
    }

    #[test]
    fn adiabatic_primitive_roundtrip() {
        let eos = AdiabaticGas::new(1.4, Floors::default());
        let w = [1.2, -0.3, 2.5];
        let u = eos.primitive_to_conserved(&w);
        assert!(close(&eos.conserved_to_primitive(&u), &w));
    }

    #[test]
    fn adiabatic_sound_speed() {
        let eos = AdiabaticGas::new(1.4, Floors::default());
        let c = eos.sound_speed(&[1.0, 0.0, 1.0]);
        assert!((c - 1.4f64.sqrt()).abs() < 1e-15);
    }

    #[test]
    fn adiabatic_static_flux_is_pressure_only() {
        let eos = AdiabaticGas::new(5.0 / 3.0, Floors::default());
        assert_eq!(eos.flux(&[2.0, 0.0, 0.7]), [0.0, 0.7, 0.0]);
    }

    #[test]
    fn floors_clamp_vacuum() {
        let floors = Floors {
            density: 1e-3,
            pressure: 1e-4,
        };
        let eos = AdiabaticGas::new(1.4, floors);
        let w = eos.conserved_to_primitive(&[0.0, 0.0, -1.0]);
        assert_eq!(w[IDN], 1e-3);
        assert_eq!(w[IEN], 1e-4);
    }

    #[test]
    fn isothermal_pressure_follows_density() {
        let eos = IsothermalGas::new(2.0, Floors::default());
        assert_eq!(eos.nvar(), 2);
        let w = eos.conserved_to_primitive(&[3.0, 6.0, 0.0]);
        assert_eq!(w, [3.0, 2.0, 12.0]);
        assert_eq!(eos.flux(&w), [6.0, 24.0, 0.0]);
        assert_eq!(eos.primitive_to_conserved(&w), [3.0, 6.0, 0.0]);
    }
}
