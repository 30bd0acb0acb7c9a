//! Mesh configuration and validation.

use std::fmt;
use std::str::FromStr;

use hydro_core::{ConfigError, ParameterInput, Real};

/// Treatment of a domain edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoundaryKind {
    /// Zero-gradient: ghosts copy the edge cell.
    Outflow,
    /// Mirror: ghosts copy interior cells with x1 momentum negated.
    Reflecting,
    /// Wrap around: the face neighbours the block on the opposite edge.
    Periodic,
}

impl FromStr for BoundaryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "outflow" => Ok(Self::Outflow),
            "reflecting" => Ok(Self::Reflecting),
            "periodic" => Ok(Self::Periodic),
            other => Err(format!(
                "unknown boundary '{other}' (expected outflow, reflecting or periodic)"
            )),
        }
    }
}

impl fmt::Display for BoundaryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Outflow => write!(f, "outflow"),
            Self::Reflecting => write!(f, "reflecting"),
            Self::Periodic => write!(f, "periodic"),
        }
    }
}

/// Uniform x1 decomposition into equally sized blocks.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshConfig {
    /// Interior cells across the whole domain.
    pub nx: usize,
    /// Interior cells per block. Must divide `nx`.
    pub block_nx: usize,
    /// Ghost cells per side. Default: 2.
    pub nghost: usize,
    /// Lower domain edge.
    pub x_min: Real,
    /// Upper domain edge.
    pub x_max: Real,
    /// Inner (low-x1) boundary.
    pub inner_bc: BoundaryKind,
    /// Outer (high-x1) boundary.
    pub outer_bc: BoundaryKind,
}

impl MeshConfig {
    /// Default ghost width.
    pub const DEFAULT_NGHOST: usize = 2;

    /// Read `<mesh>` and `<meshblock>` from parameter input.
    ///
    /// `<mesh>/nx1` is required; `<meshblock>/nx1` defaults to the whole
    /// mesh (a single block); the domain defaults to `[0, 1]` with
    /// outflow boundaries.
    pub fn from_params(pin: &ParameterInput) -> Result<Self, ConfigError> {
        let nx: usize = pin.get_required("mesh", "nx1")?;
        let config = Self {
            nx,
            block_nx: pin.get_or("meshblock", "nx1", nx)?,
            nghost: pin.get_or("mesh", "nghost", Self::DEFAULT_NGHOST)?,
            x_min: pin.get_real_or("mesh", "x1min", 0.0)?,
            x_max: pin.get_real_or("mesh", "x1max", 1.0)?,
            inner_bc: pin.get_or("mesh", "ix1_bc", BoundaryKind::Outflow)?,
            outer_bc: pin.get_or("mesh", "ox1_bc", BoundaryKind::Outflow)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fail = |reason: String| Err(ConfigError::Mesh { reason });
        if self.nx == 0 || self.block_nx == 0 {
            return fail("cell counts must be positive".into());
        }
        if self.nx % self.block_nx != 0 {
            return fail(format!(
                "meshblock nx1 ({}) does not divide mesh nx1 ({})",
                self.block_nx, self.nx
            ));
        }
        if self.nghost == 0 {
            return fail("nghost must be at least 1".into());
        }
        if self.block_nx < self.nghost {
            return fail(format!(
                "meshblock nx1 ({}) is smaller than nghost ({})",
                self.block_nx, self.nghost
            ));
        }
        if !(self.x_min.is_finite() && self.x_max.is_finite()) || self.x_max <= self.x_min {
            return fail(format!(
                "domain [{}, {}] is empty or not finite",
                self.x_min, self.x_max
            ));
        }
        let inner_periodic = self.inner_bc == BoundaryKind::Periodic;
        let outer_periodic = self.outer_bc == BoundaryKind::Periodic;
        if inner_periodic != outer_periodic {
            return fail("periodic boundaries must be set on both x1 faces".into());
        }
        if u32::try_from(self.nblocks()).is_err() {
            return fail(format!("{} blocks exceeds u32::MAX", self.nblocks()));
        }
        Ok(())
    }

    /// Number of blocks.
    pub fn nblocks(&self) -> usize {
        self.nx / self.block_nx
    }

    /// Uniform cell width.
    pub fn dx(&self) -> Real {
        (self.x_max - self.x_min) / self.nx as Real
    }

    /// Whether both faces wrap.
    pub fn is_periodic(&self) -> bool {
        self.inner_bc == BoundaryKind::Periodic
    }
}
