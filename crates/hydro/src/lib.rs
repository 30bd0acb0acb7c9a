//! Hydro: a multi-stage task-graph driver for block-decomposed 1-D
//! hydrodynamics.
//!
//! This is the facade crate. It re-exports the sub-crates and provides
//! [`build_driver`], which turns a parsed input file into a ready
//! [`HydroDriver`](driver::HydroDriver).
//!
//! # Quick start
//!
//! ```rust
//! use hydro::prelude::*;
//!
//! let pin = ParameterInput::parse(
//!     "<parthenon/time>\n\
//!      integrator = vl2\n\
//!      nlim = 2\n\
//!      <mesh>\n\
//!      nx1 = 32\n\
//!      <meshblock>\n\
//!      nx1 = 8\n\
//!      <hydro>\n\
//!      eos = adiabatic\n\
//!      cfl = 0.4\n\
//!      <problem>\n\
//!      name = sod\n",
//! )
//! .unwrap();
//! let mut driver = hydro::build_driver(&pin).unwrap();
//! assert_eq!(driver.mesh().nblocks(), 4);
//! assert_eq!(driver.run().unwrap(), 2);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `hydro-core` | IDs, geometry, parameters, errors |
//! | [`slots`] | `hydro-slots` | State slots, slot store, scratch |
//! | [`kernel`] | `hydro-kernel` | Physics kernel traits |
//! | [`mesh`] | `hydro-mesh` | Blocks, exchange, boundary conditions |
//! | [`physics`] | `hydro-physics` | EOS, Rusanov fluxes, CFL, problems |
//! | [`driver`] | `hydro-driver` | Task graph, executors, stage driver |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

mod setup;

pub use setup::{build_driver, build_mesh, executor_from_params, EXEC_BLOCK};

/// Core types, parameters and errors (`hydro-core`).
pub use hydro_core as types;

/// State slots and the per-block slot store (`hydro-slots`).
pub use hydro_slots as slots;

/// Flux, derived-field and timestep traits (`hydro-kernel`).
///
/// Implement [`kernel::FluxKernel`] to plug custom physics into the driver.
pub use hydro_kernel as kernel;

/// Mesh decomposition, ghost exchange and boundary conditions (`hydro-mesh`).
pub use hydro_mesh as mesh;

/// Reference Euler physics (`hydro-physics`).
pub use hydro_physics as physics;

/// Task graph, executors and the stage driver (`hydro-driver`).
pub use hydro_driver as driver;

/// Common imports for typical Hydro usage.
///
/// ```rust
/// use hydro::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use hydro_core::{
        BlockGeometry, BlockId, FieldLayout, ParameterInput, Real, Side, SlotKey,
    };

    // Errors
    pub use hydro_core::{ConfigError, ExchangeError, KernelError, SlotError, TaskError};

    // Kernels
    pub use hydro_kernel::{DerivedFields, FluxContext, FluxKernel, KernelVariant, Physics};

    // Mesh
    pub use hydro_mesh::{BoundaryKind, Mesh, MeshConfig};

    // Physics
    pub use hydro_physics::{HydroPackage, Problem, Reconstruction};

    // Driver
    pub use hydro_driver::{
        DriverConfig, ExecError, HydroDriver, SerialExecutor, StageIntegrator, StepError,
        StepMetrics, TaskExecutor, ThreadedExecutor,
    };
}
