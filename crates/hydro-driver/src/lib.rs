//! Multi-stage task-graph driver for Hydro.
//!
//! [`HydroDriver`] advances a [`Mesh`](hydro_mesh::Mesh) by one step of
//! an explicit multi-stage scheme. Each stage is expressed as a
//! [`TaskCollection`] of three regions (see [`HydroDriver`] for the
//! shape) and handed to a [`TaskExecutor`]. After the final stage the
//! per-block timestep estimates are reduced into the next `dt`.
//!
//! # Crate layout
//!
//! - [`task`]: task, list, region and collection types.
//! - [`executor`]: serial and threaded executors.
//! - [`update`]: flux divergence, stage update, per-block kernel tasks.
//! - [`integrator`]: stage weights and stage slot naming.
//! - [`reduction`]: mesh-wide timestep reduction.
//! - [`config`]: `<parthenon/time>` settings.
//! - [`metrics`]: per-step timings.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod driver;
pub mod executor;
pub mod integrator;
pub mod metrics;
pub mod reduction;
pub mod task;
pub mod update;

pub use config::DriverConfig;
pub use driver::{HydroDriver, StepError};
pub use executor::{ExecError, ExecutionReport, SerialExecutor, TaskExecutor, ThreadedExecutor};
pub use integrator::StageIntegrator;
pub use metrics::StepMetrics;
pub use reduction::{MinReduction, TimestepReduction};
pub use task::{
    GraphError, GraphLayout, Task, TaskCollection, TaskId, TaskKind, TaskList, TaskRegion,
    TaskSummary,
};
