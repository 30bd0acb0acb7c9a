//! Input file to ready driver.

use std::sync::Arc;

use hydro_core::{ConfigError, Packages, ParameterInput};
use hydro_driver::{DriverConfig, HydroDriver, SerialExecutor, TaskExecutor, ThreadedExecutor};
use hydro_mesh::{with_block, Mesh, MeshConfig};
use hydro_physics::{HydroPackage, Problem};

/// Input block holding executor settings.
pub const EXEC_BLOCK: &str = "parthenon/exec";

/// Build the mesh described by `<mesh>` / `<meshblock>` and fill every
/// block's base slot from `<problem>`.
pub fn build_mesh(pin: &ParameterInput, package: &HydroPackage) -> Result<Mesh, ConfigError> {
    let config = MeshConfig::from_params(pin)?;
    let mut packages = Packages::new();
    packages.add(package.descriptor());
    let mesh = Mesh::new(config, package.layout(), Arc::new(packages))?;

    let problem = Problem::from_params(pin)?;
    let eos = Arc::clone(package.eos());
    for handle in mesh.blocks() {
        with_block(handle, |block| {
            let (id, geometry) = (block.id(), *block.geometry());
            problem.generate(eos.as_ref(), id, &geometry, block.slots_mut().base_mut());
            Ok(())
        })
        .map_err(|e| ConfigError::Mesh {
            reason: format!("initial condition failed: {e}"),
        })?;
    }
    tracing::debug!(?problem, nblocks = mesh.nblocks(), "initial condition generated");
    Ok(mesh)
}

/// Executor from `<parthenon/exec> nthreads` (default 1, serial).
pub fn executor_from_params(pin: &ParameterInput) -> Result<Box<dyn TaskExecutor>, ConfigError> {
    let nthreads: usize = pin.get_or(EXEC_BLOCK, "nthreads", 1)?;
    Ok(match nthreads {
        0 => {
            return Err(ConfigError::InvalidValue {
                block: EXEC_BLOCK.into(),
                key: "nthreads".into(),
                value: "0".into(),
                reason: "must be at least 1".into(),
            })
        }
        1 => Box::new(SerialExecutor),
        n => Box::new(ThreadedExecutor::new(n)),
    })
}

/// Wire a complete driver from parsed input.
///
/// Reads `<hydro>`, `<mesh>`, `<meshblock>`, `<problem>`,
/// `<parthenon/time>` and `<parthenon/exec>`. The initial `dt` is left as
/// configured; [`HydroDriver::run`] estimates it when unset.
pub fn build_driver(pin: &ParameterInput) -> Result<HydroDriver, ConfigError> {
    let package = HydroPackage::initialize(pin)?;
    let mesh = build_mesh(pin, &package)?;
    let config = DriverConfig::from_params(pin)?;
    let executor = executor_from_params(pin)?;
    let executor_name = executor.name().to_owned();
    let driver = HydroDriver::new(pin, mesh, package.physics(), config)?.with_executor(executor);
    tracing::info!(
        nblocks = driver.mesh().nblocks(),
        integrator = driver.config().integrator.name(),
        executor = %executor_name,
        "driver ready"
    );
    Ok(driver)
}
