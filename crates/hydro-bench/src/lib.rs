//! Benchmark profiles for the Hydro task driver.
//!
//! Provides pre-built inputs for benchmarks:
//!
//! - [`reference_profile`]: 4096 cells in 16 blocks, periodic, perturbed
//! - [`stress_profile`]: 65536 cells in 64 blocks
//! - [`sod_profile`]: the Sod shock tube at a configurable resolution

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use hydro_core::ParameterInput;
use hydro_driver::HydroDriver;

/// Perturbed periodic gas on `ncells` cells split into `nblocks` blocks.
///
/// `dt` starts unset; [`warmed_driver`] estimates it.
pub fn perturbed_input(ncells: usize, nblocks: usize, seed: u64, nthreads: usize) -> ParameterInput {
    ParameterInput::new()
        .with("parthenon/time", "integrator", "vl2")
        .with("parthenon/exec", "nthreads", nthreads)
        .with("mesh", "nx1", ncells)
        .with("mesh", "ix1_bc", "periodic")
        .with("mesh", "ox1_bc", "periodic")
        .with("meshblock", "nx1", ncells / nblocks)
        .with("hydro", "eos", "adiabatic")
        .with("hydro", "cfl", 0.4)
        .with("hydro", "reconstruction", "plm")
        .with("problem", "name", "perturbed")
        .with("problem", "amplitude", 0.1)
        .with("problem", "seed", seed)
}

/// 4096 cells in 16 blocks.
pub fn reference_profile(seed: u64, nthreads: usize) -> ParameterInput {
    perturbed_input(4096, 16, seed, nthreads)
}

/// 65536 cells in 64 blocks.
pub fn stress_profile(seed: u64, nthreads: usize) -> ParameterInput {
    perturbed_input(65536, 64, seed, nthreads)
}

/// Sod shock tube on `ncells` cells in blocks of `block_nx`.
pub fn sod_profile(ncells: usize, block_nx: usize) -> ParameterInput {
    ParameterInput::new()
        .with("mesh", "nx1", ncells)
        .with("meshblock", "nx1", block_nx)
        .with("hydro", "eos", "adiabatic")
        .with("hydro", "gamma", 1.4)
        .with("hydro", "cfl", 0.4)
        .with("problem", "name", "sod")
}

/// Build a driver from `pin` and take one step so slots and scratch
/// are allocated before timing starts.
///
/// # Panics
///
/// If the profile is invalid or the warm-up step fails.
pub fn warmed_driver(pin: &ParameterInput) -> HydroDriver {
    let mut driver = hydro::build_driver(pin).expect("benchmark profile is valid");
    driver.estimate_initial_dt().expect("initial dt");
    driver.step().expect("warm-up step");
    driver
}
