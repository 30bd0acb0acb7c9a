//! End-to-end evolution with the reference Euler physics.

use hydro::prelude::*;
use hydro::types::{IDN, IEN};
use proptest::prelude::*;

fn input(problem: &str, bc: &str, extra: &str) -> ParameterInput {
    ParameterInput::parse(&format!(
        "<parthenon/time>\n\
         integrator = vl2\n\
         nlim = 6\n\
         <mesh>\n\
         nx1 = 64\n\
         ix1_bc = {bc}\n\
         ox1_bc = {bc}\n\
         <meshblock>\n\
         nx1 = 16\n\
         <hydro>\n\
         eos = adiabatic\n\
         gamma = 1.4\n\
         cfl = 0.4\n\
         {extra}\n\
         <problem>\n\
         {problem}\n"
    ))
    .unwrap()
}

/// Interior values of `var` across the mesh, in block order.
fn interior(driver: &HydroDriver, var: usize) -> Vec<f64> {
    driver
        .mesh()
        .blocks()
        .iter()
        .flat_map(|h| {
            let block = h.lock().unwrap();
            let range = block.geometry().interior();
            block.slots().base().var(var)[range].to_vec()
        })
        .collect()
}

fn total_mass(driver: &HydroDriver) -> f64 {
    interior(driver, IDN).iter().sum::<f64>() * driver.mesh().config().dx()
}

fn evolve(pin: &ParameterInput) -> HydroDriver {
    let mut driver = hydro::build_driver(pin).unwrap();
    driver.run().unwrap();
    driver
}

#[test]
fn sod_stays_physical_and_far_field_is_untouched() {
    let driver = evolve(&input("name = sod", "outflow", ""));
    assert_eq!(driver.cycle(), 6);

    let rho = interior(&driver, IDN);
    assert!(rho.iter().all(|r| r.is_finite() && *r > 0.0));
    assert_eq!(rho[0], 1.0);
    assert_eq!(rho[63], 0.125);

    for h in driver.mesh().blocks() {
        let block = h.lock().unwrap();
        let range = block.geometry().interior();
        let p = &block.slots().base().derived(2)[range];
        assert!(p.iter().all(|p| p.is_finite() && *p > 0.0));
    }
}

#[test]
fn serial_and_threaded_are_bit_identical() {
    let serial = evolve(&input("name = sod", "outflow", ""));
    let pin = input("name = sod", "outflow", "").with(hydro::EXEC_BLOCK, "nthreads", 4);
    let threaded = evolve(&pin);
    for var in [IDN, 1, IEN] {
        assert_eq!(interior(&serial, var), interior(&threaded, var));
    }
    assert_eq!(serial.time(), threaded.time());
}

#[test]
fn scratch_and_direct_are_bit_identical() {
    let direct = evolve(&input("name = sod", "outflow", "use_scratch = false"));
    let scratch = evolve(&input("name = sod", "outflow", "use_scratch = true"));
    for var in [IDN, 1, IEN] {
        assert_eq!(interior(&direct, var), interior(&scratch, var));
    }
}

#[test]
fn donor_cell_runs_too() {
    let driver = evolve(&input("name = sod", "outflow", "reconstruction = dc"));
    assert!(interior(&driver, IDN).iter().all(|r| r.is_finite() && *r > 0.0));
}

#[test]
fn reflecting_walls_conserve_mass() {
    let pin = input("name = sod", "reflecting", "");
    let before = total_mass(&hydro::build_driver(&pin).unwrap());
    let after = total_mass(&evolve(&pin));
    assert!((after - before).abs() < 1e-12 * before);
}

#[test]
fn uniform_state_is_steady() {
    let driver = evolve(&input("name = uniform\nrho = 2.0\np = 0.5", "outflow", ""));
    assert!(interior(&driver, IDN).iter().all(|&r| r == 2.0));
    assert!(interior(&driver, 1).iter().all(|&m| m == 0.0));
}

fn base_interior_and_ghosts(driver: &HydroDriver) -> Vec<f64> {
    driver
        .mesh()
        .blocks()
        .iter()
        .flat_map(|h| {
            let block = h.lock().unwrap();
            let base = block.slots().base();
            (0..base.nvar()).flat_map(|v| base.var(v).to_vec()).collect::<Vec<_>>()
        })
        .collect()
}

#[test]
fn configured_dt_first_step_sees_exchanged_ghosts() {
    let problem = "name = perturbed\namplitude = 0.3\nseed = 11";
    let pin = input(problem, "periodic", "")
        .with("meshblock", "nx1", 32)
        .with("parthenon/time", "dt", 0.001);

    let mut configured = hydro::build_driver(&pin).unwrap();
    assert_eq!(configured.mesh().nblocks(), 2);
    assert_eq!(configured.dt(), 0.001);
    configured.step().unwrap();

    let mut estimated = hydro::build_driver(&pin).unwrap();
    estimated.estimate_initial_dt().unwrap();
    estimated.set_dt(0.001).unwrap();
    estimated.step().unwrap();

    assert_eq!(
        base_interior_and_ghosts(&configured),
        base_interior_and_ghosts(&estimated)
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn periodic_runs_conserve_mass(seed in any::<u64>(), amplitude in 0.0f64..0.5) {
        let pin = input(
            &format!("name = perturbed\namplitude = {amplitude}\nseed = {seed}"),
            "periodic",
            "",
        );
        let before = total_mass(&hydro::build_driver(&pin).unwrap());
        let driver = evolve(&pin);
        let after = total_mass(&driver);
        prop_assert!((after - before).abs() < 1e-12 * before);
        prop_assert!(driver.dt() > 0.0);
    }

    #[test]
    fn perturbed_initial_state_is_reproducible(seed in any::<u64>()) {
        let pin = input(&format!("name = perturbed\nseed = {seed}"), "periodic", "");
        let a = hydro::build_driver(&pin).unwrap();
        let b = hydro::build_driver(&pin).unwrap();
        prop_assert_eq!(interior(&a, IDN), interior(&b, IDN));
    }
}
