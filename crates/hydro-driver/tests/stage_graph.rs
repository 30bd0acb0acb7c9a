//! Structure of the per-stage task collections.

use std::sync::Arc;

use hydro_core::{FieldLayout, SlotKey};
use hydro_driver::{
    DriverConfig, HydroDriver, StageIntegrator, StepError, TaskCollection, TaskKind,
};
use hydro_kernel::KernelVariant;
use hydro_test_utils::fixtures::{hydro_input, small_mesh, zero_physics};

const LAYOUT: FieldLayout = FieldLayout {
    nvar: 3,
    nderived: 0,
};

fn driver(nblocks: usize, integrator: StageIntegrator, use_scratch: bool) -> HydroDriver {
    HydroDriver::new(
        &hydro_input(),
        small_mesh(nblocks, LAYOUT, use_scratch),
        zero_physics(3, 0.05),
        DriverConfig::new(integrator),
    )
    .unwrap()
}

fn kinds(tc: &TaskCollection, region: usize, list: usize) -> Vec<TaskKind> {
    tc.regions()[region].lists()[list]
        .tasks()
        .iter()
        .map(|t| t.kind())
        .collect()
}

#[test]
fn three_regions_with_n_one_n_lists() {
    for nblocks in [1, 2, 5] {
        let d = driver(nblocks, StageIntegrator::vl2(0.1).unwrap(), false);
        let blocks = d.mesh().blocks().clone();
        for stage in 1..=2 {
            let tc = d.make_task_collection(&blocks, stage).unwrap();
            assert_eq!(tc.list_counts(), vec![nblocks, 1, nblocks]);
            assert!(tc.validate().is_ok());
        }
    }
}

#[test]
fn region_contents_follow_stage_recipe() {
    let d = driver(2, StageIntegrator::vl2(0.1).unwrap(), false);
    let blocks = d.mesh().blocks().clone();

    let first = d.make_task_collection(&blocks, 1).unwrap();
    assert_eq!(
        kinds(&first, 0, 1),
        vec![
            TaskKind::StartReceive,
            TaskKind::CalculateFluxes(KernelVariant::Direct)
        ]
    );
    assert_eq!(
        kinds(&first, 1, 0),
        vec![
            TaskKind::FluxDivergence,
            TaskKind::UpdateContainer,
            TaskKind::SendBoundaries,
            TaskKind::ReceiveBoundaries,
            TaskKind::SetBoundaries,
        ]
    );
    assert_eq!(
        kinds(&first, 2, 0),
        vec![
            TaskKind::ClearBoundary,
            TaskKind::ApplyBoundaryConditions,
            TaskKind::FillDerived,
        ]
    );

    let last = d.make_task_collection(&blocks, 2).unwrap();
    assert_eq!(
        kinds(&last, 2, 1),
        vec![
            TaskKind::ClearBoundary,
            TaskKind::ApplyBoundaryConditions,
            TaskKind::FillDerived,
            TaskKind::EstimateTimestep,
        ]
    );
}

#[test]
fn dependencies_match_recipe() {
    let d = driver(2, StageIntegrator::vl2(0.1).unwrap(), false);
    let blocks = d.mesh().blocks().clone();
    let layout = d.make_task_collection(&blocks, 2).unwrap().layout();

    // Region A tasks have no dependencies.
    assert!(layout[0].iter().flatten().all(|t| t.dependency.is_none()));

    // Region B is a chain.
    let b = &layout[1][0];
    assert_eq!(b[0].dependency, None);
    for pair in b.windows(2) {
        assert_eq!(pair[1].dependency, Some(pair[0].id));
    }
    let set = b[4].id;

    // Region C: clear has none, BC waits on set, derived on BC, timestep on derived.
    for list in &layout[2] {
        assert_eq!(list[0].dependency, None);
        assert_eq!(list[1].dependency, Some(set));
        assert_eq!(list[2].dependency, Some(list[1].id));
        assert_eq!(list[3].dependency, Some(list[2].id));
    }
}

#[test]
fn stage_slots_resolve_through_integrator() {
    let d = driver(1, StageIntegrator::vl2(0.1).unwrap(), false);
    let blocks = d.mesh().blocks().clone();

    let first = d.make_task_collection(&blocks, 1).unwrap().layout();
    assert_eq!(first[0][0][0].slot, Some(SlotKey::Stage(1)));
    assert_eq!(first[0][0][1].slot, Some(SlotKey::Base));
    assert_eq!(first[1][0][0].slot, Some(SlotKey::RateOfChange));

    let second = d.make_task_collection(&blocks, 2).unwrap().layout();
    assert_eq!(second[0][0][0].slot, Some(SlotKey::Base));
    assert_eq!(second[0][0][1].slot, Some(SlotKey::Stage(1)));
    assert_eq!(second[1][0][1].slot, Some(SlotKey::Base));
}

#[test]
fn identical_inputs_build_identical_layouts() {
    let d = driver(3, StageIntegrator::vl2(0.1).unwrap(), true);
    let blocks = d.mesh().blocks().clone();
    for stage in 1..=2 {
        let a = d.make_task_collection(&blocks, stage).unwrap().layout();
        let b = d.make_task_collection(&blocks, stage).unwrap().layout();
        assert_eq!(a, b);
    }
}

#[test]
fn scratch_flag_selects_variant() {
    let d = driver(2, StageIntegrator::rk1(0.1).unwrap(), true);
    let blocks = d.mesh().blocks().clone();
    let tc = d.make_task_collection(&blocks, 1).unwrap();
    assert_eq!(
        kinds(&tc, 0, 0)[1],
        TaskKind::CalculateFluxes(KernelVariant::Scratch)
    );
}

#[test]
fn slots_are_created_lazily_once() {
    let d = driver(2, StageIntegrator::new("rk3", vec![1.0, 0.25, 2.0 / 3.0], 0.1).unwrap(), false);
    let blocks = d.mesh().blocks().clone();
    assert_eq!(d.slot_allocations(), 0);

    d.make_task_collection(&blocks, 1).unwrap();
    // Two intermediate stages and the rate-of-change slot per block.
    assert_eq!(d.slot_allocations(), 6);
    {
        let block = blocks[0].lock().unwrap();
        let keys: Vec<_> = block.slots().keys().collect();
        assert_eq!(
            keys,
            vec![
                SlotKey::Base,
                SlotKey::Stage(1),
                SlotKey::Stage(2),
                SlotKey::RateOfChange
            ]
        );
    }

    d.make_task_collection(&blocks, 1).unwrap();
    d.make_task_collection(&blocks, 2).unwrap();
    assert_eq!(d.slot_allocations(), 6);
}

#[test]
fn out_of_range_stage_is_rejected() {
    let d = driver(1, StageIntegrator::vl2(0.1).unwrap(), false);
    let blocks = d.mesh().blocks().clone();
    for stage in [0, 3] {
        assert!(matches!(
            d.make_task_collection(&blocks, stage),
            Err(StepError::InvalidStage { nstages: 2, .. })
        ));
    }
}

#[test]
fn graph_holds_block_handles_not_copies() {
    let d = driver(2, StageIntegrator::rk1(0.1).unwrap(), false);
    let blocks = d.mesh().blocks().clone();
    let before = Arc::strong_count(&blocks[0]);
    let tc = d.make_task_collection(&blocks, 1).unwrap();
    assert!(Arc::strong_count(&blocks[0]) > before);
    drop(tc);
    assert_eq!(Arc::strong_count(&blocks[0]), before);
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn task_counts_follow_block_and_stage_counts(
            nblocks in 1usize..8,
            nstages in 1usize..5,
            use_scratch in any::<bool>(),
        ) {
            let integrator = StageIntegrator::new("custom", vec![1.0; nstages], 0.1).unwrap();
            let d = driver(nblocks, integrator, use_scratch);
            let blocks = d.mesh().blocks().clone();
            for stage in 1..=nstages {
                let tc = d.make_task_collection(&blocks, stage).unwrap();
                let per_block_c = if stage == nstages { 4 } else { 3 };
                prop_assert_eq!(tc.list_counts(), vec![nblocks, 1, nblocks]);
                prop_assert_eq!(tc.task_count(), nblocks * 2 + 5 + nblocks * per_block_c);
                prop_assert!(tc.validate().is_ok());
            }
            prop_assert_eq!(d.slot_allocations(), (nblocks * nstages) as u64);
        }
    }
}
