//! The stage driver: builds one task collection per stage and runs it.

use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;

use hydro_core::{ConfigError, ParameterInput, Real, SlotKey, TaskError};
use hydro_kernel::{KernelVariant, Physics};
use hydro_mesh::exchange::{
    clear_boundary, receive_boundary_buffers, send_boundary_buffers, set_boundaries,
    start_receiving,
};
use hydro_mesh::{
    apply_boundary_conditions, lock_block, with_block, BlockHandle, BlockList, Mesh,
};

use crate::config::DriverConfig;
use crate::executor::{ExecError, SerialExecutor, TaskExecutor};
use crate::metrics::StepMetrics;
use crate::reduction::{MinReduction, TimestepReduction};
use crate::task::{TaskCollection, TaskKind};
use crate::update;

/// Package whose parameters the driver consults.
const HYDRO: &str = "hydro";

/// Why a step (or the graph for one stage) could not be completed.
#[derive(Debug, Error)]
pub enum StepError {
    /// Configuration is unusable (e.g. `dt` not yet known).
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// `stage` is outside `1..=nstages`.
    #[error("stage {stage} is outside 1..={nstages}")]
    InvalidStage {
        /// Requested stage.
        stage: usize,
        /// Stages in the integrator.
        nstages: usize,
    },
    /// Lazy slot creation failed while building a stage's graph.
    #[error("building stage {stage} failed")]
    Build {
        /// Stage being built.
        stage: usize,
        /// Underlying failure.
        #[source]
        source: TaskError,
    },
    /// A stage's task collection failed.
    #[error("stage {stage} failed")]
    Stage {
        /// Failing stage.
        stage: usize,
        /// Underlying failure.
        #[source]
        source: ExecError,
    },
    /// The timestep reduction failed.
    #[error("timestep reduction failed")]
    Reduction(#[source] TaskError),
}

/// Advances a [`Mesh`] one multi-stage step at a time.
///
/// Each stage is three regions:
///
/// ```text
/// A  per block   StartReceive(stage[s])      CalculateFluxes(stage[s-1])
/// B  collective  FluxDivergence → UpdateContainer → Send → Receive → Set
/// C  per block   ClearBoundary   ApplyBC → FillDerived [→ EstimateTimestep]
/// ```
///
/// `EstimateTimestep` only appears on the final stage. After the last
/// stage the per-block estimates are reduced into the next step's `dt`.
pub struct HydroDriver {
    mesh: Mesh,
    physics: Physics,
    config: DriverConfig,
    executor: Box<dyn TaskExecutor>,
    reduction: Box<dyn TimestepReduction>,
    time: Real,
    cycle: u64,
    last_metrics: StepMetrics,
    base_ready: bool,
}

impl HydroDriver {
    /// Create a driver over `mesh`.
    ///
    /// Fails if `<hydro>/eos` is missing; warns if `<hydro>/cfl` is.
    /// Nothing runs before these checks pass.
    pub fn new(
        pin: &ParameterInput,
        mesh: Mesh,
        physics: Physics,
        config: DriverConfig,
    ) -> Result<Self, ConfigError> {
        pin.check_required(HYDRO, "eos")?;
        pin.check_desired(HYDRO, "cfl");
        config.validate()?;
        if physics.layout() != mesh.layout() {
            return Err(ConfigError::Mesh {
                reason: format!(
                    "mesh layout {:?} does not match physics layout {:?}",
                    mesh.layout(),
                    physics.layout()
                ),
            });
        }
        tracing::debug!(
            integrator = config.integrator.name(),
            nstages = config.integrator.nstages(),
            nblocks = mesh.nblocks(),
            ?physics,
            "driver created"
        );
        Ok(Self {
            mesh,
            physics,
            config,
            executor: Box::new(SerialExecutor),
            reduction: Box::new(MinReduction),
            time: 0.0,
            cycle: 0,
            last_metrics: StepMetrics::default(),
            base_ready: false,
        })
    }

    /// Replace the executor.
    pub fn with_executor(mut self, executor: Box<dyn TaskExecutor>) -> Self {
        self.executor = executor;
        self
    }

    /// Replace the timestep reduction.
    pub fn with_reduction(mut self, reduction: Box<dyn TimestepReduction>) -> Self {
        self.reduction = reduction;
        self
    }

    /// The mesh.
    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    /// Physics collaborators.
    pub fn physics(&self) -> &Physics {
        &self.physics
    }

    /// Driver configuration, including the integrator.
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Timestep of the next step.
    pub fn dt(&self) -> Real {
        self.config.integrator.dt()
    }

    /// Set the timestep of the next step.
    pub fn set_dt(&mut self, dt: Real) -> Result<(), ConfigError> {
        self.config.integrator.set_dt(dt)
    }

    /// Simulation time.
    pub fn time(&self) -> Real {
        self.time
    }

    /// Completed steps.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Metrics of the most recent step.
    pub fn last_metrics(&self) -> &StepMetrics {
        &self.last_metrics
    }

    fn exchange_timeout(&self) -> Duration {
        self.config.exchange_timeout
    }

    /// Build the task collection for stage `stage` (1-based).
    ///
    /// On stage 1 any missing intermediate-stage and rate-of-change slots
    /// are cloned from the base state. Existing slots are reused. Building
    /// the same stage twice yields the same layout.
    pub fn make_task_collection(
        &self,
        blocks: &BlockList,
        stage: usize,
    ) -> Result<TaskCollection, StepError> {
        let integrator = &self.config.integrator;
        let nstages = integrator.nstages();
        let beta = integrator.beta(stage).ok_or(StepError::InvalidStage { stage, nstages })?;
        let dt = integrator.dt();
        let src = integrator.stage_slot(stage - 1);
        let dst = integrator.stage_slot(stage);
        let rate = SlotKey::RateOfChange;
        let build = |source: TaskError| StepError::Build { stage, source };

        let mut tc = TaskCollection::new();

        // Region A: arm receives and compute fluxes, independently per block.
        let region = tc.add_region(blocks.len());
        for (i, handle) in blocks.iter().enumerate() {
            let (id, variant) = {
                let mut block = lock_block(handle).map_err(build)?;
                if stage == 1 {
                    let slots = block.slots_mut();
                    for key in integrator.intermediate_slots().chain([rate]) {
                        slots
                            .ensure_cloned(key, SlotKey::Base)
                            .map_err(|e| build(e.into()))?;
                    }
                }
                let use_scratch = block
                    .packages()
                    .get(HYDRO)
                    .and_then(|d| d.param_bool("use_scratch"))
                    .unwrap_or(false);
                (block.id(), KernelVariant::from_use_scratch(use_scratch))
            };
            let list = &mut region[i];

            let h = Arc::clone(handle);
            list.add_task(None, TaskKind::StartReceive, Some(id), Some(dst), move || {
                with_block(&h, |b| start_receiving(b, dst))
            });

            let h = Arc::clone(handle);
            let physics = self.physics.clone();
            list.add_task(
                None,
                TaskKind::CalculateFluxes(variant),
                Some(id),
                Some(src),
                move || {
                    with_block(&h, |b| {
                        update::calculate_fluxes(b, &physics, variant, src, stage, nstages)
                    })
                },
            );
        }

        // Region B: one collective list over the whole mesh.
        let shared: Arc<[BlockHandle]> = blocks.iter().cloned().collect();
        let mailbox = Arc::clone(self.mesh.mailbox());
        let timeout = self.exchange_timeout();
        let list = &mut tc.add_region(1)[0];

        let bs = Arc::clone(&shared);
        let flux_div = list.add_task(None, TaskKind::FluxDivergence, None, Some(rate), move || {
            update::flux_divergence(&bs, src, rate)
        });
        let bs = Arc::clone(&shared);
        let updated = list.add_task(
            Some(flux_div),
            TaskKind::UpdateContainer,
            None,
            Some(dst),
            move || update::update_container(&bs, src, rate, beta, dt, dst),
        );
        let (bs, mb) = (Arc::clone(&shared), Arc::clone(&mailbox));
        let send = list.add_task(
            Some(updated),
            TaskKind::SendBoundaries,
            None,
            Some(dst),
            move || send_boundary_buffers(&bs, &mb, dst),
        );
        let (bs, mb) = (Arc::clone(&shared), Arc::clone(&mailbox));
        let recv = list.add_task(
            Some(send),
            TaskKind::ReceiveBoundaries,
            None,
            Some(dst),
            move || receive_boundary_buffers(&bs, &mb, dst, timeout),
        );
        let bs = Arc::clone(&shared);
        let set = list.add_task(Some(recv), TaskKind::SetBoundaries, None, Some(dst), move || {
            set_boundaries(&bs, dst)
        });

        // Region C: physical boundaries, derived fields and timestep per block.
        let region = tc.add_region(blocks.len());
        for (i, handle) in blocks.iter().enumerate() {
            let id = lock_block(handle).map_err(build)?.id();
            let list = &mut region[i];

            let h = Arc::clone(handle);
            list.add_task(None, TaskKind::ClearBoundary, Some(id), Some(dst), move || {
                with_block(&h, |b| clear_boundary(b, dst))
            });

            let h = Arc::clone(handle);
            let bc = list.add_task(
                Some(set),
                TaskKind::ApplyBoundaryConditions,
                Some(id),
                Some(dst),
                move || with_block(&h, |b| apply_boundary_conditions(b, dst)),
            );

            let h = Arc::clone(handle);
            let physics = self.physics.clone();
            let derived = list.add_task(
                Some(bc),
                TaskKind::FillDerived,
                Some(id),
                Some(dst),
                move || with_block(&h, |b| update::fill_derived(b, &physics, dst)),
            );

            if stage == nstages {
                let h = Arc::clone(handle);
                let physics = self.physics.clone();
                list.add_task(
                    Some(derived),
                    TaskKind::EstimateTimestep,
                    Some(id),
                    Some(dst),
                    move || with_block(&h, |b| update::estimate_timestep(b, &physics, dst)),
                );
            }
        }

        tracing::debug!(
            stage,
            nstages,
            %src,
            %dst,
            tasks = tc.task_count(),
            "task collection built"
        );
        Ok(tc)
    }

    /// Advance one full step of `nstages` stages with the current `dt`.
    ///
    /// The first step (and the first after a failure) runs
    /// [`prepare_base`](Self::prepare_base) before stage 1.
    ///
    /// On success, time and cycle advance and the reduced block estimate
    /// (if any) becomes the next step's `dt`. On failure the step is
    /// abandoned: nothing is rolled back and queued boundary messages are
    /// discarded.
    pub fn step(&mut self) -> Result<&StepMetrics, StepError> {
        let dt = self.dt();
        if dt <= 0.0 {
            return Err(ConfigError::Integrator {
                reason: "dt is not set; call estimate_initial_dt or set_dt".into(),
            }
            .into());
        }
        if !self.base_ready {
            self.prepare_base()?;
        }
        let start = Instant::now();
        let blocks = self.mesh.blocks().clone();
        let nstages = self.config.integrator.nstages();
        let mut metrics = StepMetrics {
            dt,
            ..StepMetrics::default()
        };

        for stage in 1..=nstages {
            let stage_start = Instant::now();
            let tc = self.make_task_collection(&blocks, stage)?;
            let report = self.executor.execute(tc).map_err(|source| {
                self.base_ready = false;
                let dropped = self.mesh.mailbox().drain();
                tracing::error!(
                    cycle = self.cycle,
                    stage,
                    error = %source,
                    dropped_messages = dropped,
                    "stage failed"
                );
                StepError::Stage { stage, source }
            })?;
            metrics.tasks_executed += report.completed.len();
            metrics.region_us.push(report.region_us);
            metrics.stage_us.push(elapsed_us(stage_start));
            tracing::debug!(cycle = self.cycle, stage, executor = self.executor.name(), "stage complete");
        }

        let next = self
            .reduction
            .reduce(&blocks)
            .map_err(StepError::Reduction)?;
        if let Some(next_dt) = next {
            self.config.integrator.set_dt(next_dt)?;
        }
        self.time += dt;
        self.cycle += 1;

        metrics.next_dt = next;
        metrics.slot_allocations = self.slot_allocations();
        metrics.total_us = elapsed_us(start);
        tracing::debug!(
            cycle = self.cycle,
            time = self.time,
            dt,
            next_dt = ?next,
            "step complete"
        );
        self.last_metrics = metrics;
        Ok(&self.last_metrics)
    }

    /// Exchange, apply boundary conditions to and fill derived fields of
    /// the base slot.
    ///
    /// Runs before the first step (and after a failed one) so stage 1
    /// never reads ghost cells that no exchange has written.
    pub fn prepare_base(&mut self) -> Result<(), StepError> {
        let blocks = self.mesh.blocks().clone();
        let base = SlotKey::Base;
        let build = |source: TaskError| StepError::Build { stage: 0, source };
        let ids = blocks
            .iter()
            .map(|h| lock_block(h).map(|b| b.id()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(build)?;
        let mut tc = TaskCollection::new();

        let region = tc.add_region(blocks.len());
        for (i, handle) in blocks.iter().enumerate() {
            let h = Arc::clone(handle);
            region[i].add_task(None, TaskKind::StartReceive, Some(ids[i]), Some(base), move || {
                with_block(&h, |b| start_receiving(b, base))
            });
        }

        let shared: Arc<[BlockHandle]> = blocks.iter().cloned().collect();
        let mailbox = Arc::clone(self.mesh.mailbox());
        let timeout = self.exchange_timeout();
        let list = &mut tc.add_region(1)[0];
        let (bs, mb) = (Arc::clone(&shared), Arc::clone(&mailbox));
        let send = list.add_task(None, TaskKind::SendBoundaries, None, Some(base), move || {
            send_boundary_buffers(&bs, &mb, base)
        });
        let (bs, mb) = (Arc::clone(&shared), mailbox);
        let recv = list.add_task(Some(send), TaskKind::ReceiveBoundaries, None, Some(base), move || {
            receive_boundary_buffers(&bs, &mb, base, timeout)
        });
        let bs = Arc::clone(&shared);
        let set = list.add_task(Some(recv), TaskKind::SetBoundaries, None, Some(base), move || {
            set_boundaries(&bs, base)
        });

        let region = tc.add_region(blocks.len());
        for (i, handle) in blocks.iter().enumerate() {
            let list = &mut region[i];
            let h = Arc::clone(handle);
            list.add_task(None, TaskKind::ClearBoundary, Some(ids[i]), Some(base), move || {
                with_block(&h, |b| clear_boundary(b, base))
            });
            let h = Arc::clone(handle);
            let bc = list.add_task(
                Some(set),
                TaskKind::ApplyBoundaryConditions,
                Some(ids[i]),
                Some(base),
                move || with_block(&h, |b| apply_boundary_conditions(b, base)),
            );
            let h = Arc::clone(handle);
            let physics = self.physics.clone();
            list.add_task(
                Some(bc),
                TaskKind::FillDerived,
                Some(ids[i]),
                Some(base),
                move || with_block(&h, |b| update::fill_derived(b, &physics, base)),
            );
        }

        self.executor.execute(tc).map_err(|source| {
            let dropped = self.mesh.mailbox().drain();
            tracing::error!(error = %source, dropped_messages = dropped, "base preparation failed");
            StepError::Stage { stage: 0, source }
        })?;
        self.base_ready = true;
        tracing::debug!(cycle = self.cycle, "base slot prepared");
        Ok(())
    }

    /// Reduce a first `dt` from the base state.
    ///
    /// Prepares the base slot first if no step has done so yet.
    pub fn estimate_initial_dt(&mut self) -> Result<Real, StepError> {
        if !self.base_ready {
            self.prepare_base()?;
        }
        let blocks = self.mesh.blocks().clone();
        let base = SlotKey::Base;
        let mut tc = TaskCollection::new();
        let region = tc.add_region(blocks.len());
        for (i, handle) in blocks.iter().enumerate() {
            let id = lock_block(handle)
                .map_err(|source| StepError::Build { stage: 0, source })?
                .id();
            let h = Arc::clone(handle);
            let physics = self.physics.clone();
            region[i].add_task(None, TaskKind::EstimateTimestep, Some(id), Some(base), move || {
                with_block(&h, |b| update::estimate_timestep(b, &physics, base))
            });
        }
        self.executor
            .execute(tc)
            .map_err(|source| StepError::Stage { stage: 0, source })?;
        let dt = self
            .reduction
            .reduce(&blocks)
            .map_err(StepError::Reduction)?
            .ok_or_else(|| ConfigError::Integrator {
                reason: "no block produced a timestep estimate".into(),
            })?;
        self.set_dt(dt)?;
        tracing::debug!(dt, "initial timestep estimated");
        Ok(dt)
    }

    /// Step until `tlim` or `nlim` from the configuration is reached.
    ///
    /// The last step is shortened to land exactly on `tlim`. Estimates
    /// the initial `dt` if none is set. With neither limit configured a
    /// single step is taken.
    pub fn run(&mut self) -> Result<u64, StepError> {
        if self.dt() <= 0.0 {
            self.estimate_initial_dt()?;
        }
        let (tlim, nlim) = (self.config.tlim, self.config.nlim);
        let nlim = match (tlim, nlim) {
            (None, None) => Some(1),
            (_, n) => n,
        };
        let start_cycle = self.cycle;
        loop {
            if nlim.is_some_and(|n| self.cycle - start_cycle >= n) {
                break;
            }
            if let Some(tlim) = tlim {
                let remaining = tlim - self.time;
                if remaining <= 0.0 {
                    break;
                }
                if self.dt() > remaining {
                    self.set_dt(remaining)?;
                }
            }
            self.step()?;
        }
        Ok(self.cycle - start_cycle)
    }

    /// Slots allocated across all blocks so far.
    pub fn slot_allocations(&self) -> u64 {
        self.mesh
            .blocks()
            .iter()
            .filter_map(|h| lock_block(h).ok().map(|b| b.slots().allocations()))
            .sum()
    }
}

impl std::fmt::Debug for HydroDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HydroDriver")
            .field("mesh", &self.mesh)
            .field("physics", &self.physics)
            .field("config", &self.config)
            .field("executor", &self.executor.name())
            .field("time", &self.time)
            .field("cycle", &self.cycle)
            .finish_non_exhaustive()
    }
}

fn elapsed_us(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX)
}
