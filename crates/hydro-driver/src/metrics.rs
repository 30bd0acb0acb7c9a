//! Per-step metrics for the driver.

use hydro_core::Real;

/// Timing and work counters collected during one step.
///
/// Durations are in microseconds. The driver fills these after each
/// `step()`; the most recent set is kept on the driver.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepMetrics {
    /// Wall-clock time for the whole step.
    pub total_us: u64,
    /// Wall-clock time per stage.
    pub stage_us: Vec<u64>,
    /// Wall-clock time per region, indexed `[stage][region]`.
    pub region_us: Vec<Vec<u64>>,
    /// Tasks run across all stages.
    pub tasks_executed: usize,
    /// Slots allocated on all blocks so far.
    pub slot_allocations: u64,
    /// `dt` used for this step.
    pub dt: Real,
    /// `dt` produced by the reduction for the next step.
    pub next_dt: Option<Real>,
}
