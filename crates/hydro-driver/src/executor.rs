//! Task executors.
//!
//! An executor runs a [`TaskCollection`] region by region. A region
//! finishes completely before the next one starts. Inside a region,
//! lists are independent; [`SerialExecutor`] runs them one after another
//! on the calling thread while [`ThreadedExecutor`] hands them to a
//! scoped worker pool.
//!
//! Before running a task the executor checks that its declared
//! predecessor has completed. The first failing task aborts the rest of
//! the collection.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use indexmap::IndexSet;
use thiserror::Error;

use hydro_core::{BlockId, TaskError};

use crate::task::{GraphError, TaskCollection, TaskId, TaskKind, TaskList};

/// Why a collection did not run to completion.
#[derive(Debug, Error)]
pub enum ExecError {
    /// The collection failed validation and nothing ran.
    #[error("invalid task graph: {0}")]
    Graph(#[from] GraphError),
    /// A task was reached before its predecessor completed.
    #[error("task {task} reached before its dependency {dependency} completed")]
    DependencyNotMet {
        /// The task that could not start.
        task: TaskId,
        /// Its incomplete predecessor.
        dependency: TaskId,
    },
    /// A task returned an error.
    #[error("task {task} ({kind:?}) failed")]
    TaskFailed {
        /// The failing task.
        task: TaskId,
        /// What it was doing.
        kind: TaskKind,
        /// Target block, if any.
        block: Option<BlockId>,
        /// The underlying failure.
        #[source]
        source: TaskError,
    },
    /// A worker thread panicked.
    #[error("executor worker panicked")]
    WorkerPanicked,
}

/// What ran, in completion order.
#[derive(Clone, Debug, Default)]
pub struct ExecutionReport {
    /// Completed task ids in the order they completed.
    pub completed: Vec<TaskId>,
    /// Wall time per region, in microseconds.
    pub region_us: Vec<u64>,
}

impl ExecutionReport {
    /// Position of `id` in completion order.
    pub fn position(&self, id: TaskId) -> Option<usize> {
        self.completed.iter().position(|&c| c == id)
    }
}

/// Runs task collections.
pub trait TaskExecutor: Send + Sync {
    /// Name for logs.
    fn name(&self) -> &str;

    /// Validate and run `collection` to completion or first failure.
    fn execute(&self, collection: TaskCollection) -> Result<ExecutionReport, ExecError>;
}

// ── Shared bookkeeping ────────────────────────────────────────────

#[derive(Default)]
struct CompletionLog {
    done: Mutex<IndexSet<TaskId>>,
}

impl CompletionLog {
    fn contains(&self, id: TaskId) -> bool {
        self.done
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&id)
    }

    fn record(&self, id: TaskId) {
        self.done
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id);
    }

    fn into_order(self) -> Vec<TaskId> {
        self.done
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .into_iter()
            .collect()
    }
}

fn run_list(list: TaskList, log: &CompletionLog, abort: &AtomicBool) -> Result<(), ExecError> {
    for task in list.into_tasks() {
        if abort.load(Ordering::Acquire) {
            return Ok(());
        }
        let id = task.id();
        if let Some(dependency) = task.dependency() {
            if !log.contains(dependency) {
                return Err(ExecError::DependencyNotMet { task: id, dependency });
            }
        }
        let (kind, block) = (task.kind(), task.block());
        tracing::trace!(task = %id, ?kind, ?block, "running task");
        task.run().map_err(|source| ExecError::TaskFailed {
            task: id,
            kind,
            block,
            source,
        })?;
        log.record(id);
    }
    Ok(())
}

fn elapsed_us(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX)
}

fn run_serial(
    lists: Vec<TaskList>,
    log: &CompletionLog,
    abort: &AtomicBool,
) -> Result<(), ExecError> {
    for list in lists {
        run_list(list, log, abort)?;
    }
    Ok(())
}

// ── Serial ────────────────────────────────────────────────────────

/// Runs every list on the calling thread, in list order.
#[derive(Clone, Copy, Debug, Default)]
pub struct SerialExecutor;

impl TaskExecutor for SerialExecutor {
    fn name(&self) -> &str {
        "serial"
    }

    fn execute(&self, collection: TaskCollection) -> Result<ExecutionReport, ExecError> {
        collection.validate()?;
        let log = CompletionLog::default();
        let abort = AtomicBool::new(false);
        let mut region_us = Vec::with_capacity(collection.len());
        for region in collection.into_regions() {
            let start = Instant::now();
            run_serial(region.into_lists(), &log, &abort)?;
            region_us.push(elapsed_us(start));
        }
        Ok(ExecutionReport {
            completed: log.into_order(),
            region_us,
        })
    }
}

// ── Threaded ──────────────────────────────────────────────────────

/// Runs the lists of multi-list regions on a scoped worker pool.
///
/// Lists are fed to `workers` threads through a crossbeam channel.
/// Single-list regions run on the calling thread, so a collective list
/// that blocks in receive never occupies a worker.
#[derive(Clone, Copy, Debug)]
pub struct ThreadedExecutor {
    workers: usize,
}

impl ThreadedExecutor {
    /// Pool of `workers` threads (at least one).
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    /// Worker count.
    pub fn workers(&self) -> usize {
        self.workers
    }

    fn run_parallel(
        &self,
        lists: Vec<TaskList>,
        log: &CompletionLog,
        abort: &AtomicBool,
    ) -> Result<(), ExecError> {
        let nthreads = self.workers.min(lists.len());
        let (tx, rx) = crossbeam_channel::unbounded::<TaskList>();
        for list in lists {
            // The receiver is alive until the scope below ends.
            let _ = tx.send(list);
        }
        drop(tx);

        let errors: Mutex<Vec<ExecError>> = Mutex::new(Vec::new());
        let panicked = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..nthreads)
                .map(|_| {
                    let rx = rx.clone();
                    let errors = &errors;
                    scope.spawn(move || {
                        while let Ok(list) = rx.recv() {
                            if let Err(e) = run_list(list, log, abort) {
                                abort.store(true, Ordering::Release);
                                errors
                                    .lock()
                                    .unwrap_or_else(PoisonError::into_inner)
                                    .push(e);
                            }
                        }
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().is_err())
                .fold(false, |any, p| any || p)
        });

        if panicked {
            abort.store(true, Ordering::Release);
            return Err(ExecError::WorkerPanicked);
        }
        match errors
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .into_iter()
            .next()
        {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Default for ThreadedExecutor {
    fn default() -> Self {
        let workers = std::thread::available_parallelism().map_or(1, |n| n.get());
        Self::new(workers)
    }
}

impl TaskExecutor for ThreadedExecutor {
    fn name(&self) -> &str {
        "threaded"
    }

    fn execute(&self, collection: TaskCollection) -> Result<ExecutionReport, ExecError> {
        collection.validate()?;
        let log = CompletionLog::default();
        let abort = AtomicBool::new(false);
        let mut region_us = Vec::with_capacity(collection.len());
        for region in collection.into_regions() {
            let start = Instant::now();
            let lists = region.into_lists();
            if lists.len() <= 1 || self.workers == 1 {
                run_serial(lists, &log, &abort)?;
            } else {
                self.run_parallel(lists, &log, &abort)?;
            }
            region_us.push(elapsed_us(start));
        }
        Ok(ExecutionReport {
            completed: log.into_order(),
            region_us,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    fn counting_collection(counter: &Arc<AtomicUsize>, nlists: usize) -> TaskCollection {
        let mut tc = TaskCollection::new();
        let region = tc.add_region(nlists);
        for l in 0..nlists {
            let c = Arc::clone(counter);
            let first = region[l].add_task(None, TaskKind::StartReceive, None, None, move || {
                c.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
            let c = Arc::clone(counter);
            region[l].add_task(Some(first), TaskKind::FillDerived, None, None, move || {
                c.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }
        let c = Arc::clone(counter);
        tc.add_region(1)[0].add_task(None, TaskKind::FluxDivergence, None, None, move || {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        tc
    }

    fn executors() -> Vec<Box<dyn TaskExecutor>> {
        vec![Box::new(SerialExecutor), Box::new(ThreadedExecutor::new(4))]
    }

    #[test]
    fn runs_every_task_once() {
        for exec in executors() {
            let counter = Arc::new(AtomicUsize::new(0));
            let report = exec.execute(counting_collection(&counter, 5)).unwrap();
            assert_eq!(counter.load(Ordering::SeqCst), 11, "{}", exec.name());
            assert_eq!(report.completed.len(), 11);
            assert_eq!(report.region_us.len(), 2);
        }
    }

    #[test]
    fn regions_complete_in_order() {
        for exec in executors() {
            let counter = Arc::new(AtomicUsize::new(0));
            let report = exec.execute(counting_collection(&counter, 3)).unwrap();
            let last = TaskId {
                region: 1,
                list: 0,
                index: 0,
            };
            assert_eq!(report.position(last), Some(6));
        }
    }

    #[test]
    fn failure_stops_the_collection() {
        for exec in executors() {
            let ran_after = Arc::new(AtomicUsize::new(0));
            let mut tc = TaskCollection::new();
            tc.add_region(2)[0].add_task(None, TaskKind::FillDerived, Some(BlockId(0)), None, || {
                Err(TaskError::BlockPoisoned { block: BlockId(0) })
            });
            let c = Arc::clone(&ran_after);
            tc.add_region(1)[0].add_task(None, TaskKind::FluxDivergence, None, None, move || {
                c.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
            let err = exec.execute(tc).unwrap_err();
            assert!(matches!(
                err,
                ExecError::TaskFailed {
                    kind: TaskKind::FillDerived,
                    block: Some(BlockId(0)),
                    ..
                }
            ));
            assert_eq!(ran_after.load(Ordering::SeqCst), 0);
        }
    }

    #[test]
    fn invalid_graph_runs_nothing() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut tc = TaskCollection::new();
        let region = tc.add_region(2);
        let c = Arc::clone(&counter);
        let a = region[0].add_task(None, TaskKind::StartReceive, None, None, move || {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        region[1].add_task(Some(a), TaskKind::StartReceive, None, None, || Ok(()));
        assert!(matches!(
            SerialExecutor.execute(tc),
            Err(ExecError::Graph(GraphError::CrossList { .. }))
        ));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn worker_panic_is_reported() {
        let mut tc = TaskCollection::new();
        let region = tc.add_region(2);
        region[0].add_task(None, TaskKind::FillDerived, None, None, || panic!("boom"));
        region[1].add_task(None, TaskKind::FillDerived, None, None, || Ok(()));
        assert!(matches!(
            ThreadedExecutor::new(2).execute(tc),
            Err(ExecError::WorkerPanicked)
        ));
    }
}
