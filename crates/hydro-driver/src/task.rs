//! Task graph data structures.
//!
//! A [`TaskCollection`] is an ordered sequence of [`TaskRegion`]s. Each
//! region holds one or more [`TaskList`]s; lists of the same region are
//! independent and may run concurrently. Within a list, tasks run in
//! insertion order. Every [`Task`] names at most one predecessor, which
//! must be an earlier task of the same list or any task of an earlier
//! region.

use std::fmt;
use std::ops::{Index, IndexMut};

use thiserror::Error;

use hydro_core::{BlockId, SlotKey, TaskError};
use hydro_kernel::KernelVariant;

/// Position of a task in its collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId {
    /// Region index.
    pub region: usize,
    /// List index within the region.
    pub list: usize,
    /// Task index within the list.
    pub index: usize,
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}/l{}/t{}", self.region, self.list, self.index)
    }
}

/// What a task does. Used for logs, errors and structural comparison.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// Arm a slot's receive buffers.
    StartReceive,
    /// Compute face fluxes with the given kernel variant.
    CalculateFluxes(KernelVariant),
    /// Mesh-wide flux divergence into the rate-of-change slot.
    FluxDivergence,
    /// Mesh-wide blended update into the stage slot.
    UpdateContainer,
    /// Post boundary buffers to neighbours.
    SendBoundaries,
    /// Wait for neighbour boundary buffers.
    ReceiveBoundaries,
    /// Unpack received buffers into ghost cells.
    SetBoundaries,
    /// Reset exchange markers.
    ClearBoundary,
    /// Physical boundary conditions.
    ApplyBoundaryConditions,
    /// Recompute derived fields.
    FillDerived,
    /// Record the block timestep estimate.
    EstimateTimestep,
}

/// Boxed unit of work.
pub type TaskFn = Box<dyn FnOnce() -> Result<(), TaskError> + Send>;

/// One unit of work with zero or one predecessor.
pub struct Task {
    id: TaskId,
    dependency: Option<TaskId>,
    kind: TaskKind,
    block: Option<BlockId>,
    slot: Option<SlotKey>,
    work: TaskFn,
}

impl Task {
    /// Position in the collection.
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Declared predecessor.
    pub fn dependency(&self) -> Option<TaskId> {
        self.dependency
    }

    /// Task kind.
    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    /// Target block, `None` for mesh-wide tasks.
    pub fn block(&self) -> Option<BlockId> {
        self.block
    }

    /// Target slot.
    pub fn slot(&self) -> Option<SlotKey> {
        self.slot
    }

    /// Consume the task and run its work.
    pub fn run(self) -> Result<(), TaskError> {
        (self.work)()
    }

    /// Structural description without the work closure.
    pub fn summary(&self) -> TaskSummary {
        TaskSummary {
            id: self.id,
            dependency: self.dependency,
            kind: self.kind,
            block: self.block,
            slot: self.slot,
        }
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("dependency", &self.dependency)
            .field("kind", &self.kind)
            .field("block", &self.block)
            .field("slot", &self.slot)
            .finish_non_exhaustive()
    }
}

/// Everything about a task except its work.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TaskSummary {
    /// Position in the collection.
    pub id: TaskId,
    /// Declared predecessor.
    pub dependency: Option<TaskId>,
    /// Task kind.
    pub kind: TaskKind,
    /// Target block.
    pub block: Option<BlockId>,
    /// Target slot.
    pub slot: Option<SlotKey>,
}

// ── Lists and regions ─────────────────────────────────────────────

/// Tasks that run strictly in order.
#[derive(Debug)]
pub struct TaskList {
    region: usize,
    list: usize,
    tasks: Vec<Task>,
}

impl TaskList {
    fn new(region: usize, list: usize) -> Self {
        Self {
            region,
            list,
            tasks: Vec::new(),
        }
    }

    /// Append a task and return its id.
    pub fn add_task<F>(
        &mut self,
        dependency: Option<TaskId>,
        kind: TaskKind,
        block: Option<BlockId>,
        slot: Option<SlotKey>,
        work: F,
    ) -> TaskId
    where
        F: FnOnce() -> Result<(), TaskError> + Send + 'static,
    {
        let id = TaskId {
            region: self.region,
            list: self.list,
            index: self.tasks.len(),
        };
        self.tasks.push(Task {
            id,
            dependency,
            kind,
            block,
            slot,
            work: Box::new(work),
        });
        id
    }

    /// Tasks in order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Number of tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Consume the list, yielding its tasks in order.
    pub fn into_tasks(self) -> Vec<Task> {
        self.tasks
    }
}

/// Independent task lists.
#[derive(Debug)]
pub struct TaskRegion {
    lists: Vec<TaskList>,
}

impl TaskRegion {
    /// Lists in order.
    pub fn lists(&self) -> &[TaskList] {
        &self.lists
    }

    /// Number of lists.
    pub fn len(&self) -> usize {
        self.lists.len()
    }

    /// Whether the region has no lists.
    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    /// Consume the region, yielding its lists.
    pub fn into_lists(self) -> Vec<TaskList> {
        self.lists
    }
}

impl Index<usize> for TaskRegion {
    type Output = TaskList;

    fn index(&self, i: usize) -> &TaskList {
        &self.lists[i]
    }
}

impl IndexMut<usize> for TaskRegion {
    fn index_mut(&mut self, i: usize) -> &mut TaskList {
        &mut self.lists[i]
    }
}

// ── Collection ────────────────────────────────────────────────────

/// Structural problems in a task graph.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GraphError {
    /// A dependency names a task that does not exist.
    #[error("task {task} depends on nonexistent task {dependency}")]
    UnknownDependency {
        /// The dependent task.
        task: TaskId,
        /// The missing predecessor.
        dependency: TaskId,
    },
    /// A dependency crosses lists within one region.
    #[error("task {task} depends on {dependency} in a sibling list of the same region")]
    CrossList {
        /// The dependent task.
        task: TaskId,
        /// The offending predecessor.
        dependency: TaskId,
    },
    /// A dependency points at the same or a later task.
    #[error("task {task} depends on {dependency}, which does not run before it")]
    ForwardDependency {
        /// The dependent task.
        task: TaskId,
        /// The offending predecessor.
        dependency: TaskId,
    },
}

/// Structural snapshot of a collection: regions, lists, task summaries.
pub type GraphLayout = Vec<Vec<Vec<TaskSummary>>>;

/// Ordered regions making up one stage.
#[derive(Debug, Default)]
pub struct TaskCollection {
    regions: Vec<TaskRegion>,
}

impl TaskCollection {
    /// Empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a region of `nlists` empty lists.
    pub fn add_region(&mut self, nlists: usize) -> &mut TaskRegion {
        let region = self.regions.len();
        self.regions.push(TaskRegion {
            lists: (0..nlists).map(|list| TaskList::new(region, list)).collect(),
        });
        let last = self.regions.len() - 1;
        &mut self.regions[last]
    }

    /// Regions in order.
    pub fn regions(&self) -> &[TaskRegion] {
        &self.regions
    }

    /// Number of regions.
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Whether the collection has no regions.
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Total tasks across all regions.
    pub fn task_count(&self) -> usize {
        self.regions
            .iter()
            .flat_map(|r| &r.lists)
            .map(TaskList::len)
            .sum()
    }

    /// Lists per region.
    pub fn list_counts(&self) -> Vec<usize> {
        self.regions.iter().map(TaskRegion::len).collect()
    }

    /// Structural snapshot for comparing two builds.
    pub fn layout(&self) -> GraphLayout {
        self.regions
            .iter()
            .map(|r| {
                r.lists
                    .iter()
                    .map(|l| l.tasks.iter().map(Task::summary).collect())
                    .collect()
            })
            .collect()
    }

    fn exists(&self, id: TaskId) -> bool {
        self.regions
            .get(id.region)
            .and_then(|r| r.lists.get(id.list))
            .is_some_and(|l| id.index < l.tasks.len())
    }

    /// Check every dependency edge.
    pub fn validate(&self) -> Result<(), GraphError> {
        let tasks = self
            .regions
            .iter()
            .flat_map(|r| &r.lists)
            .flat_map(|l| &l.tasks);
        for task in tasks {
            let Some(dependency) = task.dependency else {
                continue;
            };
            let id = task.id;
            if !self.exists(dependency) {
                return Err(GraphError::UnknownDependency { task: id, dependency });
            }
            if dependency.region > id.region {
                return Err(GraphError::ForwardDependency { task: id, dependency });
            }
            if dependency.region == id.region {
                if dependency.list != id.list {
                    return Err(GraphError::CrossList { task: id, dependency });
                }
                if dependency.index >= id.index {
                    return Err(GraphError::ForwardDependency { task: id, dependency });
                }
            }
        }
        Ok(())
    }

    /// Consume the collection, yielding its regions.
    pub fn into_regions(self) -> Vec<TaskRegion> {
        self.regions
    }
}
