// Analysis-task registry: integer handle → decoded heap graph.
//
// Task lifetime is explicit and caller-controlled. A task is created from
// a snapshot file, queried any number of times, then destroyed; there is
// no implicit collection. A failed decode never publishes a graph.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use leaktrace_snapshot::HeapGraph;

use crate::error::TaskError;
use crate::Result;

/// Handle to one decoded snapshot graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub i64);

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ownership table for decoded graphs. Create/destroy/get are the only
/// mutators; graphs behind `Arc` are shared read-only with any number of
/// concurrent searches.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: Mutex<HashMap<i64, Arc<HeapGraph>>>,
    next_id: AtomicI64,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the snapshot at `path` and register it under a fresh id.
    ///
    /// Blocks for the duration of the decode; use [`create_task_async`]
    /// from latency-sensitive callers. On any failure (unreadable file,
    /// malformed stream, unusable schema) nothing is registered.
    ///
    /// [`create_task_async`]: Self::create_task_async
    pub fn create_task(&self, path: &Path) -> Result<TaskId> {
        let file = std::fs::File::open(path).map_err(leaktrace_snapshot::SnapshotError::from)?;
        let graph = HeapGraph::from_reader(file)?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        info!(
            task = id,
            path = %path.display(),
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "analysis task created"
        );
        self.lock().insert(id, Arc::new(graph));
        Ok(TaskId(id))
    }

    /// [`create_task`](Self::create_task) on a blocking worker thread.
    ///
    /// Large snapshots decode for a long time and the decode is not
    /// cancellable once started; completion is reported through the
    /// returned future instead of blocking the caller.
    pub async fn create_task_async(self: &Arc<Self>, path: PathBuf) -> Result<TaskId> {
        let registry = Arc::clone(self);
        tokio::task::spawn_blocking(move || registry.create_task(&path))
            .await
            .map_err(|e| TaskError::Background(e.to_string()))?
    }

    /// Release a task. Returns false for an unknown id.
    pub fn destroy_task(&self, id: TaskId) -> bool {
        let removed = self.lock().remove(&id.0).is_some();
        if removed {
            info!(task = id.0, "analysis task destroyed");
        } else {
            debug!(task = id.0, "destroy requested for unknown task");
        }
        removed
    }

    /// Fetch the graph owned by a task, if the task is still alive.
    pub fn get_task(&self, id: TaskId) -> Option<Arc<HeapGraph>> {
        self.lock().get(&id.0).cloned()
    }

    /// Like [`get_task`](Self::get_task) but with the lookup miss promoted
    /// to an error, for call sites where a handle is required.
    pub fn require_task(&self, id: TaskId) -> Result<Arc<HeapGraph>> {
        self.get_task(id)
            .ok_or_else(|| TaskError::UnknownTask(id.0).into())
    }

    pub fn task_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<i64, Arc<HeapGraph>>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
