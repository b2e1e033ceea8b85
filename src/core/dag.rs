//! Project dependency graph.
//!
//! `ProjectGraph` owns the task map together with a petgraph `DiGraph`
//! mirroring its dependency edges. It keeps the graph acyclic, computes
//! the ready frontier, runs the hardware/software validation state
//! machine and performs cascading resets. Every committed mutation is
//! written through to the backing [`TaskStore`].

use std::collections::{BTreeSet, HashMap};

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::task::{check_unit, Task, TaskId, TaskStatus, TeamType};
use crate::error::{Error, Result};
use crate::state::{MemoryStore, TaskMap, TaskStore};

/// Done/total counts for a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    pub done: usize,
    pub total: usize,
}

impl Completion {
    /// True when every task is done. An empty project is not complete.
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.done == self.total
    }
}

/// The task dependency graph of one project.
///
/// Edges point from a dependency to the task that depends on it. Edges
/// are only materialized for dependency ids that were already registered
/// when the dependent task was inserted; anything else stays dangling and
/// never constrains the dependent.
pub struct ProjectGraph<S: TaskStore = MemoryStore> {
    /// Dependency edges; node weights are task ids.
    graph: DiGraph<TaskId, ()>,
    /// Index mapping from TaskId to NodeIndex for fast lookups.
    index: HashMap<TaskId, NodeIndex>,
    /// Task records, ordered by id.
    tasks: TaskMap,
    store: S,
}

type Candidate = (DiGraph<TaskId, ()>, HashMap<TaskId, NodeIndex>);

impl ProjectGraph<MemoryStore> {
    /// Create an empty project backed by an in-memory store.
    pub fn in_memory() -> Self {
        Self::empty(MemoryStore::new())
    }
}

impl<S: TaskStore> ProjectGraph<S> {
    fn empty(store: S) -> Self {
        Self {
            graph: DiGraph::new(),
            index: HashMap::new(),
            tasks: TaskMap::new(),
            store,
        }
    }

    /// Open a project from its store.
    ///
    /// Stored records are replayed in creation order (ties by id) through
    /// the same insertion path as [`insert_task`](Self::insert_task), so a
    /// dependency on a task created later stays dangling after a reload
    /// exactly as it was before.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read or the stored
    /// dependencies contain a cycle.
    pub fn open(store: S) -> Result<Self> {
        let mut records: Vec<Task> = store.load()?.into_values().collect();
        records.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });

        let mut project = Self::empty(store);
        for task in records {
            project.commit(task)?;
        }

        info!(
            tasks = project.tasks.len(),
            edges = project.graph.edge_count(),
            "Project opened"
        );
        Ok(project)
    }

    /// Register a new task.
    ///
    /// Edges are added from every dependency id already present in the
    /// project; unknown ids are skipped. The edges are staged on a copy
    /// of the graph and only swapped in when the copy is still acyclic,
    /// so a rejected insertion leaves the project untouched.
    ///
    /// # Errors
    /// - `DuplicateTask` if the id is already registered
    /// - `Validation` if progress, volatility or a milestone trigger is out of range
    /// - `CycleDetected` if the new edges would close a cycle
    /// - store errors from persisting the committed snapshot
    pub fn insert_task(&mut self, task: Task) -> Result<()> {
        if self.tasks.contains_key(&task.id) {
            return Err(Error::DuplicateTask(task.id));
        }
        task.validate()?;

        let id = task.id.clone();
        self.commit(task)?;
        info!(task = %id, "Task inserted");
        self.persist()
    }

    fn stage(&self, task: &Task) -> Result<Candidate> {
        let mut graph = self.graph.clone();
        let mut index = self.index.clone();

        let node = graph.add_node(task.id.clone());
        index.insert(task.id.clone(), node);

        for dep in &task.dependencies {
            match index.get(dep) {
                Some(&dep_node) => {
                    graph.update_edge(dep_node, node, ());
                }
                None => debug!(task = %task.id, dependency = %dep, "Skipping unregistered dependency"),
            }
        }

        if toposort(&graph, None).is_err() {
            return Err(Error::CycleDetected {
                task: task.id.clone(),
            });
        }
        Ok((graph, index))
    }

    fn commit(&mut self, task: Task) -> Result<()> {
        let (graph, index) = self.stage(&task)?;
        self.graph = graph;
        self.index = index;
        self.tasks.insert(task.id.clone(), task);
        Ok(())
    }

    fn persist(&mut self) -> Result<()> {
        self.store.save(&self.tasks)
    }

    /// Get a task by id.
    pub fn get_task(&self, id: &str) -> Option<&Task> {
        self.tasks.get(id)
    }

    /// Check if the project contains a task.
    pub fn contains_task(&self, id: &str) -> bool {
        self.tasks.contains_key(id)
    }

    /// All tasks, in id order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Number of materialized dependency edges.
    pub fn dependency_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Check if a materialized edge runs from `from` to `to`.
    pub fn has_dependency(&self, from: &str, to: &str) -> bool {
        match (self.index.get(from), self.index.get(to)) {
            (Some(&from_idx), Some(&to_idx)) => self.graph.find_edge(from_idx, to_idx).is_some(),
            _ => false,
        }
    }

    /// The backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    fn neighbors(&self, id: &str, direction: Direction) -> Vec<&Task> {
        let Some(&node) = self.index.get(id) else {
            return Vec::new();
        };
        let mut tasks: Vec<&Task> = self
            .graph
            .neighbors_directed(node, direction)
            .filter_map(|n| self.tasks.get(&self.graph[n]))
            .collect();
        tasks.sort_by(|a, b| a.id.cmp(&b.id));
        tasks
    }

    /// Direct dependencies of a task (materialized edges only), in id order.
    pub fn predecessors(&self, id: &str) -> Vec<&Task> {
        self.neighbors(id, Direction::Incoming)
    }

    /// Tasks directly built on the given task, in id order.
    pub fn successors(&self, id: &str) -> Vec<&Task> {
        self.neighbors(id, Direction::Outgoing)
    }

    /// Every task reachable downstream of `id`, excluding `id` itself.
    pub fn descendants(&self, id: &str) -> BTreeSet<TaskId> {
        let Some(&start) = self.index.get(id) else {
            return BTreeSet::new();
        };
        let mut dfs = Dfs::new(&self.graph, start);
        let mut found = BTreeSet::new();
        while let Some(node) = dfs.next(&self.graph) {
            if node != start {
                found.insert(self.graph[node].clone());
            }
        }
        found
    }

    /// Whether a task may be started now.
    ///
    /// Its own status must be pending or blocked, and every direct
    /// predecessor must release its dependents (see
    /// [`Task::releases_dependents`]). Nothing beyond direct predecessors
    /// is consulted.
    pub fn is_ready(&self, task: &Task) -> bool {
        task.is_schedulable()
            && self
                .predecessors(task.id.as_str())
                .iter()
                .all(|p| p.releases_dependents())
    }

    /// The ready frontier, in id order.
    pub fn get_ready_tasks(&self) -> Vec<&Task> {
        self.tasks.values().filter(|t| self.is_ready(t)).collect()
    }

    /// Whether every software task validating `hardware_id` is done.
    ///
    /// Vacuously true for hardware with no software successors.
    pub fn validation_closed(&self, hardware_id: &str) -> bool {
        self.successors(hardware_id)
            .iter()
            .filter(|t| t.team == TeamType::Software)
            .all(|t| t.is_done())
    }

    /// Promote hardware dependencies of a finished software task.
    ///
    /// Every hardware predecessor that is not done yet is re-checked; once
    /// all of its software validators are done it becomes done with its
    /// volatility retired.
    fn close_validation_loop(&mut self, software_id: &str) -> Vec<TaskId> {
        let open: Vec<TaskId> = self
            .predecessors(software_id)
            .into_iter()
            .filter(|t| t.team == TeamType::Hardware)
            .filter(|t| !t.is_done())
            .map(|t| t.id.clone())
            .collect();

        let mut promoted = Vec::new();
        for hardware_id in open {
            if !self.validation_closed(hardware_id.as_str()) {
                continue;
            }
            if let Some(hardware) = self.tasks.get_mut(hardware_id.as_str()) {
                hardware.status = TaskStatus::Done;
                hardware.volatility = 0.0;
                hardware.touch();
                info!(task = %hardware_id, validated_by = software_id, "Hardware validated");
                promoted.push(hardware_id);
            }
        }
        promoted
    }

    /// Update a task's progress and status from untrusted status text.
    ///
    /// The status is parsed before anything is touched; an unrecognized
    /// value discards the whole update.
    ///
    /// # Errors
    /// `InvalidStatus` for an unknown status, otherwise as
    /// [`set_progress`](Self::set_progress).
    pub fn update_progress(
        &mut self,
        id: &str,
        progress: f64,
        status: &str,
    ) -> Result<Option<TaskStatus>> {
        let status: TaskStatus = status.parse()?;
        self.set_progress(id, progress, status)
    }

    /// Update a task's progress and status.
    ///
    /// Marking hardware done only finishes it when all of its software
    /// validators are done; otherwise it waits for validation. Marking
    /// software done retires its volatility and promotes any hardware it
    /// was the last validator of. Other statuses are applied as given.
    ///
    /// Returns the status the task ended up in, or `None` for an unknown id.
    ///
    /// # Errors
    /// `Validation` if `progress` is outside [0, 1], or a store error.
    pub fn set_progress(
        &mut self,
        id: &str,
        progress: f64,
        status: TaskStatus,
    ) -> Result<Option<TaskStatus>> {
        check_unit("progress", progress)?;
        let Some(team) = self.tasks.get(id).map(|t| t.team) else {
            debug!(task = id, "set_progress on unknown task");
            return Ok(None);
        };

        let resolved = match (status, team) {
            (TaskStatus::Done, TeamType::Hardware) if !self.validation_closed(id) => {
                TaskStatus::WaitingForValidation
            }
            (status, _) => status,
        };

        if let Some(task) = self.tasks.get_mut(id) {
            task.progress = progress;
            task.sync_milestones();
            task.status = resolved;
            if resolved == TaskStatus::Done {
                task.volatility = 0.0;
            }
            task.touch();
        }
        debug!(task = id, progress, status = %resolved, "Progress updated");

        if resolved == TaskStatus::Done && team == TeamType::Software {
            self.close_validation_loop(id);
        }

        self.persist()?;
        Ok(Some(resolved))
    }

    /// Set a task's volatility. Nothing downstream is touched.
    ///
    /// Returns the previous volatility, or `None` for an unknown id.
    pub fn update_volatility(&mut self, id: &str, volatility: f64) -> Result<Option<f64>> {
        check_unit("volatility", volatility)?;
        let Some(task) = self.tasks.get_mut(id) else {
            return Ok(None);
        };
        let previous = std::mem::replace(&mut task.volatility, volatility);
        task.touch();
        debug!(task = id, previous, volatility, "Volatility updated");

        self.persist()?;
        Ok(Some(previous))
    }

    /// Send all downstream work of `id` back to the start.
    ///
    /// Every transitive descendant that is done or has any progress is set
    /// to pending with zero progress. `id` itself is left alone. Returns
    /// the ids that were actually reset.
    pub fn reset_downstream(&mut self, id: &str) -> Result<BTreeSet<TaskId>> {
        let mut reset = BTreeSet::new();
        for descendant in self.descendants(id) {
            let Some(task) = self.tasks.get_mut(descendant.as_str()) else {
                continue;
            };
            if task.is_done() || task.progress > 0.0 {
                task.status = TaskStatus::Pending;
                task.progress = 0.0;
                task.sync_milestones();
                task.touch();
                reset.insert(descendant);
            }
        }

        if !reset.is_empty() {
            info!(origin = id, count = reset.len(), "Downstream tasks reset");
            self.persist()?;
        }
        Ok(reset)
    }

    /// Done/total counts across the whole project.
    pub fn completion(&self) -> Completion {
        Completion {
            done: self.tasks.values().filter(|t| t.is_done()).count(),
            total: self.tasks.len(),
        }
    }

    /// Tasks ordered so that each comes after all of its dependencies.
    ///
    /// # Errors
    /// Returns `CycleDetected` if the graph contains a cycle (should never
    /// happen since insertion rejects cycles).
    pub fn topological_order(&self) -> Result<Vec<&Task>> {
        let sorted = toposort(&self.graph, None).map_err(|cycle| Error::CycleDetected {
            task: self.graph[cycle.node_id()].clone(),
        })?;

        Ok(sorted
            .into_iter()
            .filter_map(|node| self.tasks.get(&self.graph[node]))
            .collect())
    }
}

impl<S: TaskStore> std::fmt::Debug for ProjectGraph<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectGraph")
            .field("tasks", &self.tasks.len())
            .field("dependencies", &self.graph.edge_count())
            .finish()
    }
}
