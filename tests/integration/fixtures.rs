//! Test fixtures for integration tests.
//!
//! Provides helpers for:
//! - Building hardware/software tasks tersely
//! - A temporary JSON-backed project
//! - The leg subsystem sample project

use tempfile::TempDir;

use gantry::{JsonFileStore, ProjectGraph, ProjectStage, Task, TaskStatus, TeamType};

/// A pending critical hardware task named after its id.
pub fn hw(id: &str) -> Task {
    Task::new(id, id, TeamType::Hardware, ProjectStage::Fabrication)
}

/// A pending critical software task named after its id.
pub fn sw(id: &str) -> Task {
    Task::new(id, id, TeamType::Software, ProjectStage::BringUp)
}

/// Ids of the ready frontier, in order.
pub fn ready_ids<S: gantry::TaskStore>(project: &ProjectGraph<S>) -> Vec<String> {
    project
        .get_ready_tasks()
        .iter()
        .map(|t| t.id.to_string())
        .collect()
}

/// A project backed by a JSON file in a temporary directory.
pub struct TempProject {
    /// Keeps the directory alive for the lifetime of the fixture.
    pub temp_dir: TempDir,
    pub project: ProjectGraph<JsonFileStore>,
}

impl TempProject {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let project = ProjectGraph::open(JsonFileStore::new(Self::path_in(&temp_dir)))
            .expect("Failed to open project");
        Self { temp_dir, project }
    }

    fn path_in(dir: &TempDir) -> std::path::PathBuf {
        dir.path().join("tasks.json")
    }

    pub fn store_path(&self) -> std::path::PathBuf {
        Self::path_in(&self.temp_dir)
    }

    /// Open a second engine over the same file.
    pub fn reopen(&self) -> ProjectGraph<JsonFileStore> {
        ProjectGraph::open(JsonFileStore::new(self.store_path())).expect("Failed to reopen project")
    }
}

/// Leg subsystem: CAD done, fabrication under way past its interface
/// milestone, firmware validating the fabrication.
pub fn leg_project() -> ProjectGraph {
    let mut project = ProjectGraph::in_memory();
    project
        .insert_task(
            Task::new("HW-1", "Leg CAD", TeamType::Hardware, ProjectStage::Architecture)
                .with_assigner("Alice")
                .with_component("Leg")
                .with_status(TaskStatus::Done)
                .with_progress(1.0)
                .with_expected_duration(4.0),
        )
        .expect("insert HW-1");
    project
        .insert_task(
            Task::new("HW-2", "Leg Fabrication", TeamType::Hardware, ProjectStage::Fabrication)
                .with_assigner("Alice")
                .with_component("Leg")
                .with_dependencies(["HW-1"])
                .with_status(TaskStatus::InProgress)
                .with_progress(0.6)
                .with_volatility(0.1)
                .with_milestone("mounting holes frozen", 0.5)
                .with_expected_duration(8.0),
        )
        .expect("insert HW-2");
    project
        .insert_task(
            Task::new("SW-1", "Leg Firmware", TeamType::Software, ProjectStage::BringUp)
                .with_assigner("Bob")
                .with_component("Leg")
                .with_dependencies(["HW-2"])
                .with_expected_duration(8.0)
                .with_switch_cost(2),
        )
        .expect("insert SW-1");
    project
}
