//! Durable persistence for the project's task map.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::task::{Task, TaskId};
use crate::Result;

/// The full task map, keyed and ordered by id.
pub type TaskMap = BTreeMap<TaskId, Task>;

/// Key-to-record persistence for tasks.
///
/// The graph engine calls `save` synchronously after every committed
/// mutation with the complete snapshot; stores never see partial updates.
pub trait TaskStore {
    /// Load every stored task. A store that has never been written is empty.
    fn load(&self) -> Result<TaskMap>;

    /// Replace the stored snapshot with `tasks`.
    fn save(&mut self, tasks: &TaskMap) -> Result<()>;
}

/// JSON file store.
///
/// The file holds a single object mapping task ids to task records.
/// Writes go to a temporary file that is renamed over the target, and
/// the previous snapshot is kept next to it as `*.json.bak`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TaskStore for JsonFileStore {
    fn load(&self) -> Result<TaskMap> {
        debug!(path = %self.path.display(), "JsonFileStore::load");

        if !self.path.exists() {
            debug!("Task file not found, starting with an empty project");
            return Ok(TaskMap::new());
        }

        let contents = fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(TaskMap::new());
        }
        let tasks: TaskMap = serde_json::from_str(&contents)?;
        debug!(tasks = tasks.len(), "Tasks loaded");
        Ok(tasks)
    }

    fn save(&mut self, tasks: &TaskMap) -> Result<()> {
        debug!(path = %self.path.display(), tasks = tasks.len(), "JsonFileStore::save");
        let contents = serde_json::to_string_pretty(tasks)?;

        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                debug!(dir = %dir.display(), "Creating task store directory");
                fs::create_dir_all(dir)?;
            }
        }

        if self.path.exists() {
            let backup_path = self.path.with_extension("json.bak");
            fs::copy(&self.path, &backup_path)?;
        }

        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, &contents)?;
        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}

/// In-process store, used for isolated projects and tests.
///
/// Keeps the last saved snapshot and counts how many saves happened.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tasks: TaskMap,
    saves: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with `tasks`, as if loaded from disk.
    pub fn with_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        Self {
            tasks: tasks.into_iter().map(|t| (t.id.clone(), t)).collect(),
            saves: 0,
        }
    }

    /// The last snapshot handed to `save` (or the seed tasks).
    pub fn snapshot(&self) -> &TaskMap {
        &self.tasks
    }

    /// Number of `save` calls so far.
    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl TaskStore for MemoryStore {
    fn load(&self) -> Result<TaskMap> {
        Ok(self.tasks.clone())
    }

    fn save(&mut self, tasks: &TaskMap) -> Result<()> {
        self.tasks = tasks.clone();
        self.saves += 1;
        Ok(())
    }
}
