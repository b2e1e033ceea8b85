use thiserror::Error;

use crate::core::task::TaskId;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("No home directory")]
    NoHomeDir,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid task status: {0}")]
    InvalidStatus(String),

    #[error("Adding task {task} would create a dependency cycle")]
    CycleDetected { task: TaskId },

    #[error("Task already exists: {0}")]
    DuplicateTask(TaskId),
}

pub type Result<T> = std::result::Result<T, Error>;
