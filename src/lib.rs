//! Dependency tracking and next-task recommendation for hardware/software
//! engineering programs.
//!
//! [`ProjectGraph`] owns the tasks and their dependency graph and runs the
//! completion/validation state machine. The [`planning`] module builds on
//! it: scrap risk, the risk inventory, and the lane [`Scheduler`].

pub mod config;
pub mod core;
pub mod error;
pub mod log;
pub mod planning;
pub mod state;

pub use crate::core::{
    Completion, Milestone, ProjectGraph, ProjectStage, Task, TaskCategory, TaskId, TaskStatus,
    TeamType,
};
pub use error::{Error, Result};
pub use planning::{ScheduleReport, Scheduler, SwarmingRecommendation};
pub use state::{JsonFileStore, MemoryStore, TaskStore};
