//! Core domain models for gantry.
//!
//! This module contains the task data model and the project dependency
//! graph that owns it.

pub mod dag;
pub mod task;

pub use dag::{Completion, ProjectGraph};
pub use task::{Milestone, ProjectStage, Task, TaskCategory, TaskId, TaskStatus, TeamType};
