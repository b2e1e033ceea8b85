//! Scrap risk and risk inventory.
//!
//! Risk is inherited from upstream instability: a task's scrap risk
//! depends only on the volatility of what it is built on, never on its
//! own volatility.

use serde::{Deserialize, Serialize};

use crate::core::dag::ProjectGraph;
use crate::core::task::{Task, TaskCategory, TaskId, TaskStatus, TeamType};
use crate::error::{Error, Result};
use crate::state::TaskStore;

/// Default risk inventory budget.
pub const DEFAULT_RISK_BUDGET: f64 = 2.5;

/// Reject budgets that cannot gate anything: zero, negative, NaN or infinite.
pub fn check_budget(budget: f64) -> Result<()> {
    if budget.is_finite() && budget > 0.0 {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "risk_budget must be a positive number, got {}",
            budget
        )))
    }
}

/// Likelihood (0–100) that a task's output will have to be redone.
///
/// Infrastructure and software tasks are not subject to scrap accounting
/// and always score 0. For hardware, the volatility of every direct
/// dependency contributes `volatility × 100`, clamped to 100.
pub fn scrap_risk_score(graph: &ProjectGraph<impl TaskStore>, task: &Task) -> f64 {
    if task.category == TaskCategory::Infrastructure || task.team == TeamType::Software {
        return 0.0;
    }

    let score: f64 = graph
        .predecessors(task.id.as_str())
        .iter()
        .map(|dep| dep.volatility * 100.0)
        .sum();
    score.clamp(0.0, 100.0)
}

/// Unretired instability committed to physical production.
///
/// Sum of volatility over hardware tasks that are not done, counting only
/// critical work (support and infrastructure are excluded).
pub fn risk_inventory(graph: &ProjectGraph<impl TaskStore>) -> f64 {
    graph
        .tasks()
        .filter(|t| t.team == TeamType::Hardware)
        .filter(|t| !t.is_done())
        .filter(|t| t.category == TaskCategory::Critical)
        .map(|t| t.volatility)
        .sum()
}

/// Number of direct successors of `id` that are not done yet.
pub fn downstream_impact(graph: &ProjectGraph<impl TaskStore>, id: &str) -> usize {
    graph
        .successors(id)
        .iter()
        .filter(|t| !t.is_done())
        .count()
}

/// Risk inventory measured against a budget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InventorySummary {
    pub current: f64,
    pub budget: f64,
    /// `current / budget` as a percentage.
    pub percent: f64,
    /// Set once the inventory reaches the budget.
    pub exceeded: bool,
}

impl InventorySummary {
    pub fn new(current: f64, budget: f64) -> Self {
        let percent = if budget > 0.0 {
            current / budget * 100.0
        } else {
            0.0
        };
        Self {
            current,
            budget,
            percent,
            exceeded: current >= budget,
        }
    }
}

pub fn inventory_summary(graph: &ProjectGraph<impl TaskStore>, budget: f64) -> InventorySummary {
    InventorySummary::new(risk_inventory(graph), budget)
}

/// Per-task risk and readiness, for status boards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskAnnotation {
    pub task_id: TaskId,
    pub name: String,
    pub status: TaskStatus,
    pub progress: f64,
    pub risk: f64,
    pub ready: bool,
}

/// Annotate every task, unfinished work first, then by id.
pub fn annotate(graph: &ProjectGraph<impl TaskStore>) -> Vec<TaskAnnotation> {
    let mut annotations: Vec<TaskAnnotation> = graph
        .tasks()
        .map(|task| TaskAnnotation {
            task_id: task.id.clone(),
            name: task.name.clone(),
            status: task.status,
            progress: task.progress,
            risk: scrap_risk_score(graph, task),
            ready: graph.is_ready(task),
        })
        .collect();
    annotations.sort_by(|a, b| {
        (a.status == TaskStatus::Done)
            .cmp(&(b.status == TaskStatus::Done))
            .then_with(|| a.task_id.cmp(&b.task_id))
    });
    annotations
}
