//! Priority scheduler.
//!
//! The Scheduler turns the current ready frontier into a recommendation
//! report with four ordered lanes:
//!
//! 1. Backward: software validation of hardware output, always first
//! 2. Support: explicit support work, or a swarming recommendation when
//!    the risk budget is exhausted
//! 3. Forward: new production work, gated on the risk budget and
//!    bucketed by scrap risk
//! 4. Infrastructure: always schedulable, never gated
//!
//! Reports are recomputed from scratch on every call. They carry
//! structured annotations only; rendering is up to the caller.

use std::cmp::Reverse;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Config;
use crate::core::dag::ProjectGraph;
use crate::core::task::{Task, TaskCategory, TaskId, TeamType};
use crate::error::Result;
use crate::planning::risk::{
    check_budget, downstream_impact, inventory_summary, scrap_risk_score, InventorySummary,
    DEFAULT_RISK_BUDGET,
};
use crate::state::TaskStore;

/// Scrap risk above which forward work is held.
pub const HOLD_RISK: f64 = 80.0;
/// Scrap risk above which forward work only starts tentatively.
pub const TENTATIVE_RISK: f64 = 50.0;

/// Which lane a ready task is scheduled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Backward,
    Support,
    Forward,
    Infrastructure,
}

impl Direction {
    /// Classify a task by category first, then by team.
    pub fn of(task: &Task) -> Self {
        match task.category {
            TaskCategory::Support => Direction::Support,
            TaskCategory::Infrastructure => Direction::Infrastructure,
            TaskCategory::Critical => match task.team {
                TeamType::Hardware => Direction::Forward,
                TeamType::Software => Direction::Backward,
            },
        }
    }
}

/// Recommended action for a lane entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Validate hardware output.
    Validate,
    /// Assist the software team.
    Assist,
    /// Too volatile upstream; do not start.
    Hold,
    /// Start, expecting some rework.
    TentativeStart,
    Start,
    Schedule,
}

/// One task in a lane, with its annotations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaneEntry {
    pub task_id: TaskId,
    pub name: String,
    /// Open direct successors.
    pub impact: usize,
    /// Scrap risk percentage (0–100).
    pub risk: f64,
    pub action: Action,
    /// Starting against a dependency that is not fully built.
    pub micro_batch: bool,
}

/// Recommendation to redirect capacity to a validation bottleneck.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwarmingRecommendation {
    /// The ready software task to swarm on.
    pub validation_task: TaskId,
    pub validation_name: String,
    /// The hardware dependency that task validates, if it has one.
    pub target_hardware: Option<TaskId>,
    pub target_hardware_name: Option<String>,
    /// `downstream_impact` of the target hardware.
    pub target_impact: Option<usize>,
    /// Suggested support task.
    pub action: String,
}

/// Lane-level notice replacing or supplementing the entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum LaneNotice {
    /// Lane suppressed; execute support work first.
    Blocked { reason: String },
    /// Synthesized support work.
    Swarm(SwarmingRecommendation),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaneReport {
    pub direction: Direction,
    pub entries: Vec<LaneEntry>,
    pub notice: Option<LaneNotice>,
}

impl LaneReport {
    fn new(direction: Direction) -> Self {
        Self {
            direction,
            entries: Vec::new(),
            notice: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.notice.is_none()
    }
}

/// Full recommendation for one decision point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleReport {
    pub inventory: InventorySummary,
    /// Always Backward, Support, Forward, Infrastructure, in that order.
    pub lanes: Vec<LaneReport>,
}

impl ScheduleReport {
    pub fn lane(&self, direction: Direction) -> Option<&LaneReport> {
        self.lanes.iter().find(|l| l.direction == direction)
    }

    /// Nothing to recommend.
    pub fn is_idle(&self) -> bool {
        self.lanes.iter().all(LaneReport::is_empty)
    }
}

/// Stateless recommendation engine parameterized by the risk budget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scheduler {
    risk_budget: f64,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self {
            risk_budget: DEFAULT_RISK_BUDGET,
        }
    }
}

impl Scheduler {
    /// # Errors
    /// `Validation` unless `risk_budget` is finite and positive.
    pub fn new(risk_budget: f64) -> Result<Self> {
        check_budget(risk_budget)?;
        Ok(Self { risk_budget })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.risk_budget)
    }

    pub fn risk_budget(&self) -> f64 {
        self.risk_budget
    }

    /// Build the lane report for the current state of `graph`.
    pub fn report<S: TaskStore>(&self, graph: &ProjectGraph<S>) -> ScheduleReport {
        let mut backward = Vec::new();
        let mut support = Vec::new();
        let mut forward = Vec::new();
        let mut infrastructure = Vec::new();

        for task in graph.get_ready_tasks() {
            match Direction::of(task) {
                Direction::Backward => backward.push(task),
                Direction::Support => support.push(task),
                Direction::Forward => forward.push(task),
                Direction::Infrastructure => infrastructure.push(task),
            }
        }

        let inventory = inventory_summary(graph, self.risk_budget);
        debug!(
            ready_backward = backward.len(),
            ready_support = support.len(),
            ready_forward = forward.len(),
            ready_infrastructure = infrastructure.len(),
            inventory = inventory.current,
            exceeded = inventory.exceeded,
            "Building schedule report"
        );

        let mut backward_lane = LaneReport::new(Direction::Backward);
        sort_by_impact(graph, &mut backward);
        for task in &backward {
            backward_lane
                .entries
                .push(entry(graph, task, Action::Validate));
        }

        let mut support_lane = LaneReport::new(Direction::Support);
        for task in &support {
            support_lane.entries.push(entry(graph, task, Action::Assist));
        }
        if inventory.exceeded && support.is_empty() {
            support_lane.notice = swarm_target(graph, &backward).map(LaneNotice::Swarm);
        }

        let mut forward_lane = LaneReport::new(Direction::Forward);
        if inventory.exceeded {
            forward_lane.notice = Some(LaneNotice::Blocked {
                reason: "Risk budget full: system unstable, execute support work".to_string(),
            });
        } else {
            sort_by_impact(graph, &mut forward);
            for task in &forward {
                let mut item = entry(graph, task, Action::Start);
                item.action = forward_action(item.risk);
                forward_lane.entries.push(item);
            }
        }

        let mut infrastructure_lane = LaneReport::new(Direction::Infrastructure);
        for task in &infrastructure {
            infrastructure_lane
                .entries
                .push(entry(graph, task, Action::Schedule));
        }

        ScheduleReport {
            inventory,
            lanes: vec![backward_lane, support_lane, forward_lane, infrastructure_lane],
        }
    }

    /// The swarming bottleneck among ready backward tasks, if any.
    ///
    /// Read-only; does not depend on the risk budget. Creation tooling
    /// uses this to propose support tasks proactively.
    pub fn swarming_recommendation<S: TaskStore>(
        &self,
        graph: &ProjectGraph<S>,
    ) -> Option<SwarmingRecommendation> {
        let backward: Vec<&Task> = graph
            .get_ready_tasks()
            .into_iter()
            .filter(|t| Direction::of(t) == Direction::Backward)
            .collect();
        swarm_target(graph, &backward)
    }
}

fn forward_action(risk: f64) -> Action {
    if risk > HOLD_RISK {
        Action::Hold
    } else if risk > TENTATIVE_RISK {
        Action::TentativeStart
    } else {
        Action::Start
    }
}

fn entry<S: TaskStore>(graph: &ProjectGraph<S>, task: &Task, action: Action) -> LaneEntry {
    LaneEntry {
        task_id: task.id.clone(),
        name: task.name.clone(),
        impact: downstream_impact(graph, task.id.as_str()),
        risk: scrap_risk_score(graph, task),
        action,
        micro_batch: is_micro_batch(graph, task),
    }
}

/// Whether any dependency of `task` is not fully built yet.
fn is_micro_batch<S: TaskStore>(graph: &ProjectGraph<S>, task: &Task) -> bool {
    graph
        .predecessors(task.id.as_str())
        .iter()
        .any(|dep| !dep.is_fully_built())
}

/// Descending impact, ties by ascending id.
fn sort_by_impact<S: TaskStore>(graph: &ProjectGraph<S>, tasks: &mut [&Task]) {
    tasks.sort_by_cached_key(|t| (Reverse(downstream_impact(graph, t.id.as_str())), t.id.clone()));
}

/// The hardware dependency of `task` with the highest downstream impact.
///
/// Ties go to the lowest id.
fn target_hardware<'a, S: TaskStore>(
    graph: &'a ProjectGraph<S>,
    task: &Task,
) -> Option<(&'a Task, usize)> {
    graph
        .predecessors(task.id.as_str())
        .into_iter()
        .filter(|dep| dep.team == TeamType::Hardware)
        .map(|dep| (dep, downstream_impact(graph, dep.id.as_str())))
        .min_by(|(a, a_impact), (b, b_impact)| b_impact.cmp(a_impact).then_with(|| a.id.cmp(&b.id)))
}

/// Pick the backward task whose target hardware has the highest impact.
///
/// Tasks with no hardware dependency rank below any task that has one.
/// Ties go to the lowest task id.
fn swarm_target<S: TaskStore>(
    graph: &ProjectGraph<S>,
    backward: &[&Task],
) -> Option<SwarmingRecommendation> {
    let (task, target) = backward
        .iter()
        .map(|task| (*task, target_hardware(graph, task)))
        .min_by(|(a, a_target), (b, b_target)| {
            let a_impact = a_target.map(|(_, impact)| impact);
            let b_impact = b_target.map(|(_, impact)| impact);
            b_impact.cmp(&a_impact).then_with(|| a.id.cmp(&b.id))
        })?;

    let hardware_name = target.map(|(hw, _)| hw.name.as_str()).unwrap_or("hardware");
    Some(SwarmingRecommendation {
        validation_task: task.id.clone(),
        validation_name: task.name.clone(),
        target_hardware: target.map(|(hw, _)| hw.id.clone()),
        target_hardware_name: target.map(|(hw, _)| hw.name.clone()),
        target_impact: target.map(|(_, impact)| impact),
        action: format!(
            "Build test jig for '{}' (validates '{}')",
            task.name, hardware_name
        ),
    })
}
