//! Task data model for the project dependency graph.
//!
//! Tasks are the units of engineering work tracked by the planner. Each
//! task belongs to a hardware or software team, carries its progress and
//! volatility, and lists the tasks it is built on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Unique identifier for a task within a project (e.g. `HW-1`).
///
/// Ids are chosen by whoever registers the task and are never reused.
/// Ordering is lexical and is used wherever the planner needs a
/// deterministic tie-break.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    /// Create a task identifier from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::borrow::Borrow<str> for TaskId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Which discipline owns a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamType {
    Hardware,
    Software,
}

impl std::fmt::Display for TeamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TeamType::Hardware => write!(f, "hardware"),
            TeamType::Software => write!(f, "software"),
        }
    }
}

impl std::str::FromStr for TeamType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "hardware" | "hw" => Ok(TeamType::Hardware),
            "software" | "sw" => Ok(TeamType::Software),
            other => Err(Error::Validation(format!("unknown team: {}", other))),
        }
    }
}

/// Task status in its lifecycle.
///
/// `WaitingForValidation` is only reached by hardware work that is
/// physically finished but still has software validators outstanding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Registered, not started.
    #[default]
    Pending,
    /// Someone is actively working on it.
    InProgress,
    /// Hardware output finished; risk not retired until validators are done.
    WaitingForValidation,
    /// Finished and, for hardware, validated.
    Done,
    /// Parked by its owner.
    Blocked,
}

impl TaskStatus {
    /// Wire/display value of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::WaitingForValidation => "waiting_for_validation",
            TaskStatus::Done => "done",
            TaskStatus::Blocked => "blocked",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "pending" => Ok(TaskStatus::Pending),
            "in_progress" => Ok(TaskStatus::InProgress),
            "waiting_for_validation" => Ok(TaskStatus::WaitingForValidation),
            "done" => Ok(TaskStatus::Done),
            "blocked" => Ok(TaskStatus::Blocked),
            _ => Err(Error::InvalidStatus(s.to_string())),
        }
    }
}

/// Risk accounting category of a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskCategory {
    /// Mainline work whose rework causes further complications (e.g. leg CAD).
    #[default]
    Critical,
    /// Work outside the main functionality (test harnesses, documentation).
    Infrastructure,
    /// Capacity lent to another team, usually to unblock validation.
    Support,
}

impl std::fmt::Display for TaskCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskCategory::Critical => write!(f, "Critical"),
            TaskCategory::Infrastructure => write!(f, "Infrastructure"),
            TaskCategory::Support => write!(f, "Support"),
        }
    }
}

impl std::str::FromStr for TaskCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "critical" => Ok(TaskCategory::Critical),
            "infrastructure" | "infra" => Ok(TaskCategory::Infrastructure),
            "support" => Ok(TaskCategory::Support),
            other => Err(Error::Validation(format!("unknown category: {}", other))),
        }
    }
}

/// Stage of the program a task belongs to.
///
/// Stages are ordered from architecture through testing. They classify
/// tasks for display and creation defaults only; graph logic never
/// reads them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProjectStage {
    /// Initial architecture and interfaces.
    #[serde(rename = "1. Architecture")]
    Architecture,
    /// CAD and materials on the hardware side, simulation and mock control on software.
    #[serde(rename = "2. Baseline Development")]
    Baseline,
    /// CNC, 3D printing, assembly.
    #[serde(rename = "3. Fabrication & Assembly")]
    Fabrication,
    /// Software integration and calibration on real hardware.
    #[serde(rename = "4. Bring-Up & Calibration")]
    BringUp,
    /// Test code and full system testing.
    #[serde(rename = "5. Testing & Iteration")]
    Testing,
}

impl ProjectStage {
    /// All stages in program order.
    pub const ALL: [ProjectStage; 5] = [
        ProjectStage::Architecture,
        ProjectStage::Baseline,
        ProjectStage::Fabrication,
        ProjectStage::BringUp,
        ProjectStage::Testing,
    ];

    /// Position of the stage in the program, starting at 1.
    pub fn ordinal(&self) -> u8 {
        match self {
            ProjectStage::Architecture => 1,
            ProjectStage::Baseline => 2,
            ProjectStage::Fabrication => 3,
            ProjectStage::BringUp => 4,
            ProjectStage::Testing => 5,
        }
    }

    /// Human-readable stage name without the ordinal prefix.
    pub fn label(&self) -> &'static str {
        match self {
            ProjectStage::Architecture => "Architecture",
            ProjectStage::Baseline => "Baseline Development",
            ProjectStage::Fabrication => "Fabrication & Assembly",
            ProjectStage::BringUp => "Bring-Up & Calibration",
            ProjectStage::Testing => "Testing & Iteration",
        }
    }

    /// Team that usually owns work in this stage.
    ///
    /// Bring-up and testing are software-led; everything before is
    /// hardware-led. Creation tooling uses this as a default only.
    pub fn default_team(&self) -> TeamType {
        match self {
            ProjectStage::BringUp | ProjectStage::Testing => TeamType::Software,
            ProjectStage::Architecture | ProjectStage::Baseline | ProjectStage::Fabrication => {
                TeamType::Hardware
            }
        }
    }
}

impl std::fmt::Display for ProjectStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}. {}", self.ordinal(), self.label())
    }
}

impl std::str::FromStr for ProjectStage {
    type Err = Error;

    /// Accepts the ordinal (`"3"`), the label, or the full display value.
    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim();
        ProjectStage::ALL
            .into_iter()
            .find(|stage| {
                needle == stage.ordinal().to_string()
                    || needle.eq_ignore_ascii_case(stage.label())
                    || needle.eq_ignore_ascii_case(&stage.to_string())
            })
            .ok_or_else(|| Error::Validation(format!("unknown stage: {}", needle)))
    }
}

/// A soft readiness gate on its owning task.
///
/// Once the owner's progress reaches `trigger_process`, the owner's
/// interface is considered frozen and dependents may start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub name: String,
    #[serde(default)]
    pub trigger_process: f64,
    #[serde(default)]
    pub is_reached: bool,
}

impl Milestone {
    pub fn new(name: &str, trigger_process: f64) -> Self {
        Self {
            name: name.to_string(),
            trigger_process,
            is_reached: false,
        }
    }
}

/// A single unit of engineering work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    pub team: TeamType,
    #[serde(default)]
    pub assigner: String,
    /// Physical or logical component the work is for (e.g. `leg`, `imu`).
    #[serde(default)]
    pub component_id: String,
    pub stage: ProjectStage,
    #[serde(default)]
    pub category: TaskCategory,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub expected_duration: f64,
    /// How likely the task's output is to change: 0.0 stable, 1.0 very volatile.
    #[serde(default)]
    pub volatility: f64,
    /// Ids of the tasks this task is built on, in declaration order.
    #[serde(default)]
    pub dependencies: Vec<TaskId>,
    /// Readiness logic only looks at the first milestone.
    #[serde(default, rename = "milestone", alias = "milestones")]
    pub milestones: Vec<Milestone>,
    /// Context switching penalty, 0 (none) through 5 (extreme).
    #[serde(default)]
    pub switch_cost: u8,
    #[serde(default)]
    pub target_support_id: Option<TaskId>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Create a pending critical task with no dependencies.
    pub fn new(id: impl Into<TaskId>, name: &str, team: TeamType, stage: ProjectStage) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.to_string(),
            team,
            assigner: String::new(),
            component_id: String::new(),
            stage,
            category: TaskCategory::Critical,
            status: TaskStatus::Pending,
            progress: 0.0,
            expected_duration: 0.0,
            volatility: 0.0,
            dependencies: Vec::new(),
            milestones: Vec::new(),
            switch_cost: 0,
            target_support_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_dependencies<I, T>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TaskId>,
    {
        self.dependencies = deps.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_category(mut self, category: TaskCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_progress(mut self, progress: f64) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_volatility(mut self, volatility: f64) -> Self {
        self.volatility = volatility;
        self
    }

    pub fn with_milestone(mut self, name: &str, trigger_process: f64) -> Self {
        self.milestones.push(Milestone::new(name, trigger_process));
        self
    }

    pub fn with_assigner(mut self, assigner: &str) -> Self {
        self.assigner = assigner.to_string();
        self
    }

    pub fn with_component(mut self, component_id: &str) -> Self {
        self.component_id = component_id.to_string();
        self
    }

    pub fn with_expected_duration(mut self, hours: f64) -> Self {
        self.expected_duration = hours;
        self
    }

    pub fn with_switch_cost(mut self, switch_cost: u8) -> Self {
        self.switch_cost = switch_cost;
        self
    }

    pub fn with_target_support(mut self, id: impl Into<TaskId>) -> Self {
        self.target_support_id = Some(id.into());
        self
    }

    /// Check the numeric fields are inside their documented ranges.
    ///
    /// # Errors
    /// Returns `Error::Validation` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        check_unit("progress", self.progress)?;
        check_unit("volatility", self.volatility)?;
        for milestone in &self.milestones {
            check_unit("trigger_process", milestone.trigger_process)?;
        }
        if self.switch_cost > 5 {
            return Err(Error::Validation(format!(
                "switch_cost must be between 0 and 5, got {}",
                self.switch_cost
            )));
        }
        Ok(())
    }

    /// The milestone readiness is judged against, if any.
    pub fn first_milestone(&self) -> Option<&Milestone> {
        self.milestones.first()
    }

    /// Whether this task, as a predecessor, lets its dependents start.
    ///
    /// True when the task is done, is waiting for validation, or has
    /// passed its first milestone. The milestone case models an upstream
    /// interface being frozen before the work is fully complete.
    pub fn releases_dependents(&self) -> bool {
        match self.status {
            TaskStatus::Done | TaskStatus::WaitingForValidation => true,
            TaskStatus::Pending | TaskStatus::InProgress | TaskStatus::Blocked => self
                .first_milestone()
                .is_some_and(|m| m.trigger_process <= self.progress),
        }
    }

    /// Whether the task itself may appear in the ready frontier.
    pub fn is_schedulable(&self) -> bool {
        matches!(self.status, TaskStatus::Pending | TaskStatus::Blocked)
    }

    pub fn is_done(&self) -> bool {
        self.status == TaskStatus::Done
    }

    /// Whether the task's output is fully built (progress at 100%).
    pub fn is_fully_built(&self) -> bool {
        self.progress >= 1.0
    }

    /// Refresh `is_reached` on every milestone from the current progress.
    pub(crate) fn sync_milestones(&mut self) {
        let progress = self.progress;
        for milestone in &mut self.milestones {
            milestone.is_reached = milestone.trigger_process <= progress;
        }
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

pub(crate) fn check_unit(field: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "{} must be between 0.0 and 1.0, got {}",
            field, value
        )))
    }
}
