//! Decision support built on the project graph.
//!
//! This module holds the risk model, the lane scheduler, plan-change
//! handling and overlap scoring. Everything here reads the graph and
//! recomputes from scratch; only plan changes mutate it.

pub mod overlap;
pub mod plan_change;
pub mod risk;
pub mod scheduler;

pub use overlap::overlap_score;
pub use plan_change::{apply_plan_change, PlanChange, DEFAULT_SCRAP_THRESHOLD};
pub use risk::{
    annotate, check_budget, downstream_impact, inventory_summary, risk_inventory, scrap_risk_score,
    InventorySummary, TaskAnnotation, DEFAULT_RISK_BUDGET,
};
pub use scheduler::{
    Action, Direction, LaneEntry, LaneNotice, LaneReport, ScheduleReport, Scheduler,
    SwarmingRecommendation,
};
