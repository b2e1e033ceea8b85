//! Plan changes: volatility updates that may scrap downstream work.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::dag::ProjectGraph;
use crate::core::task::TaskId;
use crate::state::TaskStore;
use crate::Result;

/// Volatility at or above which a change scraps downstream work.
pub const DEFAULT_SCRAP_THRESHOLD: f64 = 0.8;

/// Outcome of [`apply_plan_change`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanChange {
    pub previous: f64,
    pub volatility: f64,
    /// The new volatility reached the scrap threshold.
    pub scrapped: bool,
    /// Downstream tasks sent back to pending.
    pub reset: BTreeSet<TaskId>,
}

/// Record a new volatility for `id` and, if it crosses the scrap
/// threshold and `cascade` is set, reset everything built on it.
///
/// Returns `None` for an unknown id.
pub fn apply_plan_change<S: TaskStore>(
    graph: &mut ProjectGraph<S>,
    id: &str,
    volatility: f64,
    scrap_threshold: f64,
    cascade: bool,
) -> Result<Option<PlanChange>> {
    let Some(previous) = graph.update_volatility(id, volatility)? else {
        return Ok(None);
    };

    let scrapped = volatility >= scrap_threshold;
    let reset = if scrapped && cascade {
        warn!(task = id, volatility, "Volatility crossed scrap threshold, resetting downstream work");
        graph.reset_downstream(id)?
    } else {
        BTreeSet::new()
    };

    Ok(Some(PlanChange {
        previous,
        volatility,
        scrapped,
        reset,
    }))
}
