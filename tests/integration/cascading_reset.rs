//! Downstream reset and plan change tests.

use gantry::planning::{apply_plan_change, DEFAULT_SCRAP_THRESHOLD};
use gantry::{ProjectGraph, TaskStatus};

use crate::fixtures::{hw, leg_project, sw};

/// A -> B -> C with A under way and B finished.
fn chain(c_progress: f64, c_status: TaskStatus) -> ProjectGraph {
    let mut project = ProjectGraph::in_memory();
    project
        .insert_task(
            hw("A")
                .with_status(TaskStatus::InProgress)
                .with_progress(0.4),
        )
        .unwrap();
    project
        .insert_task(
            hw("B")
                .with_dependencies(["A"])
                .with_status(TaskStatus::Done)
                .with_progress(1.0),
        )
        .unwrap();
    project
        .insert_task(
            sw("C")
                .with_dependencies(["B"])
                .with_status(c_status)
                .with_progress(c_progress),
        )
        .unwrap();
    project
}

fn ids(set: &std::collections::BTreeSet<gantry::TaskId>) -> Vec<&str> {
    set.iter().map(|id| id.as_str()).collect()
}

#[test]
fn test_reset_reaches_every_descendant() {
    let mut project = chain(0.2, TaskStatus::InProgress);
    let a_before = project.get_task("A").unwrap().clone();

    let reset = project.reset_downstream("A").unwrap();

    assert_eq!(ids(&reset), vec!["B", "C"]);
    for id in ["B", "C"] {
        let task = project.get_task(id).unwrap();
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.progress, 0.0);
    }

    // The origin keeps its own work.
    let a = project.get_task("A").unwrap();
    assert_eq!(a.status, TaskStatus::InProgress);
    assert_eq!(a.progress, 0.4);
    assert_eq!(a.updated_at, a_before.updated_at);
}

#[test]
fn test_untouched_descendant_is_not_reported() {
    let mut project = chain(0.0, TaskStatus::Blocked);

    let reset = project.reset_downstream("A").unwrap();

    assert_eq!(ids(&reset), vec!["B"]);
    // C had nothing to lose and keeps its status.
    assert_eq!(project.get_task("C").unwrap().status, TaskStatus::Blocked);
}

#[test]
fn test_reset_of_leaf_is_empty() {
    let mut project = chain(0.5, TaskStatus::InProgress);
    let saves = project.store().save_count();

    assert!(project.reset_downstream("C").unwrap().is_empty());
    assert_eq!(project.store().save_count(), saves);
}

#[test]
fn test_reset_withdraws_ready_work() {
    let mut project = chain(0.0, TaskStatus::Pending);
    assert_eq!(crate::fixtures::ready_ids(&project), vec!["C"]);

    project.reset_downstream("A").unwrap();

    // B is pending again behind A, and C is blocked behind B.
    assert!(crate::fixtures::ready_ids(&project).is_empty());
    assert_eq!(project.get_task("B").unwrap().status, TaskStatus::Pending);
}

#[test]
fn test_plan_change_below_threshold_keeps_work() {
    let mut project = leg_project();

    let change = apply_plan_change(&mut project, "HW-1", 0.5, DEFAULT_SCRAP_THRESHOLD, true)
        .unwrap()
        .unwrap();

    assert_eq!(change.previous, 0.0);
    assert!(!change.scrapped);
    assert!(change.reset.is_empty());
    assert_eq!(project.get_task("HW-2").unwrap().progress, 0.6);
}

#[test]
fn test_plan_change_above_threshold_scraps_downstream() {
    let mut project = leg_project();
    project.update_progress("SW-1", 0.3, "in_progress").unwrap();

    let change = apply_plan_change(&mut project, "HW-1", 0.9, DEFAULT_SCRAP_THRESHOLD, true)
        .unwrap()
        .unwrap();

    assert!(change.scrapped);
    assert_eq!(ids(&change.reset), vec!["HW-2", "SW-1"]);
    assert_eq!(project.get_task("HW-1").unwrap().volatility, 0.9);
    let hw2 = project.get_task("HW-2").unwrap();
    assert_eq!(hw2.status, TaskStatus::Pending);
    assert!(!hw2.milestones[0].is_reached);
}

#[test]
fn test_plan_change_without_cascade_only_flags() {
    let mut project = leg_project();

    let change = apply_plan_change(&mut project, "HW-1", 0.95, DEFAULT_SCRAP_THRESHOLD, false)
        .unwrap()
        .unwrap();

    assert!(change.scrapped);
    assert!(change.reset.is_empty());
    assert_eq!(
        project.get_task("HW-2").unwrap().status,
        TaskStatus::InProgress
    );
}

#[test]
fn test_plan_change_on_unknown_task() {
    let mut project = leg_project();
    let result = apply_plan_change(&mut project, "HW-9", 0.9, DEFAULT_SCRAP_THRESHOLD, true);
    assert!(result.unwrap().is_none());
}
