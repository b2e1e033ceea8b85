//! Hardware/software validation closure tests.

use gantry::{ProjectGraph, TaskStatus};

use crate::fixtures::{hw, leg_project, sw};

fn hardware_with_two_validators() -> ProjectGraph {
    let mut project = ProjectGraph::in_memory();
    project
        .insert_task(hw("H").with_volatility(0.6).with_milestone("pinout", 0.2))
        .unwrap();
    project.insert_task(sw("S1").with_dependencies(["H"])).unwrap();
    project.insert_task(sw("S2").with_dependencies(["H"])).unwrap();
    project
}

#[test]
fn test_hardware_first_then_validators() {
    let mut project = hardware_with_two_validators();

    project.set_progress("H", 1.0, TaskStatus::Done).unwrap();
    let h = project.get_task("H").unwrap();
    assert_eq!(h.status, TaskStatus::WaitingForValidation);
    assert_ne!(h.status, TaskStatus::Done);
    assert_eq!(h.volatility, 0.6);

    project.set_progress("S1", 1.0, TaskStatus::Done).unwrap();
    assert_eq!(
        project.get_task("H").unwrap().status,
        TaskStatus::WaitingForValidation
    );

    project.set_progress("S2", 1.0, TaskStatus::Done).unwrap();
    let h = project.get_task("H").unwrap();
    assert_eq!(h.status, TaskStatus::Done);
    assert_eq!(h.volatility, 0.0);
}

#[test]
fn test_validators_first_then_hardware() {
    let mut project = hardware_with_two_validators();
    project.set_progress("H", 0.3, TaskStatus::InProgress).unwrap();

    project.set_progress("S2", 1.0, TaskStatus::Done).unwrap();
    assert_eq!(project.get_task("H").unwrap().status, TaskStatus::InProgress);

    // The last validator finishing closes the loop on H.
    project.set_progress("S1", 1.0, TaskStatus::Done).unwrap();
    let h = project.get_task("H").unwrap();
    assert_eq!(h.status, TaskStatus::Done);
    assert_eq!(h.volatility, 0.0);
    assert!(project.completion().is_complete());
}

#[test]
fn test_single_validator_closes_unfinished_hardware() {
    let mut project = ProjectGraph::in_memory();
    project
        .insert_task(hw("H").with_volatility(0.6).with_milestone("pinout", 0.2))
        .unwrap();
    project.insert_task(sw("S").with_dependencies(["H"])).unwrap();
    project.set_progress("H", 0.3, TaskStatus::InProgress).unwrap();

    project.set_progress("S", 1.0, TaskStatus::Done).unwrap();

    let h = project.get_task("H").unwrap();
    assert_eq!(h.status, TaskStatus::Done);
    assert_eq!(h.volatility, 0.0);
}

#[test]
fn test_interleaved_order() {
    let mut project = hardware_with_two_validators();
    project.set_progress("H", 0.5, TaskStatus::InProgress).unwrap();

    project.set_progress("S1", 1.0, TaskStatus::Done).unwrap();
    project.set_progress("H", 1.0, TaskStatus::Done).unwrap();
    assert_eq!(
        project.get_task("H").unwrap().status,
        TaskStatus::WaitingForValidation
    );

    project.set_progress("S2", 1.0, TaskStatus::Done).unwrap();
    assert_eq!(project.get_task("H").unwrap().status, TaskStatus::Done);
}

#[test]
fn test_leg_program_runs_to_completion() {
    let mut project = leg_project();

    project.update_progress("SW-1", 0.5, "in_progress").unwrap();
    project.update_progress("HW-2", 1.0, "done").unwrap();
    assert_eq!(
        project.get_task("HW-2").unwrap().status,
        TaskStatus::WaitingForValidation
    );
    assert!(!project.completion().is_complete());

    project.update_progress("SW-1", 1.0, "DONE").unwrap();

    assert_eq!(project.get_task("HW-2").unwrap().status, TaskStatus::Done);
    let completion = project.completion();
    assert_eq!((completion.done, completion.total), (3, 3));
    assert!(completion.is_complete());
}

#[test]
fn test_software_done_only_promotes_its_own_hardware() {
    let mut project = ProjectGraph::in_memory();
    project
        .insert_task(hw("H1").with_status(TaskStatus::WaitingForValidation))
        .unwrap();
    project
        .insert_task(hw("H2").with_status(TaskStatus::WaitingForValidation))
        .unwrap();
    project.insert_task(sw("S1").with_dependencies(["H1"])).unwrap();
    project.insert_task(sw("S2").with_dependencies(["H2"])).unwrap();

    project.set_progress("S1", 1.0, TaskStatus::Done).unwrap();

    assert_eq!(project.get_task("H1").unwrap().status, TaskStatus::Done);
    assert_eq!(
        project.get_task("H2").unwrap().status,
        TaskStatus::WaitingForValidation
    );
}

#[test]
fn test_invalid_status_text_changes_nothing() {
    let mut project = leg_project();
    let saves = project.store().save_count();

    assert!(project.update_progress("HW-2", 1.0, "shipped").is_err());

    let hw2 = project.get_task("HW-2").unwrap();
    assert_eq!(hw2.progress, 0.6);
    assert_eq!(hw2.status, TaskStatus::InProgress);
    assert_eq!(project.store().save_count(), saves);
}
