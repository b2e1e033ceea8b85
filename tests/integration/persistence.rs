//! JSON file store round trips.

use std::fs;

use gantry::{JsonFileStore, ProjectGraph, TaskStatus, TaskStore};

use crate::fixtures::{hw, ready_ids, sw, TempProject};

#[test]
fn test_absent_file_loads_empty() {
    let fixture = TempProject::new();
    assert!(fixture.project.is_empty());
    assert!(!fixture.store_path().exists());
}

#[test]
fn test_every_mutation_is_written_through() {
    let mut fixture = TempProject::new();
    fixture.project.insert_task(hw("HW-1")).unwrap();
    fixture
        .project
        .insert_task(sw("SW-1").with_dependencies(["HW-1"]))
        .unwrap();
    fixture
        .project
        .update_progress("HW-1", 1.0, "done")
        .unwrap();

    let reopened = fixture.reopen();

    assert_eq!(reopened.len(), 2);
    assert!(reopened.has_dependency("HW-1", "SW-1"));
    assert_eq!(
        reopened.get_task("HW-1").unwrap().status,
        TaskStatus::WaitingForValidation
    );
    assert_eq!(ready_ids(&reopened), vec!["SW-1"]);
}

#[test]
fn test_dangling_edge_survives_reload() {
    let mut fixture = TempProject::new();
    fixture
        .project
        .insert_task(sw("SW-1").with_dependencies(["HW-1"]))
        .unwrap();
    fixture.project.insert_task(hw("HW-1")).unwrap();

    let reopened = fixture.reopen();

    assert!(!reopened.has_dependency("HW-1", "SW-1"));
    assert_eq!(ready_ids(&reopened), vec!["HW-1", "SW-1"]);
    // The declared dependency is still recorded on the task.
    assert_eq!(reopened.get_task("SW-1").unwrap().dependencies.len(), 1);
}

#[test]
fn test_file_maps_ids_to_records() {
    let mut fixture = TempProject::new();
    fixture
        .project
        .insert_task(hw("HW-1").with_volatility(0.3).with_milestone("pinout", 0.4))
        .unwrap();

    let contents = fs::read_to_string(fixture.store_path()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&contents).unwrap();

    let record = &value["HW-1"];
    assert_eq!(record["id"], "HW-1");
    assert_eq!(record["team"], "hardware");
    assert_eq!(record["status"], "pending");
    assert_eq!(record["volatility"], 0.3);
    assert_eq!(record["milestone"][0]["trigger_process"], 0.4);
}

#[test]
fn test_previous_snapshot_kept_as_backup() {
    let mut fixture = TempProject::new();
    fixture.project.insert_task(hw("HW-1")).unwrap();
    fixture.project.insert_task(hw("HW-2")).unwrap();

    let backup = fixture.store_path().with_extension("json.bak");
    let contents = fs::read_to_string(backup).unwrap();
    let value: serde_json::Value = serde_json::from_str(&contents).unwrap();

    assert!(value.get("HW-1").is_some());
    assert!(value.get("HW-2").is_none());
}

#[test]
fn test_empty_file_loads_empty() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("tasks.json");
    fs::write(&path, "").unwrap();

    let store = JsonFileStore::new(&path);
    assert!(store.load().unwrap().is_empty());
}

#[test]
fn test_corrupt_file_is_an_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("tasks.json");
    fs::write(&path, "{ not json").unwrap();

    let result = ProjectGraph::open(JsonFileStore::new(&path));
    assert!(matches!(result, Err(gantry::Error::Json(_))));
}

#[test]
fn test_hand_written_file_with_defaults() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("nested").join("tasks.json");
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(
        &path,
        r#"{
            "HW-1": {
                "id": "HW-1",
                "name": "Chassis",
                "team": "hardware",
                "stage": "2. Baseline Development",
                "milestones": [{"name": "frame welded", "trigger_process": 0.5}]
            }
        }"#,
    )
    .unwrap();

    let project = ProjectGraph::open(JsonFileStore::new(&path)).unwrap();
    let task = project.get_task("HW-1").unwrap();

    assert_eq!(task.status, TaskStatus::Pending);
    assert_eq!(task.milestones.len(), 1);
    assert!(!task.milestones[0].is_reached);
}
