use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;
use test_env::*;

fn widget_json(temp_dir: &TempDir) -> Value {
    let output = get_widget_cmd(temp_dir).arg("--json").output().unwrap();
    assert!(output.status.success());
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_widget_without_store_shows_nothing() {
    let (temp_dir, _guard) = setup_test_env();

    get_widget_cmd(&temp_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing due today"));

    // The widget never creates the shared store
    assert!(!temp_dir.path().join("test.db").exists());
}

#[test]
fn test_widget_shows_tasks_due_today() {
    let (temp_dir, _guard) = setup_test_env();

    get_task_cmd(&temp_dir).args(["add", "Stand-up today at 23:59"]).assert().success();
    get_task_cmd(&temp_dir).args(["add", "Someday task"]).assert().success();
    get_task_cmd(&temp_dir).args(["add", "Later on 2099-01-01"]).assert().success();

    get_widget_cmd(&temp_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Stand-up"))
        .stdout(predicate::str::contains("23:59"))
        .stdout(predicate::str::contains("Someday task").not());

    let entry = widget_json(&temp_dir);
    assert_eq!(entry["tasks"].as_array().unwrap().len(), 1);
    assert_eq!(entry["tasks"][0]["title"], "Stand-up");
}

#[test]
fn test_widget_refreshes_after_app_change() {
    let (temp_dir, _guard) = setup_test_env();

    get_task_cmd(&temp_dir).args(["add", "Morning call today at 23:58"]).assert().success();
    assert_eq!(widget_json(&temp_dir)["tasks"].as_array().unwrap().len(), 1);
    assert!(temp_dir.path().join(".taskify/widgets/TaskifyWidget.timeline.json").exists());

    get_task_cmd(&temp_dir).args(["add", "Evening call today at 23:59"]).assert().success();
    assert!(temp_dir.path().join(".taskify/widgets/TaskifyWidget.reload").exists());
    assert_eq!(widget_json(&temp_dir)["tasks"].as_array().unwrap().len(), 2);

    let id = widget_json(&temp_dir)["tasks"][0]["id"].as_str().unwrap()[..8].to_string();
    get_task_cmd(&temp_dir).args(["done", &id]).assert().success();

    let entry = widget_json(&temp_dir);
    let tasks = entry["tasks"].as_array().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["title"], "Evening call");
}

#[test]
fn test_widget_fresh_rebuilds() {
    let (temp_dir, _guard) = setup_test_env();

    get_task_cmd(&temp_dir).args(["add", "Stand-up today at 23:59"]).assert().success();

    let output = get_widget_cmd(&temp_dir).args(["--json", "--fresh"]).output().unwrap();
    assert!(output.status.success());
    let entry: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(entry["tasks"].as_array().unwrap().len(), 1);
}
