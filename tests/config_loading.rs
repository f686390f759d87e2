use std::error::Error;
use std::io::Write;

use tempfile::NamedTempFile;
use taskdag::config::{ConfigFile, load_and_validate, parse_str};
use taskdag::dag::plan_execution;
use taskdag::errors::TaskdagError;
use taskdag::types::TaskStatus;
use taskdag_test_utils::builders::{ConfigFileBuilder, TaskConfigBuilder};

type TestResult = Result<(), Box<dyn Error>>;

fn write_config(contents: &str) -> Result<NamedTempFile, Box<dyn Error>> {
    let mut file = NamedTempFile::new()?;
    write!(file, "{contents}")?;
    Ok(file)
}

#[test]
fn loads_tasks_in_file_order_with_defaults() -> TestResult {
    let file = write_config(
        r#"
[[task]]
id = "db"
title = "Set up database"
status = "done"
cmd = "echo db"

[[task]]
id = "api"
after = ["db"]

[[task]]
id = "ui"
status = "in_progress"
"#,
    )?;

    let cfg = load_and_validate(file.path())?;
    let tasks = cfg.tasks();

    assert_eq!(
        tasks.iter().map(|t| t.id.as_str()).collect::<Vec<_>>(),
        vec!["db", "api", "ui"]
    );
    assert_eq!(tasks[0].title, "Set up database");
    assert_eq!(tasks[1].title, "api");
    assert_eq!(tasks[1].status, TaskStatus::Todo);
    assert_eq!(tasks[2].status, TaskStatus::InProgress);
    assert_eq!(cfg.config.max_parallel, 4);
    assert!(cfg.completion_policy().is_completed(TaskStatus::Cancelled));
    assert_eq!(cfg.commands().get("db").map(String::as_str), Some("echo db"));
    Ok(())
}

#[test]
fn after_titles_are_resolved_and_merged() -> TestResult {
    let raw = parse_str(
        r#"
[[task]]
id = "t1"
title = "Design schema"

[[task]]
id = "t2"
title = "Write migrations"
after_titles = ["design SCHEMA", "Unknown step"]

[[task]]
id = "t3"
title = "Ship"
after = ["t2"]
after_titles = ["write migrations", "Design schema"]
"#,
    )?;
    let cfg = ConfigFile::try_from(raw)?;

    assert_eq!(cfg.find("t2").unwrap().after, vec!["t1".to_string()]);
    assert_eq!(
        cfg.find("t3").unwrap().after,
        vec!["t2".to_string(), "t1".to_string()]
    );

    let plan = plan_execution(&cfg.tasks());
    assert_eq!(plan.batches.len(), 3);
    Ok(())
}

#[test]
fn cyclic_snapshot_loads_and_engine_reports_it() -> TestResult {
    let file = write_config(
        r#"
[[task]]
id = "A"
after = ["B"]

[[task]]
id = "B"
after = ["A"]
"#,
    )?;

    let cfg = load_and_validate(file.path())?;
    let plan = plan_execution(&cfg.tasks());
    assert!(plan.has_cycles);
    Ok(())
}

#[test]
fn dangling_dependency_is_accepted() -> TestResult {
    let cfg = ConfigFileBuilder::new()
        .with_task(TaskConfigBuilder::new("A").after("NonExistent").build())
        .build();
    assert_eq!(cfg.tasks()[0].dependencies, vec!["NonExistent".to_string()]);
    Ok(())
}

#[test]
fn duplicate_ids_are_rejected() {
    let raw = ConfigFileBuilder::new()
        .with_task(TaskConfigBuilder::new("A").build())
        .with_task(TaskConfigBuilder::new("A").build())
        .build_raw();

    match ConfigFile::try_from(raw) {
        Err(TaskdagError::ConfigError(msg)) => {
            assert!(msg.contains("duplicate task id"));
            assert!(msg.contains("'A'"));
        }
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn empty_id_is_rejected() {
    let raw = ConfigFileBuilder::new()
        .with_task(TaskConfigBuilder::new("  ").build())
        .build_raw();
    assert!(matches!(
        ConfigFile::try_from(raw),
        Err(TaskdagError::ConfigError(_))
    ));
}

#[test]
fn ambiguous_titles_are_rejected_when_resolving() {
    let raw = ConfigFileBuilder::new()
        .with_task(TaskConfigBuilder::new("a").title("Build").build())
        .with_task(TaskConfigBuilder::new("b").title("build").build())
        .with_task(TaskConfigBuilder::new("c").after_title("Build").build())
        .build_raw();

    match ConfigFile::try_from(raw) {
        Err(TaskdagError::ConfigError(msg)) => assert!(msg.contains("ambiguous")),
        other => panic!("Expected ConfigError, got: {:?}", other.map(|_| ())),
    }
}

#[test]
fn duplicate_titles_are_fine_without_after_titles() {
    let cfg = ConfigFileBuilder::new()
        .with_task(TaskConfigBuilder::new("a").title("Build").build())
        .with_task(TaskConfigBuilder::new("b").title("Build").build())
        .build();
    assert_eq!(cfg.tasks().len(), 2);
}

#[test]
fn bad_global_config_is_rejected() {
    let zero_parallel = ConfigFileBuilder::new().with_max_parallel(0).build_raw();
    assert!(matches!(
        ConfigFile::try_from(zero_parallel),
        Err(TaskdagError::ConfigError(msg)) if msg.contains("max_parallel")
    ));

    let no_statuses = ConfigFileBuilder::new()
        .with_completed_statuses(&[])
        .build_raw();
    assert!(matches!(
        ConfigFile::try_from(no_statuses),
        Err(TaskdagError::ConfigError(msg)) if msg.contains("completed_statuses")
    ));
}

#[test]
fn unknown_status_is_a_toml_error() {
    let result = parse_str(
        r#"
[[task]]
id = "A"
status = "finished"
"#,
    );
    assert!(matches!(result, Err(TaskdagError::TomlError(_))));
}

#[test]
fn missing_file_is_an_io_error() {
    let result = load_and_validate("/definitely/not/here/Taskdag.toml");
    assert!(matches!(result, Err(TaskdagError::IoError(_))));
}

#[test]
fn custom_completed_statuses_are_loaded() -> TestResult {
    let raw = parse_str(
        r#"
[config]
completed_statuses = ["done", "in_review"]
max_parallel = 2
"#,
    )?;
    let cfg = ConfigFile::try_from(raw)?;
    let policy = cfg.completion_policy();

    assert!(policy.is_completed(TaskStatus::InReview));
    assert!(!policy.is_completed(TaskStatus::Cancelled));
    assert!(cfg.tasks().is_empty());
    Ok(())
}

#[test]
fn status_parsing_accepts_common_spellings() {
    assert_eq!("In-Progress".parse::<TaskStatus>(), Ok(TaskStatus::InProgress));
    assert_eq!(" canceled ".parse::<TaskStatus>(), Ok(TaskStatus::Cancelled));
    assert_eq!("todo".parse::<TaskStatus>(), Ok(TaskStatus::Todo));
    assert!("finished".parse::<TaskStatus>().is_err());
    assert_eq!(TaskStatus::InReview.to_string(), "in_review");
    assert_eq!(TaskStatus::default(), TaskStatus::Todo);
}
