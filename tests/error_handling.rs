// tests/error_handling.rs

mod common;

use std::io::Write;

use common::TestResult;
use common::builders::{JobEntryBuilder, JobFileBuilder};
use jobgate::config::{JobFile, load_and_validate, parse_str};
use jobgate::dag::Scheduler;
use jobgate::errors::JobgateError;
use jobgate::job::Priority;
use jobgate::types::{JobState, Retention};
use tempfile::NamedTempFile;

fn write_job_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn test_dag_cycle_returns_structured_error() {
    let file = write_job_file(
        r#"
[job.A]
kind = "extract"
after = ["B"]

[job.B]
kind = "load"
after = ["A"]
"#,
    );

    match load_and_validate(file.path()) {
        Err(JobgateError::Cycle { job, prerequisite }) => {
            assert!(job == "A" || job == "B");
            assert!(prerequisite == "A" || prerequisite == "B");
        }
        Err(e) => panic!("Expected Cycle error, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_unknown_dependency_returns_config_error() {
    let file = write_job_file(
        r#"
[job.A]
kind = "extract"
after = ["NonExistent"]
"#,
    );

    match load_and_validate(file.path()) {
        Err(JobgateError::ConfigError(msg)) => {
            assert!(msg.contains("unknown dependency"));
            assert!(msg.contains("NonExistent"));
        }
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_self_dependency_returns_config_error() {
    let result = JobFile::try_from(
        JobFileBuilder::new()
            .with_job("A", JobEntryBuilder::new("extract").after("A").build())
            .build_raw(),
    );

    match result {
        Err(JobgateError::ConfigError(msg)) => assert!(msg.contains("cannot depend on itself")),
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
}

#[test]
fn test_zero_workers_is_rejected() {
    let result = JobFile::try_from(
        JobFileBuilder::new()
            .workers(0)
            .with_job("A", JobEntryBuilder::new("extract").build())
            .build_raw(),
    );

    assert!(matches!(result, Err(JobgateError::ConfigError(msg)) if msg.contains("workers")));
}

#[test]
fn test_empty_file_is_rejected() {
    let raw = parse_str("").unwrap();
    assert!(matches!(
        JobFile::try_from(raw),
        Err(JobgateError::ConfigError(_))
    ));
}

#[test]
fn test_bad_priority_is_a_toml_error() {
    let file = write_job_file(
        r#"
[job.A]
kind = "extract"
priority = "whenever"
"#,
    );

    match load_and_validate(file.path()) {
        Err(JobgateError::TomlError(e)) => assert!(e.to_string().contains("invalid priority")),
        Err(e) => panic!("Expected TomlError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = load_and_validate(dir.path().join("Jobs.toml"));
    assert!(matches!(result, Err(JobgateError::IoError(_))));
}

#[test]
fn test_priorities_accept_names_and_integers() -> TestResult {
    let raw = parse_str(
        r#"
[job.named]
kind = "extract"
priority = "Critical"

[job.numeric]
kind = "extract"
priority = 7

[job.default]
kind = "extract"
"#,
    )?;

    assert_eq!(raw.job["named"].priority, Priority::CRITICAL);
    assert_eq!(raw.job["numeric"].priority, Priority::new(7));
    assert_eq!(raw.job["default"].priority, Priority::NORMAL);
    Ok(())
}

#[test]
fn test_submission_order_puts_prerequisites_first() -> TestResult {
    // Alphabetical order would submit "a_load" before its prerequisites.
    let file = write_job_file(
        r#"
[scheduler]
workers = 2
retain_completed = 10

[job.a_load]
kind = "load"
after = ["m_transform", "z_extract"]

[job.m_transform]
kind = "transform"
after = ["z_extract"]

[job.z_extract]
kind = "extract"
priority = "high"

[job.b_audit]
kind = "audit"
config = { table = "events", strict = true }
"#,
    );

    let cfg = load_and_validate(file.path())?;
    assert_eq!(
        cfg.submission_order(),
        ["b_audit", "z_extract", "m_transform", "a_load"]
    );
    assert_eq!(cfg.scheduler.workers, 2);
    assert_eq!(cfg.scheduler.options().retention, Retention::Latest(10));

    let scheduler = Scheduler::from_config(&cfg)?;
    assert_eq!(scheduler.state_of("z_extract"), Some(JobState::Ready));
    assert_eq!(scheduler.state_of("a_load"), Some(JobState::Blocked));
    let audit = scheduler.get("b_audit").ok_or("b_audit missing")?;
    assert_eq!(audit.config()["table"], "events");
    assert_eq!(audit.config()["strict"], true);
    Ok(())
}

#[test]
fn test_error_messages_name_the_job() {
    let err = JobgateError::InvalidTransition {
        id: "load".to_string(),
        state: JobState::Blocked,
        operation: "complete",
    };
    assert_eq!(err.to_string(), "Cannot complete job 'load' while it is blocked");

    let err = JobgateError::Cycle {
        job: "a".to_string(),
        prerequisite: "b".to_string(),
    };
    assert!(err.to_string().contains("'a' cannot depend on 'b'"));
}
