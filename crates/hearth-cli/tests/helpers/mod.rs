use assert_cmd::Command;
use std::path::PathBuf;
use tempfile::TempDir;
use uuid::Uuid;

/// Test harness for running CLI commands against a temporary database
pub struct CliTestHarness {
    temp_dir: TempDir,
    db_path: PathBuf,
}

impl CliTestHarness {
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test.db");

        Self { temp_dir, db_path }
    }

    /// A command that runs inside the temp directory, so no stray `hearth.toml` is picked up
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("hearth").expect("Failed to find hearth binary");
        cmd.current_dir(self.temp_dir.path())
            .env("HEARTH_DATABASE_PATH", &self.db_path)
            .env("HEARTH_LOG_LEVEL", "warn")
            .env_remove("RUST_LOG")
            .env_remove("HEARTH_DEFAULT_FILTERS");
        cmd
    }

    pub fn run_success(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().success()
    }

    pub fn run_failure(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().failure()
    }

    /// Runs a command that prints task ids and returns them in output order
    pub fn run_for_ids(&self, args: &[&str]) -> Vec<Uuid> {
        let output = self.run_success(args).get_output().stdout.clone();
        extract_ids(&String::from_utf8_lossy(&output))
    }

    /// Adds a task and returns its full id
    pub fn add_task(&self, args: &[&str]) -> Uuid {
        let mut full_args = vec!["add"];
        full_args.extend_from_slice(args);
        self.run_for_ids(&full_args)
            .into_iter()
            .next()
            .expect("add printed no task id")
    }
}

/// Pulls every UUID out of colored CLI output.
pub fn extract_ids(output: &str) -> Vec<Uuid> {
    output
        .split(|c: char| !(c.is_ascii_hexdigit() || c == '-'))
        .filter(|token| token.len() == 36)
        .filter_map(|token| Uuid::parse_str(token).ok())
        .collect()
}

pub mod assertions {
    use predicates::prelude::*;

    pub fn task_created_successfully() -> impl Predicate<str> {
        predicate::str::contains("Created task")
    }

    pub fn has_error() -> impl Predicate<str> {
        predicate::str::contains("Error").or(predicate::str::contains("error"))
    }
}
