//! E2E test fixture: an isolated project, home and registry, with step
//! logging so a failing scenario shows what ran before it.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};

use serde_json::Value;
use skill::test_utils::RegistryFixture;
use tempfile::TempDir;

/// Captured output of one `skill` invocation.
#[derive(Debug)]
pub struct CommandOutput {
    pub success: bool,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

impl CommandOutput {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.stdout)
            .unwrap_or_else(|err| panic!("stdout is not JSON ({err}): {}", self.stdout))
    }
}

pub struct E2EFixture {
    pub scenario_name: String,
    pub temp_dir: TempDir,
    /// Project root
    pub root: PathBuf,
    pub home: PathBuf,
    pub registry: RegistryFixture,
    start_time: Instant,
    step_count: usize,
}

impl E2EFixture {
    pub fn new(scenario_name: &str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root = temp_dir.path().join("project");
        let home = temp_dir.path().join("home");
        std::fs::create_dir_all(&root).expect("Failed to create project dir");
        std::fs::create_dir_all(&home).expect("Failed to create home dir");
        let registry = RegistryFixture::new().expect("Failed to create registry");

        println!();
        println!("{}", "█".repeat(70));
        println!("█ E2E SCENARIO: {scenario_name}");
        println!("{}", "█".repeat(70));
        println!("[E2E] Root: {}", root.display());
        println!("[E2E] Registry: {}", registry.location());

        Self {
            scenario_name: scenario_name.to_string(),
            temp_dir,
            root,
            home,
            registry,
            start_time: Instant::now(),
            step_count: 0,
        }
    }

    pub fn log_step(&mut self, description: &str) {
        self.step_count += 1;
        println!();
        println!("┌{}", "─".repeat(68));
        println!("│ STEP {}: {}", self.step_count, description);
        println!("│ Time: {:?}", self.start_time.elapsed());
        println!("└{}", "─".repeat(68));
    }

    /// Run the `skill` binary in the project directory.
    pub fn run_skill(&self, args: &[&str]) -> CommandOutput {
        let start = Instant::now();
        println!("[CMD] skill {}", args.join(" "));

        let output = Command::new(env!("CARGO_BIN_EXE_skill"))
            .args(args)
            .current_dir(&self.root)
            .env("HOME", &self.home)
            .env("XDG_CONFIG_HOME", self.home.join("config"))
            .env("SKILL_CACHE_DIR", self.home.join("cache"))
            .env("SKILL_REGISTRY", self.registry.location())
            .env_remove("SKILL_CONFIG")
            .env_remove("SKILL_PROJECT")
            .env_remove("RUST_LOG")
            .output()
            .expect("Failed to execute skill command");

        let result = CommandOutput {
            success: output.status.success(),
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            elapsed: start.elapsed(),
        };
        println!("[CMD] Exit: {} ({:?})", result.exit_code, result.elapsed);
        if !result.stdout.is_empty() {
            println!("[STDOUT] {}", result.stdout);
        }
        if !result.stderr.is_empty() {
            println!("[STDERR] {}", result.stderr);
        }
        result
    }

    /// Run with `--machine` and parse the JSON envelope.
    pub fn run_json(&self, args: &[&str]) -> (CommandOutput, Value) {
        let mut full = vec!["--machine"];
        full.extend_from_slice(args);
        let output = self.run_skill(&full);
        let value = output.json();
        (output, value)
    }

    pub fn assert_success(&self, output: &CommandOutput, context: &str) {
        assert!(
            output.success,
            "[{}] {context} failed (exit {}): {}",
            self.scenario_name, output.exit_code, output.stderr
        );
    }

    pub fn vendor_path(&self, relative: &str) -> PathBuf {
        self.root.join("skills").join(relative)
    }

    pub fn read_vendor(&self, relative: &str) -> String {
        std::fs::read_to_string(self.vendor_path(relative))
            .unwrap_or_else(|err| panic!("read {relative}: {err}"))
    }

    pub fn write_file(&self, path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }
}

impl Drop for E2EFixture {
    fn drop(&mut self) {
        println!(
            "[E2E] {} finished after {} step(s) in {:?}",
            self.scenario_name,
            self.step_count,
            self.start_time.elapsed()
        );
    }
}
