//! Shared integration-test harness for running the `gliderqc` binary.

#![allow(dead_code)]

use std::path::PathBuf;
use std::process::{Command, Output};

/// Environment variables read by the binary that must not leak in from the
/// developer's shell.
const ISOLATED_VARS: &[&str] = &[
    "GLIDERQC_COLOR",
    "GLIDERQC_DEPLOYMENT",
    "GLIDERQC_LOG_FORMAT",
    "GLIDERQC_LOG_LEVEL",
    "GLIDERQC_MAX_ATTRS",
    "GLIDERQC_MAX_DOCUMENT_SIZE",
    "GLIDERQC_MAX_ENTRIES",
    "GLIDERQC_VARIABLES",
    "GLIDER_DATA_HOME",
    "GLIDER_DATA_HOME_TEST",
];

/// Helpers for invoking the `gliderqc` binary.
pub struct GliderQcProcess;

impl GliderQcProcess {
    /// Runs the binary with `args` and an isolated environment.
    #[allow(clippy::missing_panics_doc)]
    pub fn run(args: &[&str]) -> Output {
        Self::run_with_env(args, &[])
    }

    /// Runs the binary with `args` and extra environment variables.
    #[allow(clippy::missing_panics_doc)]
    pub fn run_with_env(args: &[&str], env: &[(&str, &str)]) -> Output {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_gliderqc"));
        for var in ISOLATED_VARS {
            cmd.env_remove(var);
        }
        cmd.env("NO_COLOR", "1");
        for (key, value) in env {
            cmd.env(key, value);
        }
        cmd.args(args).output().expect("failed to run gliderqc")
    }

    /// Returns the path to a test fixture.
    #[must_use]
    pub fn fixture_path(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures")
            .join(name)
    }

    /// Returns a fixture path as a `String` for use as an argument.
    #[must_use]
    pub fn fixture(name: &str) -> String {
        Self::fixture_path(name).display().to_string()
    }
}

/// Stdout of a finished process.
pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Stderr of a finished process.
pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
