// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::{fault::FaultMode, process::run_cmd};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    path::{Path, PathBuf},
    time::Duration,
};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Runs inputs through the classifier in a child process, so that the
/// intentional fault can be observed instead of taking down the caller.
///
/// `exe_path` must be the `buffer-classifier` binary.
pub struct Tester<'a> {
    exe_path: &'a Path,
    timeout: Duration,
    fault: FaultMode,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    Returned { flag: i32 },
    Crashed { signal: String },
    TimedOut,
    Failed { code: Option<i32> },
}

impl Outcome {
    pub fn is_crash(&self) -> bool {
        matches!(self, Outcome::Crashed { .. })
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Outcome::Returned { flag } => write!(f, "returned {flag}"),
            Outcome::Crashed { signal } => write!(f, "crashed ({signal})"),
            Outcome::TimedOut => write!(f, "timed out"),
            Outcome::Failed { code: Some(code) } => write!(f, "failed (exit code {code})"),
            Outcome::Failed { code: None } => write!(f, "failed"),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TestResult {
    pub input: PathBuf,
    pub outcome: Outcome,
    pub stderr: String,
}

impl<'a> Tester<'a> {
    pub fn new(exe_path: &'a Path) -> Self {
        Self {
            exe_path,
            timeout: DEFAULT_TIMEOUT,
            fault: FaultMode::default(),
        }
    }

    pub fn timeout(&mut self, value: u64) -> &mut Self {
        self.timeout = Duration::from_secs(value);
        self
    }

    pub fn fault(&mut self, value: FaultMode) -> &mut Self {
        self.fault = value;
        self
    }

    pub fn test_input(&self, input_file: impl AsRef<Path>) -> Result<TestResult> {
        let input_file = input_file.as_ref();
        let input = std::fs::canonicalize(input_file)
            .with_context(|| format!("unable to resolve input: {}", input_file.display()))?;

        let argv = vec![
            "classify".to_owned(),
            "--fault".to_owned(),
            self.fault.to_string(),
            input.display().to_string(),
        ];

        let output = run_cmd(self.exe_path, &argv, self.timeout)?;

        let (outcome, stderr) = match output {
            None => {
                warn!("input timed out: {}", input.display());
                (Outcome::TimedOut, String::new())
            }
            Some(output) => {
                let status = output.exit_status;
                let outcome = if let Some(signal) = status.crash_type() {
                    Outcome::Crashed { signal }
                } else if status.success {
                    match output.stdout.trim().parse() {
                        Ok(flag) => Outcome::Returned { flag },
                        Err(_) => Outcome::Failed { code: status.code },
                    }
                } else {
                    Outcome::Failed { code: status.code }
                };
                (outcome, output.stderr)
            }
        };

        debug!("tested {}: {}", input.display(), outcome);

        Ok(TestResult {
            input,
            outcome,
            stderr,
        })
    }
}
