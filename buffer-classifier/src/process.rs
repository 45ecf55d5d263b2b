// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use anyhow::{Context, Result};
use process_control::{ChildExt, Control};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;

/// Serializable representation of a process output.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Output {
    pub exit_status: ExitStatus,
    pub stderr: String,
    pub stdout: String,
}

impl From<process_control::Output> for Output {
    fn from(output: process_control::Output) -> Self {
        let exit_status = output.status.into();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        Self {
            exit_status,
            stderr,
            stdout,
        }
    }
}

/// Serializable representation of a process exit status.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ExitStatus {
    pub code: Option<i32>,
    pub signal: Option<i32>,
    pub success: bool,
}

impl From<process_control::ExitStatus> for ExitStatus {
    #[cfg(not(unix))]
    fn from(status: process_control::ExitStatus) -> Self {
        Self {
            code: status.code().map(|s| s as i32),
            signal: None,
            success: status.success(),
        }
    }

    #[cfg(unix)]
    fn from(status: process_control::ExitStatus) -> Self {
        Self {
            code: status.code().map(|s| s as i32),
            signal: status.signal(),
            success: status.success(),
        }
    }
}

impl ExitStatus {
    /// Name of the terminating signal, if any.
    pub fn signal_name(&self) -> Option<String> {
        self.signal.map(signal_name)
    }

    /// Describes how the process crashed, if it did.
    ///
    /// Windows has no signals, so abnormal termination is read from the exit
    /// code instead.
    pub fn crash_type(&self) -> Option<String> {
        if let Some(name) = self.signal_name() {
            return Some(name);
        }

        if cfg!(unix) {
            return None;
        }

        self.code.and_then(exception_name)
    }
}

// `abort()` exit code under the MSVC runtime.
const ABORT_EXIT_CODE: i32 = 3;

// NTSTATUS severity bits for STATUS_SEVERITY_ERROR.
const NTSTATUS_ERROR: u32 = 0xC000_0000;

/// Name an exit code that Windows reports for abnormal termination.
pub fn exception_name(code: i32) -> Option<String> {
    let status = code as u32;

    match status {
        0xC000_0005 => Some("STATUS_ACCESS_VIOLATION".to_owned()),
        0xC000_0409 => Some("STATUS_STACK_BUFFER_OVERRUN".to_owned()),
        _ if code == ABORT_EXIT_CODE => Some("abort".to_owned()),
        _ if status & NTSTATUS_ERROR == NTSTATUS_ERROR => {
            Some(format!("exception {status:#010x}"))
        }
        _ => None,
    }
}

#[cfg(unix)]
pub fn signal_name(signal: i32) -> String {
    use nix::sys::signal::Signal;

    match Signal::try_from(signal) {
        Ok(signal) => signal.as_str().to_owned(),
        Err(_) => format!("signal {signal}"),
    }
}

#[cfg(not(unix))]
pub fn signal_name(signal: i32) -> String {
    format!("signal {signal}")
}

/// Run `program` to completion, killing it after `timeout`.
///
/// Returns `None` if the process timed out.
pub fn run_cmd(program: &Path, argv: &[String], timeout: Duration) -> Result<Option<Output>> {
    debug!(
        "running command with timeout: cmd:{:?} argv:{:?} timeout:{:?}",
        program, argv, timeout
    );

    let mut cmd = Command::new(program);
    cmd.env_remove("RUST_LOG")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .args(argv);

    let child = cmd
        .spawn()
        .with_context(|| format!("process failed to start: {}", program.display()))?;

    let output = child
        .controlled_with_output()
        .time_limit(timeout)
        .terminate_for_timeout()
        .wait()
        .with_context(|| format!("failed waiting on process: {}", program.display()))?;

    Ok(output.map(Output::from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[cfg(unix)]
    #[test]
    fn test_signal_names() {
        assert_eq!(signal_name(libc::SIGABRT), "SIGABRT");
        assert_eq!(signal_name(libc::SIGSEGV), "SIGSEGV");
        assert_eq!(signal_name(0), "signal 0");
    }

    #[test]
    fn test_exception_names() {
        assert_eq!(
            exception_name(0xC000_0005_u32 as i32).as_deref(),
            Some("STATUS_ACCESS_VIOLATION")
        );
        assert_eq!(
            exception_name(0xC000_0409_u32 as i32).as_deref(),
            Some("STATUS_STACK_BUFFER_OVERRUN")
        );
        assert_eq!(
            exception_name(0xC000_001D_u32 as i32).as_deref(),
            Some("exception 0xc000001d")
        );
        assert_eq!(exception_name(3).as_deref(), Some("abort"));
        assert_eq!(exception_name(0), None);
        assert_eq!(exception_name(1), None);
    }

    #[test]
    fn test_crash_type_prefers_signal() {
        let status = ExitStatus {
            code: None,
            signal: Some(6),
            success: false,
        };
        assert!(status.crash_type().is_some());

        let status = ExitStatus {
            code: Some(1),
            signal: None,
            success: false,
        };
        assert_eq!(status.crash_type(), None);
    }

    #[test]
    fn test_exit_status_serde() -> Result<()> {
        let status = ExitStatus {
            code: None,
            signal: Some(6),
            success: false,
        };

        let json = serde_json::to_string(&status)?;
        assert_eq!(json, r#"{"code":null,"signal":6,"success":false}"#);
        assert_eq!(serde_json::from_str::<ExitStatus>(&json)?, status);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_run_cmd_captures_output() -> Result<()> {
        let argv = vec!["-c".to_owned(), "echo hello; exit 3".to_owned()];
        let output = run_cmd(Path::new("/bin/sh"), &argv, Duration::from_secs(10))?
            .expect("process should not time out");

        assert_eq!(output.stdout, "hello\n");
        assert_eq!(output.exit_status.code, Some(3));
        assert_eq!(output.exit_status.signal, None);
        assert!(!output.exit_status.success);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_run_cmd_timeout() -> Result<()> {
        let argv = vec!["-c".to_owned(), "exec sleep 30".to_owned()];
        let output = run_cmd(Path::new("/bin/sh"), &argv, Duration::from_millis(200))?;
        assert!(output.is_none());
        Ok(())
    }
}
