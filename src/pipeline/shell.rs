// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipewatch contributors

//! Shell step executor
//!
//! Runs one already-interpolated command through the platform shell, with
//! the child's stdout/stderr streaming straight through to ours. A non-zero
//! exit or a spawn failure comes back as an error value; terminating the
//! process is the CLI boundary's decision, not this layer's.

use std::process::Stdio;

use tokio::process::Command;

use crate::errors::PipewatchError;

/// Run `command` through the platform shell and wait for it to exit.
pub async fn run_command(step_name: &str, command: &str) -> Result<(), PipewatchError> {
    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(command);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(command);
        c
    };

    cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());

    let status = cmd
        .status()
        .await
        .map_err(|e| PipewatchError::StepSpawnFailed {
            step: step_name.to_string(),
            command: command.to_string(),
            error: e.to_string(),
        })?;

    if status.success() {
        Ok(())
    } else {
        Err(PipewatchError::StepFailed {
            step: step_name.to_string(),
            command: command.to_string(),
            code: status.code().unwrap_or(-1),
        })
    }
}
