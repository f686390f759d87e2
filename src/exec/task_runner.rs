// src/exec/task_runner.rs

//! Individual task process runner.

use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

use crate::exec::{DispatchedTask, TaskOutcome};

/// Run the task's command through the platform shell and wait for it.
///
/// stdout lines are logged at `info`, stderr lines at `debug`. Both streams
/// are drained to completion so the child never blocks on a full pipe.
pub async fn run_shell_command(task: &DispatchedTask) -> Result<TaskOutcome> {
    info!(
        task = %task.id,
        batch = task.batch,
        cmd = %task.cmd,
        "starting task process"
    );

    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(&task.cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(&task.cmd);
        c
    };

    cmd.stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning process for task '{}'", task.id))?;

    let stdout_pump = child.stdout.take().map(|stdout| {
        let id = task.id.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                info!(task = %id, "stdout: {}", line);
            }
        })
    });

    let stderr_pump = child.stderr.take().map(|stderr| {
        let id = task.id.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(task = %id, "stderr: {}", line);
            }
        })
    });

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for process of task '{}'", task.id))?;

    for pump in [stdout_pump, stderr_pump].into_iter().flatten() {
        let _ = pump.await;
    }

    let code = status.code().unwrap_or(-1);
    info!(
        task = %task.id,
        batch = task.batch,
        exit_code = code,
        success = status.success(),
        "task process exited"
    );

    Ok(if status.success() {
        TaskOutcome::Success
    } else {
        TaskOutcome::Failed(code)
    })
}
