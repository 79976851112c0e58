//! Tokio-based implementation of the `ProcessRunner` port.

use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use godcode_core::{BridgeError, Invocation, InvocationResult, InvocationState, ProcessRunner};
use tokio::process::{Child, Command};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::capture::{CaptureBuffer, spawn_capture};
use super::shutdown::{kill_group, terminate_child};

/// Tunables for [`TokioProcessRunner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Maximum number of children alive at once.
    pub max_concurrent: usize,
    /// Per-stream capture cap in bytes.
    pub capture_limit: usize,
    /// Time between SIGTERM and SIGKILL on deadline or cancellation.
    pub kill_grace: Duration,
    /// How long to wait for output readers after the child is gone.
    pub drain_timeout: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 4,
            capture_limit: 4 * 1024 * 1024,
            kill_grace: Duration::from_millis(500),
            drain_timeout: Duration::from_secs(1),
        }
    }
}

/// Runs invocations as real child processes.
///
/// Cloning shares the admission semaphore.
#[derive(Debug, Clone)]
pub struct TokioProcessRunner {
    config: RunnerConfig,
    permits: Arc<Semaphore>,
}

impl TokioProcessRunner {
    pub fn new(config: RunnerConfig) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_concurrent.max(1)));
        Self { config, permits }
    }

    pub const fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Free admission slots right now.
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    fn command(invocation: &Invocation) -> Command {
        let mut cmd = Command::new(invocation.program());
        cmd.args(invocation.args())
            .current_dir(&invocation.working_dir)
            .envs(&invocation.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);
        cmd
    }

    async fn collect(
        &self,
        readers: [JoinHandle<()>; 2],
        stdout: &CaptureBuffer,
        stderr: &CaptureBuffer,
        status: Option<ExitStatus>,
        started: Instant,
    ) -> InvocationResult {
        let aborts = readers.each_ref().map(JoinHandle::abort_handle);
        let [out, err] = readers;
        let drained = tokio::time::timeout(self.config.drain_timeout, async {
            let _ = tokio::join!(out, err);
        })
        .await;
        if drained.is_err() {
            // A descendant outside the group still holds a pipe open.
            debug!("Output readers did not finish within the drain timeout");
            for abort in aborts {
                abort.abort();
            }
        }
        let (stdout, out_truncated) = stdout.snapshot();
        let (stderr, err_truncated) = stderr.snapshot();
        InvocationResult {
            exit_code: status.map_or(-1, exit_code),
            stdout,
            stderr,
            duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            truncated: out_truncated || err_truncated,
        }
    }

    async fn stop(&self, child: &mut Child, invocation: &Invocation) -> Option<ExitStatus> {
        match terminate_child(child, self.config.kill_grace).await {
            Ok(status) => Some(status),
            Err(e) => {
                warn!(invocation_id = %invocation.id, error = %e, "Failed to terminate child");
                None
            }
        }
    }
}

impl Default for TokioProcessRunner {
    fn default() -> Self {
        Self::new(RunnerConfig::default())
    }
}

/// Exit code of a finished child. Signal deaths are encoded as `-signal`.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }
    -1
}

fn advance(invocation: &Invocation, state: &mut InvocationState, next: InvocationState) {
    debug_assert!(state.can_transition_to(next), "{state} -> {next}");
    debug!(invocation_id = %invocation.id, from = %state, to = %next, "Invocation state");
    *state = next;
}

enum Outcome {
    Exited(std::io::Result<ExitStatus>),
    DeadlineElapsed,
    Cancelled,
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(
        &self,
        invocation: &Invocation,
        cancel: &CancellationToken,
    ) -> Result<InvocationResult, BridgeError> {
        let mut state = InvocationState::Idle;

        // Waiting for admission is cancellable; a closed semaphore never happens
        // while the runner is alive.
        let _permit = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                advance(invocation, &mut state, InvocationState::Cancelled);
                return Err(BridgeError::Cancelled);
            }
            permit = Arc::clone(&self.permits).acquire_owned() => {
                permit.map_err(|_| BridgeError::Cancelled)?
            }
        };

        advance(invocation, &mut state, InvocationState::Spawning);
        debug!(invocation_id = %invocation.id, argv = ?invocation.argv, cwd = %invocation.working_dir.display(), "Spawning");

        if invocation.program().is_empty() {
            advance(invocation, &mut state, InvocationState::Failed);
            return Err(BridgeError::Spawn {
                program: String::new(),
                reason: "empty argv".to_string(),
            });
        }

        let started = Instant::now();
        let mut child = match Self::command(invocation).spawn() {
            Ok(child) => child,
            Err(e) => {
                advance(invocation, &mut state, InvocationState::Failed);
                return Err(BridgeError::Spawn {
                    program: invocation.program().to_string(),
                    reason: e.to_string(),
                });
            }
        };
        advance(invocation, &mut state, InvocationState::Running);
        // Group id for cleanup once the leader has been reaped.
        let group = child.id();

        let stdout_buf = CaptureBuffer::new(self.config.capture_limit);
        let stderr_buf = CaptureBuffer::new(self.config.capture_limit);
        let readers = [
            child.stdout.take().map_or_else(
                || tokio::spawn(async {}),
                |out| spawn_capture(out, stdout_buf.clone(), "stdout"),
            ),
            child.stderr.take().map_or_else(
                || tokio::spawn(async {}),
                |err| spawn_capture(err, stderr_buf.clone(), "stderr"),
            ),
        ];

        let outcome = tokio::select! {
            status = child.wait() => Outcome::Exited(status),
            () = tokio::time::sleep(invocation.deadline) => Outcome::DeadlineElapsed,
            () = cancel.cancelled() => Outcome::Cancelled,
        };

        match outcome {
            Outcome::Exited(Ok(status)) => {
                // Backgrounded descendants would keep the pipes open.
                kill_group(group);
                let result = self
                    .collect(readers, &stdout_buf, &stderr_buf, Some(status), started)
                    .await;
                if status.success() {
                    advance(invocation, &mut state, InvocationState::Completed);
                    Ok(result)
                } else {
                    advance(invocation, &mut state, InvocationState::Failed);
                    Err(BridgeError::execution(result))
                }
            }
            Outcome::Exited(Err(e)) => {
                kill_group(group);
                advance(invocation, &mut state, InvocationState::Failed);
                Err(BridgeError::Spawn {
                    program: invocation.program().to_string(),
                    reason: format!("failed to wait for child: {e}"),
                })
            }
            Outcome::DeadlineElapsed => {
                let status = self.stop(&mut child, invocation).await;
                let partial = self
                    .collect(readers, &stdout_buf, &stderr_buf, status, started)
                    .await;
                advance(invocation, &mut state, InvocationState::TimedOut);
                Err(BridgeError::Timeout {
                    deadline: invocation.deadline,
                    partial: Box::new(partial),
                })
            }
            Outcome::Cancelled => {
                let status = self.stop(&mut child, invocation).await;
                let partial = self
                    .collect(readers, &stdout_buf, &stderr_buf, status, started)
                    .await;
                debug!(
                    invocation_id = %invocation.id,
                    captured = partial.stdout.len() + partial.stderr.len(),
                    "Discarding output of cancelled invocation"
                );
                advance(invocation, &mut state, InvocationState::Cancelled);
                Err(BridgeError::Cancelled)
            }
        }
    }
}
