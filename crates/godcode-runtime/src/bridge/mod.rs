//! Typed command bridge over the backend program's CLI.
//!
//! One method per catalog operation. Each builds a fresh `Invocation`
//! (`[runtime, <backend_root>/<entry_file>, flags...]`), runs it through the
//! `ProcessRunner` port, and parses stdout into the operation's result type.

pub mod parse;

use std::ffi::OsString;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use godcode_core::{
    BackendCommand, BackendVersion, BridgeError, BridgeEvent, CommandOutput, DEFAULT_ENTRY_FILE,
    EventEmitter, Invocation, InvocationResult, NoopEmitter, Operation, PingResult,
    ProcessRunner, ResolvedLocation, ResumeSessionRequest, RunQaRequest, SessionSummary,
    SpecSummary, SpecTargetRequest, StartSessionRequest, StatusReport,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Deadline and entry file shared by every invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    pub deadline: Duration,
    pub entry_file: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            deadline: Duration::from_secs(30),
            entry_file: DEFAULT_ENTRY_FILE.to_string(),
        }
    }
}

/// Builds and runs backend invocations.
#[derive(Clone)]
pub struct CommandBridge {
    runner: Arc<dyn ProcessRunner>,
    emitter: Arc<dyn EventEmitter>,
    config: BridgeConfig,
}

impl std::fmt::Debug for CommandBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandBridge")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl CommandBridge {
    pub fn new(runner: Arc<dyn ProcessRunner>, config: BridgeConfig) -> Self {
        Self {
            runner,
            emitter: Arc::new(NoopEmitter::new()),
            config,
        }
    }

    /// Publish `invocation:*` events through `emitter`.
    #[must_use]
    pub fn with_emitter(mut self, emitter: Arc<dyn EventEmitter>) -> Self {
        self.emitter = emitter;
        self
    }

    pub const fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Build the invocation for `command` against `location`.
    ///
    /// The argv is a list of separate arguments; nothing is ever passed
    /// through a shell.
    pub fn build(&self, location: &ResolvedLocation, command: &BackendCommand) -> Invocation {
        let entry = location.entry_point(&self.config.entry_file);
        let mut argv = vec![
            location.runtime().to_string_lossy().into_owned(),
            entry.to_string_lossy().into_owned(),
        ];
        argv.extend(command.flags());

        Invocation::new(argv, &location.backend_root, self.config.deadline)
            .with_env(
                "PYTHONPATH",
                python_path(&location.backend_root, std::env::var_os("PYTHONPATH")),
            )
            .with_env("PYTHONUNBUFFERED", "1")
            .with_env("PYTHONIOENCODING", "utf-8")
    }

    async fn execute(
        &self,
        operation: Operation,
        location: &ResolvedLocation,
        command: &BackendCommand,
        cancel: &CancellationToken,
    ) -> Result<InvocationResult, BridgeError> {
        let invocation = self.build(location, command);
        debug!(invocation_id = %invocation.id, %operation, "Executing backend command");
        self.emitter.emit(BridgeEvent::InvocationStarted {
            invocation_id: invocation.id,
            operation,
        });

        let result = self.runner.run(&invocation, cancel).await;

        let (success, duration_ms, error) = match &result {
            Ok(r) => (true, r.duration_ms, None),
            Err(e) => {
                if let Some(partial) = e.partial_output() {
                    debug!(
                        invocation_id = %invocation.id,
                        stdout = %partial.stdout_lossy(),
                        stderr = %partial.stderr_lossy(),
                        "Partial output of failed invocation"
                    );
                }
                warn!(invocation_id = %invocation.id, %operation, kind = e.kind(), error = %e, "Backend command failed");
                (
                    false,
                    e.partial_output().map_or(0, |p| p.duration_ms),
                    Some(e.to_string()),
                )
            }
        };
        self.emitter.emit(BridgeEvent::InvocationFinished {
            invocation_id: invocation.id,
            operation,
            success,
            duration_ms,
            error,
        });

        result
    }

    /// Health probe: the backend answered `--status` with exit 0.
    pub async fn ping(
        &self,
        location: &ResolvedLocation,
        cancel: &CancellationToken,
    ) -> Result<PingResult, BridgeError> {
        let result = self
            .execute(Operation::Ping, location, &BackendCommand::Status, cancel)
            .await?;
        Ok(parse::ping(&result))
    }

    pub async fn status(
        &self,
        location: &ResolvedLocation,
        cancel: &CancellationToken,
    ) -> Result<StatusReport, BridgeError> {
        let result = self
            .execute(Operation::Status, location, &BackendCommand::StatusJson, cancel)
            .await?;
        parse::status(&result)
    }

    pub async fn list_sessions(
        &self,
        location: &ResolvedLocation,
        cancel: &CancellationToken,
    ) -> Result<Vec<SessionSummary>, BridgeError> {
        let result = self
            .execute(Operation::ListSessions, location, &BackendCommand::StatusJson, cancel)
            .await?;
        Ok(parse::sessions(&result))
    }

    pub async fn list_specs(
        &self,
        location: &ResolvedLocation,
        cancel: &CancellationToken,
    ) -> Result<Vec<SpecSummary>, BridgeError> {
        let result = self
            .execute(Operation::ListSpecs, location, &BackendCommand::ListSpecs, cancel)
            .await?;
        Ok(parse::specs(&result))
    }

    pub async fn start_session(
        &self,
        location: &ResolvedLocation,
        request: &StartSessionRequest,
        cancel: &CancellationToken,
    ) -> Result<CommandOutput, BridgeError> {
        let command = BackendCommand::StartSession {
            description: request.description.clone(),
        };
        let result = self
            .execute(Operation::StartSession, location, &command, cancel)
            .await?;
        Ok(parse::command_output(&result))
    }

    pub async fn run_qa(
        &self,
        location: &ResolvedLocation,
        request: &RunQaRequest,
        cancel: &CancellationToken,
    ) -> Result<CommandOutput, BridgeError> {
        let command = BackendCommand::RunQa {
            spec_name: request.spec_name.clone(),
            max_iterations: request.max_iterations,
            auto_fix: request.auto_fix,
        };
        let result = self.execute(Operation::RunQa, location, &command, cancel).await?;
        Ok(parse::command_output(&result))
    }

    pub async fn resume_session(
        &self,
        location: &ResolvedLocation,
        request: &ResumeSessionRequest,
        cancel: &CancellationToken,
    ) -> Result<CommandOutput, BridgeError> {
        let command = BackendCommand::Resume {
            session_id: request.session_id.clone(),
        };
        let result = self
            .execute(Operation::ResumeSession, location, &command, cancel)
            .await?;
        Ok(parse::command_output(&result))
    }

    pub async fn merge_spec(
        &self,
        location: &ResolvedLocation,
        request: &SpecTargetRequest,
        cancel: &CancellationToken,
    ) -> Result<CommandOutput, BridgeError> {
        let command = BackendCommand::Merge {
            spec_name: request.spec_name.clone(),
        };
        let result = self
            .execute(Operation::MergeSpec, location, &command, cancel)
            .await?;
        Ok(parse::command_output(&result))
    }

    pub async fn discard_spec(
        &self,
        location: &ResolvedLocation,
        request: &SpecTargetRequest,
        cancel: &CancellationToken,
    ) -> Result<CommandOutput, BridgeError> {
        let command = BackendCommand::Discard {
            spec_name: request.spec_name.clone(),
        };
        let result = self
            .execute(Operation::DiscardSpec, location, &command, cancel)
            .await?;
        Ok(parse::command_output(&result))
    }

    pub async fn backend_version(
        &self,
        location: &ResolvedLocation,
        cancel: &CancellationToken,
    ) -> Result<BackendVersion, BridgeError> {
        let result = self
            .execute(Operation::BackendVersion, location, &BackendCommand::Version, cancel)
            .await?;
        parse::version(&result)
    }
}

/// `backend_root` prepended to an inherited `PYTHONPATH`.
fn python_path(backend_root: &Path, inherited: Option<OsString>) -> String {
    let mut entries = vec![backend_root.to_path_buf()];
    if let Some(existing) = inherited {
        entries.extend(std::env::split_paths(&existing).filter(|p| !p.as_os_str().is_empty()));
    }
    std::env::join_paths(&entries).map_or_else(
        |_| backend_root.to_string_lossy().into_owned(),
        |joined| joined.to_string_lossy().into_owned(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mockall::mock;
    use std::sync::Mutex;

    mock! {
        pub Runner {}

        #[async_trait]
        impl ProcessRunner for Runner {
            async fn run(
                &self,
                invocation: &Invocation,
                cancel: &CancellationToken,
            ) -> Result<InvocationResult, BridgeError>;
        }
    }

    #[derive(Default)]
    struct RecordingEmitter(Arc<Mutex<Vec<BridgeEvent>>>);

    impl EventEmitter for RecordingEmitter {
        fn emit(&self, event: BridgeEvent) {
            self.0.lock().unwrap().push(event);
        }

        fn clone_box(&self) -> Box<dyn EventEmitter> {
            Box::new(Self(Arc::clone(&self.0)))
        }
    }

    fn location() -> ResolvedLocation {
        ResolvedLocation {
            runtime: "/usr/bin/python3".into(),
            backend_root: "/opt/backend".into(),
        }
    }

    fn ok_stdout(text: &str) -> InvocationResult {
        InvocationResult {
            stdout: text.as_bytes().to_vec(),
            duration_ms: 7,
            ..InvocationResult::default()
        }
    }

    fn bridge(runner: MockRunner) -> CommandBridge {
        CommandBridge::new(Arc::new(runner), BridgeConfig::default())
    }

    #[test]
    fn build_places_runtime_and_entry_first() {
        let bridge = bridge(MockRunner::new());
        let inv = bridge.build(&location(), &BackendCommand::StatusJson);
        assert_eq!(
            inv.argv,
            ["/usr/bin/python3", "/opt/backend/run.py", "--status", "--json"]
        );
        assert_eq!(inv.working_dir, Path::new("/opt/backend"));
        assert_eq!(inv.deadline, Duration::from_secs(30));
        assert_eq!(inv.env["PYTHONUNBUFFERED"], "1");
        assert_eq!(inv.env["PYTHONIOENCODING"], "utf-8");
        assert!(inv.env["PYTHONPATH"].starts_with("/opt/backend"));
    }

    #[test]
    fn python_path_prepends_backend_root() {
        let joined = python_path(
            Path::new("/opt/backend"),
            Some(OsString::from("/site/a")),
        );
        let parts: Vec<_> = std::env::split_paths(&joined).collect();
        assert_eq!(parts, [Path::new("/opt/backend"), Path::new("/site/a")]);

        assert_eq!(python_path(Path::new("/opt/backend"), None), "/opt/backend");
    }

    #[test]
    fn builds_are_deterministic_apart_from_the_id() {
        let bridge = bridge(MockRunner::new());
        let command = BackendCommand::RunQa {
            spec_name: "001".into(),
            max_iterations: Some(3),
            auto_fix: false,
        };
        let a = bridge.build(&location(), &command);
        let b = bridge.build(&location(), &command);
        assert_ne!(a.id, b.id);
        assert_eq!(a.argv, b.argv);
        assert_eq!(a.env, b.env);
    }

    #[tokio::test]
    async fn ping_runs_status_and_reports_connected() {
        let mut runner = MockRunner::new();
        runner
            .expect_run()
            .withf(|inv, _| inv.args()[1..] == ["--status".to_string()])
            .times(1)
            .returning(|_, _| Ok(ok_stdout("All good\n")));

        let result = bridge(runner)
            .ping(&location(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(
            result,
            PingResult {
                connected: true,
                output: "All good".into()
            }
        );
    }

    #[tokio::test]
    async fn run_qa_passes_options_as_flags() {
        let mut runner = MockRunner::new();
        runner
            .expect_run()
            .withf(|inv, _| {
                inv.args()[1..]
                    == ["--qa", "--spec=001-auth", "--max-iterations=2", "--auto-fix"]
            })
            .returning(|_, _| Ok(ok_stdout("QA passed\n")));

        let request = RunQaRequest {
            spec_name: "001-auth".into(),
            max_iterations: Some(2),
            auto_fix: true,
        };
        let output = bridge(runner)
            .run_qa(&location(), &request, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(output.output, "QA passed\n");
        assert!(!output.truncated);
    }

    #[tokio::test]
    async fn execution_errors_pass_through() {
        let mut runner = MockRunner::new();
        runner.expect_run().returning(|_, _| {
            Err(BridgeError::execution(InvocationResult {
                exit_code: 1,
                stderr: b"spec not found\n".to_vec(),
                ..InvocationResult::default()
            }))
        });

        let err = bridge(runner)
            .merge_spec(
                &location(),
                &SpecTargetRequest {
                    spec_name: "404".into(),
                },
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "spec not found");
    }

    #[tokio::test]
    async fn status_parse_failure_is_a_parse_error() {
        let mut runner = MockRunner::new();
        runner
            .expect_run()
            .returning(|_, _| Ok(ok_stdout("Traceback (most recent call last):")));

        let err = bridge(runner)
            .status(&location(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::Parse { .. }));
    }

    #[tokio::test]
    async fn lists_ignore_backend_output() {
        let mut runner = MockRunner::new();
        runner
            .expect_run()
            .times(2)
            .returning(|_, _| Ok(ok_stdout("[{\"name\": \"001\"}]")));
        let bridge = bridge(runner);
        let cancel = CancellationToken::new();

        assert!(bridge.list_specs(&location(), &cancel).await.unwrap().is_empty());
        assert!(bridge.list_sessions(&location(), &cancel).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn lifecycle_events_bracket_each_invocation() {
        let mut runner = MockRunner::new();
        runner
            .expect_run()
            .returning(|_, _| Ok(ok_stdout("claude-god-code 0.1.0\n")));
        let events = Arc::new(Mutex::new(Vec::new()));
        let bridge = bridge(runner).with_emitter(Arc::new(RecordingEmitter(Arc::clone(&events))));

        let version = bridge
            .backend_version(&location(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(version.version, "0.1.0");

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 2);
        let BridgeEvent::InvocationStarted { invocation_id: started, .. } = &events[0] else {
            panic!("expected a start event, got {:?}", events[0]);
        };
        let BridgeEvent::InvocationFinished {
            invocation_id: finished,
            success,
            duration_ms,
            ..
        } = &events[1]
        else {
            panic!("expected a finish event, got {:?}", events[1]);
        };
        assert_eq!(started, finished);
        assert!(*success);
        assert_eq!(*duration_ms, 7);
    }
}
