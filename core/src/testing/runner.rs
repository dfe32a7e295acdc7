use std::{
    io,
    path::{Path, PathBuf},
    process::{ExitStatus, Stdio},
    sync::Arc,
    time::Duration,
};

use anyhow::Context as _;
use async_trait::async_trait;
use tokio::{
    io::{AsyncReadExt as _, AsyncWriteExt as _},
    process::Command,
    time::Instant,
};

use super::{result::*, testcase::*, tokenize::tokenize};

/// Executes one case. Implementations never fail: every error is encoded in the result.
#[async_trait]
pub trait SampleRunner: Send + Sync {
    async fn run_sample(&self, case: &SampleCase) -> SampleRunResult;
}

/// Builds a runner for a resolved command and working directory.
pub trait RunnerFactory: Send + Sync {
    fn create(&self, command: &str, working_dir: Option<&Path>) -> Arc<dyn SampleRunner>;
}

#[derive(Debug, Clone)]
pub struct ProcessRunner {
    command: String,
    working_dir: Option<PathBuf>,
    timeout: Duration,
}

impl ProcessRunner {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);
    const KILL_GRACE: Duration = Duration::from_millis(100);
    /// How long output is still collected after the child has exited.
    const DRAIN_GRACE: Duration = Duration::from_millis(200);

    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            working_dir: None,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn timeout(mut self, limit: Duration) -> Self {
        self.timeout = limit;
        self
    }

    pub fn get_command(&self) -> &str {
        &self.command
    }

    pub fn get_working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    pub fn get_timeout(&self) -> Duration {
        self.timeout
    }

    async fn try_run(&self, case: &SampleCase) -> anyhow::Result<SampleRunResult> {
        let argv = tokenize(&self.command)
            .with_context(|| format!("Invalid command '{}'", self.command))?;
        let (program, args) = argv.split_first().context("Empty command")?;

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        log::debug!("Spawning {:?} (cwd={:?})", argv, self.working_dir);
        let mut proc = cmd
            .spawn()
            .with_context(|| format!("Failed to spawn '{}'", self.command))?;
        let mut stdin = proc.stdin.take().context("Failed to open stdin")?;
        let mut stdout = proc.stdout.take().context("Failed to open stdout")?;
        let mut stderr = proc.stderr.take().context("Failed to open stderr")?;

        let mut stdout_buf = Vec::new();
        let mut stderr_buf = Vec::new();
        let start_at = Instant::now();

        // stdin is fed while stdout/stderr are drained, otherwise a child that
        // fills its output pipe before consuming all input never finishes.
        // Only the exit is time-limited: a background grandchild may hold the
        // pipes open after the child itself has exited.
        let (exit, elapsed_ms, drained) = {
            let fut_stdin = async move {
                let res = stdin.write_all(case.input.as_bytes()).await;
                drop(stdin); // EOF
                match res {
                    Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
                    res => res,
                }
            };
            let drain = async {
                tokio::try_join!(
                    fut_stdin,
                    stdout.read_to_end(&mut stdout_buf),
                    stderr.read_to_end(&mut stderr_buf),
                )
            };
            tokio::pin!(drain);

            let mut drained = None;
            let exit = {
                let wait = tokio::time::timeout(self.timeout, proc.wait());
                tokio::pin!(wait);
                loop {
                    tokio::select! {
                        res = &mut drain, if drained.is_none() => drained = Some(res),
                        res = &mut wait => break res,
                    }
                }
            };
            let elapsed_ms = start_at.elapsed().as_millis() as u64;
            if matches!(exit, Ok(Ok(_))) && drained.is_none() {
                drained = tokio::time::timeout(Self::DRAIN_GRACE, &mut drain).await.ok();
            }
            (exit, elapsed_ms, drained)
        };

        match exit {
            Err(_) => {
                proc.start_kill()
                    .unwrap_or_else(|e| log::warn!("Failed to kill TLE process: {:#}", e));
                if tokio::time::timeout(Self::KILL_GRACE, proc.wait())
                    .await
                    .is_err()
                {
                    log::warn!("TLE process did not exit within {:?}", Self::KILL_GRACE);
                }
                Ok(SampleRunResult::timed_out(&case.expected_output, elapsed_ms))
            }

            Ok(Err(e)) => Err(e).context("Failed to wait for subprocess"),

            Ok(Ok(exit_status)) => {
                match drained {
                    Some(res) => {
                        res.context("Failed to communicate with subprocess")?;
                    }
                    None => log::warn!(
                        "Output pipes of '{}' still open {:?} after exit; using what was read",
                        self.command,
                        Self::DRAIN_GRACE
                    ),
                }
                Ok(SampleRunResult::finished(
                    &case.expected_output,
                    String::from_utf8_lossy(&stdout_buf).into(),
                    String::from_utf8_lossy(&stderr_buf).into(),
                    exit_code_of(exit_status),
                    elapsed_ms,
                ))
            }
        }
    }
}

#[async_trait]
impl SampleRunner for ProcessRunner {
    async fn run_sample(&self, case: &SampleCase) -> SampleRunResult {
        self.try_run(case).await.unwrap_or_else(|e| {
            log::warn!("Failed to run '{}': {:#}", self.command, e);
            SampleRunResult::launch_failure(&case.expected_output, format!("{:#}", e))
        })
    }
}

/// A child killed by a signal reports `128 + signo`, as shells do.
fn exit_code_of(status: ExitStatus) -> Option<i32> {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt as _;
        status.code().or_else(|| status.signal().map(|sig| 128 + sig))
    }
    #[cfg(not(unix))]
    {
        status.code()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ProcessRunnerFactory {
    pub timeout: Duration,
}

impl Default for ProcessRunnerFactory {
    fn default() -> Self {
        Self {
            timeout: ProcessRunner::DEFAULT_TIMEOUT,
        }
    }
}

impl RunnerFactory for ProcessRunnerFactory {
    fn create(&self, command: &str, working_dir: Option<&Path>) -> Arc<dyn SampleRunner> {
        let mut runner = ProcessRunner::new(command).timeout(self.timeout);
        if let Some(dir) = working_dir {
            runner = runner.working_dir(dir);
        }
        Arc::new(runner)
    }
}

#[cfg(all(test, unix))]
mod test {
    use super::*;

    struct X {
        input: &'static str,
        expected: &'static str,
        script: &'static str,
        want_passed: bool,
        want_exit_code: Option<i32>,
        want_stdout: &'static str,
        want_stderr: &'static str,
    }

    fn sh(script: &str) -> String {
        // terminate '  ->  enclose ' with "  ->  restart '
        format!("sh -c '{}'", script.replace('\'', r#"'"'"'"#))
    }

    async fn run_test(x: X) {
        let r = ProcessRunner::new(sh(x.script)).timeout(Duration::from_millis(3000));
        let res = dbg!(r.run_sample(&SampleCase::new(x.input, x.expected)).await);
        assert_eq!(res.passed, x.want_passed);
        assert_eq!(res.exit_code, x.want_exit_code);
        assert_eq!(res.actual_output, x.want_stdout);
        assert_eq!(res.standard_error, x.want_stderr);
        assert!(!res.timed_out);
    }

    #[tokio::test]
    async fn should_pass_when_echoing_stdin() {
        let r = ProcessRunner::new("cat");
        let res = r.run_sample(&SampleCase::new("1 2\n3\n", "1 2\n3\n")).await;
        assert!(res.passed);
        assert_eq!(res.exit_code, Some(0));
        assert_eq!(res.actual_output, "1 2\n3\n");
        assert_eq!(res.failure_kind(), None);
    }

    #[tokio::test]
    async fn should_pass_even_if_stdin_is_not_read() {
        run_test(X {
            input: "123\n",
            expected: "hello_123\n",
            script: "echo hello_123",
            want_passed: true,
            want_exit_code: Some(0),
            want_stdout: "hello_123\n",
            want_stderr: "",
        })
        .await;
    }

    #[tokio::test]
    async fn should_pass_with_trailing_whitespace() {
        run_test(X {
            input: "",
            expected: "1 2 3\n",
            script: "printf \"1 2 3  \\r\\n\\r\\n\"",
            want_passed: true,
            want_exit_code: Some(0),
            want_stdout: "1 2 3  \r\n\r\n",
            want_stderr: "",
        })
        .await;
    }

    #[tokio::test]
    async fn should_fail_on_mismatch() {
        run_test(X {
            input: "123\n",
            expected: "hello_123\n",
            script: "echo hello_123 >&2",
            want_passed: false,
            want_exit_code: Some(0),
            want_stdout: "",
            want_stderr: "hello_123\n",
        })
        .await;
    }

    #[tokio::test]
    async fn should_fail_on_nonzero_exit_even_if_stdout_is_correct() {
        run_test(X {
            input: "",
            expected: "ok\n",
            script: "echo ok; echo boom >&2; exit 7",
            want_passed: false,
            want_exit_code: Some(7),
            want_stdout: "ok\n",
            want_stderr: "boom\n",
        })
        .await;
    }

    #[tokio::test]
    async fn killed_by_signal_is_nonzero_exit() {
        let r = ProcessRunner::new(sh("kill -9 $$"));
        let res = r.run_sample(&SampleCase::new("", "")).await;
        assert_eq!(res.exit_code, Some(128 + 9));
        assert_eq!(res.failure_kind(), Some(FailureKind::NonZeroExit));
    }

    #[tokio::test]
    async fn should_time_out_promptly() {
        let r = ProcessRunner::new("sleep 5").timeout(Duration::from_millis(300));
        let started = std::time::Instant::now();
        let res = r.run_sample(&SampleCase::new("", "x")).await;

        assert!(started.elapsed() < Duration::from_secs(3));
        assert!(res.timed_out);
        assert!(!res.passed);
        assert_eq!(res.exit_code, None);
        assert_eq!(res.actual_output, "");
        assert_eq!(res.comparison.normalized_expected, "x");
        assert!(res.elapsed_ms >= 300);
    }

    #[tokio::test]
    async fn exited_child_is_judged_even_if_grandchild_holds_stdout() {
        let r = ProcessRunner::new(sh("sleep 2 & echo 3")).timeout(Duration::from_millis(500));
        let started = std::time::Instant::now();
        let res = r.run_sample(&SampleCase::new("", "3")).await;

        assert!(started.elapsed() < Duration::from_millis(1500));
        assert!(!res.timed_out);
        assert_eq!(res.exit_code, Some(0));
        assert_eq!(res.actual_output, "3\n");
        assert!(res.passed);
    }

    #[tokio::test]
    async fn missing_executable_is_launch_failure() {
        let r = ProcessRunner::new("definitely-not-an-existing-command-42 arg");
        let res = r.run_sample(&SampleCase::new("", "x")).await;
        assert!(!res.passed);
        assert!(!res.timed_out);
        assert_eq!(res.exit_code, None);
        assert!(res
            .standard_error
            .contains("definitely-not-an-existing-command-42"));
        assert_eq!(res.failure_kind(), Some(FailureKind::LaunchFailure));
    }

    #[tokio::test]
    async fn invalid_command_is_launch_failure() {
        let res = ProcessRunner::new("echo \"abc")
            .run_sample(&SampleCase::new("", ""))
            .await;
        assert_eq!(res.failure_kind(), Some(FailureKind::LaunchFailure));
        assert!(res.standard_error.contains("Unterminated quote"));

        let res = ProcessRunner::new("   ")
            .run_sample(&SampleCase::new("", ""))
            .await;
        assert_eq!(res.failure_kind(), Some(FailureKind::LaunchFailure));
        assert!(res.standard_error.contains("blank"));
    }

    #[tokio::test]
    async fn large_payload_does_not_deadlock() {
        let line = "0123456789abcdefghijklmnopqrstuvwxyz\n";
        let input = line.repeat(4 * 1024 * 1024 / line.len());
        let r = ProcessRunner::new("cat").timeout(Duration::from_secs(20));
        let res = r.run_sample(&SampleCase::new(input.clone(), input.clone())).await;
        assert!(!res.timed_out);
        assert!(res.passed);
        assert_eq!(res.actual_output.len(), input.len());
    }

    #[tokio::test]
    async fn runs_in_working_dir() {
        let r = ProcessRunner::new("cat Cargo.toml").working_dir(env!("CARGO_MANIFEST_DIR"));
        let res = r.run_sample(&SampleCase::new("", "")).await;
        assert_eq!(res.exit_code, Some(0));
        assert!(res.actual_output.contains("sjudge-core"));
    }

    #[tokio::test]
    async fn factory_applies_timeout_and_working_dir() {
        let f = ProcessRunnerFactory {
            timeout: Duration::from_millis(200),
        };
        let runner = f.create("sleep 3", Some(Path::new(env!("CARGO_MANIFEST_DIR"))));
        let res = runner.run_sample(&SampleCase::new("", "")).await;
        assert!(res.timed_out);
    }
}
