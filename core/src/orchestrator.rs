use std::{
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use tokio::{sync::Mutex, task::JoinHandle};

use crate::store::ResultStore;
use crate::testing::{RunnerFactory, SampleRunResult, TestCaseKey, Testcase};

/// Cooperative stop request shared between the orchestrator and its callers.
/// Checked only between cases.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RunError {
    #[error("Another run is already in progress")]
    AlreadyRunning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunAllOutcome {
    Completed {
        passed: usize,
        judged: usize,
    },
    Cancelled {
        passed: usize,
        judged: usize,
        /// Keys that were never started.
        cancelled: Vec<TestCaseKey>,
    },
}

impl RunAllOutcome {
    pub fn counts(&self) -> (usize, usize) {
        match self {
            RunAllOutcome::Completed { passed, judged }
            | RunAllOutcome::Cancelled { passed, judged, .. } => (*passed, *judged),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, RunAllOutcome::Cancelled { .. })
    }
}

/// Clears the running mark of a key when the dispatch ends, however it ends.
struct RunningGuard<'a> {
    store: &'a ResultStore,
    key: &'a TestCaseKey,
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.store.clear_running(self.key);
    }
}

pub struct RunOrchestrator {
    store: Arc<ResultStore>,
    factory: Arc<dyn RunnerFactory>,
    working_dir: Option<PathBuf>,
    cancel: CancelHandle,
    in_progress: Mutex<()>,
}

impl RunOrchestrator {
    pub fn new(store: Arc<ResultStore>, factory: Arc<dyn RunnerFactory>) -> Self {
        Self {
            store,
            factory,
            working_dir: None,
            cancel: CancelHandle::default(),
            in_progress: Mutex::new(()),
        }
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_cancel_handle(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn store(&self) -> &Arc<ResultStore> {
        &self.store
    }

    pub fn get_working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Prevents the next case from starting. A case already dispatched runs to
    /// completion or to its own timeout.
    pub fn request_cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_running(&self) -> bool {
        self.in_progress.try_lock().is_err()
    }

    pub async fn run_single(
        &self,
        case: &Testcase,
        command: &str,
    ) -> Result<SampleRunResult, RunError> {
        let _in_progress = self
            .in_progress
            .try_lock()
            .map_err(|_| RunError::AlreadyRunning)?;

        self.store
            .set_case_info(case.key.clone(), &case.input, case.expected_output.clone());
        Ok(self.dispatch(case, command).await)
    }

    /// Runs every case in order: samples by ascending index, then custom
    /// cases, then general cases, each in the order given.
    pub async fn run_all(
        &self,
        cases: Vec<Testcase>,
        command: &str,
    ) -> Result<RunAllOutcome, RunError> {
        let _in_progress = self
            .in_progress
            .try_lock()
            .map_err(|_| RunError::AlreadyRunning)?;

        let cases = order_cases(cases);
        self.store.clear_results();
        self.cancel.reset();
        for case in &cases {
            self.store
                .set_case_info(case.key.clone(), &case.input, case.expected_output.clone());
        }
        self.store.populate(cases.iter().map(|c| c.key.clone()));

        log::info!("Running {} testcases with '{}'", cases.len(), command);

        let mut passed = 0;
        let mut judged = 0;
        for (i, case) in cases.iter().enumerate() {
            if self.cancel.is_cancelled() {
                return Ok(self.cancelled(&cases[i..], passed, judged));
            }
            let result = self.dispatch(case, command).await;
            if case.is_judged() {
                judged += 1;
                if result.passed {
                    passed += 1;
                }
            }
        }

        if self.cancel.is_cancelled() {
            return Ok(self.cancelled(&[], passed, judged));
        }

        log::info!("Finished: {}/{} passed", passed, judged);
        self.store.notify_run_all_complete(passed, judged);
        Ok(RunAllOutcome::Completed { passed, judged })
    }

    pub fn spawn_run_all(
        self: &Arc<Self>,
        cases: Vec<Testcase>,
        command: impl Into<String>,
    ) -> JoinHandle<Result<RunAllOutcome, RunError>> {
        let this = Arc::clone(self);
        let command = command.into();
        tokio::spawn(async move { this.run_all(cases, &command).await })
    }

    pub fn spawn_run_single(
        self: &Arc<Self>,
        case: Testcase,
        command: impl Into<String>,
    ) -> JoinHandle<Result<SampleRunResult, RunError>> {
        let this = Arc::clone(self);
        let command = command.into();
        tokio::spawn(async move { this.run_single(&case, &command).await })
    }

    fn cancelled(&self, rest: &[Testcase], passed: usize, judged: usize) -> RunAllOutcome {
        let cancelled: Vec<_> = rest.iter().map(|c| c.key.clone()).collect();
        log::info!(
            "Cancelled: {}/{} passed, {} not started",
            passed,
            judged,
            cancelled.len()
        );
        self.store.mark_cancelled(&cancelled);
        RunAllOutcome::Cancelled {
            passed,
            judged,
            cancelled,
        }
    }

    /// Executes one case and records exactly one result for it.
    async fn dispatch(&self, case: &Testcase, command: &str) -> SampleRunResult {
        let key = &case.key;
        self.store.set_running(key);
        let _running = RunningGuard {
            store: &self.store,
            key,
        };

        let runner = self.factory.create(command, self.working_dir.as_deref());
        let sample = case.to_sample_case();
        let expected_output = sample.expected_output.clone();

        // A panicking runner must still leave a result behind.
        let result = match tokio::spawn(async move { runner.run_sample(&sample).await }).await {
            Ok(result) => result,
            Err(e) => {
                log::error!("Runner for {} crashed: {}", key, e);
                SampleRunResult::launch_failure(&expected_output, format!("Runner crashed: {}", e))
            }
        };

        self.store.add_result(key.clone(), result.clone());
        result
    }
}

fn order_cases(mut cases: Vec<Testcase>) -> Vec<Testcase> {
    cases.sort_by_key(|c| match c.key {
        TestCaseKey::Sample(i) => (c.key.category(), i),
        _ => (c.key.category(), 0),
    });
    cases
}
