use serde::Serialize;

use super::{compare::compare, testcase::TestCaseKey};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputComparisonResult {
    pub passed: bool,
    pub normalized_expected: String,
    pub normalized_actual: String,
}

/// Outcome of one execution attempt. Every failure mode is encoded here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SampleRunResult {
    pub passed: bool,
    pub actual_output: String,
    pub expected_output: String,
    pub standard_error: String,
    pub exit_code: Option<i32>,
    pub timed_out: bool,
    pub comparison: OutputComparisonResult,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum FailureKind {
    LaunchFailure,
    Timeout,
    NonZeroExit,
    OutputMismatch,
}

impl SampleRunResult {
    pub fn finished(
        expected_output: &str,
        actual_output: String,
        standard_error: String,
        exit_code: Option<i32>,
        elapsed_ms: u64,
    ) -> Self {
        let comparison = compare(expected_output, &actual_output);
        Self {
            passed: exit_code == Some(0) && comparison.passed,
            actual_output,
            expected_output: expected_output.to_owned(),
            standard_error,
            exit_code,
            timed_out: false,
            comparison,
            elapsed_ms,
        }
    }

    pub fn timed_out(expected_output: &str, elapsed_ms: u64) -> Self {
        Self {
            passed: false,
            actual_output: String::new(),
            expected_output: expected_output.to_owned(),
            standard_error: String::new(),
            exit_code: None,
            timed_out: true,
            comparison: compare(expected_output, ""),
            elapsed_ms,
        }
    }

    /// The process never produced an exit status; `message` becomes its stderr.
    pub fn launch_failure(expected_output: &str, message: impl Into<String>) -> Self {
        Self {
            passed: false,
            actual_output: String::new(),
            expected_output: expected_output.to_owned(),
            standard_error: message.into(),
            exit_code: None,
            timed_out: false,
            comparison: compare(expected_output, ""),
            elapsed_ms: 0,
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        if self.timed_out {
            return Some(FailureKind::Timeout);
        }
        match self.exit_code {
            None => Some(FailureKind::LaunchFailure),
            Some(0) if self.comparison.passed => None,
            Some(0) => Some(FailureKind::OutputMismatch),
            Some(_) => Some(FailureKind::NonZeroExit),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Verdict {
    Passed,
    Failed,
    /// No expected output was recorded; the run is shown but never judged.
    NoOracle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EntryState {
    Pending,
    Running,
    Finished,
    Cancelled,
}

/// Status label shown per testcase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum JudgeCode {
    #[strum(serialize = "PASS")]
    Pass,
    #[strum(serialize = "FAIL")]
    Fail,
    #[strum(serialize = "TLE")]
    Tle,
    #[strum(serialize = "RUN")]
    Run,
    #[strum(serialize = "RUNNING")]
    Running,
    #[strum(serialize = "PENDING")]
    Pending,
    #[strum(serialize = "CANCELLED")]
    Cancelled,
}

/// Display state of one key in the result store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestResultEntry {
    pub key: TestCaseKey,
    pub state: EntryState,
    /// `Some` only once `state == Finished`.
    pub verdict: Option<Verdict>,
    pub timed_out: bool,
    pub result: Option<SampleRunResult>,
    pub elapsed_ms: Option<u64>,
}

impl TestResultEntry {
    pub fn pending(key: TestCaseKey) -> Self {
        Self {
            key,
            state: EntryState::Pending,
            verdict: None,
            timed_out: false,
            result: None,
            elapsed_ms: None,
        }
    }

    pub fn running(key: TestCaseKey) -> Self {
        Self {
            state: EntryState::Running,
            ..Self::pending(key)
        }
    }

    pub fn finished(key: TestCaseKey, result: SampleRunResult, judged: bool) -> Self {
        let verdict = match (judged, result.passed) {
            (false, _) => Verdict::NoOracle,
            (true, true) => Verdict::Passed,
            (true, false) => Verdict::Failed,
        };
        Self {
            key,
            state: EntryState::Finished,
            verdict: Some(verdict),
            timed_out: result.timed_out,
            elapsed_ms: Some(result.elapsed_ms),
            result: Some(result),
        }
    }

    pub fn is_running(&self) -> bool {
        self.state == EntryState::Running
    }

    pub fn judge(&self) -> JudgeCode {
        match (self.state, self.verdict) {
            (EntryState::Pending, _) => JudgeCode::Pending,
            (EntryState::Running, _) => JudgeCode::Running,
            (EntryState::Cancelled, _) => JudgeCode::Cancelled,
            (EntryState::Finished, _) if self.timed_out => JudgeCode::Tle,
            (EntryState::Finished, Some(Verdict::Passed)) => JudgeCode::Pass,
            (EntryState::Finished, Some(Verdict::NoOracle)) => JudgeCode::Run,
            (EntryState::Finished, _) => JudgeCode::Fail,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn passed_requires_zero_exit_and_matching_output() {
        let ok = SampleRunResult::finished("3\n", "3\n".into(), "".into(), Some(0), 5);
        assert!(ok.passed);
        assert_eq!(ok.failure_kind(), None);

        let re = SampleRunResult::finished("3\n", "3\n".into(), "".into(), Some(1), 5);
        assert!(!re.passed);
        assert_eq!(re.failure_kind(), Some(FailureKind::NonZeroExit));

        let wa = SampleRunResult::finished("3\n", "4\n".into(), "".into(), Some(0), 5);
        assert!(!wa.passed);
        assert_eq!(wa.failure_kind(), Some(FailureKind::OutputMismatch));
    }

    #[test]
    fn timeout_and_launch_failure() {
        let tle = SampleRunResult::timed_out("3", 100);
        assert!(!tle.passed && tle.timed_out);
        assert_eq!(tle.actual_output, "");
        assert_eq!(tle.comparison.normalized_expected, "3");
        assert_eq!(tle.failure_kind(), Some(FailureKind::Timeout));

        let lf = SampleRunResult::launch_failure("3", "command not found");
        assert!(!lf.passed && !lf.timed_out);
        assert_eq!(lf.standard_error, "command not found");
        assert_eq!(lf.failure_kind(), Some(FailureKind::LaunchFailure));
    }

    #[test]
    fn entry_judge_code() {
        let key = TestCaseKey::Sample(0);
        let pass = SampleRunResult::finished("1", "1".into(), "".into(), Some(0), 1);
        let fail = SampleRunResult::finished("1", "2".into(), "".into(), Some(0), 1);

        assert_eq!(TestResultEntry::pending(key.clone()).judge(), JudgeCode::Pending);
        assert_eq!(TestResultEntry::running(key.clone()).judge(), JudgeCode::Running);
        assert_eq!(
            TestResultEntry::finished(key.clone(), pass.clone(), true).judge(),
            JudgeCode::Pass
        );
        assert_eq!(
            TestResultEntry::finished(key.clone(), fail.clone(), true).judge(),
            JudgeCode::Fail
        );
        assert_eq!(
            TestResultEntry::finished(key.clone(), fail, false).judge(),
            JudgeCode::Run
        );
        assert_eq!(
            TestResultEntry::finished(key, SampleRunResult::timed_out("1", 10), true).judge(),
            JudgeCode::Tle
        );
        assert_eq!(JudgeCode::Tle.to_string(), "TLE");
    }
}
