use std::{
    collections::HashMap,
    io,
    sync::{Arc, Mutex, PoisonError, Weak},
    time::Duration,
};

use colored::Colorize as _;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use sjudge_core::testing::{JudgeCode, SampleRunResult, TestCaseKey};
use sjudge_core::{ResultListener, ResultStore};

use crate::style;

/// Renders store events on the terminal: a spinner per running testcase,
/// a status line per result and details for failures.
pub struct ConsoleReporter {
    store: Weak<ResultStore>,
    container: MultiProgress,
    bars: Mutex<HashMap<TestCaseKey, ProgressBar>>,
    show_detail: bool,
}

impl ConsoleReporter {
    pub fn new(store: &Arc<ResultStore>, show_detail: bool) -> Self {
        Self {
            store: Arc::downgrade(store),
            container: MultiProgress::new(),
            bars: Mutex::new(HashMap::new()),
            show_detail,
        }
    }

    fn take_bar(&self, key: &TestCaseKey) -> Option<ProgressBar> {
        self.bars
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
    }

    fn finish_line(&self, key: &TestCaseKey, msg: String) -> io::Result<()> {
        match self.take_bar(key) {
            Some(bar) => bar.finish_with_message(msg),
            None => self.container.println(msg)?,
        }
        Ok(())
    }

    fn judge_of(&self, key: &TestCaseKey, result: &SampleRunResult) -> JudgeCode {
        self.store
            .upgrade()
            .and_then(|store| store.entry(key))
            .map(|entry| entry.judge())
            .unwrap_or(if result.timed_out {
                JudgeCode::Tle
            } else if result.passed {
                JudgeCode::Pass
            } else {
                JudgeCode::Fail
            })
    }
}

impl ResultListener for ConsoleReporter {
    fn on_running(&self, key: &TestCaseKey) -> anyhow::Result<()> {
        let style = ProgressStyle::default_spinner().template("{spinner} {msg}")?;
        let bar = self
            .container
            .add(ProgressBar::new_spinner())
            .with_style(style)
            .with_message(format!("{} ...", key.label()));
        bar.enable_steady_tick(Duration::from_millis(80));
        self.bars
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.clone(), bar);
        Ok(())
    }

    fn on_result(&self, key: &TestCaseKey, result: &SampleRunResult) -> anyhow::Result<()> {
        let judge = self.judge_of(key, result);
        self.finish_line(
            key,
            format!(
                "{} ... {}{} [{}ms]",
                key.label().cyan(),
                style::judge_icon(judge),
                " ".repeat(4usize.saturating_sub(judge.to_string().len())),
                result.elapsed_ms,
            ),
        )?;

        if self.show_detail && matches!(judge, JudgeCode::Fail | JudgeCode::Tle | JudgeCode::Run) {
            self.container
                .suspend(|| style::print_result_detail(&key.label(), judge, result));
        }
        Ok(())
    }

    fn on_cancelled(&self, key: &TestCaseKey) -> anyhow::Result<()> {
        self.finish_line(
            key,
            format!(
                "{} ... {}",
                key.label().cyan(),
                style::judge_icon(JudgeCode::Cancelled)
            ),
        )?;
        Ok(())
    }

    fn on_running_cleared(&self, key: &TestCaseKey) -> anyhow::Result<()> {
        if let Some(bar) = self.take_bar(key) {
            bar.finish_and_clear();
        }
        Ok(())
    }

    fn on_run_all_complete(&self, passed: usize, judged: usize) -> anyhow::Result<()> {
        self.container.println(style::summary_line(passed, judged))?;
        Ok(())
    }
}
