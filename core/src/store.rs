use std::{
    collections::HashMap,
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
};

use crate::testing::{
    CaseCategory, EntryState, SampleRunResult, TestCaseKey, TestResultEntry,
};

/// Observer of the result store. Every method defaults to a no-op.
///
/// Callbacks are invoked synchronously, in registration order, after the store
/// has released its lock, so a listener may query the store.
#[allow(unused_variables)]
pub trait ResultListener: Send + Sync {
    fn on_result(&self, key: &TestCaseKey, result: &SampleRunResult) -> anyhow::Result<()> {
        Ok(())
    }

    fn on_running(&self, key: &TestCaseKey) -> anyhow::Result<()> {
        Ok(())
    }

    fn on_cancelled(&self, key: &TestCaseKey) -> anyhow::Result<()> {
        Ok(())
    }

    /// A running entry went back to pending without a result,
    /// e.g. when its run was aborted.
    fn on_running_cleared(&self, key: &TestCaseKey) -> anyhow::Result<()> {
        Ok(())
    }

    fn on_all_results_cleared(&self) -> anyhow::Result<()> {
        Ok(())
    }

    fn on_run_all_complete(&self, passed: usize, judged: usize) -> anyhow::Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Reference snapshot of a case, kept for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseInfo {
    pub input: String,
    /// `None` means no oracle.
    pub expected_output: Option<String>,
}

#[derive(Debug, Default)]
struct State {
    case_infos: HashMap<TestCaseKey, CaseInfo>,
    // registration order of `case_infos` keys
    case_order: Vec<TestCaseKey>,
    entries: HashMap<TestCaseKey, TestResultEntry>,
}

impl State {
    fn is_judged(&self, key: &TestCaseKey) -> bool {
        self.case_infos
            .get(key)
            .map_or(true, |info| info.expected_output.is_some())
    }

    fn order_of(&self, key: &TestCaseKey) -> usize {
        self.case_order
            .iter()
            .position(|k| k == key)
            .unwrap_or(usize::MAX)
    }
}

#[derive(Default)]
pub struct ResultStore {
    state: Mutex<State>,
    listeners: Mutex<Vec<(ListenerId, Arc<dyn ResultListener>)>>,
    next_listener_id: AtomicU64,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_listener(&self, listener: Arc<dyn ResultListener>) -> ListenerId {
        let id = ListenerId(self.next_listener_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, listener));
        id
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let len = listeners.len();
        listeners.retain(|(x, _)| *x != id);
        listeners.len() != len
    }

    /// A failing (or panicking) listener is logged and skipped.
    fn notify<F>(&self, event: &str, f: F)
    where
        F: Fn(&dyn ResultListener) -> anyhow::Result<()>,
    {
        let listeners = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        for (id, listener) in listeners {
            match panic::catch_unwind(AssertUnwindSafe(|| f(listener.as_ref()))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => log::warn!("Listener {:?} failed on {}: {:#}", id, event, e),
                Err(_) => log::warn!("Listener {:?} panicked on {}", id, event),
            }
        }
    }

    pub fn set_case_info(
        &self,
        key: TestCaseKey,
        input: impl Into<String>,
        expected_output: Option<String>,
    ) {
        let mut st = self.state();
        let info = CaseInfo {
            input: input.into(),
            expected_output,
        };
        if st.case_infos.insert(key.clone(), info).is_none() {
            st.case_order.push(key);
        }
    }

    pub fn case_info(&self, key: &TestCaseKey) -> Option<CaseInfo> {
        self.state().case_infos.get(key).cloned()
    }

    pub fn get_case_input(&self, key: &TestCaseKey) -> Option<String> {
        self.state().case_infos.get(key).map(|c| c.input.clone())
    }

    pub fn get_case_expected_output(&self, key: &TestCaseKey) -> Option<String> {
        self.state()
            .case_infos
            .get(key)
            .and_then(|c| c.expected_output.clone())
    }

    /// Creates pending entries for keys that have none yet.
    pub fn populate(&self, keys: impl IntoIterator<Item = TestCaseKey>) {
        let mut st = self.state();
        for key in keys {
            st.entries
                .entry(key.clone())
                .or_insert_with(|| TestResultEntry::pending(key));
        }
    }

    /// Marks `key` as running, dropping the previous result.
    pub fn set_running(&self, key: &TestCaseKey) {
        self.state()
            .entries
            .insert(key.clone(), TestResultEntry::running(key.clone()));
        self.notify("running", |l| l.on_running(key));
    }

    /// Reverts a still-running entry to pending and notifies listeners.
    /// Returns false (and notifies nobody) for any other state.
    pub fn clear_running(&self, key: &TestCaseKey) -> bool {
        let cleared = {
            let mut st = self.state();
            match st.entries.get_mut(key) {
                Some(entry) if entry.is_running() => {
                    entry.state = EntryState::Pending;
                    true
                }
                _ => false,
            }
        };
        if cleared {
            self.notify("running-cleared", |l| l.on_running_cleared(key));
        }
        cleared
    }

    /// Stores `result`, replacing any prior result of `key`, then notifies listeners.
    pub fn add_result(&self, key: TestCaseKey, result: SampleRunResult) {
        {
            let mut st = self.state();
            let judged = st.is_judged(&key);
            let entry = TestResultEntry::finished(key.clone(), result.clone(), judged);
            st.entries.insert(key.clone(), entry);
        }
        self.notify("result", |l| l.on_result(&key, &result));
    }

    /// Marks every given key that has no result yet as cancelled.
    pub fn mark_cancelled(&self, keys: &[TestCaseKey]) {
        let cancelled: Vec<_> = {
            let mut st = self.state();
            keys.iter()
                .filter(|key| {
                    let entry = st
                        .entries
                        .entry((*key).clone())
                        .or_insert_with(|| TestResultEntry::pending((*key).clone()));
                    if entry.state == EntryState::Finished {
                        return false;
                    }
                    entry.state = EntryState::Cancelled;
                    true
                })
                .cloned()
                .collect()
        };
        for key in &cancelled {
            self.notify("cancelled", |l| l.on_cancelled(key));
        }
    }

    pub fn get_result(&self, key: &TestCaseKey) -> Option<SampleRunResult> {
        self.state().entries.get(key).and_then(|e| e.result.clone())
    }

    pub fn all_results(&self) -> HashMap<TestCaseKey, SampleRunResult> {
        self.state()
            .entries
            .iter()
            .filter_map(|(k, e)| e.result.clone().map(|r| (k.clone(), r)))
            .collect()
    }

    pub fn entry(&self, key: &TestCaseKey) -> Option<TestResultEntry> {
        self.state().entries.get(key).cloned()
    }

    /// Samples by index first, then custom and general cases in registration order.
    pub fn entries(&self) -> Vec<TestResultEntry> {
        let st = self.state();
        let mut entries: Vec<_> = st.entries.values().cloned().collect();
        entries.sort_by_key(|e| match &e.key {
            TestCaseKey::Sample(i) => (e.key.category(), *i),
            key => (key.category(), st.order_of(key)),
        });
        entries
    }

    /// Removes every result and entry. Case snapshots are kept.
    pub fn clear_results(&self) {
        self.state().entries.clear();
        self.notify("all-results-cleared", |l| l.on_all_results_cleared());
    }

    pub fn notify_run_all_complete(&self, passed: usize, judged: usize) {
        self.notify("run-all-complete", |l| l.on_run_all_complete(passed, judged));
    }

    fn keys_of(&self, category: CaseCategory) -> Vec<TestCaseKey> {
        self.state()
            .case_order
            .iter()
            .filter(|k| k.category() == category)
            .cloned()
            .collect()
    }

    pub fn custom_keys(&self) -> Vec<TestCaseKey> {
        self.keys_of(CaseCategory::Custom)
    }

    pub fn general_keys(&self) -> Vec<TestCaseKey> {
        self.keys_of(CaseCategory::General)
    }

    pub fn sample_count(&self) -> usize {
        self.state()
            .case_infos
            .keys()
            .filter_map(|k| match k {
                TestCaseKey::Sample(i) => Some(i + 1),
                _ => None,
            })
            .max()
            .unwrap_or(0)
    }

    /// Drops snapshots and stale results of one category.
    pub fn clear_case_info(&self, category: CaseCategory) {
        let mut st = self.state();
        st.case_infos.retain(|k, _| k.category() != category);
        st.case_order.retain(|k| k.category() != category);
        st.entries.retain(|k, _| k.category() != category);
    }

    pub fn clear_custom_case_info(&self) {
        self.clear_case_info(CaseCategory::Custom)
    }

    pub fn clear_general_case_info(&self) {
        self.clear_case_info(CaseCategory::General)
    }

    /// Drops every snapshot, e.g. when another problem is loaded.
    pub fn clear_all_case_info(&self) {
        let mut st = self.state();
        st.case_infos.clear();
        st.case_order.clear();
    }
}
