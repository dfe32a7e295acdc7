pub mod command;
pub mod config;
pub mod orchestrator;
pub mod store;
pub mod testing;

pub use crate::config::Config;
pub use crate::orchestrator::{CancelHandle, RunAllOutcome, RunError, RunOrchestrator};
pub use crate::store::{CaseInfo, ListenerId, ResultListener, ResultStore};
