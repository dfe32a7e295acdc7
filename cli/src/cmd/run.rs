use std::sync::Arc;

use anyhow::{bail, Context as _};
use sjudge_core::testing::TestCaseKey;
use sjudge_core::ResultStore;

use crate::{cases::CasesFile, style};

use super::{GlobalArgs, RunArgs, SubcmdResult};

#[derive(Debug, clap::Args)]
pub struct Args {
    /// Testcase to run: `sample:<index>`, `custom:<name>` or `general:<name>`
    #[arg()]
    pub key: TestCaseKey,

    #[command(flatten)]
    pub run: RunArgs,
}

pub async fn exec(args: &Args, _global_args: &GlobalArgs) -> SubcmdResult {
    let settings = args.run.load_settings()?;

    let case = CasesFile::load(&settings.cases_file)?
        .into_testcases()
        .into_iter()
        .find(|t| t.key == args.key)
        .with_context(|| {
            format!(
                "No testcase '{}' in {:?}",
                args.key, settings.cases_file
            )
        })?;

    let store = Arc::new(ResultStore::new());
    let orch = Arc::new(settings.orchestrator(store.clone()));

    log::info!("Running: {}", settings.command);
    let result = orch
        .spawn_run_single(case, settings.command.clone())
        .await
        .context("Run task failed")??;

    let judge = store
        .entry(&args.key)
        .map(|e| e.judge())
        .context("Missing result entry")?;

    if args.run.json {
        println!("{}", serde_json::to_string_pretty(&store.entries())?);
    } else {
        style::print_result_detail(&args.key.label(), judge, &result);
    }

    if result.passed || store.case_info(&args.key).map_or(false, |c| c.expected_output.is_none()) {
        Ok(())
    } else {
        bail!("{} failed", args.key.label())
    }
}
