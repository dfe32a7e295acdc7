pub mod init;
pub mod run;

use std::{path::PathBuf, sync::Arc, time::Duration};

use sjudge_core::{testing::ProcessRunnerFactory, Config, ResultStore, RunOrchestrator};

use crate::{config::GlobalConfig, util};

#[derive(Debug, clap::Parser)]
#[command(author, version, about, long_about = None)]
pub struct GlobalArgs {
    #[command(subcommand)]
    pub subcmd: Subcommand,

    /// Log debug messages
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, clap::Subcommand)]
pub enum Subcommand {
    Init(init::Args),

    #[command(alias("r"))]
    Run(run::Args),

    #[command(alias("t"))]
    Test(test::Args),
}

pub type SubcmdResult = anyhow::Result<()>;

impl GlobalArgs {
    pub async fn exec_subcmd(&self) -> SubcmdResult {
        use Subcommand::*;
        match &self.subcmd {
            Init(args) => init::exec(args, self),
            Run(args) => run::exec(args, self).await,
            Test(args) => test::exec(args, self).await,
        }
    }
}

/// Options shared by the subcommands that execute the solution.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct RunArgs {
    /// Testcase file [default: `run.cases` of sjudge.toml, or cases.toml]
    #[arg(long)]
    pub cases: Option<PathBuf>,

    /// Command to run (split like a shell would, but no shell is invoked)
    #[arg(short, long)]
    pub command: Option<String>,

    /// Source file to infer the command from
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Working directory of the solution
    #[arg(short = 'd', long)]
    pub working_dir: Option<PathBuf>,

    /// Time limit per testcase in milliseconds
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Print results as JSON instead of the interactive view
    #[arg(long)]
    pub json: bool,
}

/// Settings resolved from command line > project config > user settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub command: String,
    pub working_dir: Option<PathBuf>,
    pub timeout: Duration,
    pub cases_file: PathBuf,
}

impl RunArgs {
    pub fn resolve(&self, cfg: &Config, global: &GlobalConfig) -> RunSettings {
        let command = match (&self.command, &self.file) {
            (Some(cmd), _) if !cmd.trim().is_empty() => cmd.trim().to_owned(),
            (_, Some(file)) => sjudge_core::command::resolve_run_command(
                "",
                Some(file.as_path()),
                cfg.run.python.as_deref(),
            ),
            _ => cfg.run_command(),
        };
        RunSettings {
            command,
            working_dir: self.working_dir.clone().or_else(|| cfg.working_dir()),
            timeout: self
                .timeout
                .map(Duration::from_millis)
                .or_else(|| cfg.timeout())
                .unwrap_or_else(|| global.timeout()),
            cases_file: self.cases.clone().unwrap_or_else(|| cfg.cases_file()),
        }
    }

    pub fn load_settings(&self) -> anyhow::Result<RunSettings> {
        let cfg = Config::from_file_finding_in_ancestors(util::current_dir()?)?;
        let global = GlobalConfig::from_file_or_default()?;
        Ok(self.resolve(&cfg, &global))
    }
}

impl RunSettings {
    pub fn orchestrator(&self, store: Arc<ResultStore>) -> RunOrchestrator {
        let factory = Arc::new(ProcessRunnerFactory {
            timeout: self.timeout,
        });
        let orch = RunOrchestrator::new(store, factory);
        match &self.working_dir {
            Some(dir) => orch.working_dir(dir.clone()),
            None => orch,
        }
    }
}
