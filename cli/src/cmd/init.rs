use std::path::{Path, PathBuf};

use anyhow::{ensure, Context as _};
use sjudge_core::Config;

use crate::print_success;

use super::{GlobalArgs, SubcmdResult};

#[derive(Debug, clap::Args)]
pub struct Args {
    #[arg(default_value = ".")]
    pub dir: PathBuf,
}

pub fn exec(args: &Args, _global_args: &GlobalArgs) -> SubcmdResult {
    write_examples(&args.dir)?;
    print_success!("Created {} and {} in {:?}", Config::FILENAME, Config::DEFAULT_CASES_FILENAME, args.dir);
    Ok(())
}

pub fn write_examples(dir: &Path) -> anyhow::Result<()> {
    let files = [
        (dir.join(Config::FILENAME), Config::example_toml()),
        (dir.join(Config::DEFAULT_CASES_FILENAME), Config::example_cases_toml()),
    ];
    for (path, _) in &files {
        ensure!(!path.exists(), "Already exists: {:?}", path);
    }

    std::fs::create_dir_all(dir).with_context(|| format!("Cannot create dir {:?}", dir))?;
    for (path, contents) in &files {
        std::fs::write(path, contents).with_context(|| format!("Cannot write file {:?}", path))?;
    }
    Ok(())
}
