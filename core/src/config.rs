use std::path::{Path, PathBuf};
use std::result::Result as StdResult;
use std::time::Duration;

use anyhow::Context as _;
use rust_embed::RustEmbed;
use serde::Deserialize;

use crate::command;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(skip)]
    pub source_config_file: Option<PathBuf>,
    #[serde(default)]
    pub run: RunConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    pub command: Option<String>,
    pub file: Option<PathBuf>,
    pub python: Option<String>,
    pub working_dir: Option<PathBuf>,
    pub timeout_millis: Option<u64>,
    pub cases: Option<PathBuf>,
}

#[derive(RustEmbed)]
#[folder = "assets/"]
struct Asset;

fn asset(name: &str) -> String {
    let file = Asset::get(name).unwrap_or_else(|| panic!("Missing embedded asset '{}'", name));
    String::from_utf8_lossy(file.data.as_ref()).into_owned()
}

impl Config {
    pub const FILENAME: &str = "sjudge.toml";
    pub const DEFAULT_CASES_FILENAME: &str = "cases.toml";

    pub fn example_toml() -> String {
        asset(Self::FILENAME)
    }

    pub fn example_cases_toml() -> String {
        asset(Self::DEFAULT_CASES_FILENAME)
    }

    pub fn from_toml(s: &str) -> StdResult<Self, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn from_toml_file(filepath: PathBuf) -> anyhow::Result<Self> {
        let toml = std::fs::read_to_string(&filepath)
            .with_context(|| format!("Cannot read file {:?}", filepath))?;
        let mut cfg = Self::from_toml(&toml)
            .with_context(|| format!("Invalid config TOML: {:?}", filepath))?;
        cfg.source_config_file = Some(filepath);
        Ok(cfg)
    }

    /// Find config file ancestor dirs, including current dir.
    pub fn find_file_in_ancestors(cur_dir: impl AsRef<Path>) -> Option<PathBuf> {
        cur_dir
            .as_ref()
            .ancestors()
            .map(|dir| dir.join(Self::FILENAME))
            .find(|path| path.is_file())
    }

    /// Default config when no file is found.
    pub fn from_file_finding_in_ancestors(cur_dir: impl AsRef<Path>) -> anyhow::Result<Self> {
        match Self::find_file_in_ancestors(cur_dir) {
            Some(path) => {
                log::debug!("Using config {:?}", path);
                Self::from_toml_file(path)
            }
            None => Ok(Self::default()),
        }
    }

    /// Directory relative paths in the config are resolved against.
    pub fn base_dir(&self) -> &Path {
        self.source_config_file
            .as_deref()
            .and_then(Path::parent)
            .unwrap_or(Path::new("."))
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.base_dir().join(path)
    }

    pub fn cases_file(&self) -> PathBuf {
        let name = self
            .run
            .cases
            .as_deref()
            .unwrap_or(Path::new(Self::DEFAULT_CASES_FILENAME));
        self.resolve(name)
    }

    pub fn working_dir(&self) -> Option<PathBuf> {
        self.run.working_dir.as_deref().map(|d| self.resolve(d))
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.run.timeout_millis.map(Duration::from_millis)
    }

    /// Configured command, else one inferred from `run.file`, else the default.
    pub fn run_command(&self) -> String {
        let file = self.run.file.as_deref().map(|f| self.resolve(f));
        command::resolve_run_command(
            self.run.command.as_deref().unwrap_or(""),
            file.as_deref(),
            self.run.python.as_deref(),
        )
    }
}
