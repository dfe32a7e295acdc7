use std::{collections::HashSet, path::Path};

use anyhow::Context as _;
use serde::Deserialize;
use sjudge_core::testing::{CaseCategory, TestCaseKey, Testcase};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CasesFile {
    #[serde(default)]
    pub sample: Vec<SampleEntry>,
    #[serde(default)]
    pub custom: Vec<CustomEntry>,
    #[serde(default)]
    pub general: Vec<GeneralEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SampleEntry {
    pub input: String,
    pub output: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomEntry {
    pub name: String,
    pub input: String,
    pub output: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneralEntry {
    pub name: String,
    pub input: String,
    pub output: String,
}

#[derive(Debug, thiserror::Error)]
pub enum CasesFileError {
    #[error("Invalid cases TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Empty name in a {0} case")]
    EmptyName(CaseCategory),

    #[error("Duplicate {0} case name '{1}'")]
    DuplicateName(CaseCategory, String),
}

impl CasesFile {
    pub fn from_toml(s: &str) -> Result<Self, CasesFileError> {
        let cases: Self = toml::from_str(s)?;
        cases.validate()?;
        Ok(cases)
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let toml = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read cases file {:?}", path))?;
        Self::from_toml(&toml).with_context(|| format!("Invalid cases file {:?}", path))
    }

    fn validate(&self) -> Result<(), CasesFileError> {
        fn check<'a>(
            category: CaseCategory,
            names: impl Iterator<Item = &'a str>,
        ) -> Result<(), CasesFileError> {
            let mut seen = HashSet::new();
            for name in names {
                if name.trim().is_empty() {
                    return Err(CasesFileError::EmptyName(category));
                }
                if !seen.insert(name) {
                    return Err(CasesFileError::DuplicateName(category, name.to_owned()));
                }
            }
            Ok(())
        }
        check(CaseCategory::Custom, self.custom.iter().map(|c| c.name.as_str()))?;
        check(CaseCategory::General, self.general.iter().map(|c| c.name.as_str()))
    }

    pub fn len(&self) -> usize {
        self.sample.len() + self.custom.len() + self.general.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_testcases(self) -> Vec<Testcase> {
        let samples = self
            .sample
            .into_iter()
            .enumerate()
            .map(|(i, s)| Testcase::sample(i, s.input, s.output));
        let customs = self
            .custom
            .into_iter()
            .map(|c| Testcase::new(TestCaseKey::Custom(c.name), c.input, c.output));
        let generals = self
            .general
            .into_iter()
            .map(|g| Testcase::new(TestCaseKey::General(g.name), g.input, Some(g.output)));
        samples.chain(customs).chain(generals).collect()
    }
}

#[cfg(test)]
mod test {
    use sjudge_core::Config;

    use super::*;

    #[test]
    fn example_cases_should_be_parsable() {
        let cases = CasesFile::from_toml(&Config::example_cases_toml()).unwrap();
        assert_eq!(cases.len(), 5);

        let testcases = cases.into_testcases();
        let keys: Vec<_> = testcases.iter().map(|t| t.key.to_string()).collect();
        assert_eq!(
            keys,
            ["sample:0", "sample:1", "custom:negative", "custom:debug", "general:zeros"]
        );
        assert_eq!(testcases[0].input, "1 2\n");
        assert_eq!(testcases[0].expected_output.as_deref(), Some("3\n"));
        assert!(!testcases[3].is_judged());
        assert!(testcases[4].is_judged());
    }

    #[test]
    fn empty_file_has_no_cases() {
        assert!(CasesFile::from_toml("").unwrap().is_empty());
    }

    #[test]
    fn same_name_in_different_categories_is_allowed() {
        let toml = r#"
            [[custom]]
            name = "x"
            input = ""
            [[general]]
            name = "x"
            input = ""
            output = ""
        "#;
        assert_eq!(CasesFile::from_toml(toml).unwrap().len(), 2);
    }

    #[test]
    fn invalid_files() {
        let dup = r#"
            [[custom]]
            name = "x"
            input = "1"
            [[custom]]
            name = "x"
            input = "2"
        "#;
        assert!(matches!(
            CasesFile::from_toml(dup),
            Err(CasesFileError::DuplicateName(CaseCategory::Custom, name)) if name == "x"
        ));

        let blank = "[[general]]\nname = ' '\ninput = ''\noutput = ''";
        assert!(matches!(
            CasesFile::from_toml(blank),
            Err(CasesFileError::EmptyName(CaseCategory::General))
        ));

        let general_without_output = "[[general]]\nname = 'g'\ninput = ''";
        assert!(matches!(
            CasesFile::from_toml(general_without_output),
            Err(CasesFileError::Parse(_))
        ));
    }
}
