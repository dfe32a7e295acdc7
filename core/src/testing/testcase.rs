use std::{fmt, str::FromStr};

use serde::Serialize;

/// Input and expected output handed to a single execution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SampleCase {
    pub input: String,
    pub expected_output: String,
}

impl SampleCase {
    pub fn new(input: impl Into<String>, expected_output: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            expected_output: expected_output.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum CaseCategory {
    Sample,
    Custom,
    General,
}

/// Identity of a testcase across the result store and the orchestrator.
///
/// `Custom("x")` and `General("x")` are distinct keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum TestCaseKey {
    Sample(usize),
    Custom(String),
    General(String),
}

impl TestCaseKey {
    pub fn category(&self) -> CaseCategory {
        match self {
            TestCaseKey::Sample(_) => CaseCategory::Sample,
            TestCaseKey::Custom(_) => CaseCategory::Custom,
            TestCaseKey::General(_) => CaseCategory::General,
        }
    }

    /// Human readable name. Sample indices are shown 1-based.
    pub fn label(&self) -> String {
        match self {
            TestCaseKey::Sample(i) => format!("Sample {}", i + 1),
            TestCaseKey::Custom(name) | TestCaseKey::General(name) => name.clone(),
        }
    }
}

impl fmt::Display for TestCaseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestCaseKey::Sample(i) => write!(f, "sample:{}", i),
            TestCaseKey::Custom(name) => write!(f, "custom:{}", name),
            TestCaseKey::General(name) => write!(f, "general:{}", name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseKeyError {
    #[error("Invalid testcase key '{0}': expected 'sample:<index>', 'custom:<name>' or 'general:<name>'")]
    Malformed(String),

    #[error("Invalid sample index '{0}'")]
    InvalidIndex(String),
}

impl FromStr for TestCaseKey {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((kind, id)) = s.split_once(':') else {
            return Err(ParseKeyError::Malformed(s.to_owned()))
        };
        if id.is_empty() {
            return Err(ParseKeyError::Malformed(s.to_owned()));
        }
        match kind {
            "sample" => id
                .parse()
                .map(TestCaseKey::Sample)
                .map_err(|_| ParseKeyError::InvalidIndex(id.to_owned())),
            "custom" => Ok(TestCaseKey::Custom(id.to_owned())),
            "general" => Ok(TestCaseKey::General(id.to_owned())),
            _ => Err(ParseKeyError::Malformed(s.to_owned())),
        }
    }
}

/// A keyed case as supplied by collaborators.
/// `expected_output == None` means there is no oracle (debug run).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Testcase {
    pub key: TestCaseKey,
    pub input: String,
    pub expected_output: Option<String>,
}

impl Testcase {
    pub fn new(
        key: TestCaseKey,
        input: impl Into<String>,
        expected_output: Option<impl Into<String>>,
    ) -> Self {
        Self {
            key,
            input: input.into(),
            expected_output: expected_output.map(Into::into),
        }
    }

    pub fn sample(index: usize, input: impl Into<String>, output: impl Into<String>) -> Self {
        Self::new(TestCaseKey::Sample(index), input, Some(output))
    }

    pub fn is_judged(&self) -> bool {
        self.expected_output.is_some()
    }

    /// Cases without an oracle are run against an empty expectation.
    pub fn to_sample_case(&self) -> SampleCase {
        SampleCase {
            input: self.input.clone(),
            expected_output: self.expected_output.clone().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn custom_and_general_with_same_name_are_distinct() {
        let keys: HashSet<_> = [
            TestCaseKey::Custom("x".into()),
            TestCaseKey::General("x".into()),
            TestCaseKey::Custom("x".into()),
        ]
        .into_iter()
        .collect();
        assert_eq!(keys.len(), 2);
    }

    #[test]
    fn parse_key() {
        assert_eq!("sample:2".parse(), Ok(TestCaseKey::Sample(2)));
        assert_eq!("custom:edge".parse(), Ok(TestCaseKey::Custom("edge".into())));
        assert_eq!(
            "general:big:1".parse(),
            Ok(TestCaseKey::General("big:1".into()))
        );
        assert_eq!(
            "sample:x".parse::<TestCaseKey>(),
            Err(ParseKeyError::InvalidIndex("x".into()))
        );
        assert!("custom:".parse::<TestCaseKey>().is_err());
        assert!("edge".parse::<TestCaseKey>().is_err());
        assert!("other:a".parse::<TestCaseKey>().is_err());
    }

    #[test]
    fn display_is_parsable() {
        for key in [
            TestCaseKey::Sample(0),
            TestCaseKey::Custom("a b".into()),
            TestCaseKey::General("g".into()),
        ] {
            assert_eq!(key.to_string().parse(), Ok(key));
        }
    }

    #[test]
    fn no_oracle_case_runs_against_empty_expectation() {
        let t = Testcase::new(TestCaseKey::Custom("dbg".into()), "1\n", None::<String>);
        assert!(!t.is_judged());
        assert_eq!(t.to_sample_case(), SampleCase::new("1\n", ""));
    }
}
