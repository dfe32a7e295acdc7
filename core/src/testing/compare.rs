use super::result::OutputComparisonResult;

/// Judge-like normalization:
/// CRLF/CR become LF, spaces and tabs at the end of each line are removed,
/// and trailing empty lines are dropped. Blank lines in the middle are kept.
pub fn normalize(text: &str) -> String {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut lines: Vec<&str> = unified
        .split('\n')
        .map(|line| line.trim_end_matches([' ', '\t']))
        .collect();
    while lines.last().map_or(false, |line| line.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}

pub fn compare(expected: &str, actual: &str) -> OutputComparisonResult {
    let normalized_expected = normalize(expected);
    let normalized_actual = normalize(actual);
    OutputComparisonResult {
        passed: normalized_expected == normalized_actual,
        normalized_expected,
        normalized_actual,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn normalize_line_endings_and_trailing_whitespace() {
        assert_eq!(normalize("1 2 3  \r\n\r\n"), "1 2 3");
        assert_eq!(normalize("a\rb\r\n c \t\n"), "a\nb\n c");
        assert_eq!(normalize("a\n\nb\n\n\n"), "a\n\nb");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("\n\n  \n"), "");
    }

    #[test]
    fn leading_whitespace_is_significant() {
        assert_eq!(normalize("  x"), "  x");
        assert!(!compare("x", " x").passed);
    }

    #[test]
    fn identical_text_passes() {
        for x in ["", "3", "a\n\nb", "  1 2\t\n3\r\n", "\u{3042}\u{3044}\n"] {
            assert!(compare(x, x).passed, "{:?}", x);
        }
    }

    #[test]
    fn lenient_on_trailing_whitespace() {
        let r = compare("1 2 3\n", "1 2 3  \r\n\r\n");
        assert!(r.passed);
        assert_eq!(r.normalized_expected, "1 2 3");
        assert_eq!(r.normalized_actual, "1 2 3");
    }

    #[test]
    fn interior_blank_line_matters() {
        let r = compare("a\n\nb", "a\nb");
        assert!(!r.passed);
        assert_eq!(r.normalized_expected, "a\n\nb");
        assert_eq!(r.normalized_actual, "a\nb");
    }

    #[test]
    fn missing_output_fails() {
        assert!(!compare("3\n", "").passed);
        assert!(compare("\n", "").passed);
    }
}
