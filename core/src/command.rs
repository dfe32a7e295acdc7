use std::path::Path;

pub const DEFAULT_RUN_COMMAND: &str = "./main";

const JVM_SOURCE_ROOTS: [&str; 4] = [
    "/src/main/java/",
    "/src/test/java/",
    "/src/main/kotlin/",
    "/src/test/kotlin/",
];

pub fn default_python_command() -> &'static str {
    if cfg!(windows) {
        "python"
    } else {
        "python3"
    }
}

/// Double-quotes `s` so that [`crate::testing::tokenize`] yields it back as one token.
pub fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Guesses a run command for a source file from its extension.
pub fn infer_command_from_file_path(
    path: impl AsRef<Path>,
    python: Option<&str>,
) -> Option<String> {
    let normalized = path.as_ref().to_string_lossy().replace('\\', "/");
    let path = Path::new(&normalized);
    let stem = path.file_stem()?.to_str()?;
    if stem.trim().is_empty() {
        return None;
    }
    let ext = path.extension()?.to_str()?.to_lowercase();

    let cmd = match ext.as_str() {
        "java" => format!("java {}", quote(&normalized)),
        "kt" => format!("kotlin {}", jvm_main_class(&normalized, &format!("{}Kt", stem))),
        "py" => format!(
            "{} {}",
            quote(python.unwrap_or(default_python_command())),
            quote(&normalized)
        ),
        "js" => format!("node {}", quote(&normalized)),
        "ts" => format!("ts-node {}", quote(&normalized)),
        "go" => format!("go run {}", quote(&normalized)),
        "sh" => format!("bash {}", quote(&normalized)),
        "c" | "cc" | "cpp" | "cxx" => {
            let without_ext = &normalized[..normalized.len() - ext.len() - 1];
            quote(without_ext)
        }
        _ => return None,
    };
    Some(cmd)
}

/// Prefixes the package derived from a Maven/Gradle style source root, if any.
fn jvm_main_class(normalized_path: &str, simple_name: &str) -> String {
    let Some(root) = JVM_SOURCE_ROOTS.iter().find(|r| normalized_path.contains(*r)) else {
        return simple_name.to_owned()
    };
    let (_, relative) = normalized_path.split_once(root).unwrap_or(("", ""));
    let package = relative
        .rsplit_once('/')
        .map(|(dir, _)| dir)
        .unwrap_or("")
        .split('/')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(".");

    if package.is_empty() {
        simple_name.to_owned()
    } else {
        format!("{}.{}", package, simple_name)
    }
}

/// Trimmed `raw` if not blank, else a command inferred from `current_file`,
/// else [`DEFAULT_RUN_COMMAND`].
pub fn resolve_run_command(
    raw: &str,
    current_file: Option<&Path>,
    python: Option<&str>,
) -> String {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        return trimmed.to_owned();
    }
    current_file
        .and_then(|f| infer_command_from_file_path(f, python))
        .unwrap_or_else(|| DEFAULT_RUN_COMMAND.to_owned())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::testing::tokenize;

    fn infer(path: &str) -> Option<String> {
        infer_command_from_file_path(path, Some("python3"))
    }

    #[test]
    fn infer_by_extension() {
        assert_eq!(infer("Main.java").unwrap(), r#"java "Main.java""#);
        assert_eq!(infer("/w/a.py").unwrap(), r#""python3" "/w/a.py""#);
        assert_eq!(infer("a.JS").unwrap(), r#"node "a.JS""#);
        assert_eq!(infer("a.ts").unwrap(), r#"ts-node "a.ts""#);
        assert_eq!(infer("a.go").unwrap(), r#"go run "a.go""#);
        assert_eq!(infer("run.sh").unwrap(), r#"bash "run.sh""#);
        assert_eq!(infer("/w/1000.cpp").unwrap(), r#""/w/1000""#);
        assert_eq!(infer("x.cc").unwrap(), r#""x""#);
        assert_eq!(infer("Main.kt").unwrap(), "kotlin MainKt");
        assert_eq!(infer("README.md"), None);
        assert_eq!(infer("Makefile"), None);
    }

    #[test]
    fn infer_kotlin_package_from_source_root() {
        assert_eq!(
            infer("/p/src/main/kotlin/boj/p1000/Main.kt").unwrap(),
            "kotlin boj.p1000.MainKt"
        );
        assert_eq!(infer("/p/src/main/kotlin/Main.kt").unwrap(), "kotlin MainKt");
    }

    #[test]
    fn windows_separators_are_normalized() {
        assert_eq!(infer(r"C:\w\a.py").unwrap(), r#""python3" "C:/w/a.py""#);
    }

    #[test]
    fn quoted_path_survives_tokenize() {
        let path = r#"/tmp/my dir/we"ird.py"#;
        let tokens = tokenize(&infer(path).unwrap()).unwrap();
        assert_eq!(tokens, ["python3", path]);
    }

    #[test]
    fn resolve_precedence() {
        let file = Path::new("a.py");
        assert_eq!(resolve_run_command("  ./sol \n", Some(file), None), "./sol");
        assert_eq!(
            resolve_run_command(" ", Some(file), Some("pypy3")),
            r#""pypy3" "a.py""#
        );
        assert_eq!(resolve_run_command("", Some(Path::new("a.txt")), None), "./main");
        assert_eq!(resolve_run_command("", None, None), DEFAULT_RUN_COMMAND);
    }
}
