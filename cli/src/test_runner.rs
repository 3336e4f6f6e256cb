//! Runner for `.test.md` fixtures.
//!
//! A fixture is a Markdown page preceded by TOML frontmatter between `---`
//! lines. The frontmatter states what the pipeline should report for the
//! page; line numbers count from the first line after the frontmatter.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use fencekit::{BlockError, Document};
use renderer::Report;

#[derive(Debug, Deserialize)]
pub struct ExpectedError {
    /// Substring that must appear in the error message.
    pub contains: String,

    /// If set, the error must be attributed to this 1-based line.
    #[serde(default)]
    pub line: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TestConfig {
    #[serde(default)]
    pub description: Option<String>,

    /// Number of well-formed blocks the extractor must find.
    #[serde(default)]
    pub expect_blocks: Option<usize>,

    /// Number of descriptors the renderer must produce.
    #[serde(default)]
    pub expect_descriptors: Option<usize>,

    /// Kinds of the rendered descriptors, in order.
    #[serde(default)]
    pub expect_kinds: Option<Vec<String>>,

    /// If present (even empty), error count and content are checked in order.
    #[serde(default)]
    pub expect_errors: Option<Vec<ExpectedError>>,

    /// Shorthand for `expect_errors = []`.
    #[serde(default)]
    pub expect_clean: bool,
}

/// Split a `.test.md` file into its TOML config and Markdown page.
fn parse_test_file(content: &str) -> Result<(TestConfig, &str), String> {
    let content = content.trim_start_matches('\u{feff}');

    let after_open = content
        .strip_prefix("---")
        .ok_or("missing opening --- frontmatter delimiter")?;
    let after_open = after_open
        .strip_prefix('\n')
        .or_else(|| after_open.strip_prefix("\r\n"))
        .unwrap_or(after_open);

    let close_pos = after_open
        .find("\n---")
        .ok_or("missing closing --- frontmatter delimiter")?;

    let toml_str = after_open[..close_pos].trim_end_matches('\r');
    let rest = &after_open[close_pos + 4..];
    let page = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
        .unwrap_or(rest);

    let config: TestConfig =
        toml::from_str(toml_str).map_err(|e| format!("TOML parse error: {}", e))?;

    Ok((config, page))
}

pub enum TestOutcome {
    Pass,
    Fail(String),
}

pub struct TestResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: TestOutcome,
}

impl TestResult {
    fn label(&self) -> &str {
        self.description.as_deref().unwrap_or_else(|| {
            self.path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("?")
        })
    }
}

fn run_single_test(path: &Path) -> TestResult {
    let (description, outcome) = match std::fs::read_to_string(path) {
        Err(e) => (None, TestOutcome::Fail(format!("cannot read file: {}", e))),
        Ok(content) => match parse_test_file(&content) {
            Err(e) => (None, TestOutcome::Fail(format!("frontmatter error: {}", e))),
            Ok((config, page)) => {
                let document = Document::new(0, path, page.to_string());
                let outcome = match evaluate(&config, &document) {
                    None => TestOutcome::Pass,
                    Some(reason) => TestOutcome::Fail(reason),
                };
                (config.description, outcome)
            }
        },
    };
    TestResult {
        path: path.to_path_buf(),
        description,
        outcome,
    }
}

/// Compare a page's pipeline results with its expectations. Returns `Some(reason)` on mismatch.
fn evaluate(config: &TestConfig, document: &Document) -> Option<String> {
    let report: Report = renderer::process_document(document);

    if let Some(expected) = config.expect_blocks {
        let actual = document.blocks().filter(Result::is_ok).count();
        if actual != expected {
            return Some(format!("expected {} block(s), extracted {}", expected, actual));
        }
    }

    if let Some(expected) = config.expect_descriptors {
        if report.descriptors.len() != expected {
            return Some(format!(
                "expected {} descriptor(s), rendered {}",
                expected,
                report.descriptors.len()
            ));
        }
    }

    if let Some(expected) = &config.expect_kinds {
        let actual: Vec<String> = report
            .descriptors
            .iter()
            .map(|d| d.widget.kind().to_string())
            .collect();
        if &actual != expected {
            return Some(format!(
                "kind mismatch\n  expected: {}\n  actual:   {}",
                expected.join(", "),
                actual.join(", ")
            ));
        }
    }

    if config.expect_clean && !report.errors.is_empty() {
        return check_errors(&report.errors, &[]);
    }

    config
        .expect_errors
        .as_deref()
        .and_then(|expected| check_errors(&report.errors, expected))
}

fn check_errors(actual: &[BlockError], expected: &[ExpectedError]) -> Option<String> {
    if actual.len() != expected.len() {
        let actual_msgs: Vec<String> = actual.iter().map(|e| format!("    - {}", e)).collect();
        return Some(format!(
            "expected {} error(s), got {}\n  actual errors:\n{}",
            expected.len(),
            actual.len(),
            if actual_msgs.is_empty() {
                "    (none)".to_string()
            } else {
                actual_msgs.join("\n")
            }
        ));
    }

    for (i, (actual, expected)) in actual.iter().zip(expected).enumerate() {
        let msg = actual.kind.to_string();
        if !msg.contains(&expected.contains) {
            return Some(format!(
                "error[{}]: expected message containing \"{}\", got: {}",
                i, expected.contains, msg
            ));
        }
        if let Some(line) = expected.line {
            if actual.location.line != line {
                return Some(format!(
                    "error[{}]: expected on line {}, but reported on line {}",
                    i, line, actual.location.line
                ));
            }
        }
    }

    None
}

/// Discover `.test.md` files grouped by sub-folder; files directly in `root` get category "".
fn discover_categorized(root: &Path) -> BTreeMap<String, Vec<PathBuf>> {
    let mut categories: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    collect_tests(root, root, &mut categories);
    for files in categories.values_mut() {
        files.sort();
    }
    categories
}

fn collect_tests(dir: &Path, root: &Path, out: &mut BTreeMap<String, Vec<PathBuf>>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_tests(&path, root, out);
            continue;
        }
        let is_test = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(".test.md"));
        if is_test {
            let category = path
                .parent()
                .and_then(|p| p.strip_prefix(root).ok())
                .map(|p| p.to_string_lossy().replace('\\', "/"))
                .unwrap_or_default();
            out.entry(category).or_default().push(path);
        }
    }
}

fn category_label(cat: &str) -> &str {
    if cat.is_empty() { "(root)" } else { cat }
}

pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no categories)");
        return;
    }

    let categories = discover_categorized(path);
    if categories.is_empty() {
        eprintln!("no .test.md files found in {}", path.display());
        return;
    }

    eprintln!("available categories:");
    for (cat, files) in &categories {
        eprintln!("  {} ({} tests)", category_label(cat), files.len());
    }
}

fn paint(s: &str, code: &str, no_color: bool) -> String {
    if no_color {
        s.to_string()
    } else {
        format!("\x1b[{}m{}\x1b[0m", code, s)
    }
}

/// Run every `.test.md` under `path` (or the single file), optionally limited to
/// `categories`. Returns the exit code: 0 when all pass, 1 otherwise.
pub fn run_tests(path: &Path, no_color: bool, categories: &[String]) -> i32 {
    let selected: BTreeMap<String, Vec<PathBuf>> = if path.is_file() {
        BTreeMap::from([(String::new(), vec![path.to_path_buf()])])
    } else {
        let all = discover_categorized(path);
        if all.is_empty() {
            eprintln!("no .test.md files found in {}", path.display());
            return 1;
        }
        select_categories(all, categories)
    };

    if selected.is_empty() {
        eprintln!("no matching categories found");
        return 1;
    }

    let mut passed = 0usize;
    let mut failures: Vec<TestResult> = Vec::new();

    for (cat, files) in &selected {
        eprintln!();
        eprintln!("{}", paint(category_label(cat), "1", no_color));
        for file in files {
            let result = run_single_test(file);
            if matches!(result.outcome, TestOutcome::Pass) {
                passed += 1;
                eprintln!("  {}  {}", paint("PASS", "32", no_color), result.label());
            } else {
                eprintln!("  {}  {}", paint("FAIL", "31", no_color), result.label());
                failures.push(result);
            }
        }
    }

    if !failures.is_empty() {
        eprintln!();
        eprintln!("failures:");
        for f in &failures {
            eprintln!();
            eprintln!("  --- {} ---", f.path.display());
            if let TestOutcome::Fail(reason) = &f.outcome {
                for line in reason.lines() {
                    eprintln!("  {}", line);
                }
            }
        }
    }

    eprintln!();
    if failures.is_empty() {
        eprintln!("test result: {}. {} passed, 0 failed", paint("ok", "32", no_color), passed);
        0
    } else {
        eprintln!(
            "test result: {}. {} passed, {} failed (of {})",
            paint("FAILED", "31", no_color),
            passed,
            failures.len(),
            passed + failures.len()
        );
        1
    }
}

/// Keep the requested categories (and their sub-folders), warning about unknown names.
fn select_categories(
    all: BTreeMap<String, Vec<PathBuf>>,
    requested: &[String],
) -> BTreeMap<String, Vec<PathBuf>> {
    if requested.is_empty() {
        return all;
    }
    let wanted: Vec<&str> = requested.iter().map(|r| r.trim_matches('/')).collect();
    for req in &wanted {
        let known = all
            .keys()
            .any(|cat| cat.as_str() == *req || cat.starts_with(&format!("{}/", req)));
        if !known {
            eprintln!(
                "warning: category '{}' not found (available: {})",
                req,
                all.keys()
                    .map(|k| category_label(k))
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
    }
    all.into_iter()
        .filter(|(cat, _)| {
            wanted
                .iter()
                .any(|req| cat.as_str() == *req || cat.starts_with(&format!("{}/", req)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cases_dir() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("cases")
    }

    #[test]
    fn frontmatter_splits_config_and_page() {
        let (config, page) =
            parse_test_file("---\ndescription = \"d\"\nexpect_blocks = 2\n---\n# Page\n").unwrap();
        assert_eq!(config.description.as_deref(), Some("d"));
        assert_eq!(config.expect_blocks, Some(2));
        assert_eq!(page, "# Page\n");
    }

    #[test]
    fn frontmatter_is_required() {
        assert!(parse_test_file("# Page\n").is_err());
        assert!(parse_test_file("---\nexpect_blocks = 1\n").is_err());
    }

    #[test]
    fn error_expectations_compare_in_order() {
        let document = Document::new(
            0,
            "inline.md",
            "```quiz\nquestion: Q?\noptions:\n  - text: a\n```\n".to_string(),
        );
        let config = TestConfig {
            expect_errors: Some(vec![ExpectedError {
                contains: "exactly one correct option".to_string(),
                line: Some(1),
            }]),
            ..TestConfig::default()
        };
        assert!(evaluate(&config, &document).is_none());

        let wrong_line = TestConfig {
            expect_errors: Some(vec![ExpectedError {
                contains: "exactly one".to_string(),
                line: Some(3),
            }]),
            ..TestConfig::default()
        };
        assert!(evaluate(&wrong_line, &document).is_some());
    }

    #[test]
    fn bundled_cases_pass() {
        assert_eq!(run_tests(&cases_dir(), true, &[]), 0);
    }

    #[test]
    fn category_filter_selects_subfolders() {
        let all = discover_categorized(&cases_dir());
        let picked = select_categories(all, &["invalid".to_string()]);
        assert!(!picked.is_empty());
        assert!(picked.keys().all(|k| k == "invalid" || k.starts_with("invalid/")));
    }
}
