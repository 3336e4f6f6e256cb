use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::Config;

/// Expand command-line paths into the Markdown files to check.
/// Files named explicitly are always kept; directories are walked recursively
/// and filtered by the configured extensions. Output is sorted and deduplicated.
pub fn collect(paths: &[PathBuf], config: &Config) -> Vec<PathBuf> {
    let mut out = Vec::new();
    for path in paths {
        if path.is_dir() {
            walk(path, config, &mut out);
        } else {
            out.push(path.clone());
        }
    }
    out.sort();
    out.dedup();
    out
}

fn walk(dir: &Path, config: &Config, out: &mut Vec<PathBuf>) {
    if config.is_excluded(dir) {
        debug!(dir = %dir.display(), "skipping excluded directory");
        return;
    }
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "cannot read directory");
            return;
        }
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            walk(&path, config, out);
        } else if config.wants_file(&path) {
            out.push(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walks_directories_and_skips_excluded() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("guide/replication")).unwrap();
        std::fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        std::fs::write(root.join("guide/intro.md"), "# Intro").unwrap();
        std::fs::write(root.join("guide/replication/setup.markdown"), "# Setup").unwrap();
        std::fs::write(root.join("guide/notes.txt"), "notes").unwrap();
        std::fs::write(root.join("node_modules/pkg/README.md"), "# pkg").unwrap();

        let found = collect(&[root.to_path_buf()], &Config::default());
        assert_eq!(
            found,
            vec![
                root.join("guide/intro.md"),
                root.join("guide/replication/setup.markdown"),
            ]
        );
    }

    #[test]
    fn unreadable_directories_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("page.md"), "# Page").unwrap();
        let missing = dir.path().join("gone");

        let found = collect(&[dir.path().to_path_buf()], &Config::default());
        assert_eq!(found, vec![dir.path().join("page.md")]);

        let mut out = Vec::new();
        walk(&missing, &Config::default(), &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn explicit_files_are_kept() {
        let found = collect(
            &[PathBuf::from("b.txt"), PathBuf::from("a.md"), PathBuf::from("a.md")],
            &Config::default(),
        );
        assert_eq!(found, vec![PathBuf::from("a.md"), PathBuf::from("b.txt")]);
    }
}
