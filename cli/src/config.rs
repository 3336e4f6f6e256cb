use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Looked up in the working directory when `--config` is not given.
pub const CONFIG_FILE: &str = "fencekit.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// File extensions scanned when a directory is given.
    pub extensions: Vec<String>,
    /// Directory names skipped while walking.
    pub exclude: Vec<String>,
    pub render: RenderConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub format: OutputFormat,
    pub pretty: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// The pipeline report as JSON
    #[default]
    Json,
    /// The page with widgets replaced by HTML placeholders
    Html,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            extensions: vec!["md".to_string(), "markdown".to_string()],
            exclude: [".git", "node_modules", "site", "target"]
                .into_iter()
                .map(String::from)
                .collect(),
            render: RenderConfig::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl Config {
    /// Load `explicit` if given, else `fencekit.toml` from the working directory if present,
    /// else the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let path = PathBuf::from(CONFIG_FILE);
                if !path.is_file() {
                    return Ok(Config::default());
                }
                path
            }
        };
        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        Config::parse(&text).map_err(|source| ConfigError::Parse { path, source })
    }

    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn wants_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|x| x.eq_ignore_ascii_case(ext)))
    }

    pub fn is_excluded(&self, dir: &Path) -> bool {
        dir.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| self.exclude.iter().any(|x| x == name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.extensions, vec!["md", "markdown"]);
        assert_eq!(config.render.format, OutputFormat::Json);
        assert!(!config.render.pretty);
    }

    #[test]
    fn render_section_overrides() {
        let config = Config::parse("extensions = [\"mdx\"]\n[render]\nformat = \"html\"\npretty = true\n").unwrap();
        assert_eq!(config.extensions, vec!["mdx"]);
        assert!(config.exclude.contains(&"node_modules".to_string()));
        assert_eq!(config.render.format, OutputFormat::Html);
        assert!(config.render.pretty);
    }

    #[test]
    fn bad_format_is_rejected() {
        assert!(Config::parse("[render]\nformat = \"pdf\"\n").is_err());
    }

    #[test]
    fn load_reports_unreadable_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(&dir.path().join("missing.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn extension_matching_ignores_case() {
        let config = Config::default();
        assert!(config.wants_file(Path::new("docs/intro.MD")));
        assert!(!config.wants_file(Path::new("docs/intro.txt")));
        assert!(config.is_excluded(Path::new("repo/node_modules")));
    }
}
