//! Parser configuration loaded from TOML.
//!
//! ```toml
//! default_message_encoding = "json"
//! module_or_dir = "probe"
//! working_dir = "/workspace/project"
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::format::MessageEncoding;
use crate::infer::ModuleOrDirPolicy;

const CONFIG_FILE_NAME: &str = "config.toml";

/// Settings shared by every parser built from this configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParserConfig {
    /// Encoding of stream tokens and extensionless paths for message parsers
    pub default_message_encoding: MessageEncoding,
    /// Module-versus-directory tie-break
    pub module_or_dir: ModuleOrDirPolicy,
    /// Directory relative paths are probed against
    pub working_dir: Option<PathBuf>,
}

impl ParserConfig {
    /// Read and parse a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Parse configuration content from a string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| enhance_toml_error(e, content))
    }

    /// Load `path` if given, else the default config file if it exists,
    /// else the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match default_config_path() {
            Some(path) if path.is_file() => {
                tracing::debug!(path = %path.display(), "loading default config");
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Serialize to a TOML string.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config to TOML")
    }
}

/// `<config dir>/fetchref/config.toml`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("fetchref").join(CONFIG_FILE_NAME))
}

/// Add the offending lines to a TOML error.
fn enhance_toml_error(error: toml::de::Error, content: &str) -> anyhow::Error {
    let error_msg = error.message().to_string();

    let line_hint = error
        .span()
        .map(|span| content[..span.start.min(content.len())].matches('\n').count() + 1);

    if let Some(line_num) = line_hint {
        let context = get_line_context(content, line_num);
        anyhow::anyhow!(
            "TOML parsing error at line {}:\n{}\n\nError: {}",
            line_num,
            context,
            error_msg
        )
    } else {
        anyhow::anyhow!("TOML parsing error: {}", error_msg)
    }
}

fn get_line_context(content: &str, line_num: usize) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let start = line_num.saturating_sub(2);
    let end = (line_num + 1).min(lines.len());

    lines[start.min(end)..end]
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let num = start + i + 1;
            let marker = if num == line_num { ">>>" } else { "   " };
            format!("{} {:4} | {}", marker, num, line)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = ParserConfig::from_toml_str("").unwrap();
        assert_eq!(config, ParserConfig::default());
        assert_eq!(config.default_message_encoding, MessageEncoding::Binpb);
        assert_eq!(config.module_or_dir, ModuleOrDirPolicy::Probe);
    }

    #[test]
    fn parses_every_field() {
        let config = ParserConfig::from_toml_str(
            r#"
default_message_encoding = "json"
module_or_dir = "module"
working_dir = "/workspace"
"#,
        )
        .unwrap();
        assert_eq!(config.default_message_encoding, MessageEncoding::Json);
        assert_eq!(config.module_or_dir, ModuleOrDirPolicy::Module);
        assert_eq!(config.working_dir, Some(PathBuf::from("/workspace")));
    }

    #[test]
    fn unknown_field_is_named() {
        let err = ParserConfig::from_toml_str("module_or_dir = \"dir\"\ncolour = \"blue\"\n")
            .unwrap_err()
            .to_string();
        assert!(err.contains("colour"), "{err}");
    }

    #[test]
    fn invalid_encoding_fails() {
        assert!(ParserConfig::from_toml_str("default_message_encoding = \"xml\"").is_err());
    }

    #[test]
    fn round_trips_through_toml() {
        let config = ParserConfig {
            default_message_encoding: MessageEncoding::Yaml,
            module_or_dir: ModuleOrDirPolicy::Dir,
            working_dir: None,
        };
        let toml = config.to_toml_string().unwrap();
        assert_eq!(ParserConfig::from_toml_str(&toml).unwrap(), config);
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ParserConfig::load(&dir.path().join("missing.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "default_message_encoding = \"txtpb\"\n").unwrap();
        let config = ParserConfig::load(&path).unwrap();
        assert_eq!(config.default_message_encoding, MessageEncoding::Txtpb);
    }
}
