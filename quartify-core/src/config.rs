//! Configuration parsing and management.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Export settings, matching the quartify.yml schema.
///
/// Every field has a default, so an empty file (or no file at all) yields
/// the stock Obsidian-to-Quarto behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Name of the directory created under the vault root
    pub output_dir: String,

    /// Files copied only when they sit directly under the vault root
    pub root_files: Vec<String>,

    /// Markdown extensions (without the dot)
    pub content_extensions: Vec<String>,

    /// Image extensions that are mirrored and linkable with `[[name.ext]]`
    pub asset_extensions: Vec<String>,

    /// Directory names the sidebar generator never descends into
    pub excluded_dirs: Vec<String>,

    /// Indentation of top-level sidebar entries
    pub sidebar_indent: usize,

    pub markers: MarkerConfig,
}

/// Exact-line markers recognized inside vault notes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    pub ignored_file: String,
    pub tags_open: String,
    pub tags_close: String,
    pub template_trigger: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: "exportFiles".to_string(),
            root_files: strings(&["_quarto.yml", "references.bib"]),
            content_extensions: strings(&["md", "markdown"]),
            asset_extensions: strings(&["png", "jpg", "jpeg"]),
            excluded_dirs: strings(&[
                ".git",
                ".obsidian",
                ".quarto",
                "_book",
                "public",
                "_site",
                "TEMPLATES",
                "exportFiles",
            ]),
            sidebar_indent: 6,
            markers: MarkerConfig::default(),
        }
    }
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            ignored_file: "<!--IGNORED_FILE-->".to_string(),
            tags_open: "<!--TAGS-->".to_string(),
            tags_close: "<!--/TAGS-->".to_string(),
            template_trigger: "TARGET DECK".to_string(),
        }
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

impl ExportConfig {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&contents)
    }

    /// Parse configuration from YAML text
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        // serde_yaml rejects an empty document for a struct
        let config: ExportConfig = if contents.trim().is_empty() {
            ExportConfig::default()
        } else {
            serde_yaml::from_str(contents)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` when given, otherwise fall back to the defaults
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let name = self.output_dir.trim();
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(ConfigError::InvalidValue {
                field: "output_dir",
                reason: format!("'{}' is not a plain directory name", self.output_dir),
            });
        }
        if self.content_extensions.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "content_extensions",
                reason: "at least one markdown extension is required".to_string(),
            });
        }
        Ok(())
    }

    pub fn is_content_file(&self, path: &Path) -> bool {
        has_extension(path, &self.content_extensions)
    }

    pub fn is_asset_file(&self, path: &Path) -> bool {
        has_extension(path, &self.asset_extensions)
    }

    /// Whether `name` is one of the recognized root-level file names
    pub fn is_root_file(&self, name: &str) -> bool {
        self.root_files.iter().any(|f| f == name)
    }

    pub fn is_excluded_dir(&self, name: &str) -> bool {
        self.excluded_dirs.iter().any(|d| d == name)
    }

    /// Link text ending in one of these is treated as an embedded image
    pub fn is_image_link(&self, text: &str) -> bool {
        self.asset_extensions.iter().any(|ext| {
            text.len() > ext.len() + 1
                && text.ends_with(ext.as_str())
                && text[..text.len() - ext.len()].ends_with('.')
        })
    }
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| e == ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = ExportConfig::default();

        assert_eq!(config.output_dir, "exportFiles");
        assert_eq!(config.sidebar_indent, 6);
        assert!(config.is_root_file("_quarto.yml"));
        assert!(config.is_excluded_dir(".obsidian"));
        assert_eq!(config.markers.ignored_file, "<!--IGNORED_FILE-->");
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = ExportConfig::from_yaml(
            r#"
sidebar_indent: 2
markers:
  template_trigger: "DECK"
"#,
        )
        .unwrap();

        assert_eq!(config.sidebar_indent, 2);
        assert_eq!(config.markers.template_trigger, "DECK");
        assert_eq!(config.markers.tags_open, "<!--TAGS-->");
        assert_eq!(config.output_dir, "exportFiles");
    }

    #[test]
    fn test_empty_yaml_is_default() {
        let config = ExportConfig::from_yaml("   \n").unwrap();
        assert_eq!(config.content_extensions, vec!["md", "markdown"]);
    }

    #[test]
    fn test_rejects_nested_output_dir() {
        let result = ExportConfig::from_yaml("output_dir: out/nested\n");
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue {
                field: "output_dir",
                ..
            })
        ));
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(matches!(
            ExportConfig::from_yaml("sidebar_indent: [unclosed"),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_extension_checks() {
        let config = ExportConfig::default();

        assert!(config.is_content_file(Path::new("notes/a.md")));
        assert!(!config.is_content_file(Path::new("notes/a.txt")));
        assert!(config.is_asset_file(Path::new("img/a.png")));
        assert!(!config.is_asset_file(Path::new("png")));
    }

    #[test]
    fn test_image_link_detection() {
        let config = ExportConfig::default();

        assert!(config.is_image_link("diagram.png"));
        assert!(config.is_image_link("photo.jpg"));
        assert!(!config.is_image_link("notes about png"));
        assert!(!config.is_image_link(".png"));
        assert!(!config.is_image_link("Page"));
    }
}
