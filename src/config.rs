use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::coverage::ImportFormat;
use crate::error::{ReportError, Result};

pub const DEFAULT_COVER_DATA: &str = "all.coverdata";
pub const DEFAULT_OUTPUT: &str = "coverage.xml";
pub const DEFAULT_SOURCE_DIR: &str = "src/";
pub const DEFAULT_APP_NAME: &str = "Application";
pub const DEFAULT_EXTENSION: &str = "erl";

/// Optional settings from one source (command line or config file).
///
/// `None` means the source did not set the value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigLayer {
    #[serde(default)]
    pub cover: Option<PathBuf>,
    #[serde(default)]
    pub output: Option<PathBuf>,
    #[serde(default)]
    pub src: Option<PathBuf>,
    #[serde(default)]
    pub appname: Option<String>,
    #[serde(default)]
    pub format: Option<ImportFormat>,
    #[serde(default)]
    pub extension: Option<String>,
    /// Minimum overall line coverage, in percent
    #[serde(default)]
    pub fail_under: Option<f64>,
}

impl ConfigLayer {
    /// Values set here win over `fallback`
    pub fn or(self, fallback: ConfigLayer) -> ConfigLayer {
        ConfigLayer {
            cover: self.cover.or(fallback.cover),
            output: self.output.or(fallback.output),
            src: self.src.or(fallback.src),
            appname: self.appname.or(fallback.appname),
            format: self.format.or(fallback.format),
            extension: self.extension.or(fallback.extension),
            fail_under: self.fail_under.or(fallback.fail_under),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    report: ConfigLayer,
}

/// Load the `[report]` table of a TOML config file
pub fn load_config_file(path: &Path) -> Result<ConfigLayer> {
    let content = fs::read_to_string(path).map_err(|e| {
        ReportError::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;

    let file: ConfigFile = toml::from_str(&content).map_err(|e| {
        ReportError::Config(format!("Failed to parse {}: {}", path.display(), e))
    })?;

    Ok(file.report)
}

/// Settings for one run, fixed after startup
#[derive(Debug, Clone, PartialEq)]
pub struct ReportConfig {
    /// Informational; only read by the importer
    pub cover_data: PathBuf,
    pub output: PathBuf,
    pub source_dir: PathBuf,
    /// Name of the single package
    pub app_name: String,
    pub format: ImportFormat,
    pub extension: String,
    pub fail_under: Option<f64>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            cover_data: PathBuf::from(DEFAULT_COVER_DATA),
            output: PathBuf::from(DEFAULT_OUTPUT),
            source_dir: PathBuf::from(DEFAULT_SOURCE_DIR),
            app_name: DEFAULT_APP_NAME.to_string(),
            format: ImportFormat::default(),
            extension: DEFAULT_EXTENSION.to_string(),
            fail_under: None,
        }
    }
}

impl ReportConfig {
    /// Fill unset values with defaults and validate the result
    pub fn from_layer(layer: ConfigLayer) -> Result<Self> {
        let defaults = ReportConfig::default();

        let config = ReportConfig {
            cover_data: layer.cover.unwrap_or(defaults.cover_data),
            output: layer.output.unwrap_or(defaults.output),
            source_dir: layer.src.unwrap_or(defaults.source_dir),
            app_name: layer.appname.unwrap_or(defaults.app_name),
            format: layer.format.unwrap_or(defaults.format),
            extension: layer.extension.unwrap_or(defaults.extension),
            fail_under: layer.fail_under,
        };

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.app_name.trim().is_empty() {
            return Err(ReportError::Config("appname must not be empty".to_string()));
        }

        if self.extension.trim_start_matches('.').is_empty() {
            return Err(ReportError::Config("extension must not be empty".to_string()));
        }

        if let Some(threshold) = self.fail_under {
            if !(0.0..=100.0).contains(&threshold) {
                return Err(ReportError::Config(format!(
                    "fail_under must be between 0 and 100, got {}",
                    threshold
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = ReportConfig::from_layer(ConfigLayer::default()).unwrap();

        assert_eq!(config.cover_data, PathBuf::from("all.coverdata"));
        assert_eq!(config.output, PathBuf::from("coverage.xml"));
        assert_eq!(config.source_dir, PathBuf::from("src/"));
        assert_eq!(config.app_name, "Application");
        assert_eq!(config.format, ImportFormat::Lcov);
        assert_eq!(config.fail_under, None);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[report]
cover = "cover/eunit.info"
src = "apps"
appname = "billing"
format = "cobertura"
fail_under = 80.0
"#;

        let file: ConfigFile = toml::from_str(toml_content).unwrap();
        let config = ReportConfig::from_layer(file.report).unwrap();

        assert_eq!(config.cover_data, PathBuf::from("cover/eunit.info"));
        assert_eq!(config.source_dir, PathBuf::from("apps"));
        assert_eq!(config.app_name, "billing");
        assert_eq!(config.format, ImportFormat::Cobertura);
        assert_eq!(config.output, PathBuf::from("coverage.xml"));
        assert_eq!(config.fail_under, Some(80.0));
    }

    #[test]
    fn test_command_line_wins_over_file() {
        let cli = ConfigLayer {
            appname: Some("cli".to_string()),
            ..Default::default()
        };
        let file = ConfigLayer {
            appname: Some("file".to_string()),
            output: Some(PathBuf::from("out.xml")),
            ..Default::default()
        };

        let config = ReportConfig::from_layer(cli.or(file)).unwrap();
        assert_eq!(config.app_name, "cli");
        assert_eq!(config.output, PathBuf::from("out.xml"));
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("coberturize.toml");
        fs::write(&path, "[report]\ncolour = \"red\"\n").unwrap();

        assert!(matches!(load_config_file(&path), Err(ReportError::Config(_))));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let threshold = ConfigLayer {
            fail_under: Some(120.0),
            ..Default::default()
        };
        assert!(ReportConfig::from_layer(threshold).is_err());

        let name = ConfigLayer {
            appname: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(ReportConfig::from_layer(name).is_err());

        let extension = ConfigLayer {
            extension: Some(".".to_string()),
            ..Default::default()
        };
        assert!(ReportConfig::from_layer(extension).is_err());
    }

    #[test]
    fn test_missing_config_file() {
        let dir = tempdir().unwrap();
        assert!(load_config_file(&dir.path().join("absent.toml")).is_err());
    }
}
