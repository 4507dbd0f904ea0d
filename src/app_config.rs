//! Application configuration loading for CLI defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use mtv_core::Quality;

/// TOML-backed file configuration for mtv defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    /// Directory downloads are written to.
    pub target_dir: Option<PathBuf>,
    /// Requested download quality.
    pub quality: Option<Quality>,
    /// Records older than this many days are not stored (0 keeps all).
    pub max_age_days: Option<u32>,
    /// Records shorter than this many minutes are not stored.
    pub min_duration_minutes: Option<u32>,
    /// Default verbosity mode.
    pub verbosity: Option<VerbositySetting>,
    /// Feed fetched by `update --source auto`.
    pub feed_url: Option<String>,
    /// Database file.
    pub database: Option<PathBuf>,
}

/// Supported config verbosity labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbositySetting {
    Default,
    Verbose,
    Quiet,
    Debug,
}

impl VerbositySetting {
    /// Returns the tracing filter directive for this setting.
    #[must_use]
    pub fn log_level(self) -> &'static str {
        match self {
            Self::Default => "info",
            Self::Verbose | Self::Debug => "debug",
            Self::Quiet => "error",
        }
    }
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/mtv/config.toml`
/// 2. `$HOME/.config/mtv/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg_config_home).join("mtv").join("config.toml"));
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("mtv")
            .join("config.toml"),
    )
}

/// Resolves the default database path.
///
/// Priority:
/// 1. `$XDG_DATA_HOME/mtv/filme.sqlite`
/// 2. `$HOME/.local/share/mtv/filme.sqlite`
/// 3. `./filme.sqlite`
#[must_use]
pub fn resolve_default_database_path() -> PathBuf {
    if let Some(xdg_data_home) = env_var_non_empty_os("XDG_DATA_HOME") {
        return PathBuf::from(xdg_data_home).join("mtv").join(DATABASE_FILE);
    }
    env_var_non_empty_os("HOME").map_or_else(
        || PathBuf::from(DATABASE_FILE),
        |home| {
            PathBuf::from(home)
                .join(".local")
                .join("share")
                .join("mtv")
                .join(DATABASE_FILE)
        },
    )
}

const DATABASE_FILE: &str = "filme.sqlite";

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads the config file.
///
/// An explicit path must exist. Without one the default path is used when
/// present, otherwise an empty config is returned.
pub fn load_file_config(explicit: Option<&Path>) -> Result<FileConfig> {
    if let Some(path) = explicit {
        return read_file_config(path);
    }
    match resolve_default_config_path() {
        Some(path) if path.exists() => read_file_config(&path),
        _ => Ok(FileConfig::default()),
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line_number = line_index + 1;
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() || line.starts_with('[') {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!("Invalid config syntax on line {line_number}: expected key = value");
        };

        let key = raw_key.trim();
        let value = raw_value.trim();
        let invalid = || format!("Invalid `{key}` value on line {line_number}");

        match key {
            "target_dir" => {
                cfg.target_dir = Some(PathBuf::from(
                    parse_string_literal(value).with_context(invalid)?,
                ));
            }
            "quality" => {
                let parsed = parse_string_literal(value).with_context(invalid)?;
                let quality = parsed
                    .parse::<Quality>()
                    .map_err(anyhow::Error::msg)
                    .with_context(invalid)?;
                cfg.quality = Some(quality);
            }
            "max_age_days" => {
                cfg.max_age_days = Some(parse_integer_u32(value).with_context(invalid)?);
            }
            "min_duration_minutes" => {
                cfg.min_duration_minutes = Some(parse_integer_u32(value).with_context(invalid)?);
            }
            "verbosity" => {
                let parsed = parse_string_literal(value).with_context(invalid)?;
                cfg.verbosity = Some(parse_verbosity(&parsed).with_context(|| {
                    format!("Invalid `verbosity` value '{parsed}' on line {line_number}")
                })?);
            }
            "feed_url" => {
                cfg.feed_url = Some(parse_string_literal(value).with_context(invalid)?);
            }
            "database" => {
                cfg.database = Some(PathBuf::from(
                    parse_string_literal(value).with_context(invalid)?,
                ));
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_number}");
            }
        }
    }
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_integer_u32(raw_value: &str) -> Result<u32> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i64>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u32::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u32"))
}

fn parse_verbosity(value: &str) -> Result<VerbositySetting> {
    match value {
        "default" => Ok(VerbositySetting::Default),
        "verbose" => Ok(VerbositySetting::Verbose),
        "quiet" => Ok(VerbositySetting::Quiet),
        "debug" => Ok(VerbositySetting::Debug),
        _ => bail!("Expected one of: default, verbose, quiet, debug"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config_all_fields() {
        let cfg = parse_config_str(
            r#"
target_dir = "/srv/videos"
quality = "SD"
max_age_days = 30
min_duration_minutes = 10
verbosity = "verbose"
feed_url = "https://mirror.example.de/Filmliste-akt.xz"
database = "/var/lib/mtv/filme.sqlite"
"#,
        )
        .unwrap();
        assert_eq!(cfg.target_dir, Some(PathBuf::from("/srv/videos")));
        assert_eq!(cfg.quality, Some(Quality::Sd));
        assert_eq!(cfg.max_age_days, Some(30));
        assert_eq!(cfg.min_duration_minutes, Some(10));
        assert_eq!(cfg.verbosity, Some(VerbositySetting::Verbose));
        assert_eq!(
            cfg.feed_url.as_deref(),
            Some("https://mirror.example.de/Filmliste-akt.xz")
        );
        assert_eq!(cfg.database, Some(PathBuf::from("/var/lib/mtv/filme.sqlite")));
    }

    #[test]
    fn test_parse_config_partial_fields() {
        let cfg = parse_config_str("quality = \"hd\"\n").unwrap();
        assert_eq!(cfg.quality, Some(Quality::Hd));
        assert!(cfg.target_dir.is_none());
        assert!(cfg.verbosity.is_none());
    }

    #[test]
    fn test_parse_config_supports_comments_and_sections() {
        let cfg = parse_config_str(
            r#"
# mtv settings
[config]
max_age_days = 7 # one week
feed_url = "https://mirror.example.de/#list" # hash inside string
"#,
        )
        .unwrap();
        assert_eq!(cfg.max_age_days, Some(7));
        assert_eq!(cfg.feed_url.as_deref(), Some("https://mirror.example.de/#list"));
    }

    #[test]
    fn test_parse_config_rejects_unknown_keys_with_line() {
        let err = parse_config_str("quality = \"HD\"\nziel = \"x\"").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Unknown configuration key"));
        assert!(message.contains("ziel"));
        assert!(message.contains("line 2"));
    }

    #[test]
    fn test_parse_config_rejects_invalid_quality() {
        let err = parse_config_str("quality = \"4K\"").unwrap_err();
        assert!(err.to_string().contains("quality"));
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_parse_config_rejects_negative_integer() {
        let err = parse_config_str("max_age_days = -1").unwrap_err();
        assert!(err.to_string().contains("max_age_days"));
    }

    #[test]
    fn test_parse_config_rejects_unquoted_string() {
        let err = parse_config_str("target_dir = /srv/videos").unwrap_err();
        assert!(err.to_string().contains("target_dir"));
    }

    #[test]
    fn test_parse_config_rejects_missing_equals() {
        let err = parse_config_str("\n\nquality").unwrap_err();
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn test_parse_config_rejects_invalid_verbosity() {
        let err = parse_config_str("verbosity = \"loud\"").unwrap_err();
        assert!(err.to_string().contains("verbosity"));
    }

    #[test]
    fn test_verbosity_log_level() {
        assert_eq!(VerbositySetting::Default.log_level(), "info");
        assert_eq!(VerbositySetting::Verbose.log_level(), "debug");
        assert_eq!(VerbositySetting::Quiet.log_level(), "error");
        assert_eq!(VerbositySetting::Debug.log_level(), "debug");
    }

    #[test]
    fn test_load_file_config_explicit_path_must_exist() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = load_file_config(Some(&dir.path().join("missing.toml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_load_file_config_reads_explicit_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "min_duration_minutes = 15\n").unwrap();
        let cfg = load_file_config(Some(&path)).unwrap();
        assert_eq!(cfg.min_duration_minutes, Some(15));
    }
}
