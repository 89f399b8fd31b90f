use crate::error::ErrorCode;
use crate::ics::ExportOptions;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Snapshot key used when the config does not name one.
pub const DEFAULT_SNAPSHOT_FILE: &str = "jobtrail-state.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub export: ExportOptions,
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    #[serde(default = "default_snapshot_file")]
    pub snapshot_file: String,
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            snapshot_file: default_snapshot_file(),
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

impl StoreConfig {
    #[must_use]
    pub const fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

/// Config plus the values resolved from the environment and terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub config: Config,
    pub config_path: Option<PathBuf>,
    pub data_dir: PathBuf,
    pub resolved_output: String,
}

/// Where the config file lives: `JOBTRAIL_CONFIG` if set, else
/// `<config dir>/jobtrail/config.toml`.
#[must_use]
pub fn config_path() -> Option<PathBuf> {
    if let Some(explicit) = env::var_os("JOBTRAIL_CONFIG").filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(explicit));
    }
    dirs::config_dir().map(|dir| dir.join("jobtrail/config.toml"))
}

/// Parse the config at `path`. A missing file yields defaults.
///
/// # Errors
///
/// Fails when the file cannot be read or is not valid TOML; the message
/// carries the config parse error code.
pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<Config>(&content).with_context(|| {
        format!(
            "{}: Failed to parse {}",
            ErrorCode::ConfigParseError.code(),
            path.display()
        )
    })
}

/// Directory holding the snapshot.
///
/// `JOBTRAIL_DATA_DIR` wins, then the config, then the platform data
/// directory, then `./.jobtrail`.
#[must_use]
pub fn resolve_data_dir(config: &Config, env_dir: Option<String>) -> PathBuf {
    if let Some(dir) = env_dir.filter(|d| !d.trim().is_empty()) {
        return PathBuf::from(dir);
    }
    if let Some(dir) = &config.store.data_dir {
        return dir.clone();
    }
    dirs::data_dir().map_or_else(|| PathBuf::from(".jobtrail"), |dir| dir.join("jobtrail"))
}

/// Load the config and resolve the data directory and output mode.
///
/// # Errors
///
/// Same as [`load_config_from`].
pub fn resolve_config(cli_json: bool) -> Result<EffectiveConfig> {
    let config_path = config_path();
    let config = match &config_path {
        Some(path) => load_config_from(path)?,
        None => Config::default(),
    };

    let data_dir = resolve_data_dir(&config, env::var("JOBTRAIL_DATA_DIR").ok());
    let env_format = env::var("FORMAT").ok();
    let resolved_output = resolve_output(cli_json, config.output.clone(), env_format);

    Ok(EffectiveConfig {
        config,
        config_path,
        data_dir,
        resolved_output,
    })
}

/// Output mode precedence: `--json`, then `FORMAT`, then config, then
/// TTY detection.
#[must_use]
pub fn resolve_output(
    cli_json: bool,
    config_output: Option<String>,
    env_format: Option<String>,
) -> String {
    fn normalize_output_mode(raw: &str) -> Option<&'static str> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" | "human" => Some("pretty"),
            "text" | "table" => Some("text"),
            "json" => Some("json"),
            _ => None,
        }
    }

    if cli_json {
        return "json".to_string();
    }

    if let Some(mode) = env_format.as_deref().and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if let Some(mode) = config_output.as_deref().and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if std::io::stdout().is_terminal() {
        "pretty".to_string()
    } else {
        "text".to_string()
    }
}

fn default_snapshot_file() -> String {
    DEFAULT_SNAPSHOT_FILE.to_string()
}

const fn default_lock_timeout_ms() -> u64 {
    2000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_uses_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = load_config_from(&dir.path().join("config.toml")).expect("load should succeed");
        assert_eq!(cfg.store.snapshot_file, "jobtrail-state.json");
        assert_eq!(cfg.store.lock_timeout(), Duration::from_millis(2000));
        assert_eq!(cfg.export.reminder_minutes, 30);
        assert_eq!(cfg.export.default_duration_minutes, 60);
        assert!(cfg.output.is_none());
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
output = "json"

[store]
data_dir = "/srv/jobtrail"

[export]
reminder_minutes = 15
"#,
        )
        .expect("write config");

        let cfg = load_config_from(&path).expect("parse");
        assert_eq!(cfg.output.as_deref(), Some("json"));
        assert_eq!(cfg.store.data_dir, Some(PathBuf::from("/srv/jobtrail")));
        assert_eq!(cfg.store.snapshot_file, DEFAULT_SNAPSHOT_FILE);
        assert_eq!(cfg.export.reminder_minutes, 15);
        assert_eq!(cfg.export.default_duration_minutes, 60);
        assert_eq!(cfg.export.product_id, ExportOptions::default().product_id);
    }

    #[test]
    fn bad_toml_is_a_config_parse_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[store\nsnapshot_file = ").expect("write config");

        let err = load_config_from(&path).expect_err("should fail");
        assert!(format!("{err:#}").contains("E1001"));
    }

    #[test]
    fn env_data_dir_beats_config() {
        let cfg = Config {
            store: StoreConfig {
                data_dir: Some(PathBuf::from("/from/config")),
                ..StoreConfig::default()
            },
            ..Config::default()
        };
        assert_eq!(
            resolve_data_dir(&cfg, Some("/from/env".into())),
            PathBuf::from("/from/env")
        );
        assert_eq!(resolve_data_dir(&cfg, None), PathBuf::from("/from/config"));
        assert_eq!(
            resolve_data_dir(&cfg, Some("  ".into())),
            PathBuf::from("/from/config")
        );
    }

    #[test]
    fn cli_json_overrides_env_and_config() {
        let output = resolve_output(true, Some("pretty".to_string()), Some("text".to_string()));
        assert_eq!(output, "json");
    }

    #[test]
    fn env_beats_config_and_aliases_normalize() {
        assert_eq!(
            resolve_output(false, Some("table".to_string()), Some("human".to_string())),
            "pretty"
        );
        assert_eq!(
            resolve_output(false, Some("human".to_string()), Some("table".to_string())),
            "text"
        );
        assert_eq!(
            resolve_output(false, Some("json".to_string()), Some("bogus".to_string())),
            "json"
        );
    }
}
