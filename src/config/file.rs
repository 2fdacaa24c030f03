//! Configuration file loading and discovery.
//!
//! Supports loading configuration from YAML files with automatic discovery.

use super::defaults::{CONFIG_DIR_NAME, CONFIG_FILE_NAMES};
use super::types::AppConfig;
use std::path::{Path, PathBuf};

// ============================================================================
// Configuration File Discovery
// ============================================================================

/// Discover a config file by searching standard locations.
///
/// Search order:
/// 1. Explicit path if provided
/// 2. Current directory
/// 3. Git repository root (if in a repo)
/// 4. User config directory (~/.config/watchfor/)
/// 5. Home directory
#[must_use]
pub fn discover_config_file(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        if path.exists() {
            return Some(path.to_path_buf());
        }
    }

    let cwd = std::env::current_dir().ok();
    let candidates = [
        cwd.clone(),
        cwd.as_deref().and_then(find_git_root),
        dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME)),
        dirs::home_dir(),
    ];

    candidates
        .iter()
        .flatten()
        .find_map(|dir| find_config_in_dir(dir))
}

/// Directories searched by [`discover_config_file`], in order.
#[must_use]
pub fn config_search_paths() -> Vec<PathBuf> {
    let cwd = std::env::current_dir().ok();
    [
        cwd.clone(),
        cwd.as_deref().and_then(find_git_root),
        dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME)),
        dirs::home_dir(),
    ]
    .into_iter()
    .flatten()
    .collect()
}

fn find_config_in_dir(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.exists())
}

/// Walk up from `start` to the first directory containing `.git`.
fn find_git_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
}

// ============================================================================
// Configuration File Loading
// ============================================================================

/// Error type for config file operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigFileError {
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Load an `AppConfig` from a YAML file.
pub fn load_config_file(path: &Path) -> Result<AppConfig, ConfigFileError> {
    if !path.exists() {
        return Err(ConfigFileError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)?;
    let config: AppConfig = serde_yaml::from_str(&content)?;
    Ok(config)
}

/// Load config from the discovered file, or return defaults.
///
/// An explicitly requested file that fails to load is an error; a discovered
/// one that fails is logged and skipped.
pub fn load_or_default(
    explicit_path: Option<&Path>,
) -> Result<(AppConfig, Option<PathBuf>), ConfigFileError> {
    if let Some(path) = explicit_path {
        return load_config_file(path).map(|config| (config, Some(path.to_path_buf())));
    }

    Ok(discover_config_file(None).map_or_else(
        || (AppConfig::default(), None),
        |path| match load_config_file(&path) {
            Ok(config) => {
                tracing::debug!("Loaded config from {}", path.display());
                (config, Some(path))
            }
            Err(e) => {
                tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                (AppConfig::default(), None)
            }
        },
    ))
}

// ============================================================================
// Example Config Generation
// ============================================================================

/// Generate a commented example config with all options.
#[must_use]
pub fn generate_full_example_config() -> String {
    r#"# watchfor configuration file
# ============================
#
# Place it at:
#   - .watchfor.yaml in your project root
#   - ~/.config/watchfor/watchfor.yaml for global config
#
# CLI arguments always override file settings.

watch:
  # Command to run on every iteration
  # command: "curl -sf http://localhost:8080/health"
  # Seconds between iterations
  interval: 1.0
  # Stop with a timeout event after this many seconds
  # timeout: 60
  # Stop with an overcount event after this many iterations
  # count: 100
  # Transitions required before a change run resolves
  # flappings: 2
  # success, fail, change or monitor
  mode: success

# Commands run when events fire. They receive WATCHFOR_EVENT, WATCHFOR_MODE,
# WATCHFOR_ITERATION, WATCHFOR_ELAPSED, WATCHFOR_OUTCOME, WATCHFOR_FLAPPINGS
# and WATCHFOR_COMMAND in their environment.
#
# callbacks:
#   on_success: "echo up"
#   on_fail: "echo down"
#   on_change: "echo changed"
#   on_timeout: "echo timed out"
#   on_overcount: "echo gave up"
#   on_heartbeat: "date"
callbacks: {}

output:
  # 1 prints . or ! per iteration, 2 prints a status line
  progress: 0
  # 0 warn, 1 info, 2 debug, 3 trace
  verbosity: 0
  # text or json (NDJSON event stream)
  format: text
  # file: events.ndjson
"#
    .to_string()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::watch::WatchMode;
    use tempfile::TempDir;

    #[test]
    fn test_find_config_in_dir() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join(".watchfor.yaml");
        std::fs::write(&config_path, "watch:\n  mode: fail\n").unwrap();

        assert_eq!(find_config_in_dir(tmp.path()), Some(config_path));
    }

    #[test]
    fn test_find_config_in_dir_not_found() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(find_config_in_dir(tmp.path()), None);
    }

    #[test]
    fn test_find_git_root() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join(".git")).unwrap();
        let nested = tmp.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();
        assert_eq!(find_git_root(&nested), Some(tmp.path().to_path_buf()));
    }

    #[test]
    fn test_load_config_file() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.yaml");
        let yaml = r#"
watch:
  command: "test -f /tmp/ready"
  interval: 0.25
  count: 40
  mode: change
  flappings: 3
callbacks:
  on_change: "echo flipped"
output:
  format: json
"#;
        std::fs::write(&config_path, yaml).unwrap();

        let config = load_config_file(&config_path).unwrap();
        assert_eq!(config.watch.command.as_deref(), Some("test -f /tmp/ready"));
        assert_eq!(config.watch.interval, 0.25);
        assert_eq!(config.watch.count, Some(40));
        assert_eq!(config.watch.flappings, Some(3));
        assert_eq!(config.watch.mode, WatchMode::Change);
        assert_eq!(config.callbacks.on_change.as_deref(), Some("echo flipped"));
        assert_eq!(config.output.format, crate::config::EventFormat::Json);
        assert!(config.watch.timeout.is_none());
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config_file(Path::new("/nonexistent/config.yaml"));
        assert!(matches!(result, Err(ConfigFileError::NotFound(_))));
    }

    #[test]
    fn test_load_config_file_bad_mode() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.yaml");
        std::fs::write(&config_path, "watch:\n  mode: sometimes\n").unwrap();
        assert!(matches!(
            load_config_file(&config_path),
            Err(ConfigFileError::Parse(_))
        ));
    }

    #[test]
    fn test_load_or_default_explicit_missing_is_error() {
        assert!(load_or_default(Some(Path::new("/nonexistent/watchfor.yaml"))).is_err());
    }

    #[test]
    fn test_full_example_config_parses() {
        let config: AppConfig = serde_yaml::from_str(&generate_full_example_config()).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_discover_explicit_path() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("custom.yaml");
        std::fs::write(&config_path, "watch:\n  interval: 2\n").unwrap();
        assert_eq!(discover_config_file(Some(&config_path)), Some(config_path));
    }
}
