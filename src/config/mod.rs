//! Configuration module for watchfor.
//!
//! - Type-safe configuration structures with serde and JSON Schema support
//! - Validation for all configuration values
//! - YAML config file loading and discovery
//!
//! # Configuration File
//!
//! Place a `.watchfor.yaml` file in your project root or `~/.config/watchfor/`:
//!
//! ```yaml
//! watch:
//!   command: "pg_isready -h db"
//!   interval: 2
//!   timeout: 120
//! callbacks:
//!   on_success: "echo database is up"
//! ```

mod defaults;
pub mod file;
mod types;
mod validation;

pub use defaults::{CONFIG_FILE_NAMES, DEFAULT_INTERVAL, DEFAULT_INTERVAL_SECS};
pub use file::{
    config_search_paths, discover_config_file, generate_full_example_config, load_config_file,
    load_or_default, ConfigFileError,
};
pub use types::{
    AppConfig, AppConfigBuilder, CallbackConfig, EventFormat, OutputConfig, WatchSettings,
};
pub use validation::{ConfigError, Validatable};

/// Generate a JSON Schema for the `AppConfig` configuration format.
#[must_use]
pub fn generate_json_schema() -> String {
    let schema = schemars::schema_for!(AppConfig);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}
