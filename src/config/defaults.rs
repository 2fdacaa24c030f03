//! Default values for watchfor configuration.

use std::time::Duration;

/// Seconds between iterations when no interval is given.
pub const DEFAULT_INTERVAL_SECS: f64 = 1.0;

/// [`DEFAULT_INTERVAL_SECS`] as a [`Duration`].
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Config file names searched for, in order.
pub const CONFIG_FILE_NAMES: &[&str] = &[
    ".watchfor.yaml",
    ".watchfor.yml",
    "watchfor.yaml",
    "watchfor.yml",
];

/// Directory under the user config dir that may hold a config file.
pub const CONFIG_DIR_NAME: &str = "watchfor";
