//! watchfor: run a command on an interval until its outcome says stop.

use anyhow::{Context, Result};
use clap::{ArgGroup, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{
    layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry,
};
use watchfor::{
    cli::{self, CliOverrides},
    config::{CallbackConfig, EventFormat, CONFIG_FILE_NAMES},
    watch::{parse_duration, WatchMode},
};

#[derive(Parser)]
#[command(name = "watchfor")]
#[command(version)]
#[command(about = "Run a command repeatedly and react when its outcome changes", long_about = None)]
#[command(group(
    ArgGroup::new("mode")
        .args(["success", "fail", "change", "monitor"])
        .multiple(false)
))]
#[command(after_help = "EXIT CODES:
    0  The watched condition was met
    1  Timeout, iteration budget exhausted, interrupt, or error

EXAMPLES:
    # Wait until a port accepts connections, give up after a minute
    watchfor -c 'nc -z localhost 5432' -t 60 -p

    # Report every state change of a health check, forever
    watchfor -c 'curl -sf localhost:8080/health' -m -a 'echo changed'

    # Stop after the command flapped three times
    watchfor -c './probe.sh' -g -l 3 -i 500ms")]
struct Cli {
    /// Command to watch (run through the shell)
    #[arg(short = 'c', long = "command", visible_alias = "cmd")]
    command: Option<String>,

    /// Interval between runs: seconds (1, 0.5) or suffixed (500ms, 2s, 1m)
    #[arg(short, long, value_parser = parse_duration_arg)]
    interval: Option<Duration>,

    /// Stop with the timeout callback after this long
    #[arg(short, long, value_parser = parse_duration_arg)]
    timeout: Option<Duration>,

    /// Stop with the overcount callback after this many runs
    #[arg(short = 'n', long)]
    count: Option<u64>,

    /// Number of outcome changes before a change watch resolves
    #[arg(short = 'l', long)]
    flappings: Option<u64>,

    /// Stop when the command succeeds (default)
    #[arg(short, long, visible_alias = "true")]
    success: bool,

    /// Stop when the command fails
    #[arg(short, long, visible_alias = "false")]
    fail: bool,

    /// Stop when the outcome changes
    #[arg(short = 'g', long)]
    change: bool,

    /// Never stop on outcome; only budgets end the run
    #[arg(short, long, visible_alias = "mon")]
    monitor: bool,

    /// Run on a success event
    #[arg(short = 'x', long)]
    success_command: Option<String>,

    /// Run on a fail event
    #[arg(short = 'u', long)]
    fail_command: Option<String>,

    /// Run on a change event
    #[arg(short = 'a', long)]
    change_command: Option<String>,

    /// Run when the timeout is reached
    #[arg(short = 'o', long)]
    timeout_command: Option<String>,

    /// Run when the iteration budget is exhausted
    #[arg(short = 'w', long)]
    overcount_command: Option<String>,

    /// Run before every iteration
    #[arg(short = 'b', long)]
    heartbeat_command: Option<String>,

    /// Print progress (repeat for one line per run)
    #[arg(short, long, action = clap::ArgAction::Count)]
    progress: u8,

    /// Disable progress output, including progress set in the config file
    #[arg(long, conflicts_with = "progress")]
    no_progress: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Event stream format
    #[arg(long, value_enum)]
    format: Option<EventFormat>,

    /// Append the event stream to this file instead of stdout
    #[arg(long)]
    output_file: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    subcommand: Option<Commands>,
}

impl Cli {
    fn mode(&self) -> Option<WatchMode> {
        if self.success {
            Some(WatchMode::Success)
        } else if self.fail {
            Some(WatchMode::Fail)
        } else if self.change {
            Some(WatchMode::Change)
        } else if self.monitor {
            Some(WatchMode::Monitor)
        } else {
            None
        }
    }

    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            command: self.command.clone(),
            interval: self.interval,
            timeout: self.timeout,
            count: self.count,
            flappings: self.flappings,
            mode: self.mode(),
            callbacks: CallbackConfig {
                on_success: self.success_command.clone(),
                on_fail: self.fail_command.clone(),
                on_change: self.change_command.clone(),
                on_timeout: self.timeout_command.clone(),
                on_overcount: self.overcount_command.clone(),
                on_heartbeat: self.heartbeat_command.clone(),
            },
            progress: if self.no_progress {
                Some(0)
            } else {
                (self.progress > 0).then_some(self.progress)
            },
            verbosity: (self.verbose > 0).then_some(self.verbose),
            format: self.format,
            output_file: self.output_file.clone(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Generate JSON Schema for the config file format
    ConfigSchema {
        /// Write schema to file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show, discover, or initialize configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Sub-subcommands for the `config` command
#[derive(Subcommand)]
enum ConfigAction {
    /// Print current effective configuration (merged from defaults + file + flags)
    Show,
    /// Print config file search paths and discovered config file
    Path,
    /// Generate an example .watchfor.yaml in the current directory
    Init,
}

fn parse_duration_arg(s: &str) -> std::result::Result<Duration, String> {
    parse_duration(s).map_err(|e| e.to_string())
}

const fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the stderr subscriber. The returned handle retunes the level once
/// the config file is known; it is `None` when `RUST_LOG` decides the level.
fn init_logging(verbosity: u8) -> Option<reload::Handle<EnvFilter, Registry>> {
    let from_env = std::env::var("RUST_LOG").ok();
    let filter = EnvFilter::new(
        from_env
            .clone()
            .unwrap_or_else(|| level_for(verbosity).to_string()),
    );
    let (filter, handle) = reload::Layer::new(filter);
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();

    from_env.is_none().then_some(handle)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_handle = init_logging(cli.verbose);
    let overrides = cli.overrides();

    match cli.subcommand {
        None => {
            let (config, loaded_from) = cli::resolve_config(cli.config.as_deref(), &overrides)?;
            if let Some(path) = &loaded_from {
                tracing::info!("Loaded config from {}", path.display());
            }
            if let Some(handle) = log_handle {
                if config.output.verbosity != cli.verbose {
                    let level = level_for(config.output.verbosity);
                    if let Err(e) = handle.reload(EnvFilter::new(level)) {
                        tracing::warn!("Could not apply log level {level}: {e}");
                    }
                }
            }

            if config.watch.command.is_none() {
                Cli::command().print_help()?;
                return Ok(());
            }

            let code = cli::run_watch(&config)?;
            if code != 0 {
                std::process::exit(code);
            }
            Ok(())
        }

        Some(Commands::Completions { shell }) => {
            generate(shell, &mut Cli::command(), "watchfor", &mut io::stdout());
            Ok(())
        }

        Some(Commands::ConfigSchema { output }) => {
            let schema = watchfor::config::generate_json_schema();
            match output {
                Some(path) => {
                    std::fs::write(&path, &schema)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    eprintln!("Schema written to {}", path.display());
                }
                None => {
                    println!("{schema}");
                }
            }
            Ok(())
        }

        Some(Commands::Config { action }) => match action {
            ConfigAction::Show => {
                let (config, loaded_from) =
                    cli::resolve_config(cli.config.as_deref(), &overrides)?;
                if let Some(path) = &loaded_from {
                    eprintln!("# Loaded from: {}", path.display());
                } else {
                    eprintln!("# No config file found; showing defaults");
                }
                let yaml = serde_yaml::to_string(&config).context("failed to serialize config")?;
                print!("{yaml}");
                Ok(())
            }
            ConfigAction::Path => {
                eprintln!("Config file search paths (in order):");
                for path in watchfor::config::config_search_paths() {
                    eprintln!("  {}", path.display());
                }
                eprintln!();
                eprintln!("Recognized file names:");
                for name in CONFIG_FILE_NAMES {
                    eprintln!("  {name}");
                }
                eprintln!();
                match watchfor::config::discover_config_file(cli.config.as_deref()) {
                    Some(path) => eprintln!("Active config file: {}", path.display()),
                    None => eprintln!("No config file found."),
                }
                Ok(())
            }
            ConfigAction::Init => {
                let target = std::env::current_dir()
                    .context("cannot determine current directory")?
                    .join(".watchfor.yaml");
                if target.exists() {
                    anyhow::bail!(
                        "{} already exists. Remove it first to re-initialize.",
                        target.display()
                    );
                }
                let content = watchfor::config::generate_full_example_config();
                std::fs::write(&target, content)
                    .with_context(|| format!("failed to write {}", target.display()))?;
                eprintln!("Created {}", target.display());
                Ok(())
            }
        },
    }
}
