use crate::config::{CliOverrides, Config};
use crate::error::Result;
use crate::ui::OutputMode;
use clap::{Args, Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "site-copy")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Copy local files referenced by a window of a site list")]
#[command(
    long_about = "Scans the sites between two marker keys of a site document for local \
                  ./ and ../ paths in their api and ext fields, and copies those files \
                  from the source root into the destination root."
)]
#[command(after_help = "EXAMPLES:\n  \
    site-copy jsm_with_app_sites.json\n  \
    site-copy api.json --start cbh --end 奇优 --source-root ../xiaosa --dest-root .\n  \
    site-copy api.json --dry-run --output-format json")]
pub struct CopyCli {
    /// Site document to scan
    #[arg(required_unless_present = "generate_config")]
    pub document: Option<PathBuf>,

    /// Key of the entry that opens the scanned window
    #[arg(long, help = "Key of the entry that opens the scanned window")]
    pub start: Option<String>,

    /// Key of the entry that closes the scanned window
    #[arg(long, help = "Key of the entry that closes the scanned window")]
    pub end: Option<String>,

    /// Directory the referenced files are copied from
    #[arg(long)]
    pub source_root: Option<PathBuf>,

    /// Directory the referenced files are copied into
    #[arg(long)]
    pub dest_root: Option<PathBuf>,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Parser, Debug)]
#[command(name = "site-merge")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Merge one site list into another")]
#[command(
    long_about = "Merges the sites of SOURCE into BASE right after the marker entry, \
                  dropping excluded keys and names BASE already has, then refreshes the \
                  spider checksum and writes <base>_with_app_sites.json."
)]
#[command(after_help = "EXAMPLES:\n  \
    site-merge ../xiaosa/api.json dianshi.json\n  \
    site-merge api.json dianshi.json --marker cbh --exclude-key 豆瓣\n  \
    site-merge api.json dianshi.json --output merged.json --dry-run")]
pub struct MergeCli {
    /// Source site document (local path)
    #[arg(required_unless_present = "generate_config")]
    pub source: Option<String>,

    /// Base site document the sources are merged into
    #[arg(required_unless_present = "generate_config")]
    pub base: Option<PathBuf>,

    /// Output file (defaults to <base>_with_app_sites.json next to the base)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Key of the base entry the sources are inserted after
    #[arg(long)]
    pub marker: Option<String>,

    /// Additional source key to drop (repeatable)
    #[arg(long = "exclude-key", value_name = "KEY")]
    pub exclude_keys: Vec<String>,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Configuration file path
    #[arg(short, long, help = "Path to TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    /// Verbose output level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Dry run (show what would be done without writing anything)
    #[arg(long, help = "Show what would be done without writing any file")]
    pub dry_run: bool,

    /// Generate sample configuration file
    #[arg(long, help = "Generate a sample configuration file")]
    pub generate_config: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    #[default]
    Human,
    /// JSON formatted output
    Json,
    /// Plain text output
    Plain,
}

impl From<OutputFormat> for OutputMode {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Human => OutputMode::Human,
            OutputFormat::Json => OutputMode::Json,
            OutputFormat::Plain => OutputMode::Plain,
        }
    }
}

impl CommonArgs {
    pub fn load_config(&self, overrides: &CliOverrides) -> Result<Config> {
        let mut config = Config::load_with_defaults(self.config.as_ref())?;
        config.merge_with_cli_args(overrides);
        config.validate()?;
        Ok(config)
    }

    pub fn config_path_or_default(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| PathBuf::from("sitekit.toml"))
    }

    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }
}

impl CopyCli {
    pub fn create_cli_overrides(&self) -> CliOverrides {
        CliOverrides::new()
            .with_start_key(self.start.clone())
            .with_end_key(self.end.clone())
            .with_source_root(self.source_root.clone())
            .with_dest_root(self.dest_root.clone())
    }

    pub fn load_config(&self) -> Result<Config> {
        self.common.load_config(&self.create_cli_overrides())
    }
}

impl MergeCli {
    pub fn create_cli_overrides(&self) -> CliOverrides {
        let exclude = if self.exclude_keys.is_empty() {
            None
        } else {
            Some(self.exclude_keys.clone())
        };

        CliOverrides::new()
            .with_marker_key(self.marker.clone())
            .with_remove_keys(exclude)
    }

    pub fn load_config(&self) -> Result<Config> {
        self.common.load_config(&self.create_cli_overrides())
    }
}

/// Diagnostics go to stderr; `RUST_LOG` takes precedence over `-v`.
pub fn init_tracing(verbose: u8) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = match verbose {
        0 => "sitekit=warn",
        1 => "sitekit=debug",
        _ => "sitekit=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    let _ = fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
