//! Command-line and environment configuration.
//!
//! Priority: CLI flags > environment variables (including a `.env` file,
//! loaded by `main`) > defaults.  [`Config::from_args`] validates ranges and
//! resolves derived paths so the rest of the program only sees final values.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use crate::catalog::SourceSelection;
use crate::source::{aic, harvard};

const DEFAULT_PAGE_SIZE: u32 = 12;
const MAX_PAGE_SIZE: u32 = 100;
const DEFAULT_TIMEOUT_MS: u64 = 15_000;

/// artfeed - browse museum collections from the terminal
///
/// Combines the Art Institute of Chicago and Harvard Art Museums into one
/// infinite-scroll feed and keeps a personal exhibition of favourites.
#[derive(Parser, Debug)]
#[command(name = "artfeed")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Browse museum collections from the terminal", long_about = None)]
pub struct CliArgs {
    /// Which museum to browse: all, aic, harvard
    #[arg(short, long, env = "ARTFEED_SOURCE", default_value = "all",
          value_parser = clap::value_parser!(SourceSelection))]
    pub source: SourceSelection,

    /// Records per page (1-100)
    #[arg(short = 'n', long, env = "ARTFEED_PAGE_SIZE", default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: u32,

    /// Harvard Art Museums API key; without it Harvard is skipped
    #[arg(long, env = "HARVARD_API_KEY", hide_env_values = true)]
    pub harvard_api_key: Option<String>,

    /// Art Institute of Chicago API root
    #[arg(long, env = "AIC_BASE_URL", default_value = aic::DEFAULT_BASE_URL)]
    pub aic_base_url: String,

    /// Harvard Art Museums API root
    #[arg(long, env = "HARVARD_BASE_URL", default_value = harvard::DEFAULT_BASE_URL)]
    pub harvard_base_url: String,

    /// HTTP request timeout in milliseconds (1000-120000)
    #[arg(long, env = "ARTFEED_TIMEOUT_MS", default_value_t = DEFAULT_TIMEOUT_MS)]
    pub timeout_ms: u64,

    /// Directory holding the saved exhibition
    #[arg(long, env = "ARTFEED_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Log file for the terminal UI (defaults to <data-dir>/artfeed.log)
    #[arg(long, env = "ARTFEED_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Seed for the interleaving shuffle, for a reproducible feed order
    #[arg(long, env = "ARTFEED_SEED")]
    pub seed: Option<u64>,

    #[command(subcommand)]
    pub command: Option<Cmd>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Cmd {
    /// Print one page of artworks and exit
    List {
        /// Page number (only 1 when combining all museums)
        #[arg(short, long, default_value_t = 1)]
        page: u32,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Print the details of one artwork, e.g. `artfeed show aic-27992`
    Show {
        /// Tagged id: <source>-<id>
        id: String,
    },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub source: SourceSelection,
    pub page_size: u32,
    pub harvard_api_key: Option<String>,
    pub aic_base_url: String,
    pub harvard_base_url: String,
    pub timeout: Duration,
    pub data_dir: PathBuf,
    pub log_file: PathBuf,
    pub seed: Option<u64>,
    pub command: Option<Cmd>,
}

impl Config {
    pub fn from_args(args: CliArgs) -> Result<Self> {
        if !(1..=MAX_PAGE_SIZE).contains(&args.page_size) {
            bail!(
                "page size must be between 1 and {MAX_PAGE_SIZE}, got {}",
                args.page_size
            );
        }
        if !(1_000..=120_000).contains(&args.timeout_ms) {
            bail!(
                "timeout must be between 1000 and 120000 ms, got {}",
                args.timeout_ms
            );
        }
        if let Some(Cmd::List { page: 0, .. }) = args.command {
            bail!("pages are numbered from 1");
        }

        let data_dir = match args.data_dir {
            Some(dir) => dir,
            None => dirs::data_local_dir()
                .context("could not determine a data directory; pass --data-dir")?
                .join("artfeed"),
        };
        let log_file = args
            .log_file
            .unwrap_or_else(|| data_dir.join("artfeed.log"));

        Ok(Self {
            source: args.source,
            page_size: args.page_size,
            harvard_api_key: args.harvard_api_key.filter(|k| !k.trim().is_empty()),
            aic_base_url: args.aic_base_url,
            harvard_base_url: args.harvard_base_url,
            timeout: Duration::from_millis(args.timeout_ms),
            data_dir,
            log_file,
            seed: args.seed,
            command: args.command,
        })
    }
}

/// Parse the process arguments and environment.
pub fn load() -> Result<Config> {
    Config::from_args(CliArgs::parse())
}
