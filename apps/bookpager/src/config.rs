//! Run configuration.
//!
//! Precedence: CLI flag > width file > built-in default. A `.env` file is loaded
//! if present so `RUST_LOG` and `BOOKPAGER_INPUT` can live next to the input.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;

use crate::delivery::{DeliveryTiming, FocusTarget};
use crate::errors::AppError;
use crate::layout::{WidthConfig, WidthOverrides};

const DEFAULT_INPUT: &str = "input.txt";
const DEFAULT_DELAY_SECS: f64 = 0.3;
const DEFAULT_OFFSET: i32 = -50;

/// CLI arguments
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "bookpager")]
#[command(version)]
#[command(about = "Lays out text as in-game book pages and feeds them to the game page by page", long_about = None)]
pub struct CliArgs {
    /// Input text file (UTF-8). Defaults to $BOOKPAGER_INPUT, then input.txt
    #[arg(value_name = "INPUT")]
    pub input: Option<PathBuf>,

    /// Lines per page
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    pub lines: Option<i64>,

    /// Line width budget in width units
    #[arg(long, value_name = "WIDTH", allow_negative_numbers = true)]
    pub max_width: Option<f64>,

    /// JSON file with width-table overrides
    #[arg(long, value_name = "FILE")]
    pub widths: Option<PathBuf>,

    /// Print the pages and exit without delivering them
    #[arg(long)]
    pub preview: bool,

    /// Print the preview as JSON
    #[arg(long, requires = "preview")]
    pub json: bool,

    /// Debug-level logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Horizontal offset from the page-turn button to the text field
    #[arg(long, value_name = "PX", allow_negative_numbers = true)]
    pub offset_x: Option<i32>,

    /// Vertical offset from the page-turn button to the text field
    #[arg(long, value_name = "PX", allow_negative_numbers = true)]
    pub offset_y: Option<i32>,

    /// Delay between delivery steps, in seconds
    #[arg(long, value_name = "SECS")]
    pub delay: Option<f64>,

    /// Log every delivery step instead of driving the game
    #[arg(long)]
    pub dry_run: bool,

    /// Only copy each page to the clipboard; the operator pastes and turns pages
    #[arg(long)]
    pub manual: bool,
}

/// How the finished pages leave the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    PreviewText,
    PreviewJson,
    DryRun,
    /// Synthetic mouse and keyboard input.
    Automated,
    /// Clipboard only, paced by the operator.
    Clipboard,
}

/// Fully resolved configuration for one run.
#[derive(Debug, Clone)]
pub struct Config {
    pub input_path: PathBuf,
    pub width: WidthConfig,
    pub output: OutputMode,
    pub log_filter: String,
    pub timing: DeliveryTiming,
    pub focus: FocusTarget,
}

impl Config {
    /// Loads `.env`, then resolves `args` against the process environment.
    pub fn load(args: &CliArgs) -> Result<Self, AppError> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::resolve(
            args,
            std::env::var("BOOKPAGER_INPUT").ok(),
            std::env::var("RUST_LOG").ok(),
        )
    }

    /// Resolves configuration from CLI arguments and already-read environment values.
    pub fn resolve(
        args: &CliArgs,
        env_input: Option<String>,
        env_log: Option<String>,
    ) -> Result<Self, AppError> {
        let input_path = args
            .input
            .clone()
            .or_else(|| env_input.map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT));

        let mut overrides = match &args.widths {
            Some(path) => read_width_file(path)?,
            None => WidthOverrides::default(),
        };
        if args.lines.is_some() {
            overrides.lines_per_page = args.lines;
        }
        if args.max_width.is_some() {
            overrides.max_line_width = args.max_width;
        }
        let width = WidthConfig::from_overrides(&overrides)?;

        let delay_secs = args.delay.unwrap_or(DEFAULT_DELAY_SECS);
        let step_delay = Duration::try_from_secs_f64(delay_secs).map_err(|e| {
            AppError::Config(format!(
                "--delay must be a non-negative number of seconds, got {delay_secs}: {e}"
            ))
        })?;

        let output = if args.preview && args.json {
            OutputMode::PreviewJson
        } else if args.preview {
            OutputMode::PreviewText
        } else if args.dry_run {
            OutputMode::DryRun
        } else if args.manual {
            OutputMode::Clipboard
        } else {
            OutputMode::Automated
        };

        let log_filter = if args.verbose {
            "debug".to_string()
        } else {
            env_log.unwrap_or_else(|| "info".to_string())
        };

        Ok(Config {
            input_path,
            width,
            output,
            log_filter,
            timing: DeliveryTiming {
                step_delay,
                ..DeliveryTiming::default()
            },
            focus: FocusTarget {
                offset_x: args.offset_x.unwrap_or(DEFAULT_OFFSET),
                offset_y: args.offset_y.unwrap_or(DEFAULT_OFFSET),
            },
        })
    }
}

fn read_width_file(path: &Path) -> Result<WidthOverrides, AppError> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        AppError::Config(format!("cannot read width file {}: {e}", path.display()))
    })?;
    serde_json::from_str(&raw)
        .map_err(|e| AppError::Config(format!("invalid width file {}: {e}", path.display())))
}
