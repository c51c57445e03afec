mod config;
mod delivery;
mod diagnostics;
mod document;
mod errors;
mod layout;
mod preview;
mod state;

use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::config::{CliArgs, Config, OutputMode};
use crate::delivery::{
    deliver_pages, AutomationDriver, ClipboardDriver, DeliveryOutcome, RecordingDriver, Trigger,
};
use crate::diagnostics::Diagnostics;
use crate::document::load_document;
use crate::errors::AppError;
use crate::state::RunState;

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    // Configuration errors are fatal before any layout work begins.
    let config = match Config::load(&args) {
        Ok(config) => config,
        Err(e) => {
            Diagnostics::new("info").in_scope(|| error!("{e}"));
            std::process::exit(1);
        }
    };

    let diagnostics = Diagnostics::new(&config.log_filter);
    let state = RunState::new(config, diagnostics.clone());

    let (cancel_tx, cancel_rx) = watch::channel(false);
    let ctrl_c_tx = cancel_tx.clone();
    tokio::spawn(diagnostics.instrument(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Ctrl-C received; cancelling");
            ctrl_c_tx.send_replace(true);
        }
    }));

    if let Err(e) = diagnostics
        .instrument(run(&state, cancel_tx, cancel_rx))
        .await
    {
        diagnostics.in_scope(|| error!("{e}"));
        std::process::exit(1);
    }
}

async fn run(
    state: &RunState,
    cancel_tx: watch::Sender<bool>,
    cancel_rx: watch::Receiver<bool>,
) -> Result<(), AppError> {
    let config = &state.config;
    info!("Starting bookpager v{}", env!("CARGO_PKG_VERSION"));
    info!(
        lines_per_page = state.width.lines_per_page(),
        max_line_width = state.width.max_line_width(),
        cjk_width = state.width.cjk_width(),
        default_width = state.width.default_width(),
        input = %config.input_path.display(),
        "Layout config"
    );

    let text = load_document(&config.input_path).await?;
    let summary = state.layout(text).await?;

    for line in &summary.over_budget {
        warn!(
            line = line.line_index + 1,
            width = line.width,
            text = %line.text,
            "Glyph wider than the line budget; placed alone"
        );
    }
    info!(
        pages = summary.pages.len(),
        lines = summary.line_count,
        "Layout complete"
    );

    let report = match config.output {
        OutputMode::PreviewText => {
            info!("Preview mode ({} pages)", summary.pages.len());
            preview::print(&preview::render_text(&summary)).map_err(anyhow::Error::from)?;
            return Ok(());
        }
        OutputMode::PreviewJson => {
            let rendered = preview::render_json(&summary).map_err(anyhow::Error::from)?;
            preview::print(&rendered).map_err(anyhow::Error::from)?;
            return Ok(());
        }
        OutputMode::DryRun => {
            let driver = RecordingDriver::new(Trigger::Start);
            let report =
                deliver_pages(&summary.pages, &driver, config.focus, &config.timing, cancel_rx)
                    .await?;
            info!(steps = driver.actions().len(), "[dry-run] finished");
            report
        }
        OutputMode::Automated => {
            let driver = AutomationDriver::open().await?;
            deliver_pages(&summary.pages, &driver, config.focus, &config.timing, cancel_rx).await?
        }
        OutputMode::Clipboard => {
            let driver = ClipboardDriver::new(cancel_tx)?;
            deliver_pages(&summary.pages, &driver, config.focus, &config.timing, cancel_rx).await?
        }
    };

    match report.outcome {
        DeliveryOutcome::Completed => info!(pages = report.pages_delivered, "All pages delivered"),
        DeliveryOutcome::AbortedBeforeStart => info!("Nothing delivered"),
        DeliveryOutcome::Cancelled => info!(
            delivered = report.pages_delivered,
            total = report.pages_total,
            "Stopped early"
        ),
    }
    Ok(())
}
