use std::sync::Arc;

use crate::config::Config;
use crate::diagnostics::Diagnostics;
use crate::errors::AppError;
use crate::layout::{layout_document, LayoutSummary, WidthConfig};

/// Everything one run owns. Built once in `main`, read-only afterwards.
#[derive(Clone)]
pub struct RunState {
    pub config: Config,
    /// Shared with the blocking layout task.
    pub width: Arc<WidthConfig>,
    /// Run-scoped log sink. The engine's diagnostics go here, never to a global.
    pub diagnostics: Diagnostics,
}

impl RunState {
    pub fn new(config: Config, diagnostics: Diagnostics) -> Self {
        let width = Arc::new(config.width.clone());
        RunState {
            config,
            width,
            diagnostics,
        }
    }

    /// Lays out `text` on the blocking pool and returns the finished pages.
    ///
    /// Layout is CPU-bound; `spawn_blocking` keeps the runtime free to watch for
    /// Ctrl-C. The run's diagnostics follow the work onto the blocking thread.
    pub async fn layout(&self, text: String) -> Result<LayoutSummary, AppError> {
        let width = Arc::clone(&self.width);
        let diagnostics = self.diagnostics.clone();

        tokio::task::spawn_blocking(move || {
            diagnostics.in_scope(|| layout_document(&text, &width))
        })
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in layout: {e}")))
    }
}
