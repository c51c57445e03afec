use std::path::PathBuf;

use thiserror::Error;

use crate::delivery::DeliveryError;
use crate::layout::LayoutError;

/// Application-level error type.
/// Every variant is fatal for the run; `main` reports it and exits non-zero.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("Input file could not be read: {}: {source}", path.display())]
    InputUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Layout configuration error: {0}")]
    Layout(#[from] LayoutError),

    #[error("Delivery failed: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
