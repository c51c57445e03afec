//! Page delivery: hands finished pages to the game one at a time.
//!
//! # Pipeline
//! 1. wait for the operator's trigger (or abort)
//! 2. for each page: focus the text field, transfer the page text, and for every
//!    page but the last, advance to a fresh page
//!
//! Cancellation is a `watch` channel flipped by Ctrl-C or by the driver itself.
//! It is checked before every step and interrupts every delay. Layout is already
//! complete when delivery starts; nothing here touches the page contents.

pub mod automation;
pub mod clipboard;
pub mod operator;
pub mod recording;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::layout::Page;

pub use automation::AutomationDriver;
pub use clipboard::ClipboardDriver;
#[cfg(test)]
pub use recording::DeliveryAction;
pub use recording::RecordingDriver;

// ────────────────────────────────────────────────────────────────────────────
// Types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("clipboard unavailable: {0}")]
    Clipboard(String),

    #[error("operator input failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("input device failed: {0}")]
    Driver(String),
}

/// What the operator asked for while delivery was waiting to start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Start,
    Abort,
}

/// Position of the page text field relative to the page-turn button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FocusTarget {
    pub offset_x: i32,
    pub offset_y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryTiming {
    /// Pause after focusing and after advancing.
    pub step_delay: Duration,
    /// Pause after a transfer so the target can take the text in.
    pub transfer_settle: Duration,
}

impl Default for DeliveryTiming {
    fn default() -> Self {
        DeliveryTiming {
            step_delay: Duration::from_millis(300),
            transfer_settle: Duration::from_millis(300),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeliveryOutcome {
    Completed,
    /// The operator aborted at the trigger prompt.
    AbortedBeforeStart,
    /// Cancellation arrived while pages were being delivered.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryReport {
    pub pages_total: usize,
    pub pages_delivered: usize,
    pub outcome: DeliveryOutcome,
}

// ────────────────────────────────────────────────────────────────────────────
// Driver trait
// ────────────────────────────────────────────────────────────────────────────

/// The input surface delivery drives. Implement this to swap the mechanism
/// (synthetic input, manual clipboard, a recording for dry runs) without
/// touching the pipeline.
#[async_trait]
pub trait InputDriver: Send + Sync {
    /// Blocks until the operator starts or aborts delivery.
    async fn wait_for_trigger(&self) -> Result<Trigger, DeliveryError>;

    /// Puts input focus on the page text field.
    async fn focus(&self, target: FocusTarget) -> Result<(), DeliveryError>;

    /// Moves one page's full text into the focused field.
    async fn transfer(&self, text: &str) -> Result<(), DeliveryError>;

    /// Turns to a fresh, empty page.
    async fn advance(&self) -> Result<(), DeliveryError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Pipeline
// ────────────────────────────────────────────────────────────────────────────

/// Delivers `pages` in order through `driver`.
///
/// Returns how far delivery got. Driver failures abort the run as errors;
/// cancellation is not an error.
pub async fn deliver_pages(
    pages: &[Page],
    driver: &dyn InputDriver,
    focus: FocusTarget,
    timing: &DeliveryTiming,
    mut cancel: watch::Receiver<bool>,
) -> Result<DeliveryReport, DeliveryError> {
    let mut report = DeliveryReport {
        pages_total: pages.len(),
        pages_delivered: 0,
        outcome: DeliveryOutcome::Completed,
    };

    let trigger = tokio::select! {
        biased;
        _ = cancelled(&mut cancel) => None,
        trigger = driver.wait_for_trigger() => Some(trigger?),
    };
    match trigger {
        None => {
            report.outcome = DeliveryOutcome::Cancelled;
            return Ok(report);
        }
        Some(Trigger::Abort) => {
            warn!("Delivery aborted before the first page");
            report.outcome = DeliveryOutcome::AbortedBeforeStart;
            return Ok(report);
        }
        Some(Trigger::Start) => info!(pages = pages.len(), "Delivery started"),
    }

    for (i, page) in pages.iter().enumerate() {
        let focused = step(driver.focus(focus), &mut cancel).await?
            && pause(timing.step_delay, &mut cancel).await;
        if !focused || !step(driver.transfer(&page.to_text()), &mut cancel).await? {
            report.outcome = DeliveryOutcome::Cancelled;
            break;
        }
        report.pages_delivered += 1;
        debug!(
            page = page.index,
            total = pages.len(),
            lines = page.line_count(),
            "Page delivered"
        );

        if !pause(timing.transfer_settle, &mut cancel).await {
            report.outcome = DeliveryOutcome::Cancelled;
            break;
        }

        let is_last = i + 1 == pages.len();
        if !is_last {
            let advanced = step(driver.advance(), &mut cancel).await?
                && pause(timing.step_delay, &mut cancel).await;
            if !advanced {
                report.outcome = DeliveryOutcome::Cancelled;
                break;
            }
        }
    }

    if report.outcome == DeliveryOutcome::Cancelled {
        warn!(
            delivered = report.pages_delivered,
            total = report.pages_total,
            "Delivery cancelled"
        );
    }
    Ok(report)
}

/// Runs one driver step unless cancellation wins first.
/// `Ok(false)` means the step was skipped or abandoned.
async fn step<F>(action: F, cancel: &mut watch::Receiver<bool>) -> Result<bool, DeliveryError>
where
    F: Future<Output = Result<(), DeliveryError>>,
{
    if *cancel.borrow() {
        return Ok(false);
    }
    tokio::select! {
        biased;
        _ = cancelled(cancel) => Ok(false),
        result = action => result.map(|()| true),
    }
}

/// Sleeps for `duration`; returns `false` if cancelled first.
async fn pause(duration: Duration, cancel: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        biased;
        _ = cancelled(cancel) => false,
        _ = tokio::time::sleep(duration) => true,
    }
}

/// Resolves once the cancel flag is set. Never resolves if every sender is gone.
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    loop {
        if *cancel.borrow_and_update() {
            return;
        }
        if cancel.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn make_pages(n: usize) -> Vec<Page> {
        (1..=n)
            .map(|index| Page {
                index,
                lines: vec![format!("page {index} line 1"), format!("page {index} line 2")],
            })
            .collect()
    }

    fn focus() -> FocusTarget {
        FocusTarget {
            offset_x: -50,
            offset_y: -50,
        }
    }

    struct FailingDriver;

    #[async_trait]
    impl InputDriver for FailingDriver {
        async fn wait_for_trigger(&self) -> Result<Trigger, DeliveryError> {
            Ok(Trigger::Start)
        }

        async fn focus(&self, _target: FocusTarget) -> Result<(), DeliveryError> {
            Ok(())
        }

        async fn transfer(&self, _text: &str) -> Result<(), DeliveryError> {
            Err(DeliveryError::Driver("target window vanished".to_string()))
        }

        async fn advance(&self) -> Result<(), DeliveryError> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_page_delivered_in_order() {
        let driver = RecordingDriver::new(Trigger::Start);
        let (_tx, rx) = watch::channel(false);
        let pages = make_pages(3);

        let report = deliver_pages(&pages, &driver, focus(), &DeliveryTiming::default(), rx)
            .await
            .unwrap();

        assert_eq!(report.outcome, DeliveryOutcome::Completed);
        assert_eq!(report.pages_delivered, 3);
        assert_eq!(
            driver.actions(),
            vec![
                DeliveryAction::WaitForTrigger,
                DeliveryAction::Focus(focus()),
                DeliveryAction::Transfer("page 1 line 1\npage 1 line 2".to_string()),
                DeliveryAction::Advance,
                DeliveryAction::Focus(focus()),
                DeliveryAction::Transfer("page 2 line 1\npage 2 line 2".to_string()),
                DeliveryAction::Advance,
                DeliveryAction::Focus(focus()),
                DeliveryAction::Transfer("page 3 line 1\npage 3 line 2".to_string()),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_advance_after_single_page() {
        let driver = RecordingDriver::new(Trigger::Start);
        let (_tx, rx) = watch::channel(false);
        deliver_pages(&make_pages(1), &driver, focus(), &DeliveryTiming::default(), rx)
            .await
            .unwrap();
        assert!(!driver.actions().contains(&DeliveryAction::Advance));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timing_delays_are_applied() {
        let driver = RecordingDriver::new(Trigger::Start);
        let (_tx, rx) = watch::channel(false);
        let timing = DeliveryTiming {
            step_delay: Duration::from_millis(100),
            transfer_settle: Duration::from_millis(40),
        };
        let start = tokio::time::Instant::now();
        deliver_pages(&make_pages(3), &driver, focus(), &timing, rx)
            .await
            .unwrap();
        // 3 × (focus delay + settle) + 2 × advance delay
        assert_eq!(start.elapsed(), Duration::from_millis(3 * 140 + 2 * 100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_abort_trigger_delivers_nothing() {
        let driver = RecordingDriver::new(Trigger::Abort);
        let (_tx, rx) = watch::channel(false);
        let report = deliver_pages(&make_pages(2), &driver, focus(), &DeliveryTiming::default(), rx)
            .await
            .unwrap();
        assert_eq!(report.outcome, DeliveryOutcome::AbortedBeforeStart);
        assert_eq!(report.pages_delivered, 0);
        assert_eq!(driver.actions(), vec![DeliveryAction::WaitForTrigger]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_before_trigger() {
        let driver = RecordingDriver::new(Trigger::Start);
        let (_tx, rx) = watch::channel(true);
        let report = deliver_pages(&make_pages(2), &driver, focus(), &DeliveryTiming::default(), rx)
            .await
            .unwrap();
        assert_eq!(report.outcome, DeliveryOutcome::Cancelled);
        assert!(driver.actions().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_mid_run_stops_before_next_page() {
        let (tx, rx) = watch::channel(false);
        let driver = RecordingDriver::new(Trigger::Start).cancel_after_transfers(1, tx);
        let report = deliver_pages(&make_pages(3), &driver, focus(), &DeliveryTiming::default(), rx)
            .await
            .unwrap();

        assert_eq!(report.outcome, DeliveryOutcome::Cancelled);
        assert_eq!(report.pages_delivered, 1);
        let transfers = driver
            .actions()
            .iter()
            .filter(|a| matches!(a, DeliveryAction::Transfer(_)))
            .count();
        assert_eq!(transfers, 1);
        assert!(!driver.actions().contains(&DeliveryAction::Advance));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_delay_interrupts_sleep() {
        let driver = RecordingDriver::new(Trigger::Start);
        let (tx, rx) = watch::channel(false);
        let timing = DeliveryTiming {
            step_delay: Duration::from_secs(60),
            transfer_settle: Duration::from_secs(60),
        };
        let pages = make_pages(2);
        let start = tokio::time::Instant::now();

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            tx.send(true).unwrap();
        });
        let report = deliver_pages(&pages, &driver, focus(), &timing, rx)
            .await
            .unwrap();
        canceller.await.unwrap();

        assert_eq!(report.outcome, DeliveryOutcome::Cancelled);
        assert!(start.elapsed() < Duration::from_secs(60));
        assert!(!driver
            .actions()
            .iter()
            .any(|a| matches!(a, DeliveryAction::Transfer(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_driver_failure_propagates() {
        let (_tx, rx) = watch::channel(false);
        let err = deliver_pages(
            &make_pages(2),
            &FailingDriver,
            focus(),
            &DeliveryTiming::default(),
            rx,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DeliveryError::Driver(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_page_list_completes_after_trigger() {
        let driver = RecordingDriver::new(Trigger::Start);
        let (_tx, rx) = watch::channel(false);
        let report = deliver_pages(&[], &driver, focus(), &DeliveryTiming::default(), rx)
            .await
            .unwrap();
        assert_eq!(report.outcome, DeliveryOutcome::Completed);
        assert_eq!(report.pages_total, 0);
    }
}
