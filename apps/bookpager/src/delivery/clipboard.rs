//! Clipboard driver: puts each page on the system clipboard and paces the
//! operator through pasting and page turns from the terminal.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use arboard::Clipboard;
use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{debug, info};

use super::operator::OperatorPrompt;
use super::{DeliveryError, FocusTarget, InputDriver, Trigger};

pub struct ClipboardDriver {
    clipboard: Mutex<Clipboard>,
    operator: OperatorPrompt,
    cancel: watch::Sender<bool>,
    focus_hint_shown: AtomicBool,
}

impl ClipboardDriver {
    /// Opens the system clipboard. `cancel` is flipped when the operator stops mid-run.
    pub fn new(cancel: watch::Sender<bool>) -> Result<Self, DeliveryError> {
        let clipboard = Clipboard::new().map_err(|e| DeliveryError::Clipboard(e.to_string()))?;
        Ok(ClipboardDriver {
            clipboard: Mutex::new(clipboard),
            operator: OperatorPrompt::stdin()?,
            cancel,
            focus_hint_shown: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl InputDriver for ClipboardDriver {
    async fn wait_for_trigger(&self) -> Result<Trigger, DeliveryError> {
        self.operator
            .ask("Switch to the game and open the book, then press Enter to start (q + Enter cancels)")
            .await
    }

    async fn focus(&self, target: FocusTarget) -> Result<(), DeliveryError> {
        show_focus_hint(&self.focus_hint_shown, target);
        debug!(
            offset_x = target.offset_x,
            offset_y = target.offset_y,
            "Focus page text field"
        );
        Ok(())
    }

    async fn transfer(&self, text: &str) -> Result<(), DeliveryError> {
        {
            let mut clipboard = self
                .clipboard
                .lock()
                .map_err(|_| DeliveryError::Clipboard("clipboard lock poisoned".to_string()))?;
            clipboard
                .set_text(text.to_string())
                .map_err(|e| DeliveryError::Clipboard(e.to_string()))?;
        }
        info!(
            chars = text.chars().count(),
            "Page copied; paste it into the book with Ctrl+V"
        );
        Ok(())
    }

    async fn advance(&self) -> Result<(), DeliveryError> {
        let answer = self
            .operator
            .ask("Turn to the next page, then press Enter (q + Enter stops)")
            .await?;
        if answer == Trigger::Abort {
            self.cancel.send_replace(true);
        }
        Ok(())
    }
}

fn show_focus_hint(shown: &AtomicBool, target: FocusTarget) {
    if !shown.swap(true, Ordering::Relaxed) {
        info!(
            "Click the page text field ({:+}, {:+} px from the page-turn button) before each paste",
            target.offset_x, target.offset_y
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_focus_hint_logged_once() {
        let (diagnostics, logs) = crate::diagnostics::tests::capturing("info");
        let hint_shown = AtomicBool::new(false);
        let target = FocusTarget {
            offset_x: -50,
            offset_y: 20,
        };
        diagnostics.in_scope(|| {
            for _ in 0..3 {
                show_focus_hint(&hint_shown, target);
            }
        });
        assert_eq!(logs.contents().matches("-50, +20 px").count(), 1);
    }
}
