//! Recording driver: logs and remembers every step instead of performing it.
//!
//! Backs `--dry-run`, and lets tests assert the exact step sequence.

use std::sync::Mutex;

use async_trait::async_trait;
#[cfg(test)]
use tokio::sync::watch;
use tracing::info;

use super::{DeliveryError, FocusTarget, InputDriver, Trigger};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryAction {
    WaitForTrigger,
    Focus(FocusTarget),
    Transfer(String),
    Advance,
}

pub struct RecordingDriver {
    trigger: Trigger,
    actions: Mutex<Vec<DeliveryAction>>,
    /// Flip the cancel flag after this many transfers.
    #[cfg(test)]
    cancel_after: Option<(usize, watch::Sender<bool>)>,
}

impl RecordingDriver {
    pub fn new(trigger: Trigger) -> Self {
        RecordingDriver {
            trigger,
            actions: Mutex::new(Vec::new()),
            #[cfg(test)]
            cancel_after: None,
        }
    }

    /// Requests cancellation through `cancel` once `transfers` pages have been transferred.
    #[cfg(test)]
    pub fn cancel_after_transfers(mut self, transfers: usize, cancel: watch::Sender<bool>) -> Self {
        self.cancel_after = Some((transfers, cancel));
        self
    }

    pub fn actions(&self) -> Vec<DeliveryAction> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<DeliveryAction>> {
        // A poisoned log is still a valid log.
        self.actions.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, action: DeliveryAction) {
        self.lock().push(action);
    }

    #[cfg(test)]
    fn cancel_if_due(&self) {
        if let Some((limit, cancel)) = &self.cancel_after {
            let transfers = self
                .lock()
                .iter()
                .filter(|a| matches!(a, DeliveryAction::Transfer(_)))
                .count();
            if transfers >= *limit {
                cancel.send_replace(true);
            }
        }
    }
}

#[async_trait]
impl InputDriver for RecordingDriver {
    async fn wait_for_trigger(&self) -> Result<Trigger, DeliveryError> {
        self.record(DeliveryAction::WaitForTrigger);
        info!(trigger = ?self.trigger, "[dry-run] trigger");
        Ok(self.trigger)
    }

    async fn focus(&self, target: FocusTarget) -> Result<(), DeliveryError> {
        self.record(DeliveryAction::Focus(target));
        info!(
            offset_x = target.offset_x,
            offset_y = target.offset_y,
            "[dry-run] focus page text field"
        );
        Ok(())
    }

    async fn transfer(&self, text: &str) -> Result<(), DeliveryError> {
        self.record(DeliveryAction::Transfer(text.to_string()));
        info!(
            chars = text.chars().count(),
            lines = text.lines().count(),
            "[dry-run] transfer page"
        );
        #[cfg(test)]
        self.cancel_if_due();
        Ok(())
    }

    async fn advance(&self) -> Result<(), DeliveryError> {
        self.record(DeliveryAction::Advance);
        info!("[dry-run] turn page");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_actions_in_call_order() {
        let driver = RecordingDriver::new(Trigger::Start);
        driver.wait_for_trigger().await.unwrap();
        driver.transfer("abc").await.unwrap();
        driver.advance().await.unwrap();
        assert_eq!(
            driver.actions(),
            vec![
                DeliveryAction::WaitForTrigger,
                DeliveryAction::Transfer("abc".to_string()),
                DeliveryAction::Advance,
            ]
        );
    }

    #[tokio::test]
    async fn test_cancel_after_transfers_flips_flag() {
        let (tx, rx) = watch::channel(false);
        let driver = RecordingDriver::new(Trigger::Start).cancel_after_transfers(2, tx);
        driver.transfer("one").await.unwrap();
        assert!(!*rx.borrow());
        driver.transfer("two").await.unwrap();
        assert!(*rx.borrow());
    }
}
