//! Automated driver: clicks the page text field, pastes each page and clicks the
//! page-turn button with a synthetic mouse and keyboard.
//!
//! The operator hovers the page-turn button and presses Enter. That cursor
//! position is the origin: focus clicks at origin + offset, advance clicks at
//! the origin.
//!
//! Platform input handles are not always `Send`, so the device lives on its own
//! OS thread and the async side sends it jobs.

use std::sync::Mutex;

use arboard::Clipboard;
use async_trait::async_trait;
use enigo::{Button, Coordinate, Direction, Enigo, Key, Keyboard, Mouse, Settings};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use super::operator::OperatorPrompt;
use super::{DeliveryError, FocusTarget, InputDriver, Trigger};

/// Absolute screen position in pixels.
pub type Point = (i32, i32);

#[cfg(target_os = "macos")]
const PASTE_MODIFIER: Key = Key::Meta;
#[cfg(not(target_os = "macos"))]
const PASTE_MODIFIER: Key = Key::Control;

/// Synthetic input primitives. Runs on the input thread only.
pub trait InputDevice {
    fn cursor(&mut self) -> Result<Point, String>;

    fn click_at(&mut self, at: Point) -> Result<(), String>;

    /// Pastes `text` into whatever currently has keyboard focus.
    fn paste(&mut self, text: &str) -> Result<(), String>;
}

/// The real desktop: enigo for mouse and keys, arboard for the clipboard.
pub struct DesktopInput {
    enigo: Enigo,
    clipboard: Clipboard,
}

impl DesktopInput {
    pub fn open() -> Result<Self, String> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|e| format!("cannot open input device: {e}"))?;
        let clipboard = Clipboard::new().map_err(|e| format!("clipboard unavailable: {e}"))?;
        Ok(DesktopInput { enigo, clipboard })
    }
}

impl InputDevice for DesktopInput {
    fn cursor(&mut self) -> Result<Point, String> {
        self.enigo.location().map_err(|e| e.to_string())
    }

    fn click_at(&mut self, (x, y): Point) -> Result<(), String> {
        self.enigo
            .move_mouse(x, y, Coordinate::Abs)
            .map_err(|e| e.to_string())?;
        self.enigo
            .button(Button::Left, Direction::Click)
            .map_err(|e| e.to_string())
    }

    fn paste(&mut self, text: &str) -> Result<(), String> {
        self.clipboard
            .set_text(text.to_string())
            .map_err(|e| e.to_string())?;
        self.enigo
            .key(PASTE_MODIFIER, Direction::Press)
            .map_err(|e| e.to_string())?;
        let pasted = self.enigo.key(Key::Unicode('v'), Direction::Click);
        // Release the modifier even when the V stroke failed.
        let released = self.enigo.key(PASTE_MODIFIER, Direction::Release);
        pasted.and(released).map_err(|e| e.to_string())
    }
}

type Job = Box<dyn FnOnce(&mut dyn InputDevice) + Send>;

/// Handle to the thread that owns the input device.
struct InputThread {
    jobs: mpsc::UnboundedSender<Job>,
}

impl InputThread {
    /// Spawns the thread and opens the device on it.
    async fn spawn<D, F>(open: F) -> Result<Self, DeliveryError>
    where
        D: InputDevice + 'static,
        F: FnOnce() -> Result<D, String> + Send + 'static,
    {
        let (jobs, mut rx) = mpsc::unbounded_channel::<Job>();
        let (ready_tx, ready_rx) = oneshot::channel();

        std::thread::Builder::new()
            .name("input-device".to_string())
            .spawn(move || {
                let mut device = match open() {
                    Ok(device) => {
                        let _ = ready_tx.send(Ok(()));
                        device
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                while let Some(job) = rx.blocking_recv() {
                    job(&mut device);
                }
            })?;

        ready_rx
            .await
            .map_err(|_| DeliveryError::Driver("input thread exited during setup".to_string()))?
            .map_err(DeliveryError::Driver)?;
        Ok(InputThread { jobs })
    }

    async fn run<T, F>(&self, op: F) -> Result<T, DeliveryError>
    where
        T: Send + 'static,
        F: FnOnce(&mut dyn InputDevice) -> Result<T, String> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let job: Job = Box::new(move |device| {
            let _ = tx.send(op(device));
        });
        self.jobs
            .send(job)
            .map_err(|_| DeliveryError::Driver("input thread stopped".to_string()))?;
        rx.await
            .map_err(|_| DeliveryError::Driver("input thread stopped".to_string()))?
            .map_err(DeliveryError::Driver)
    }
}

pub struct AutomationDriver {
    input: InputThread,
    operator: OperatorPrompt,
    /// Page-turn button position, recorded when the operator starts delivery.
    origin: Mutex<Option<Point>>,
}

impl AutomationDriver {
    /// Opens the desktop input device, with operator answers on stdin.
    pub async fn open() -> Result<Self, DeliveryError> {
        Self::with_device(DesktopInput::open, OperatorPrompt::stdin()?).await
    }

    pub async fn with_device<D, F>(open: F, operator: OperatorPrompt) -> Result<Self, DeliveryError>
    where
        D: InputDevice + 'static,
        F: FnOnce() -> Result<D, String> + Send + 'static,
    {
        Ok(AutomationDriver {
            input: InputThread::spawn(open).await?,
            operator,
            origin: Mutex::new(None),
        })
    }

    fn origin(&self) -> Result<Point, DeliveryError> {
        self.origin
            .lock()
            .map_err(|_| DeliveryError::Driver("origin lock poisoned".to_string()))?
            .ok_or_else(|| DeliveryError::Driver("page-turn position not recorded yet".to_string()))
    }
}

/// Where the text field is, given the page-turn button position.
fn focus_point((x, y): Point, target: FocusTarget) -> Point {
    (
        x.saturating_add(target.offset_x),
        y.saturating_add(target.offset_y),
    )
}

#[async_trait]
impl InputDriver for AutomationDriver {
    async fn wait_for_trigger(&self) -> Result<Trigger, DeliveryError> {
        let trigger = self
            .operator
            .ask("Hover the mouse over the book's page-turn button, then press Enter to start (q + Enter cancels)")
            .await?;
        if trigger == Trigger::Start {
            let origin = self.input.run(|device| device.cursor()).await?;
            *self
                .origin
                .lock()
                .map_err(|_| DeliveryError::Driver("origin lock poisoned".to_string()))? =
                Some(origin);
            info!(x = origin.0, y = origin.1, "Page-turn button position recorded");
        }
        Ok(trigger)
    }

    async fn focus(&self, target: FocusTarget) -> Result<(), DeliveryError> {
        let at = focus_point(self.origin()?, target);
        self.input.run(move |device| device.click_at(at)).await?;
        debug!(x = at.0, y = at.1, "Clicked page text field");
        Ok(())
    }

    async fn transfer(&self, text: &str) -> Result<(), DeliveryError> {
        let chars = text.chars().count();
        let text = text.to_string();
        self.input.run(move |device| device.paste(&text)).await?;
        debug!(chars, "Pasted page");
        Ok(())
    }

    async fn advance(&self) -> Result<(), DeliveryError> {
        let origin = self.origin()?;
        self.input.run(move |device| device.click_at(origin)).await?;
        debug!(x = origin.0, y = origin.1, "Clicked page-turn button");
        Ok(())
    }
}
