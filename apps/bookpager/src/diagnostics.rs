//! Per-run diagnostics handle.
//!
//! The subscriber is never installed as the global default. A run owns one
//! `Diagnostics` and enters it explicitly: `in_scope` for synchronous work
//! (including closures sent to `spawn_blocking`), `instrument` for futures.

use std::future::Future;

use tracing::instrument::{WithDispatch, WithSubscriber};
use tracing::Dispatch;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter};

#[derive(Clone)]
pub struct Diagnostics {
    dispatch: Dispatch,
}

impl Diagnostics {
    /// Human-readable logs on stderr, so stdout stays free for previews.
    pub fn new(filter: &str) -> Self {
        Self::build(filter, std::io::stderr, true)
    }

    /// Plain-text logs into an arbitrary writer.
    pub fn with_writer<W>(filter: &str, writer: W) -> Self
    where
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        Self::build(filter, writer, false)
    }

    /// Discards everything.
    pub fn silent() -> Self {
        Diagnostics {
            dispatch: Dispatch::none(),
        }
    }

    fn build<W>(filter: &str, writer: W, ansi: bool) -> Self
    where
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        let subscriber = tracing_subscriber::registry()
            .with(env_filter(filter))
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_ansi(ansi),
            );
        Diagnostics {
            dispatch: Dispatch::new(subscriber),
        }
    }

    /// Runs `f` with this run's subscriber as the current dispatcher.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }

    /// Attaches this run's subscriber to `future` for every poll.
    pub fn instrument<F: Future>(&self, future: F) -> WithDispatch<F> {
        future.with_subscriber(self.dispatch.clone())
    }
}

/// A bare level such as `debug` applies to this crate only; anything with a
/// directive (`bookpager=trace,tokio=warn`) is used verbatim.
fn env_filter(filter: &str) -> EnvFilter {
    let directive = if filter.contains('=') {
        filter.to_string()
    } else {
        format!("{}={}", env!("CARGO_PKG_NAME"), filter)
    };
    EnvFilter::try_new(directive)
        .unwrap_or_else(|_| EnvFilter::new(format!("{}=info", env!("CARGO_PKG_NAME"))))
}
