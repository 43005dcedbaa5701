//! Deep-link delivery

use async_trait::async_trait;
use tokio::sync::mpsc;

/// Delivers the URL the app was launched with, then every URL it receives.
#[async_trait]
pub trait LinkSource: Send {
    /// The launch URL. Called once, during initialization.
    async fn initial_url(&mut self) -> Option<String>;

    /// Wait for the next incoming URL. `None` once the source is closed.
    async fn next_url(&mut self) -> Option<String>;
}

/// Channel-backed link source.
///
/// The host feeds URLs through the [`LinkSender`]; dropping every sender
/// closes the source.
#[derive(Debug)]
pub struct ChannelLinkSource {
    initial: Option<String>,
    rx: mpsc::UnboundedReceiver<String>,
}

/// Handle used by the host to push received URLs.
#[derive(Debug, Clone)]
pub struct LinkSender {
    tx: mpsc::UnboundedSender<String>,
}

impl LinkSender {
    /// Queue a received URL. Returns `false` if the source is gone.
    pub fn send(&self, url: impl Into<String>) -> bool {
        self.tx.send(url.into()).is_ok()
    }
}

impl ChannelLinkSource {
    pub fn new(initial: Option<String>) -> (Self, LinkSender) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { initial, rx }, LinkSender { tx })
    }
}

#[async_trait]
impl LinkSource for ChannelLinkSource {
    async fn initial_url(&mut self) -> Option<String> {
        self.initial.take()
    }

    async fn next_url(&mut self) -> Option<String> {
        self.rx.recv().await
    }
}
