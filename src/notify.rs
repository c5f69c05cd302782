//! User-visible notices (the toast surface).
//!
//! Sinks are fire-and-forget: the state machine never waits on them and a
//! sink that cannot deliver simply drops the notice.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub severity: Severity,
    pub title: String,
    pub description: String,
}

impl Notice {
    pub fn info(description: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            title: "Success".to_string(),
            description: description.into(),
        }
    }

    pub fn error(description: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            title: "Error".to_string(),
            description: description.into(),
        }
    }
}

pub trait NoticeSink: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Writes notices to the log. Default sink for headless runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNoticeSink;

impl NoticeSink for TracingNoticeSink {
    fn notify(&self, notice: Notice) {
        match notice.severity {
            Severity::Info => tracing::info!(title = %notice.title, "{}", notice.description),
            Severity::Error => tracing::error!(title = %notice.title, "{}", notice.description),
        }
    }
}

/// Forwards notices to a UI task over a bounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNoticeSink {
    tx: mpsc::Sender<Notice>,
}

impl ChannelNoticeSink {
    pub fn new(tx: mpsc::Sender<Notice>) -> Self {
        Self { tx }
    }

    /// A capacity of zero is raised to one.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Notice>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(tx), rx)
    }
}

impl NoticeSink for ChannelNoticeSink {
    fn notify(&self, notice: Notice) {
        if let Err(e) = self.tx.try_send(notice) {
            tracing::debug!("Dropping notice: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_use_fixed_titles() {
        let ok = Notice::info("Required network added and switched.");
        assert_eq!(ok.severity, Severity::Info);
        assert_eq!(ok.title, "Success");

        let err = Notice::error("Failed to add required network.");
        assert_eq!(err.severity.as_str(), "error");
        assert_eq!(err.title, "Error");
    }

    #[tokio::test]
    async fn channel_sink_delivers_and_drops_when_full() {
        let (sink, mut rx) = ChannelNoticeSink::channel(1);
        sink.notify(Notice::info("first"));
        sink.notify(Notice::info("second"));

        assert_eq!(rx.recv().await.unwrap().description, "first");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn channel_sink_tolerates_closed_receiver() {
        let (sink, rx) = ChannelNoticeSink::channel(4);
        drop(rx);
        sink.notify(Notice::error("nobody listening"));
    }

    #[test]
    fn zero_capacity_channel_still_delivers() {
        let (sink, mut rx) = ChannelNoticeSink::channel(0);
        sink.notify(Notice::error("Please install a wallet extension."));
        assert_eq!(
            rx.try_recv().unwrap().description,
            "Please install a wallet extension."
        );
    }
}
