//! User-visible notices.
//!
//! Errors are converted into notices at the boundary where they occur and
//! forwarded over a channel for the UI layer to display. The sender never
//! blocks; if the UI has gone away the notice is logged and dropped.

use tokio::sync::mpsc;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A message destined for the user, not the logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            text: text.into(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }
}

/// Cloneable handle for emitting notices from any component.
#[derive(Clone)]
pub struct NoticeSender {
    tx: mpsc::UnboundedSender<Notice>,
}

impl NoticeSender {
    pub fn send(&self, notice: Notice) {
        if self.tx.send(notice).is_err() {
            warn!("notice receiver dropped, notice discarded");
        }
    }

    pub fn error(&self, text: impl Into<String>) {
        self.send(Notice::error(text));
    }

    pub fn warning(&self, text: impl Into<String>) {
        self.send(Notice::warning(text));
    }

    pub fn info(&self, text: impl Into<String>) {
        self.send(Notice::info(text));
    }
}

/// Create the notice pipeline: components hold the sender, the UI drains
/// the receiver.
pub fn notice_channel() -> (NoticeSender, mpsc::UnboundedReceiver<Notice>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (NoticeSender { tx }, rx)
}
