//! User-facing failure notifications

use tokio::sync::mpsc;

use crate::error::{ClientError, ErrorCategory};

/// Something the user should be told about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// A request failed
    Error {
        category: ErrorCategory,
        message: String,
    },
    /// The refresh token was rejected and the session was cleared
    SessionExpired,
}

impl Notice {
    pub fn from_error(err: &ClientError) -> Self {
        match err {
            ClientError::SessionExpired { .. } => Notice::SessionExpired,
            other => Notice::Error {
                category: other.category(),
                message: other.to_string(),
            },
        }
    }

    pub fn message(&self) -> String {
        match self {
            Notice::Error { message, .. } => message.clone(),
            Notice::SessionExpired => ClientError::session_expired().to_string(),
        }
    }
}

/// Receives notices; implementations must not block
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Logs notices through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match &notice {
            Notice::SessionExpired => {
                tracing::warn!(message = %notice.message(), "Session expired");
            }
            Notice::Error { category, message } => {
                tracing::warn!(category = ?category, message = %message, "API request failed");
            }
        }
    }
}

/// Forwards notices to a channel, e.g. for a UI task to display
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notice>,
}

impl ChannelNotifier {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notice: Notice) {
        if self.tx.send(notice).is_err() {
            tracing::debug!("Notice dropped, receiver closed");
        }
    }
}
