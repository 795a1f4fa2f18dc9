//! Alert system for reporting success, warning and error messages to users.
//!
//! The live transaction store never returns errors up the caller's stack.
//! Instead, every outcome is pushed onto an alert channel that the
//! presentation layer drains and displays, e.g. as toasts.

use tokio::sync::mpsc;

/// Alert message types for styling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertType {
    Success,
    Warning,
    Error,
}

/// A message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub alert_type: AlertType,
    pub message: String,
    pub details: String,
}

impl Alert {
    /// Create a new success alert
    pub fn success(message: &str, details: &str) -> Self {
        Self {
            alert_type: AlertType::Success,
            message: message.to_owned(),
            details: details.to_owned(),
        }
    }

    /// Create a new warning alert
    pub fn warning(message: &str, details: &str) -> Self {
        Self {
            alert_type: AlertType::Warning,
            message: message.to_owned(),
            details: details.to_owned(),
        }
    }

    /// Create a new error alert
    pub fn error(message: &str, details: &str) -> Self {
        Self {
            alert_type: AlertType::Error,
            message: message.to_owned(),
            details: details.to_owned(),
        }
    }
}

/// The sending half of the alert channel. Cheap to clone.
#[derive(Debug, Clone)]
pub struct AlertSender {
    sender: mpsc::UnboundedSender<Alert>,
}

/// The receiving half of the alert channel.
pub type AlertReceiver = mpsc::UnboundedReceiver<Alert>;

/// Create a connected alert sender and receiver.
pub fn alert_channel() -> (AlertSender, AlertReceiver) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (AlertSender { sender }, receiver)
}

impl AlertSender {
    /// Log `alert` and pass it on to the presentation layer.
    ///
    /// Alerts sent after the receiver has been dropped are only logged.
    pub fn send(&self, alert: Alert) {
        match alert.alert_type {
            AlertType::Success => tracing::info!("{}: {}", alert.message, alert.details),
            AlertType::Warning => tracing::warn!("{}: {}", alert.message, alert.details),
            AlertType::Error => tracing::error!("{}: {}", alert.message, alert.details),
        }

        if self.sender.send(alert).is_err() {
            tracing::debug!("Alert receiver dropped, alert was not delivered");
        }
    }
}
