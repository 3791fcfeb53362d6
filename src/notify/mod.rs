//! Delivery of finished reports.
//!
//! A [`Notifier`] takes a rendered [`Document`] and owns its transport.
//! Delivery errors are always returned to the caller.

pub mod file;

#[cfg(feature = "smtp")]
pub mod smtp;

#[cfg(feature = "http")]
pub mod webhook;

use crate::report::Document;

pub use file::{FileNotifier, StdoutNotifier};

#[cfg(feature = "smtp")]
pub use smtp::SmtpNotifier;

#[cfg(feature = "http")]
pub use webhook::WebhookNotifier;

/// Something that can deliver a finished report.
pub trait Notifier {
    /// Short label used in logs.
    fn name(&self) -> &'static str;

    fn deliver(&self, document: &Document) -> Result<(), NotifyError>;
}

/// Delivery errors.
#[derive(Debug)]
pub enum NotifyError {
    Io(String),
    Network(String),
    Server { status: u16, message: String },
    Config(String),
}

impl std::fmt::Display for NotifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotifyError::Io(msg) => write!(f, "Delivery IO error: {msg}"),
            NotifyError::Network(msg) => write!(f, "Delivery network error: {msg}"),
            NotifyError::Server { status, message } => {
                write!(f, "Delivery server error ({status}): {message}")
            }
            NotifyError::Config(msg) => write!(f, "Delivery config error: {msg}"),
        }
    }
}

impl std::error::Error for NotifyError {}
