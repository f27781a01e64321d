//! Outbound reminder delivery.
//!
//! The engine treats delivery as a black box with a success/failure outcome:
//! [`Notifier::send`] either delivers the message or returns a
//! [`NotifyError`], which the dispatcher records as a per-user failure. A
//! notifier fault never aborts a run.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::config::NotifierConfig;
use crate::types::ReminderSettings;

// ---------------------------------------------------------------------------
// NotifyError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notifier endpoint not configured")]
    NotConfigured,

    #[error("send failed: {0}")]
    Send(String),

    #[error("provider returned {status}: {body}")]
    Provider { status: u16, body: String },
}

// ---------------------------------------------------------------------------
// ReminderEmail
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReminderEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// The fixed stalled-learner message. Every dispatch uses this shape; the
/// engine never personalizes beyond the recipient address.
pub fn reminder_email(settings: &ReminderSettings) -> ReminderEmail {
    ReminderEmail {
        to: settings.email.clone(),
        subject: "Your course is waiting for you".to_string(),
        body: "It has been a little while since your last lesson. \
               Pick up where you left off — a few minutes today keeps the \
               habit going. You can turn these reminders off any time from \
               your settings."
            .to_string(),
    }
}

// ---------------------------------------------------------------------------
// Notifier
// ---------------------------------------------------------------------------

pub trait Notifier: Send + Sync {
    fn send(&self, email: &ReminderEmail) -> Result<(), NotifyError>;
}

// ---------------------------------------------------------------------------
// HttpNotifier
// ---------------------------------------------------------------------------

/// Delivers reminders through an HTTP email provider.
///
/// Posts `{from, to, subject, text}` as JSON to the configured endpoint with
/// optional bearer auth. The request timeout converts a hung provider into a
/// per-user failure rather than a stuck run.
pub struct HttpNotifier {
    client: reqwest::blocking::Client,
    endpoint: String,
    token: Option<String>,
    from: String,
}

impl HttpNotifier {
    pub fn new(config: &NotifierConfig) -> Result<Self, NotifyError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| NotifyError::Send(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            token: config.token.clone(),
            from: config.from.clone(),
        })
    }
}

impl Notifier for HttpNotifier {
    fn send(&self, email: &ReminderEmail) -> Result<(), NotifyError> {
        if self.endpoint.is_empty() {
            return Err(NotifyError::NotConfigured);
        }

        let payload = serde_json::json!({
            "from": self.from,
            "to": email.to,
            "subject": email.subject,
            "text": email.body,
        });

        let mut request = self.client.post(&self.endpoint).json(&payload);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().map_err(|e| NotifyError::Send(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(NotifyError::Provider {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
