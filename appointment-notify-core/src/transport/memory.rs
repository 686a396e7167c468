use std::sync::{Mutex, PoisonError};

use tracing::debug;

use crate::ics::Method;
use crate::transport::{MailTransport, OutgoingMail};

/// Which transport call produced a [`SentMail`].
#[derive(Debug, Clone, PartialEq)]
pub enum SendKind {
    Html,
    HtmlWithCopies,
    Calendar { method: Method, calendar: String },
}

/// Owned copy of everything handed to the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct SentMail {
    pub kind: SendKind,
    pub to: String,
    pub cc: String,
    pub bcc: String,
    pub sender_name: String,
    pub sender_email: String,
    pub subject: String,
    pub body: String,
}

impl SentMail {
    fn record(kind: SendKind, mail: &OutgoingMail<'_>) -> Self {
        SentMail {
            kind,
            to: mail.to.to_string(),
            cc: mail.cc.to_string(),
            bcc: mail.bcc.to_string(),
            sender_name: mail.sender_name.to_string(),
            sender_email: mail.sender_email.to_string(),
            subject: mail.subject.to_string(),
            body: mail.body.to_string(),
        }
    }

    /// The calendar object, for calendar sends.
    pub fn calendar(&self) -> Option<&str> {
        match &self.kind {
            SendKind::Calendar { calendar, .. } => Some(calendar),
            _ => None,
        }
    }
}

/// Keeps every message in memory instead of sending it.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<SentMail>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<SentMail> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn take(&self) -> Vec<SentMail> {
        std::mem::take(&mut *self.sent.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn push(&self, mail: SentMail) {
        debug!(to = %mail.to, subject = %mail.subject, "Recorded outgoing mail");
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(mail);
    }
}

impl MailTransport for RecordingTransport {
    fn send_html(&self, mail: &OutgoingMail<'_>) {
        self.push(SentMail::record(SendKind::Html, mail));
    }

    fn send_html_with_copies(&self, mail: &OutgoingMail<'_>) {
        self.push(SentMail::record(SendKind::HtmlWithCopies, mail));
    }

    fn send_calendar(&self, mail: &OutgoingMail<'_>, calendar: &[u8], method: Method) {
        let calendar = String::from_utf8_lossy(calendar).into_owned();
        self.push(SentMail::record(SendKind::Calendar { method, calendar }, mail));
    }
}
