//! Mail transports.
//!
//! Sending is fire-and-forget: a transport logs its own failures and never
//! reports them to the composer.

mod memory;
mod smtp;

use crate::ics::Method;

pub use memory::{RecordingTransport, SendKind, SentMail};
pub use smtp::SmtpMailTransport;

/// A rendered message. Recipient lists are separator-delimited.
#[derive(Debug, Clone, Copy)]
pub struct OutgoingMail<'a> {
    pub to: &'a str,
    pub cc: &'a str,
    pub bcc: &'a str,
    pub sender_name: &'a str,
    pub sender_email: &'a str,
    pub subject: &'a str,
    pub body: &'a str,
}

pub trait MailTransport: Send + Sync {
    /// HTML mail to the primary recipient only.
    fn send_html(&self, mail: &OutgoingMail<'_>);

    /// HTML mail to the primary recipient, with Cc and Bcc copies.
    fn send_html_with_copies(&self, mail: &OutgoingMail<'_>);

    /// HTML mail carrying a calendar object, with Cc and Bcc copies.
    fn send_calendar(&self, mail: &OutgoingMail<'_>, calendar: &[u8], method: Method);
}
