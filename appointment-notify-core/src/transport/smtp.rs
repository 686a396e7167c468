use lettre::message::header::ContentType;
use lettre::message::{Mailbox, MessageBuilder, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, Message, SmtpTransport, Transport};
use tracing::{error, info, warn};

use crate::error::{NotifyError, NotifyResult};
use crate::ics::{Method, split_addresses};
use crate::settings::SmtpSettings;
use crate::transport::{MailTransport, OutgoingMail};

/// Blocking SMTP relay.
pub struct SmtpMailTransport {
    inner: SmtpTransport,
    separator: String,
}

impl SmtpMailTransport {
    pub fn new(settings: &SmtpSettings, separator: &str) -> NotifyResult<Self> {
        let builder = if settings.tls {
            SmtpTransport::relay(&settings.host)
                .map_err(|e| NotifyError::Transport(format!("TLS relay {}: {e}", settings.host)))?
        } else {
            SmtpTransport::builder_dangerous(&settings.host)
        };

        let builder = match settings.port {
            Some(port) => builder.port(port),
            None => builder,
        };

        let builder = match (&settings.username, &settings.password) {
            (Some(u), Some(p)) => builder.credentials(Credentials::new(u.clone(), p.clone())),
            (None, None) => builder,
            _ => {
                return Err(NotifyError::Transport(
                    "smtp.username and smtp.password must be set together".into(),
                ));
            }
        };

        Ok(SmtpMailTransport {
            inner: builder.build(),
            separator: separator.to_string(),
        })
    }

    fn mailboxes(&self, list: &str) -> Vec<Mailbox> {
        split_addresses(list, &self.separator)
            .filter_map(|address| match address.parse::<Address>() {
                Ok(address) => Some(Mailbox::new(None, address)),
                Err(e) => {
                    warn!(address, error = %e, "Skipping invalid recipient");
                    None
                }
            })
            .collect()
    }

    fn envelope(&self, mail: &OutgoingMail<'_>, copies: bool) -> NotifyResult<MessageBuilder> {
        let address = mail.sender_email.parse::<Address>().map_err(|e| {
            NotifyError::Transport(format!("Invalid sender '{}': {e}", mail.sender_email))
        })?;
        let name = (!mail.sender_name.is_empty()).then(|| mail.sender_name.to_string());

        let mut builder = Message::builder()
            .from(Mailbox::new(name, address))
            .subject(mail.subject);
        for mailbox in self.mailboxes(mail.to) {
            builder = builder.to(mailbox);
        }
        if copies {
            for mailbox in self.mailboxes(mail.cc) {
                builder = builder.cc(mailbox);
            }
            for mailbox in self.mailboxes(mail.bcc) {
                builder = builder.bcc(mailbox);
            }
        }
        Ok(builder)
    }

    fn html_message(&self, mail: &OutgoingMail<'_>, copies: bool) -> NotifyResult<Message> {
        self.envelope(mail, copies)?
            .header(ContentType::TEXT_HTML)
            .body(mail.body.to_string())
            .map_err(|e| NotifyError::Transport(format!("Failed to build mail: {e}")))
    }

    fn calendar_message(
        &self,
        mail: &OutgoingMail<'_>,
        calendar: &[u8],
        method: Method,
    ) -> NotifyResult<Message> {
        let calendar_type = ContentType::parse(&format!(
            "text/calendar; charset=UTF-8; method={}",
            method.as_ics_str()
        ))
        .map_err(|e| NotifyError::Transport(format!("Invalid calendar content type: {e}")))?;

        let parts = MultiPart::alternative()
            .singlepart(
                SinglePart::builder()
                    .header(ContentType::TEXT_HTML)
                    .body(mail.body.to_string()),
            )
            .singlepart(
                SinglePart::builder()
                    .header(calendar_type)
                    .body(calendar.to_vec()),
            );

        self.envelope(mail, true)?
            .multipart(parts)
            .map_err(|e| NotifyError::Transport(format!("Failed to build invite mail: {e}")))
    }

    fn deliver(&self, message: NotifyResult<Message>, mail: &OutgoingMail<'_>) {
        let result = message.and_then(|message| {
            self.inner
                .send(&message)
                .map_err(|e| NotifyError::Transport(e.to_string()))
        });
        match result {
            Ok(_) => info!(to = mail.to, subject = mail.subject, "Mail sent"),
            Err(e) => error!(to = mail.to, subject = mail.subject, error = %e, "Mail not sent"),
        }
    }
}

impl MailTransport for SmtpMailTransport {
    fn send_html(&self, mail: &OutgoingMail<'_>) {
        self.deliver(self.html_message(mail, false), mail);
    }

    fn send_html_with_copies(&self, mail: &OutgoingMail<'_>) {
        self.deliver(self.html_message(mail, true), mail);
    }

    fn send_calendar(&self, mail: &OutgoingMail<'_>, calendar: &[u8], method: Method) {
        self.deliver(self.calendar_message(mail, calendar, method), mail);
    }
}
