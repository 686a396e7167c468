//! Notification composition.
//!
//! A [`Notifier`] renders the subject and body of one notification, then
//! hands it to the mail transport, either as a plain HTML mail or with a
//! calendar invite attached.

mod sender;

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info};

use crate::appointment::{AppointmentSnapshot, ResourceHistory};
use crate::error::{NotifyError, NotifyResult};
use crate::ics::{CalendarDocument, InviteEncoder, InviteRequest, Organizer, TimeZoneSource};
use crate::markers::{MarkerModel, MarkerModelBuilder};
use crate::notification_config::NotificationConfig;
use crate::recap::RecapRegistry;
use crate::settings::NotifierSettings;
use crate::template::{TEMPLATE_NOTIFY_MAIL, TEMPLATE_NOTIFY_SMS, TemplateRenderer};
use crate::transport::{MailTransport, OutgoingMail};

pub use sender::{Sender, is_valid_email};

/// What was sent, for the notification history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedContent {
    pub subject: String,
    pub body: String,
}

pub struct Notifier {
    settings: NotifierSettings,
    renderer: Arc<dyn TemplateRenderer>,
    transport: Arc<dyn MailTransport>,
    markers: MarkerModelBuilder,
    encoder: InviteEncoder,
}

impl Notifier {
    pub fn new(
        settings: NotifierSettings,
        renderer: Arc<dyn TemplateRenderer>,
        transport: Arc<dyn MailTransport>,
        time_zones: Arc<dyn TimeZoneSource>,
        recaps: RecapRegistry,
    ) -> NotifyResult<Self> {
        let markers = MarkerModelBuilder::new(&settings, recaps, renderer.clone());
        let encoder = InviteEncoder::new(&settings, time_zones)?;
        Ok(Notifier {
            settings,
            renderer,
            transport,
            markers,
            encoder,
        })
    }

    pub fn settings(&self) -> &NotifierSettings {
        &self.settings
    }

    pub fn encoder(&self) -> &InviteEncoder {
        &self.encoder
    }

    /// Render and send one notification to `target`.
    ///
    /// Returns `None` without sending anything when an input is missing, when
    /// the history record is not about an appointment, or when the invite
    /// could not be encoded.
    pub fn compose_and_send(
        &self,
        appointment: Option<&AppointmentSnapshot>,
        history: Option<&ResourceHistory>,
        config: Option<&NotificationConfig>,
        locale: &str,
        target: &str,
    ) -> NotifyResult<Option<RenderedContent>> {
        let (Some(appointment), Some(history), Some(config)) = (appointment, history, config)
        else {
            debug!("Nothing to notify: missing appointment, history or task config");
            return Ok(None);
        };
        if !history.is_appointment() {
            debug!(
                resource_type = %history.resource_type,
                id_history = history.id,
                "Nothing to notify: history is not about an appointment"
            );
            return Ok(None);
        }

        let sender = Sender::resolve(
            &config.sender_name,
            &config.sender_email,
            &self.settings.no_reply_email,
        );
        let config = NotificationConfig {
            sender_name: sender.name.clone(),
            sender_email: sender.email.clone(),
            ..config.clone()
        };

        let model = self.markers.build(
            Some(appointment),
            Some(&config),
            &appointment.responses,
            locale,
        )?;
        let content = self.render(&config, locale, &model)?;

        let mail = OutgoingMail {
            to: target,
            cc: &config.recipients_cc,
            bcc: &config.recipients_bcc,
            sender_name: &sender.name,
            sender_email: &sender.email,
            subject: &content.subject,
            body: &content.body,
        };

        if config.send_ical_notif {
            let document = match self.invite(appointment, &config, &sender, &content, target) {
                Ok(document) => document,
                Err(NotifyError::ResourceUnavailable { path, source }) => {
                    error!(
                        appointment = appointment.id,
                        timezone_file = %path.display(),
                        error = %source,
                        "Time-zone resource unavailable, notification aborted"
                    );
                    return Ok(None);
                }
                Err(NotifyError::Format(reason)) => {
                    error!(
                        appointment = appointment.id,
                        error = %reason,
                        "Could not encode calendar invite, notification aborted"
                    );
                    return Ok(None);
                }
                Err(e) => return Err(e),
            };
            self.transport
                .send_calendar(&mail, &document.serialize(), document.method());
        } else if config.has_copies() {
            self.transport.send_html_with_copies(&mail);
        } else {
            self.transport.send_html(&mail);
        }

        info!(
            appointment = appointment.id,
            id_history = history.id,
            invite = config.send_ical_notif,
            "Notification sent"
        );
        Ok(Some(content))
    }

    /// Subject from the inline template; body from the mail or SMS template,
    /// rendered a second time so markers carried by values get expanded.
    fn render(
        &self,
        config: &NotificationConfig,
        locale: &str,
        model: &MarkerModel,
    ) -> NotifyResult<RenderedContent> {
        let subject = self.renderer.render_string(&config.subject, locale, model)?;

        let template = if config.is_sms {
            TEMPLATE_NOTIFY_SMS
        } else {
            TEMPLATE_NOTIFY_MAIL
        };
        let first_pass = self.renderer.render_template(template, locale, model)?;
        let body = self.renderer.render_string(&first_pass, locale, model)?;

        Ok(RenderedContent { subject, body })
    }

    fn invite(
        &self,
        appointment: &AppointmentSnapshot,
        config: &NotificationConfig,
        sender: &Sender,
        content: &RenderedContent,
        target: &str,
    ) -> NotifyResult<CalendarDocument> {
        let location = if config.location.trim().is_empty() {
            appointment.location.as_str()
        } else {
            config.location.as_str()
        };

        let request = InviteRequest {
            appointment_id: appointment.id,
            start: self.encoder.localize(&appointment.start)?,
            end: self.encoder.localize(&appointment.end)?,
            subject: &content.subject,
            location,
            organizer: Organizer {
                name: sender.name.clone(),
                email: sender.email.clone(),
            },
            required_attendees: target,
            optional_attendees: &config.recipients_cc,
            description: &content.body,
            create: config.create_notif,
        };

        let event = self.encoder.build_event(&request)?;
        self.encoder.encode(&event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appointment::APPOINTMENT_RESOURCE_TYPE;
    use crate::ics::{FileTimeZoneSource, Method, TimeZoneRegistry};
    use crate::template::MiniJinjaRenderer;
    use crate::transport::{RecordingTransport, SendKind};
    use chrono::NaiveDate;

    const TIMEZONES: &str = include_str!("../../resources/timezones.ics");

    fn notifier_with(time_zones: Arc<dyn TimeZoneSource>) -> (Notifier, Arc<RecordingTransport>) {
        let transport = Arc::new(RecordingTransport::new());
        let notifier = Notifier::new(
            NotifierSettings::default(),
            Arc::new(MiniJinjaRenderer::new()),
            transport.clone(),
            time_zones,
            RecapRegistry::with_defaults("%d/%m/%Y"),
        )
        .unwrap();
        (notifier, transport)
    }

    fn notifier() -> (Notifier, Arc<RecordingTransport>) {
        notifier_with(Arc::new(TimeZoneRegistry::parse(TIMEZONES).unwrap()))
    }

    fn appointment() -> AppointmentSnapshot {
        let day = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        AppointmentSnapshot {
            id: 42,
            reference: "AB-42".to_string(),
            id_form: 1,
            id_admin_user: 0,
            user_guid: None,
            first_name: "Alice".to_string(),
            last_name: "Martin".to_string(),
            email: "alice@example.org".to_string(),
            start: day.and_hms_opt(9, 0, 0).unwrap(),
            end: day.and_hms_opt(9, 30, 0).unwrap(),
            location: "Town hall".to_string(),
            form_title: "Passport".to_string(),
            responses: Vec::new(),
        }
    }

    fn history(resource_type: &str) -> ResourceHistory {
        ResourceHistory {
            id: 1,
            id_resource: 42,
            resource_type: resource_type.to_string(),
        }
    }

    fn config() -> NotificationConfig {
        NotificationConfig {
            sender_name: "Town hall".to_string(),
            sender_email: "hall@example.org".to_string(),
            subject: "Appointment {{ reference }}".to_string(),
            message: "Hello {{ firstName }}".to_string(),
            ..NotificationConfig::default()
        }
    }

    #[test]
    fn test_missing_inputs_send_nothing() {
        let (notifier, transport) = notifier();
        let appointment = appointment();
        let appointment_history = history(APPOINTMENT_RESOURCE_TYPE);
        let other_history = history("form_response");
        let configs = [
            config(),
            NotificationConfig {
                send_ical_notif: true,
                create_notif: true,
                ..config()
            },
            NotificationConfig {
                is_sms: true,
                ..config()
            },
        ];

        for config in &configs {
            for mask in 0..8u8 {
                let a = (mask & 1 != 0).then_some(&appointment);
                let c = (mask & 4 != 0).then_some(config);
                let histories = [
                    ((mask & 2 != 0).then_some(&appointment_history), mask == 7),
                    (Some(&other_history), false),
                ];
                for (h, complete) in histories {
                    if complete {
                        continue;
                    }
                    let result = notifier.compose_and_send(a, h, c, "fr", "alice@example.org");
                    assert_eq!(result.unwrap(), None, "mask {mask}, history {h:?}");
                }
            }
        }
        assert!(transport.sent().is_empty());
    }

    #[test]
    fn test_broken_subject_template_is_an_error() {
        let (notifier, transport) = notifier();
        let config = NotificationConfig {
            subject: "{% if %}".to_string(),
            ..config()
        };

        let result = notifier.compose_and_send(
            Some(&appointment()),
            Some(&history(APPOINTMENT_RESOURCE_TYPE)),
            Some(&config),
            "fr",
            "alice@example.org",
        );
        assert!(matches!(result, Err(NotifyError::Render(_))), "Got: {result:?}");
        assert!(transport.sent().is_empty());
    }

    #[test]
    fn test_broken_message_fails_second_pass() {
        let (notifier, transport) = notifier();
        let config = NotificationConfig {
            message: "Hello {{ firstName".to_string(),
            send_ical_notif: true,
            ..config()
        };

        let result = notifier.compose_and_send(
            Some(&appointment()),
            Some(&history(APPOINTMENT_RESOURCE_TYPE)),
            Some(&config),
            "fr",
            "alice@example.org",
        );
        assert!(matches!(result, Err(NotifyError::Render(_))), "Got: {result:?}");
        assert!(transport.sent().is_empty());
    }

    #[test]
    fn test_other_resource_type_sends_nothing() {
        let (notifier, transport) = notifier();
        let result = notifier.compose_and_send(
            Some(&appointment()),
            Some(&history("form_response")),
            Some(&config()),
            "fr",
            "alice@example.org",
        );
        assert_eq!(result.unwrap(), None);
        assert!(transport.sent().is_empty());
    }

    #[test]
    fn test_plain_mail_with_double_pass() {
        let (notifier, transport) = notifier();
        let content = notifier
            .compose_and_send(
                Some(&appointment()),
                Some(&history(APPOINTMENT_RESOURCE_TYPE)),
                Some(&config()),
                "fr",
                "alice@example.org",
            )
            .unwrap()
            .unwrap();

        assert_eq!(content.subject, "Appointment AB-42");
        assert!(content.body.contains("Hello Alice"), "Got: {}", content.body);

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].kind, SendKind::Html);
        assert_eq!(sent[0].to, "alice@example.org");
        assert_eq!(sent[0].body, content.body);
    }

    #[test]
    fn test_copies_use_copy_aware_send() {
        let (notifier, transport) = notifier();
        let config = NotificationConfig {
            recipients_bcc: "audit@example.org".to_string(),
            ..config()
        };
        notifier
            .compose_and_send(
                Some(&appointment()),
                Some(&history(APPOINTMENT_RESOURCE_TYPE)),
                Some(&config),
                "fr",
                "alice@example.org",
            )
            .unwrap();

        let sent = transport.sent();
        assert_eq!(sent[0].kind, SendKind::HtmlWithCopies);
        assert_eq!(sent[0].bcc, "audit@example.org");
    }

    #[test]
    fn test_sms_template_is_used() {
        let (notifier, _transport) = notifier();
        let config = NotificationConfig {
            is_sms: true,
            ..config()
        };
        let content = notifier
            .compose_and_send(
                Some(&appointment()),
                Some(&history(APPOINTMENT_RESOURCE_TYPE)),
                Some(&config),
                "fr",
                "0600000000@sms.example.org",
            )
            .unwrap()
            .unwrap();
        assert_eq!(content.body, "Hello Alice");
    }

    #[test]
    fn test_sender_is_normalized() {
        let (notifier, transport) = notifier();
        let config = NotificationConfig {
            sender_name: String::new(),
            sender_email: "broken".to_string(),
            ..config()
        };
        notifier
            .compose_and_send(
                Some(&appointment()),
                Some(&history(APPOINTMENT_RESOURCE_TYPE)),
                Some(&config),
                "fr",
                "alice@example.org",
            )
            .unwrap();

        let sent = transport.sent();
        assert_eq!(sent[0].sender_email, "no-reply@localhost");
        assert_eq!(sent[0].sender_name, "no-reply@localhost");
    }

    #[test]
    fn test_invite_is_attached() {
        let (notifier, transport) = notifier();
        let config = NotificationConfig {
            send_ical_notif: true,
            create_notif: true,
            recipients_cc: "bob@example.org".to_string(),
            location: "Room 4".to_string(),
            ..config()
        };
        notifier
            .compose_and_send(
                Some(&appointment()),
                Some(&history(APPOINTMENT_RESOURCE_TYPE)),
                Some(&config),
                "fr",
                "alice@example.org",
            )
            .unwrap()
            .unwrap();

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        let SendKind::Calendar { method, calendar } = &sent[0].kind else {
            panic!("expected a calendar send, got {:?}", sent[0].kind);
        };
        assert_eq!(*method, Method::Request);
        assert!(calendar.contains("UID:appointment42"));
        assert!(calendar.contains("DTSTART;TZID=Europe/Paris:20240305T090000"));
        assert!(calendar.contains("LOCATION:Room 4"));
        assert!(calendar.contains("METHOD:REQUEST"));
    }

    #[test]
    fn test_missing_timezone_resource_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let (notifier, transport) =
            notifier_with(Arc::new(FileTimeZoneSource::new(dir.path().join("none.ics"))));
        let config = NotificationConfig {
            send_ical_notif: true,
            ..config()
        };

        let result = notifier.compose_and_send(
            Some(&appointment()),
            Some(&history(APPOINTMENT_RESOURCE_TYPE)),
            Some(&config),
            "fr",
            "alice@example.org",
        );
        assert_eq!(result.unwrap(), None);
        assert!(transport.sent().is_empty());
    }

    #[test]
    fn test_reversed_appointment_is_invalid() {
        let (notifier, transport) = notifier();
        let mut appointment = appointment();
        std::mem::swap(&mut appointment.start, &mut appointment.end);
        let config = NotificationConfig {
            send_ical_notif: true,
            ..config()
        };

        let result = notifier.compose_and_send(
            Some(&appointment),
            Some(&history(APPOINTMENT_RESOURCE_TYPE)),
            Some(&config),
            "fr",
            "alice@example.org",
        );
        assert!(matches!(result, Err(NotifyError::InvalidInput(_))));
        assert!(transport.sent().is_empty());
    }
}
