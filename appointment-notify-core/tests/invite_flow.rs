use std::sync::Arc;

use appointment_notify_core::appointment::APPOINTMENT_RESOURCE_TYPE;
use appointment_notify_core::history::NotificationHistory;
use appointment_notify_core::ics::{FileTimeZoneSource, Method};
use appointment_notify_core::recap::RecapRegistry;
use appointment_notify_core::template::MiniJinjaRenderer;
use appointment_notify_core::transport::{RecordingTransport, SendKind};
use appointment_notify_core::{
    AppointmentSnapshot, Entry, NotificationConfig, Notifier, NotifierSettings, ResourceHistory,
    Response,
};
use chrono::NaiveDate;

const TIMEZONES: &str = include_str!("../resources/timezones.ics");

fn unfold(ics: &str) -> String {
    ics.replace("\r\n ", "")
}

fn setup() -> (tempfile::TempDir, Notifier, Arc<RecordingTransport>) {
    let dir = tempfile::tempdir().unwrap();
    let tz_path = dir.path().join("timezones.ics");
    std::fs::write(&tz_path, TIMEZONES).unwrap();

    let settings = NotifierSettings {
        timezone_file: tz_path.clone(),
        ..NotifierSettings::default()
    };
    let transport = Arc::new(RecordingTransport::new());
    let notifier = Notifier::new(
        settings,
        Arc::new(MiniJinjaRenderer::new()),
        transport.clone(),
        Arc::new(FileTimeZoneSource::new(tz_path)),
        RecapRegistry::with_defaults("%d/%m/%Y"),
    )
    .unwrap();

    (dir, notifier, transport)
}

fn appointment() -> AppointmentSnapshot {
    let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    AppointmentSnapshot {
        id: 42,
        reference: "RDV-42".to_string(),
        id_form: 3,
        id_admin_user: 0,
        user_guid: None,
        first_name: "Alice".to_string(),
        last_name: "Martin".to_string(),
        email: "alice@example.org".to_string(),
        start: day.and_hms_opt(10, 0, 0).unwrap(),
        end: day.and_hms_opt(10, 30, 0).unwrap(),
        location: "Town hall, desk 3".to_string(),
        form_title: "Passport".to_string(),
        responses: vec![Response {
            entry: Entry {
                id: 1,
                title: "Reason".to_string(),
                kind: "text".to_string(),
            },
            value: "Renewal".to_string(),
            field_title: None,
            file_name: None,
        }],
    }
}

fn history() -> ResourceHistory {
    ResourceHistory {
        id: 10,
        id_resource: 42,
        resource_type: APPOINTMENT_RESOURCE_TYPE.to_string(),
    }
}

fn config(create: bool) -> NotificationConfig {
    NotificationConfig {
        sender_name: "Town hall".to_string(),
        sender_email: "hall@example.org".to_string(),
        recipients_cc: "bob@example.org".to_string(),
        subject: "Appointment {{ reference }}".to_string(),
        message: "<p>Hello {{ firstName }}, see you on {{ date_appointment }}.</p>{{ recap }}"
            .to_string(),
        send_ical_notif: true,
        create_notif: create,
        ..NotificationConfig::default()
    }
}

#[test]
fn invite_then_cancel_share_uid() {
    let (_dir, notifier, transport) = setup();

    let created = notifier
        .compose_and_send(
            Some(&appointment()),
            Some(&history()),
            Some(&config(true)),
            "fr",
            "alice@example.org",
        )
        .unwrap()
        .unwrap();
    assert_eq!(created.subject, "Appointment RDV-42");
    assert!(created.body.contains("Hello Alice, see you on 01/06/2024."));
    assert!(created.body.contains("Renewal"));

    notifier
        .compose_and_send(
            Some(&appointment()),
            Some(&history()),
            Some(&config(false)),
            "fr",
            "alice@example.org",
        )
        .unwrap()
        .unwrap();

    let sent = transport.take();
    assert_eq!(sent.len(), 2);

    let methods: Vec<Method> = sent
        .iter()
        .map(|mail| match &mail.kind {
            SendKind::Calendar { method, .. } => *method,
            other => panic!("expected a calendar send, got {other:?}"),
        })
        .collect();
    assert_eq!(methods, vec![Method::Request, Method::Cancel]);

    for mail in &sent {
        let ics = unfold(mail.calendar().unwrap());
        assert!(ics.contains("UID:appointment42"), "ICS:\n{ics}");
        assert!(ics.contains("DTSTART;TZID=Europe/Paris:20240601T100000"));
        assert!(ics.contains("DTEND;TZID=Europe/Paris:20240601T103000"));
        assert!(ics.contains("BEGIN:VTIMEZONE"));
        assert!(ics.contains("X-ALT-DESC;FMTTYPE=text/html:"));

        let attendees: Vec<&str> = ics.lines().filter(|l| l.starts_with("ATTENDEE")).collect();
        assert_eq!(attendees.len(), 2);
        assert!(
            attendees
                .iter()
                .any(|l| l.contains("alice@example.org") && l.contains("ROLE=REQ-PARTICIPANT"))
        );
        assert!(
            attendees
                .iter()
                .any(|l| l.contains("bob@example.org") && l.contains("ROLE=OPT-PARTICIPANT"))
        );
    }
    assert!(unfold(sent[1].calendar().unwrap()).contains("METHOD:CANCEL"));

    let record = NotificationHistory::from_content(history().id, 42, "alice@example.org", &created);
    assert_eq!(record.email_subject, "Appointment RDV-42");
}
