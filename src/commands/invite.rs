use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use appointment_notify_core::NotifierSettings;
use appointment_notify_core::ics::{FileTimeZoneSource, InviteEncoder, InviteRequest, Organizer};
use appointment_notify_core::notify::Sender;
use appointment_notify_core::recipient;

use crate::fixtures;

pub fn run(
    settings: NotifierSettings,
    appointment_path: &Path,
    to: Option<String>,
    cc: &str,
    subject: Option<String>,
    cancel: bool,
) -> Result<()> {
    let appointment = fixtures::load_appointment(appointment_path)?;

    let time_zones = FileTimeZoneSource::new(settings.timezone_path());
    let encoder = InviteEncoder::new(&settings, Arc::new(time_zones))?;

    let to = to
        .or_else(|| recipient::user_address(&appointment).map(str::to_string))
        .unwrap_or_default();
    let subject = subject.unwrap_or_else(|| appointment.form_title.clone());
    let sender = Sender::resolve("", "", &settings.no_reply_email);

    let request = InviteRequest {
        appointment_id: appointment.id,
        start: encoder.localize(&appointment.start)?,
        end: encoder.localize(&appointment.end)?,
        subject: &subject,
        location: &appointment.location,
        organizer: Organizer {
            name: sender.name,
            email: sender.email,
        },
        required_attendees: &to,
        optional_attendees: cc,
        description: &appointment.reference,
        create: !cancel,
    };

    let event = encoder.build_event(&request)?;
    let document = encoder.encode(&event)?;
    print!("{document}");

    Ok(())
}
