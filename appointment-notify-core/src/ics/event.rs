//! Calendar invite types.

use chrono::{DateTime, Utc};

use crate::appointment::APPOINTMENT_RESOURCE_TYPE;

/// The meeting an invite creates or cancels.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarEvent {
    /// Stable across create and cancel, see [`CalendarEvent::uid_for`]
    pub uid: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub subject: String,
    pub location: String,
    pub organizer: Organizer,
    /// Required attendees first, then optional ones
    pub attendees: Vec<Attendee>,
    /// Plain description, unfolded
    pub description: String,
    pub method: Method,
}

impl CalendarEvent {
    pub fn uid_for(appointment_id: i64) -> String {
        format!("{APPOINTMENT_RESOURCE_TYPE}{appointment_id}")
    }
}

/// Sender of the invite (ORGANIZER).
#[derive(Debug, Clone, PartialEq)]
pub struct Organizer {
    pub name: String,
    pub email: String,
}

/// An invited participant (ATTENDEE).
#[derive(Debug, Clone, PartialEq)]
pub struct Attendee {
    pub email: String,
    pub role: Role,
    pub status: ParticipationStatus,
    pub rsvp: bool,
}

impl Attendee {
    /// A participant as invited by the engine: action needed, no RSVP requested.
    pub fn invited(email: &str, role: Role) -> Self {
        Attendee {
            email: email.to_string(),
            role,
            status: ParticipationStatus::NeedsAction,
            rsvp: false,
        }
    }
}

/// Attendee ROLE parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Required,
    Optional,
}

impl Role {
    pub fn as_ics_str(self) -> &'static str {
        match self {
            Role::Required => "REQ-PARTICIPANT",
            Role::Optional => "OPT-PARTICIPANT",
        }
    }
}

/// Attendee PARTSTAT parameter. Invitations are always sent unanswered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipationStatus {
    NeedsAction,
}

impl ParticipationStatus {
    pub fn as_ics_str(self) -> &'static str {
        match self {
            ParticipationStatus::NeedsAction => "NEEDS-ACTION",
        }
    }
}

/// Calendar METHOD: create or remove the meeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Request,
    Cancel,
}

impl Method {
    pub fn from_create(create: bool) -> Self {
        if create { Method::Request } else { Method::Cancel }
    }

    pub fn as_ics_str(self) -> &'static str {
        match self {
            Method::Request => "REQUEST",
            Method::Cancel => "CANCEL",
        }
    }

    pub fn is_create(self) -> bool {
        self == Method::Request
    }
}
