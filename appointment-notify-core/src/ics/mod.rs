//! Calendar invite encoding.
//!
//! This module produces RFC 5545 documents for appointment invites:
//! one VEVENT bound to the server time zone, with its VTIMEZONE definition,
//! attendee roles, a folded description and an optional HTML alternative.

mod event;
mod fold;
mod generate;
mod timezone;

pub use event::{Attendee, CalendarEvent, Method, Organizer, ParticipationStatus, Role};
pub use fold::{FOLD, escape_text, fold_content_line, fold_description};
pub use generate::{
    CalendarDocument, InviteEncoder, InviteRequest, looks_like_html, split_addresses,
};
pub use timezone::{FileTimeZoneSource, TimeZoneRegistry, TimeZoneSource};
