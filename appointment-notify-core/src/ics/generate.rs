//! Calendar invite generation.

use std::fmt;
use std::sync::{Arc, LazyLock};

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use icalendar::{Calendar, Component, EventLike, Property};
use regex::Regex;
use tracing::debug;

use crate::error::{NotifyError, NotifyResult};
use crate::ics::event::{Attendee, CalendarEvent, Method, Organizer, Role};
use crate::ics::fold::{escape_folded, escape_text, fold_content_line, fold_description};
use crate::ics::timezone::TimeZoneSource;
use crate::settings::NotifierSettings;

/// An opening tag eventually followed by a closing tag.
static HTML_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<\D+.*>.*</\D+.*>").expect("HTML pattern is valid"));

/// Whether a description should also be offered as HTML.
pub fn looks_like_html(description: &str) -> bool {
    HTML_PATTERN.is_match(description)
}

/// What the composer knows about the meeting to invite to.
#[derive(Debug, Clone)]
pub struct InviteRequest<'a> {
    pub appointment_id: i64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub subject: &'a str,
    pub location: &'a str,
    pub organizer: Organizer,
    /// Separator-delimited list of required attendees
    pub required_attendees: &'a str,
    /// Separator-delimited list of optional attendees
    pub optional_attendees: &'a str,
    pub description: &'a str,
    pub create: bool,
}

/// Builds calendar documents bound to the configured time zone.
pub struct InviteEncoder {
    prod_id: String,
    separator: String,
    time_zone: Tz,
    time_zones: Arc<dyn TimeZoneSource>,
}

impl InviteEncoder {
    pub fn new(
        settings: &NotifierSettings,
        time_zones: Arc<dyn TimeZoneSource>,
    ) -> NotifyResult<Self> {
        Ok(InviteEncoder {
            prod_id: settings.ical_prod_id.clone(),
            separator: settings.mail_list_separator.clone(),
            time_zone: settings.tz()?,
            time_zones,
        })
    }

    pub fn time_zone(&self) -> Tz {
        self.time_zone
    }

    /// The instant of a wall-clock time in the configured zone. Ambiguous
    /// times resolve to the earliest instant; skipped times are invalid.
    pub fn localize(&self, local: &NaiveDateTime) -> NotifyResult<DateTime<Utc>> {
        self.time_zone
            .from_local_datetime(local)
            .earliest()
            .map(|time| time.with_timezone(&Utc))
            .ok_or_else(|| {
                NotifyError::InvalidInput(format!(
                    "{local} does not exist in {}",
                    self.time_zone.name()
                ))
            })
    }

    /// Turn a request into an event: UID from the appointment id, attendee
    /// lists tokenized (required first).
    pub fn build_event(&self, request: &InviteRequest<'_>) -> NotifyResult<CalendarEvent> {
        check_chronology(request.start, request.end)?;

        Ok(CalendarEvent {
            uid: CalendarEvent::uid_for(request.appointment_id),
            start: request.start,
            end: request.end,
            subject: request.subject.to_string(),
            location: request.location.to_string(),
            organizer: request.organizer.clone(),
            attendees: self.attendees(request.required_attendees, request.optional_attendees),
            description: request.description.to_string(),
            method: Method::from_create(request.create),
        })
    }

    /// Attendees of both lists, in list order. Every character of the
    /// configured separator delimits addresses; blanks are skipped.
    pub fn attendees(&self, required: &str, optional: &str) -> Vec<Attendee> {
        let mut attendees = Vec::new();
        for (list, role) in [(required, Role::Required), (optional, Role::Optional)] {
            attendees.extend(
                split_addresses(list, &self.separator).map(|email| Attendee::invited(email, role)),
            );
        }
        attendees
    }

    /// Encode an event into a calendar document.
    ///
    /// Fails when the time-zone definitions cannot be loaded or do not
    /// define the configured zone; no document is produced then.
    pub fn encode(&self, event: &CalendarEvent) -> NotifyResult<CalendarDocument> {
        check_chronology(event.start, event.end)?;

        let registry = self.time_zones.load()?;
        let tzid = self.time_zone.name();
        let zone_definition = registry
            .definition(tzid)
            .ok_or_else(|| {
                NotifyError::Format(format!("Time zone '{tzid}' has no VTIMEZONE definition"))
            })?
            .to_vec();

        let start = event.start.with_timezone(&self.time_zone);
        let end = event.end.with_timezone(&self.time_zone);

        let mut ics_event = icalendar::Event::new();
        ics_event.uid(&event.uid);
        ics_event.summary(&event.subject);

        // DTSTAMP - required by RFC 5545
        let dtstamp = Utc::now().format("%Y%m%dT%H%M%SZ").to_string();
        ics_event.add_property("DTSTAMP", &dtstamp);

        add_zoned_datetime(&mut ics_event, "DTSTART", &start);
        add_zoned_datetime(&mut ics_event, "DTEND", &end);

        if !event.location.is_empty() {
            ics_event.location(&event.location);
        }

        // ORGANIZER
        let mut organizer = Property::new("ORGANIZER", format!("mailto:{}", event.organizer.email));
        if !event.organizer.name.is_empty() {
            organizer.add_parameter("CN", &event.organizer.name);
        }
        ics_event.append_property(organizer);

        // ATTENDEE (multi-property - can appear multiple times)
        for attendee in &event.attendees {
            let mut prop = Property::new("ATTENDEE", format!("mailto:{}", attendee.email));
            prop.add_parameter("ROLE", attendee.role.as_ics_str());
            prop.add_parameter("PARTSTAT", attendee.status.as_ics_str());
            prop.add_parameter("RSVP", if attendee.rsvp { "TRUE" } else { "FALSE" });
            ics_event.append_multi_property(prop);
        }

        let ics_event = ics_event.done();
        let mut calendar = Calendar::new();
        calendar.push(ics_event);
        let calendar = calendar.done();

        let html_description =
            looks_like_html(&event.description).then(|| event.description.clone());

        debug!(
            uid = %event.uid,
            method = event.method.as_ics_str(),
            attendees = event.attendees.len(),
            html = html_description.is_some(),
            "Encoded calendar invite"
        );

        Ok(CalendarDocument {
            calendar,
            method: event.method,
            prod_id: self.prod_id.clone(),
            uid: event.uid.clone(),
            start,
            end,
            attendees: event.attendees.clone(),
            description: fold_description(&event.description),
            html_description,
            zone_definition,
        })
    }
}

/// An encoded invite, ready for serialization.
#[derive(Debug, Clone)]
pub struct CalendarDocument {
    calendar: Calendar,
    method: Method,
    prod_id: String,
    uid: String,
    start: DateTime<Tz>,
    end: DateTime<Tz>,
    attendees: Vec<Attendee>,
    description: String,
    html_description: Option<String>,
    zone_definition: Vec<String>,
}

impl CalendarDocument {
    pub fn method(&self) -> Method {
        self.method
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn start(&self) -> DateTime<Tz> {
        self.start
    }

    pub fn end(&self) -> DateTime<Tz> {
        self.end
    }

    pub fn attendees(&self) -> &[Attendee] {
        &self.attendees
    }

    /// The folded plain description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The unfolded HTML alternative, when the description contains markup.
    pub fn html_description(&self) -> Option<&str> {
        self.html_description.as_deref()
    }

    /// Canonical text, CRLF line endings.
    pub fn to_ics_string(&self) -> String {
        let raw = self.calendar.to_string();
        let mut out = String::with_capacity(raw.len() + 1024);
        let mut depth = 0usize;
        let mut skipping = false;
        let mut zone_written = false;

        for line in raw.lines() {
            let continuation = line.starts_with(' ') || line.starts_with('\t');
            if continuation {
                if !skipping {
                    push_line(&mut out, line);
                }
                continue;
            }
            skipping = false;

            if let Some(name) = line.strip_prefix("BEGIN:") {
                if name == "VEVENT" && !zone_written {
                    for zone_line in &self.zone_definition {
                        push_line(&mut out, &fold_content_line(zone_line));
                    }
                    zone_written = true;
                }
                push_line(&mut out, line);
                depth += 1;
                if name == "VCALENDAR" {
                    self.push_calendar_header(&mut out);
                }
                continue;
            }

            if line.starts_with("END:") {
                if line == "END:VEVENT" {
                    self.push_descriptions(&mut out);
                }
                push_line(&mut out, line);
                depth = depth.saturating_sub(1);
                continue;
            }

            // Calendar-level properties are written by push_calendar_header
            if depth == 1 {
                skipping = true;
                continue;
            }

            push_line(&mut out, line);
        }

        out
    }

    /// Bytes handed to the transport.
    pub fn serialize(&self) -> Vec<u8> {
        self.to_ics_string().into_bytes()
    }

    fn push_calendar_header(&self, out: &mut String) {
        push_line(out, "VERSION:2.0");
        push_line(out, &fold_content_line(&format!("PRODID:{}", self.prod_id)));
        push_line(out, "CALSCALE:GREGORIAN");
        push_line(out, &format!("METHOD:{}", self.method.as_ics_str()));
    }

    fn push_descriptions(&self, out: &mut String) {
        push_line(out, &format!("DESCRIPTION:{}", escape_folded(&self.description)));
        if let Some(ref html) = self.html_description {
            let alt = format!("X-ALT-DESC;FMTTYPE=text/html:{}", escape_text(html));
            push_line(out, &fold_content_line(&alt));
        }
    }
}

impl fmt::Display for CalendarDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_ics_string())
    }
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line);
    out.push_str("\r\n");
}

fn check_chronology(start: DateTime<Utc>, end: DateTime<Utc>) -> NotifyResult<()> {
    if end < start {
        return Err(NotifyError::InvalidInput(format!(
            "Event ends ({end}) before it starts ({start})"
        )));
    }
    Ok(())
}

/// Add a DTSTART/DTEND with the wall-clock time and its TZID parameter
fn add_zoned_datetime(ics_event: &mut icalendar::Event, name: &str, time: &DateTime<Tz>) {
    let mut prop = Property::new(name, time.format("%Y%m%dT%H%M%S").to_string());
    prop.add_parameter("TZID", time.timezone().name());
    ics_event.append_property(prop);
}

/// Split a recipient list on any of the separator characters.
pub fn split_addresses<'a>(list: &'a str, separator: &'a str) -> impl Iterator<Item = &'a str> {
    list.split(move |c: char| separator.contains(c))
        .map(str::trim)
        .filter(|address| !address.is_empty())
}
