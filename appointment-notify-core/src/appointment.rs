//! Appointment-side types read by the notification engine.
//!
//! These are snapshots handed over by the workflow runner. The engine never
//! mutates them and never looks anything up on its own.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Resource type of appointments in workflow history records.
/// Also the prefix of every calendar UID.
pub const APPOINTMENT_RESOURCE_TYPE: &str = "appointment";

/// A read-only view of one booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentSnapshot {
    pub id: i64,
    /// Human-readable booking reference shown to the user
    #[serde(default)]
    pub reference: String,
    pub id_form: i64,
    /// Admin user the appointment is assigned to (0 when unassigned)
    #[serde(default)]
    pub id_admin_user: i64,
    /// GUID of the front-office user, used by CRM notifications
    #[serde(default)]
    pub user_guid: Option<String>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    /// Wall-clock start in the server time zone
    pub start: NaiveDateTime,
    /// Wall-clock end in the server time zone
    pub end: NaiveDateTime,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub form_title: String,
    /// Answers in form question order
    #[serde(default)]
    pub responses: Vec<Response>,
}

/// A question of the booking form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: i64,
    pub title: String,
    /// Question kind identifier ("text", "phone", "file", ...)
    pub kind: String,
}

/// One answer to one form question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub entry: Entry,
    #[serde(default)]
    pub value: String,
    /// Title of the chosen field for choice questions
    #[serde(default)]
    pub field_title: Option<String>,
    /// Original name of an uploaded file
    #[serde(default)]
    pub file_name: Option<String>,
}

/// The workflow history record a notification task runs for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceHistory {
    pub id: i64,
    pub id_resource: i64,
    pub resource_type: String,
}

impl ResourceHistory {
    pub fn is_appointment(&self) -> bool {
        self.resource_type == APPOINTMENT_RESOURCE_TYPE
    }
}
