//! Record of a sent notification.

use serde::{Deserialize, Serialize};

use crate::notify::RenderedContent;

/// What was sent for one history entry of an appointment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationHistory {
    /// Assigned by the store; 0 until saved
    #[serde(default)]
    pub id_notif: i64,
    pub id_history: i64,
    pub id_appointment: i64,
    pub email_to: String,
    pub email_subject: String,
    pub email_message: String,
}

impl NotificationHistory {
    pub fn from_content(
        id_history: i64,
        id_appointment: i64,
        email_to: &str,
        content: &RenderedContent,
    ) -> Self {
        NotificationHistory {
            id_notif: 0,
            id_history,
            id_appointment,
            email_to: email_to.to_string(),
            email_subject: content.subject.clone(),
            email_message: content.body.clone(),
        }
    }
}
