//! Per-task notification configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Settings of one notification task, read-only for one notification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub sender_name: String,
    pub sender_email: String,
    /// Separator-delimited Cc list (also the optional attendees of an invite)
    pub recipients_cc: String,
    /// Separator-delimited Bcc list
    pub recipients_bcc: String,
    /// Inline template of the subject line
    pub subject: String,
    /// Text embedded by the body template; may contain markers itself
    pub message: String,
    /// Invite location; the appointment location is used when blank
    pub location: String,
    /// Send a calendar invite instead of a plain mail
    pub send_ical_notif: bool,
    /// Invite creates the meeting (true) or cancels it (false)
    pub create_notif: bool,
    /// Render the SMS body template instead of the mail one
    pub is_sms: bool,
    /// Additional markers; they override the computed ones
    pub extra_markers: BTreeMap<String, String>,
}

impl NotificationConfig {
    /// Whether the plain mail has to go through the Cc/Bcc-aware variant.
    pub fn has_copies(&self) -> bool {
        !self.recipients_cc.trim().is_empty() || !self.recipients_bcc.trim().is_empty()
    }
}
