//! Who a notification goes to.
//!
//! The user variants address the appointment's owner, by mail or through the
//! SMS gateway. The admin variant addresses the admin user in charge, and
//! gives them links to cancel or validate the appointment.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::appointment::{AppointmentSnapshot, ResourceHistory};
use crate::error::NotifyResult;
use crate::markers::{MARK_URL_CANCEL, MARK_URL_VALIDATE};
use crate::notification_config::NotificationConfig;
use crate::notify::{Notifier, RenderedContent};

/// Question kind holding phone numbers.
pub const PHONE_ENTRY_KIND: &str = "phone";

/// The appointment's mail address, if any.
pub fn user_address(appointment: &AppointmentSnapshot) -> Option<&str> {
    Some(appointment.email.trim()).filter(|email| !email.is_empty())
}

/// Mail address of the SMS gateway for the first phone number answered.
pub fn sms_address(appointment: &AppointmentSnapshot, sms_server: &str) -> Option<String> {
    appointment
        .responses
        .iter()
        .filter(|response| response.entry.kind == PHONE_ENTRY_KIND)
        .map(|response| response.value.trim())
        .find(|phone| !phone.is_empty())
        .map(|phone| format!("{phone}{sms_server}"))
}

/// Notify the appointment's owner by mail, or by SMS when the task says so.
pub fn notify_user(
    notifier: &Notifier,
    appointment: Option<&AppointmentSnapshot>,
    history: Option<&ResourceHistory>,
    config: Option<&NotificationConfig>,
    locale: &str,
) -> NotifyResult<Option<RenderedContent>> {
    let (Some(appointment), Some(config)) = (appointment, config) else {
        return Ok(None);
    };

    let target = if config.is_sms {
        sms_address(appointment, &notifier.settings().sms_server)
    } else {
        user_address(appointment).map(str::to_string)
    };
    let Some(target) = target else {
        warn!(appointment = appointment.id, sms = config.is_sms, "No address to notify");
        return Ok(None);
    };

    notifier.compose_and_send(Some(appointment), history, Some(config), locale, &target)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminUser {
    pub id: i64,
    pub email: String,
}

/// Admin user lookup.
pub trait AdminDirectory: Send + Sync {
    fn find_admin(&self, id_admin_user: i64) -> Option<AdminUser>;
}

/// Links that run a workflow action on an appointment.
pub trait ActionUrlBuilder: Send + Sync {
    fn action_url(&self, id_action: i64, id_admin_user: i64, id_appointment: i64) -> String;
}

/// Settings of an admin notification task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminTaskConfig {
    #[serde(flatten)]
    pub notification: NotificationConfig,
    /// Admin to notify; the appointment's admin when not positive
    pub id_admin_user: i64,
    pub id_action_cancel: i64,
    pub id_action_validate: i64,
}

impl AdminTaskConfig {
    /// The admin in charge of `appointment`.
    pub fn resolve_admin(
        &self,
        appointment: &AppointmentSnapshot,
        directory: &dyn AdminDirectory,
    ) -> Option<AdminUser> {
        let id = if self.id_admin_user > 0 {
            self.id_admin_user
        } else {
            appointment.id_admin_user
        };
        directory.find_admin(id)
    }

    /// The notification config with the action links added as markers.
    pub fn with_action_urls(
        &self,
        appointment: &AppointmentSnapshot,
        urls: &dyn ActionUrlBuilder,
    ) -> NotificationConfig {
        let mut config = self.notification.clone();
        for (marker, id_action) in [
            (MARK_URL_CANCEL, self.id_action_cancel),
            (MARK_URL_VALIDATE, self.id_action_validate),
        ] {
            let url = urls.action_url(id_action, self.id_admin_user, appointment.id);
            config.extra_markers.insert(marker.to_string(), url);
        }
        config
    }
}

/// Notify the admin in charge of the appointment.
pub fn notify_admin(
    notifier: &Notifier,
    appointment: Option<&AppointmentSnapshot>,
    history: Option<&ResourceHistory>,
    task: Option<&AdminTaskConfig>,
    directory: &dyn AdminDirectory,
    urls: &dyn ActionUrlBuilder,
    locale: &str,
) -> NotifyResult<Option<RenderedContent>> {
    let (Some(appointment), Some(task)) = (appointment, task) else {
        return Ok(None);
    };
    let Some(admin) = task.resolve_admin(appointment, directory) else {
        warn!(appointment = appointment.id, "No admin user to notify");
        return Ok(None);
    };

    let config = task.with_action_urls(appointment, urls);
    notifier.compose_and_send(Some(appointment), history, Some(&config), locale, &admin.email)
}
