//! CRM notifications.
//!
//! Instead of a mail, the user gets a demand in the CRM, followed by a
//! notification on that demand.

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::appointment::AppointmentSnapshot;
use crate::error::NotifyResult;
use crate::markers::format_naive;
use crate::settings::NotifierSettings;

/// Settings of one CRM notification task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrmTaskConfig {
    pub demand_type: String,
    pub id_status_crm: i64,
    pub status_text: String,
    /// Opaque payload attached to the demand
    pub data: String,
    pub object: String,
    /// Message with `${marker}` placeholders
    pub message: String,
    pub sender: String,
}

pub trait CrmClient: Send + Sync {
    /// Create a demand for the user, returns its id.
    fn create_demand(
        &self,
        demand_type: &str,
        user_guid: &str,
        id_status: i64,
        status_text: &str,
        data: &str,
    ) -> NotifyResult<String>;

    fn notify(&self, id_demand: &str, object: &str, message: &str, sender: &str)
    -> NotifyResult<()>;
}

/// Replace `${firstName}`, `${lastName}`, `${email}`, `${reference}`,
/// `${date_appointment}` and `${time_appointment}` in `message`.
pub fn crm_message(
    message: &str,
    appointment: &AppointmentSnapshot,
    settings: &NotifierSettings,
) -> NotifyResult<String> {
    let date = format_naive(&appointment.start, &settings.date_format)?;
    let time = format_naive(&appointment.start, &settings.time_format)?;

    let message = [
        ("${firstName}", appointment.first_name.as_str()),
        ("${lastName}", appointment.last_name.as_str()),
        ("${email}", appointment.email.as_str()),
        ("${reference}", appointment.reference.as_str()),
        ("${date_appointment}", date.as_str()),
        ("${time_appointment}", time.as_str()),
    ]
    .iter()
    .fold(message.to_string(), |acc, (mark, value)| acc.replace(mark, value));
    Ok(message)
}

/// Create the demand, then notify it. Returns the demand id when the
/// notification went out.
///
/// A demand that cannot be created is logged and skips the notification.
pub fn notify_crm(
    client: &dyn CrmClient,
    config: Option<&CrmTaskConfig>,
    appointment: &AppointmentSnapshot,
    settings: &NotifierSettings,
) -> NotifyResult<Option<String>> {
    let Some(config) = config else {
        return Ok(None);
    };
    let Some(user_guid) = appointment.user_guid.as_deref().filter(|g| !g.trim().is_empty())
    else {
        warn!(appointment = appointment.id, "No user GUID, CRM demand not created");
        return Ok(None);
    };

    let id_demand = match client.create_demand(
        &config.demand_type,
        user_guid,
        config.id_status_crm,
        &config.status_text,
        &config.data,
    ) {
        Ok(id) => id,
        Err(e) => {
            error!(appointment = appointment.id, error = %e, "Could not create CRM demand");
            return Ok(None);
        }
    };

    let message = crm_message(&config.message, appointment, settings)?;
    client.notify(&id_demand, &config.object, &message, &config.sender)?;

    info!(appointment = appointment.id, id_demand = %id_demand, "CRM demand notified");
    Ok(Some(id_demand))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NotifyError;
    use chrono::NaiveDate;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeCrm {
        fail_create: bool,
        notified: Mutex<Vec<(String, String)>>,
    }

    impl CrmClient for FakeCrm {
        fn create_demand(
            &self,
            _demand_type: &str,
            user_guid: &str,
            _id_status: i64,
            _status_text: &str,
            _data: &str,
        ) -> NotifyResult<String> {
            if self.fail_create {
                return Err(NotifyError::Transport("CRM down".into()));
            }
            Ok(format!("demand-{user_guid}"))
        }

        fn notify(
            &self,
            id_demand: &str,
            _object: &str,
            message: &str,
            _sender: &str,
        ) -> NotifyResult<()> {
            self.notified
                .lock()
                .unwrap()
                .push((id_demand.to_string(), message.to_string()));
            Ok(())
        }
    }

    fn appointment() -> AppointmentSnapshot {
        let day = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        AppointmentSnapshot {
            id: 9,
            reference: "AB-9".to_string(),
            id_form: 1,
            id_admin_user: 0,
            user_guid: Some("guid-1".to_string()),
            first_name: "Alice".to_string(),
            last_name: "Martin".to_string(),
            email: "alice@example.org".to_string(),
            start: day.and_hms_opt(14, 15, 0).unwrap(),
            end: day.and_hms_opt(14, 45, 0).unwrap(),
            location: String::new(),
            form_title: String::new(),
            responses: Vec::new(),
        }
    }

    fn config() -> CrmTaskConfig {
        CrmTaskConfig {
            message: "${firstName} ${lastName}: ${reference} on ${date_appointment} at ${time_appointment}"
                .to_string(),
            ..CrmTaskConfig::default()
        }
    }

    #[test]
    fn test_message_substitution() {
        let message =
            crm_message(&config().message, &appointment(), &NotifierSettings::default()).unwrap();
        assert_eq!(message, "Alice Martin: AB-9 on 05/03/2024 at 14:15");
    }

    #[test]
    fn test_demand_is_notified() {
        let crm = FakeCrm::default();
        let id = notify_crm(&crm, Some(&config()), &appointment(), &NotifierSettings::default())
            .unwrap();

        assert_eq!(id.as_deref(), Some("demand-guid-1"));
        let notified = crm.notified.lock().unwrap();
        assert_eq!(notified[0].0, "demand-guid-1");
        assert!(notified[0].1.starts_with("Alice Martin"));
    }

    #[test]
    fn test_failed_demand_skips_notify() {
        let crm = FakeCrm {
            fail_create: true,
            ..FakeCrm::default()
        };
        let id = notify_crm(&crm, Some(&config()), &appointment(), &NotifierSettings::default())
            .unwrap();

        assert_eq!(id, None);
        assert!(crm.notified.lock().unwrap().is_empty());
    }

    #[test]
    fn test_missing_guid_skips_everything() {
        let crm = FakeCrm::default();
        let mut appointment = appointment();
        appointment.user_guid = None;

        let id = notify_crm(&crm, Some(&config()), &appointment, &NotifierSettings::default())
            .unwrap();
        assert_eq!(id, None);
    }
}
