use std::path::Path;

use anyhow::{Context, Result};
use appointment_notify_core::appointment::APPOINTMENT_RESOURCE_TYPE;
use appointment_notify_core::{AppointmentSnapshot, NotificationConfig, ResourceHistory};

/// Read an appointment from a JSON file.
pub fn load_appointment(path: &Path) -> Result<AppointmentSnapshot> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read appointment {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse appointment {}", path.display()))
}

/// Read a notification task from a TOML file.
pub fn load_task(path: &Path) -> Result<NotificationConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read task {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("Failed to parse task {}", path.display()))
}

/// The history record a workflow would have created for this appointment.
pub fn history_for(appointment: &AppointmentSnapshot) -> ResourceHistory {
    ResourceHistory {
        id: 0,
        id_resource: appointment.id,
        resource_type: APPOINTMENT_RESOURCE_TYPE.to_string(),
    }
}
