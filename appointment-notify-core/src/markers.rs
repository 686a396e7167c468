//! Rendering model of a notification.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::appointment::{AppointmentSnapshot, Response};
use crate::error::{NotifyError, NotifyResult};
use crate::notification_config::NotificationConfig;
use crate::recap::RecapRegistry;
use crate::settings::NotifierSettings;
use crate::template::{TEMPLATE_NOTIFY_RECAP, TemplateRenderer};

pub const MARK_REFERENCE: &str = "reference";
pub const MARK_FIRST_NAME: &str = "firstName";
pub const MARK_LAST_NAME: &str = "lastName";
pub const MARK_EMAIL: &str = "email";
pub const MARK_DATE_APPOINTMENT: &str = "date_appointment";
pub const MARK_TIME_APPOINTMENT: &str = "time_appointment";
pub const MARK_END_DATE_APPOINTMENT: &str = "end_date_appointment";
pub const MARK_END_TIME_APPOINTMENT: &str = "end_time_appointment";
pub const MARK_LOCATION: &str = "location";
pub const MARK_FORM_TITLE: &str = "form_title";
pub const MARK_SENDER_NAME: &str = "sender_name";
pub const MARK_SENDER_EMAIL: &str = "sender_email";
pub const MARK_MESSAGE: &str = "message";
pub const MARK_RECAP: &str = "recap";
pub const MARK_URL_CANCEL: &str = "url_cancel";
pub const MARK_URL_VALIDATE: &str = "url_validate";

/// Context key of the entries handed to the recap template.
pub const RECAP_LIST_KEY: &str = "list_response";

const MARK_LOCALE: &str = "locale";

/// Marker name to value. Last write wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkerModel(BTreeMap<String, Value>);

impl MarkerModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// The marker's value when it is a string.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// A copy of the model exposing `locale`, unless a marker already uses that name.
    pub fn with_locale(&self, locale: &str) -> MarkerModel {
        let mut model = self.clone();
        model
            .0
            .entry(MARK_LOCALE.to_string())
            .or_insert_with(|| Value::from(locale));
        model
    }
}

/// Builds the marker model of one notification.
#[derive(Clone)]
pub struct MarkerModelBuilder {
    recaps: RecapRegistry,
    renderer: Arc<dyn TemplateRenderer>,
    date_format: String,
    time_format: String,
}

impl MarkerModelBuilder {
    pub fn new(
        settings: &NotifierSettings,
        recaps: RecapRegistry,
        renderer: Arc<dyn TemplateRenderer>,
    ) -> Self {
        MarkerModelBuilder {
            recaps,
            renderer,
            date_format: settings.date_format.clone(),
            time_format: settings.time_format.clone(),
        }
    }

    /// Base markers, then the rendered recap, then the task's extra markers.
    pub fn build(
        &self,
        appointment: Option<&AppointmentSnapshot>,
        config: Option<&NotificationConfig>,
        responses: &[Response],
        locale: &str,
    ) -> NotifyResult<MarkerModel> {
        let appointment = appointment.ok_or_else(|| {
            NotifyError::InvalidInput("Cannot build markers without an appointment".into())
        })?;
        let config = config.ok_or_else(|| {
            NotifyError::InvalidInput("Cannot build markers without a notification config".into())
        })?;

        let mut model = MarkerModel::new();
        model.insert(MARK_REFERENCE, appointment.reference.as_str());
        model.insert(MARK_FIRST_NAME, appointment.first_name.as_str());
        model.insert(MARK_LAST_NAME, appointment.last_name.as_str());
        model.insert(MARK_EMAIL, appointment.email.as_str());
        model.insert(MARK_DATE_APPOINTMENT, format_naive(&appointment.start, &self.date_format)?);
        model.insert(MARK_TIME_APPOINTMENT, format_naive(&appointment.start, &self.time_format)?);
        model.insert(MARK_END_DATE_APPOINTMENT, format_naive(&appointment.end, &self.date_format)?);
        model.insert(MARK_END_TIME_APPOINTMENT, format_naive(&appointment.end, &self.time_format)?);
        model.insert(MARK_LOCATION, appointment.location.as_str());
        model.insert(MARK_FORM_TITLE, appointment.form_title.as_str());
        model.insert(MARK_SENDER_NAME, config.sender_name.as_str());
        model.insert(MARK_SENDER_EMAIL, config.sender_email.as_str());
        model.insert(MARK_MESSAGE, config.message.as_str());

        model.insert(MARK_RECAP, self.render_recap(responses, locale)?);

        for (name, value) in &config.extra_markers {
            model.insert(name.as_str(), value.as_str());
        }

        Ok(model)
    }

    fn render_recap(&self, responses: &[Response], locale: &str) -> NotifyResult<String> {
        let entries = self.recaps.recap(responses, locale);
        let list = serde_json::to_value(&entries)
            .map_err(|e| NotifyError::Render(format!("Could not serialize recap: {e}")))?;

        let mut context = MarkerModel::new();
        context.insert(RECAP_LIST_KEY, list);
        self.renderer
            .render_template(TEMPLATE_NOTIFY_RECAP, locale, &context)
    }
}

/// strftime-style formatting that reports bad patterns instead of panicking.
pub(crate) fn format_naive(time: &NaiveDateTime, format: &str) -> NotifyResult<String> {
    let mut out = String::new();
    write!(out, "{}", time.format(format))
        .map_err(|_| NotifyError::InvalidInput(format!("Invalid date/time format '{format}'")))?;
    Ok(out)
}
