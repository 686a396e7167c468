//! Process-wide notifier settings.

use std::path::{Path, PathBuf};

use chrono::format::{Item, StrftimeItems};
use chrono_tz::Tz;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::{NotifyError, NotifyResult};

static DEFAULT_NO_REPLY_EMAIL: &str = "no-reply@localhost";
static DEFAULT_MAIL_LIST_SEPARATOR: &str = ";";
static DEFAULT_ICAL_PRODID: &str = "-//appointment-notify//iCal 1.0//EN";
static DEFAULT_TIME_ZONE: &str = "Europe/Paris";
static DEFAULT_TIMEZONE_FILE: &str =
    concat!(env!("CARGO_MANIFEST_DIR"), "/resources/timezones.ics");
static DEFAULT_DATE_FORMAT: &str = "%d/%m/%Y";
static DEFAULT_TIME_FORMAT: &str = "%H:%M";

/// Prefix of environment variables overriding settings,
/// e.g. `APPOINTMENT_NOTIFY__TIME_ZONE=UTC`.
const ENV_PREFIX: &str = "APPOINTMENT_NOTIFY";

fn default_no_reply_email() -> String {
    DEFAULT_NO_REPLY_EMAIL.to_string()
}

fn default_mail_list_separator() -> String {
    DEFAULT_MAIL_LIST_SEPARATOR.to_string()
}

fn default_ical_prod_id() -> String {
    DEFAULT_ICAL_PRODID.to_string()
}

fn default_time_zone() -> String {
    DEFAULT_TIME_ZONE.to_string()
}

fn default_timezone_file() -> PathBuf {
    PathBuf::from(DEFAULT_TIMEZONE_FILE)
}

fn default_date_format() -> String {
    DEFAULT_DATE_FORMAT.to_string()
}

fn default_time_format() -> String {
    DEFAULT_TIME_FORMAT.to_string()
}

/// Settings shared by every notification, loaded from
/// ~/.config/appointment-notify/config.toml and the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierSettings {
    /// Sender used when a task has no valid sender address
    #[serde(default = "default_no_reply_email")]
    pub no_reply_email: String,

    /// Delimiter characters of recipient lists
    #[serde(default = "default_mail_list_separator")]
    pub mail_list_separator: String,

    #[serde(default = "default_ical_prod_id")]
    pub ical_prod_id: String,

    /// Server time zone; appointment times are wall-clock times in this zone
    #[serde(default = "default_time_zone")]
    pub time_zone: String,

    /// iCalendar file holding the VTIMEZONE definitions
    #[serde(default = "default_timezone_file")]
    pub timezone_file: PathBuf,

    /// Domain appended to a phone number to reach the SMS gateway
    #[serde(default)]
    pub sms_server: String,

    /// Directory overriding the bundled templates
    #[serde(default)]
    pub templates_dir: Option<PathBuf>,

    #[serde(default = "default_date_format")]
    pub date_format: String,

    #[serde(default = "default_time_format")]
    pub time_format: String,

    #[serde(default)]
    pub smtp: Option<SmtpSettings>,
}

/// SMTP relay used by the lettre transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpSettings {
    pub host: String,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Use an implicit TLS relay; plain SMTP otherwise
    #[serde(default = "default_tls")]
    pub tls: bool,
}

fn default_tls() -> bool {
    true
}

impl Default for NotifierSettings {
    fn default() -> Self {
        NotifierSettings {
            no_reply_email: default_no_reply_email(),
            mail_list_separator: default_mail_list_separator(),
            ical_prod_id: default_ical_prod_id(),
            time_zone: default_time_zone(),
            timezone_file: default_timezone_file(),
            sms_server: String::new(),
            templates_dir: None,
            date_format: default_date_format(),
            time_format: default_time_format(),
            smtp: None,
        }
    }
}

impl NotifierSettings {
    pub fn config_path() -> NotifyResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| NotifyError::Config("Could not determine config directory".into()))?
            .join("appointment-notify");

        Ok(config_dir.join("config.toml"))
    }

    /// Load settings from `path` (or the default config path), then apply
    /// environment overrides. A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> NotifyResult<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        let settings: NotifierSettings = Config::builder()
            .add_source(File::from(config_path).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .map_err(|e| NotifyError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| NotifyError::Config(e.to_string()))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings that would only fail later, mid-notification.
    pub fn validate(&self) -> NotifyResult<()> {
        self.tz()?;
        for format in [&self.date_format, &self.time_format] {
            if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
                return Err(NotifyError::Config(format!(
                    "Invalid date/time format '{format}'"
                )));
            }
        }
        if self.mail_list_separator.is_empty() {
            return Err(NotifyError::Config(
                "mail_list_separator must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// The configured server time zone.
    pub fn tz(&self) -> NotifyResult<Tz> {
        self.time_zone
            .parse::<Tz>()
            .map_err(|_| NotifyError::Config(format!("Unknown time zone '{}'", self.time_zone)))
    }

    /// Time-zone resource path with `~` expanded.
    pub fn timezone_path(&self) -> PathBuf {
        let expanded = shellexpand::tilde(&self.timezone_file.to_string_lossy()).into_owned();
        PathBuf::from(expanded)
    }
}
