//! Appointment notifications.
//!
//! This crate renders the notifications of an appointment workflow:
//! - `markers` and `recap` build the rendering model of one notification
//! - `notify` renders it and hands it to a `transport`, optionally with a
//!   calendar invite built by `ics`
//! - `recipient` and `crm` decide who (or what) gets notified

pub mod appointment;
pub mod crm;
pub mod error;
pub mod history;
pub mod ics;
pub mod markers;
pub mod notification_config;
pub mod notify;
pub mod recap;
pub mod recipient;
pub mod settings;
pub mod template;
pub mod transport;

pub use appointment::{AppointmentSnapshot, Entry, ResourceHistory, Response};
pub use error::{NotifyError, NotifyResult};
pub use markers::{MarkerModel, MarkerModelBuilder};
pub use notification_config::NotificationConfig;
pub use notify::{Notifier, RenderedContent};
pub use settings::NotifierSettings;
