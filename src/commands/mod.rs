pub mod invite;
pub mod preview;

use std::sync::Arc;

use anyhow::Result;
use appointment_notify_core::ics::FileTimeZoneSource;
use appointment_notify_core::recap::RecapRegistry;
use appointment_notify_core::template::MiniJinjaRenderer;
use appointment_notify_core::transport::MailTransport;
use appointment_notify_core::{Notifier, NotifierSettings};

/// A notifier wired to the default collaborators.
pub fn build_notifier(
    settings: NotifierSettings,
    transport: Arc<dyn MailTransport>,
) -> Result<Notifier> {
    let renderer = MiniJinjaRenderer::with_templates_dir(settings.templates_dir.clone());
    let time_zones = FileTimeZoneSource::new(settings.timezone_path());
    let recaps = RecapRegistry::with_defaults(&settings.date_format);

    Ok(Notifier::new(
        settings,
        Arc::new(renderer),
        transport,
        Arc::new(time_zones),
        recaps,
    )?)
}
