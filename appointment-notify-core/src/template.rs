//! Template rendering.
//!
//! The engine only needs two operations: render a stored template by name,
//! and render an inline template string. Both get the marker model plus the
//! `locale` of the notification.

use std::path::{Path, PathBuf};

use minijinja::{AutoEscape, Environment, ErrorKind};

use crate::error::NotifyResult;
use crate::markers::MarkerModel;

pub const TEMPLATE_NOTIFY_MAIL: &str = "task_notify_appointment_mail.html";
pub const TEMPLATE_NOTIFY_SMS: &str = "task_notify_appointment_sms.html";
pub const TEMPLATE_NOTIFY_RECAP: &str = "task_notify_appointment_recap.html";

/// Templating collaborator.
pub trait TemplateRenderer: Send + Sync {
    /// Render the stored template `name`.
    fn render_template(&self, name: &str, locale: &str, model: &MarkerModel)
    -> NotifyResult<String>;

    /// Render `source` as an inline template.
    fn render_string(&self, source: &str, locale: &str, model: &MarkerModel)
    -> NotifyResult<String>;
}

fn bundled_template(name: &str) -> Option<&'static str> {
    match name {
        TEMPLATE_NOTIFY_MAIL => Some(include_str!("../templates/task_notify_appointment_mail.html")),
        TEMPLATE_NOTIFY_SMS => Some(include_str!("../templates/task_notify_appointment_sms.html")),
        TEMPLATE_NOTIFY_RECAP => {
            Some(include_str!("../templates/task_notify_appointment_recap.html"))
        }
        _ => None,
    }
}

/// minijinja-backed renderer.
///
/// Templates are looked up in the optional templates directory first, then
/// among the bundled ones. Output is never auto-escaped: markers already
/// carry markup (the recap, action links).
pub struct MiniJinjaRenderer {
    env: Environment<'static>,
}

impl MiniJinjaRenderer {
    pub fn new() -> Self {
        Self::with_templates_dir(None)
    }

    pub fn with_templates_dir(dir: Option<PathBuf>) -> Self {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.set_loader(move |name| load_template(dir.as_deref(), name));
        MiniJinjaRenderer { env }
    }
}

impl Default for MiniJinjaRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer for MiniJinjaRenderer {
    fn render_template(
        &self,
        name: &str,
        locale: &str,
        model: &MarkerModel,
    ) -> NotifyResult<String> {
        let template = self.env.get_template(name)?;
        Ok(template.render(model.with_locale(locale))?)
    }

    fn render_string(
        &self,
        source: &str,
        locale: &str,
        model: &MarkerModel,
    ) -> NotifyResult<String> {
        Ok(self.env.render_str(source, model.with_locale(locale))?)
    }
}

fn load_template(dir: Option<&Path>, name: &str) -> Result<Option<String>, minijinja::Error> {
    if let Some(dir) = dir {
        let path = dir.join(name);
        if path.is_file() {
            return std::fs::read_to_string(&path).map(Some).map_err(|e| {
                minijinja::Error::new(
                    ErrorKind::InvalidOperation,
                    format!("Could not read template {}: {e}", path.display()),
                )
            });
        }
    }
    Ok(bundled_template(name).map(str::to_string))
}
