//! Built-in recap renderers.

use chrono::NaiveDate;

use crate::appointment::Response;
use crate::recap::RecapRenderer;

/// Raw value, trimmed. Also the fallback for unknown kinds.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextRecap;

impl RecapRenderer for TextRecap {
    fn render_recap(&self, response: &Response, _locale: &str) -> String {
        response.value.trim().to_string()
    }
}

/// Phone numbers with inner whitespace removed.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhoneRecap;

impl RecapRenderer for PhoneRecap {
    fn render_recap(&self, response: &Response, _locale: &str) -> String {
        response.value.split_whitespace().collect()
    }
}

/// The uploaded file's original name rather than its storage key.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileRecap;

impl RecapRenderer for FileRecap {
    fn render_recap(&self, response: &Response, _locale: &str) -> String {
        match response.file_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => response.value.trim().to_string(),
        }
    }
}

/// Title of the chosen field, falling back to its raw value.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChoiceRecap;

impl RecapRenderer for ChoiceRecap {
    fn render_recap(&self, response: &Response, _locale: &str) -> String {
        match response.field_title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => response.value.trim().to_string(),
        }
    }
}

/// ISO dates (`YYYY-MM-DD`) re-formatted for display; anything else as is.
#[derive(Debug, Clone)]
pub struct DateRecap {
    format: String,
}

impl DateRecap {
    pub fn new(format: impl Into<String>) -> Self {
        DateRecap {
            format: format.into(),
        }
    }
}

impl RecapRenderer for DateRecap {
    fn render_recap(&self, response: &Response, _locale: &str) -> String {
        let value = response.value.trim();
        match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
            Ok(date) => date.format(&self.format).to_string(),
            Err(_) => value.to_string(),
        }
    }
}
