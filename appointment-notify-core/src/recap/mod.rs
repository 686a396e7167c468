//! Responses recap.
//!
//! Every form question kind knows how to summarize its own answers. Kinds are
//! looked up in a [`RecapRegistry`]; kinds nobody registered are shown as
//! plain text.

mod renderers;

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::appointment::Response;

pub use renderers::{ChoiceRecap, DateRecap, FileRecap, PhoneRecap, TextRecap};

/// Summarizes one answer of a given question kind.
pub trait RecapRenderer: Send + Sync {
    fn render_recap(&self, response: &Response, locale: &str) -> String;
}

/// One line of the recap, as seen by the recap template.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseRecapEntry {
    pub entry_id: i64,
    pub question: String,
    pub value: String,
}

/// Recap renderers keyed by question kind.
#[derive(Clone)]
pub struct RecapRegistry {
    renderers: HashMap<String, Arc<dyn RecapRenderer>>,
    fallback: Arc<dyn RecapRenderer>,
}

impl RecapRegistry {
    /// A registry that renders everything as plain text.
    pub fn new() -> Self {
        RecapRegistry {
            renderers: HashMap::new(),
            fallback: Arc::new(TextRecap),
        }
    }

    /// The built-in renderers; dates are displayed with `date_format`.
    pub fn with_defaults(date_format: &str) -> Self {
        let mut registry = Self::new();
        registry.register("text", Arc::new(TextRecap));
        registry.register("textarea", Arc::new(TextRecap));
        registry.register("phone", Arc::new(PhoneRecap));
        registry.register("file", Arc::new(FileRecap));
        for kind in ["choice", "radio", "checkbox", "select"] {
            registry.register(kind, Arc::new(ChoiceRecap));
        }
        registry.register("date", Arc::new(DateRecap::new(date_format)));
        registry
    }

    /// Register (or replace) the renderer of a question kind.
    pub fn register(&mut self, kind: impl Into<String>, renderer: Arc<dyn RecapRenderer>) {
        self.renderers.insert(kind.into(), renderer);
    }

    pub fn renderer_for(&self, kind: &str) -> &dyn RecapRenderer {
        self.renderers
            .get(kind)
            .unwrap_or(&self.fallback)
            .as_ref()
    }

    /// Recap entries, in response order.
    pub fn recap(&self, responses: &[Response], locale: &str) -> Vec<ResponseRecapEntry> {
        responses
            .iter()
            .map(|response| ResponseRecapEntry {
                entry_id: response.entry.id,
                question: response.entry.title.clone(),
                value: self
                    .renderer_for(&response.entry.kind)
                    .render_recap(response, locale),
            })
            .collect()
    }
}

impl Default for RecapRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appointment::Entry;

    fn response(id: i64, title: &str, kind: &str, value: &str) -> Response {
        Response {
            entry: Entry {
                id,
                title: title.to_string(),
                kind: kind.to_string(),
            },
            value: value.to_string(),
            field_title: None,
            file_name: None,
        }
    }

    struct Shouting;

    impl RecapRenderer for Shouting {
        fn render_recap(&self, response: &Response, _locale: &str) -> String {
            response.value.to_uppercase()
        }
    }

    #[test]
    fn test_recap_keeps_response_order() {
        let registry = RecapRegistry::with_defaults("%d/%m/%Y");
        let entries = registry.recap(
            &[
                response(3, "Phone", "phone", "06 00 00 00 00"),
                response(1, "Name", "text", " Alice "),
                response(2, "Day", "date", "2024-12-24"),
            ],
            "fr",
        );

        let ids: Vec<i64> = entries.iter().map(|e| e.entry_id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
        assert_eq!(entries[0].value, "0600000000");
        assert_eq!(entries[1].value, "Alice");
        assert_eq!(entries[2].value, "24/12/2024");
        assert_eq!(entries[2].question, "Day");
    }

    #[test]
    fn test_unknown_kind_uses_fallback() {
        let registry = RecapRegistry::with_defaults("%d/%m/%Y");
        let entries = registry.recap(&[response(1, "Colour", "colour-picker", "red ")], "fr");
        assert_eq!(entries[0].value, "red");
    }

    #[test]
    fn test_register_replaces_renderer() {
        let mut registry = RecapRegistry::new();
        registry.register("text", Arc::new(Shouting));
        let entries = registry.recap(&[response(1, "Name", "text", "alice")], "fr");
        assert_eq!(entries[0].value, "ALICE");
    }
}
