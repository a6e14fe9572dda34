use std::collections::BTreeMap;

use serde_json::{json, Value};

use crate::render::html_escape;

/// Logical content targets of a page template. A template declares the slots it
/// has; renderers write by name and writes to undeclared slots are dropped.
#[derive(Debug, Clone, Copy)]
pub struct PageTemplate {
    pub name: &'static str,
    pub slots: &'static [&'static str],
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Slot {
    html: String,
    attrs: BTreeMap<String, String>,
}

/// The renderable page: slot name → current content. Every write replaces the
/// slot's previous content, so re-rendering never accumulates stale nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    template: &'static str,
    slots: BTreeMap<&'static str, Slot>,
}

impl Document {
    pub fn new(template: &PageTemplate) -> Self {
        Document {
            template: template.name,
            slots: template
                .slots
                .iter()
                .map(|name| (*name, Slot::default()))
                .collect(),
        }
    }

    /// Same template minus some slots, for pages that only carry part of it.
    pub fn without(mut self, absent: &[&str]) -> Self {
        self.slots.retain(|name, _| !absent.contains(name));
        self
    }

    pub fn template(&self) -> &'static str {
        self.template
    }

    /// Replace the slot content with escaped text. Returns false if absent.
    pub fn replace_text(&mut self, slot: &str, text: &str) -> bool {
        self.replace_html(slot, html_escape(text))
    }

    /// Replace the slot content with pre-built markup. Returns false if absent.
    pub fn replace_html(&mut self, slot: &str, html: String) -> bool {
        match self.slots.get_mut(slot) {
            Some(s) => {
                s.html = html;
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self, slot: &str) -> bool {
        self.replace_html(slot, String::new())
    }

    pub fn set_attr(&mut self, slot: &str, attr: &str, value: &str) -> bool {
        match self.slots.get_mut(slot) {
            Some(s) => {
                s.attrs.insert(attr.to_string(), value.to_string());
                true
            }
            None => false,
        }
    }

    pub fn html(&self, slot: &str) -> Option<&str> {
        self.slots.get(slot).map(|s| s.html.as_str())
    }

    pub fn attr(&self, slot: &str, attr: &str) -> Option<&str> {
        self.slots
            .get(slot)
            .and_then(|s| s.attrs.get(attr))
            .map(String::as_str)
    }

    /// Tera context fragment: `{"slots": {..}, "attrs": {..}}`.
    pub fn to_context(&self) -> Value {
        let mut slots = serde_json::Map::new();
        let mut attrs = serde_json::Map::new();
        for (name, slot) in &self.slots {
            slots.insert((*name).to_string(), Value::String(slot.html.clone()));
            if !slot.attrs.is_empty() {
                attrs.insert((*name).to_string(), json!(slot.attrs));
            }
        }
        json!({ "slots": slots, "attrs": attrs })
    }
}
