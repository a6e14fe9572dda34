use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::i18n::Language;

/// A string with one entry per language code (`{"id": "...", "en": "..."}`).
/// Missing entries read as the empty string.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct Localized(pub BTreeMap<String, String>);

impl Localized {
    pub fn get(&self, lang: Language) -> &str {
        self.0.get(lang.code()).map(String::as_str).unwrap_or("")
    }

    pub fn has(&self, lang: Language) -> bool {
        self.0.contains_key(lang.code())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Project {
    pub id: i64,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub title: Localized,
    #[serde(default)]
    pub short_description: Localized,
    #[serde(default)]
    pub problem: Localized,
    #[serde(default)]
    pub solution: Localized,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

/// Shown on cards when a project has no images at all.
pub const PLACEHOLDER_IMAGE: &str = "/assets/img/placeholder.svg";

impl Project {
    /// Card/thumbnail image: the first gallery image.
    pub fn thumbnail(&self) -> &str {
        self.images
            .first()
            .map(String::as_str)
            .unwrap_or(PLACEHOLDER_IMAGE)
    }

    /// Localized fields that have no entry for `lang`.
    pub fn missing_fields(&self, lang: Language) -> Vec<&'static str> {
        let fields: [(&'static str, &Localized); 4] = [
            ("title", &self.title),
            ("short_description", &self.short_description),
            ("problem", &self.problem),
            ("solution", &self.solution),
        ];
        fields
            .iter()
            .filter(|(_, value)| !value.has(lang))
            .map(|(name, _)| *name)
            .collect()
    }

    pub fn detail_url(&self) -> String {
        format!("/project?id={}", self.id)
    }
}
