use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::portfolio::Project;
use crate::i18n::Language;

/// The whole data document: projects, per-language UI text and skills.
/// Loaded once per page request and never mutated afterwards.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct SiteData {
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub texts: BTreeMap<String, TextBundle>,
    #[serde(default)]
    pub skills: Skills,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Skills {
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub tools: Vec<String>,
}

/// All UI labels for one language, grouped by page section.
/// Every field defaults so a partial bundle still renders.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct TextBundle {
    pub navbar: Vec<String>,
    pub hero: HeroText,
    pub about: AboutText,
    pub skills: SkillsText,
    pub detail: DetailText,
    pub form: FormText,
    pub footer: String,
    pub projects_title: String,
    pub contact: String,
    pub card_button: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct HeroText {
    pub greeting: String,
    pub subtitle: String,
    pub quote: String,
    pub my_works_button: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AboutText {
    pub title: String,
    pub description: String,
    pub cv: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct SkillsText {
    pub languages: String,
    pub tools: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct DetailText {
    pub overview: String,
    pub problem: String,
    pub solution: String,
    pub tools: String,
    pub related: String,
    pub collab_title: String,
    pub back: String,
    pub not_found: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct FormText {
    pub name: String,
    pub email: String,
    pub message: String,
    pub send_button: String,
}

impl TextBundle {
    /// Navbar label by position; missing entries read as empty.
    pub fn nav(&self, index: usize) -> &str {
        self.navbar.get(index).map(String::as_str).unwrap_or("")
    }
}

impl SiteData {
    /// `id` is the only join between the URL and the project list.
    pub fn find_project(&self, id: i64) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn bundle(&self, lang: Language) -> Option<&TextBundle> {
        self.texts.get(lang.code())
    }
}
