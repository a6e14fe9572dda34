use rocket_dyn_templates::Template;
use serde_json::Value;

use crate::document::Document;
use crate::i18n::Resolved;

/// Wrap a rendered [`Document`] in its Tera layout together with the page
/// chrome (theme attribute, theme icon, language toggle label).
pub fn render_page(doc: &Document, resolved: &Resolved<'_>, back: &str) -> Template {
    Template::render(doc.template(), page_context(doc, resolved, back))
}

pub fn page_context(doc: &Document, resolved: &Resolved<'_>, back: &str) -> Value {
    let mut context = doc.to_context();
    if let Value::Object(map) = &mut context {
        map.insert("lang".into(), resolved.language.code().into());
        map.insert("theme".into(), resolved.theme.code().into());
        map.insert("theme_icon".into(), resolved.theme.icon_class().into());
        map.insert("lang_label".into(), resolved.language.toggle_label().into());
        map.insert("back".into(), url_encode(back).into());
        map.insert(
            "current_year".into(),
            chrono::Utc::now().format("%Y").to_string().into(),
        );
    }
    context
}

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

pub fn url_encode(s: &str) -> String {
    url::form_urlencoded::byte_serialize(s.as_bytes()).collect()
}

/// Only same-site absolute paths are accepted as redirect targets. Spaces
/// from a decoded query are re-encoded so the result is a valid URI.
pub fn safe_back_path(back: Option<&str>) -> String {
    match back {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.contains('\\')
                && !path.chars().any(|c| c.is_control()) =>
        {
            path.replace(' ', "%20")
        }
        _ => "/".to_string(),
    }
}

/// Upper-cased first two characters, used for the tool chips on cards.
pub fn initials(tool: &str) -> String {
    tool.chars().take(2).collect::<String>().to_uppercase()
}
