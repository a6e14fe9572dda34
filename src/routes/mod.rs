pub mod admin;
pub mod api;
pub mod prefs;
pub mod public;

use rocket::http::Status;
use rocket_dyn_templates::Template;

use crate::designs::common::{render_load_error, RenderOptions};
use crate::document::{Document, PageTemplate};
use crate::i18n::{resolve, Preferences};
use crate::loader::LoadError;
use crate::models::site_data::SiteData;
use crate::render::render_page;

/// The data file could not be loaded: draw the page chrome with a localized
/// error panel and answer 503.
pub(crate) fn load_failed(
    template: &PageTemplate,
    error: &LoadError,
    prefs: &Preferences,
    options: &RenderOptions,
    back: &str,
) -> (Status, Template) {
    log::error!("Failed to load site data: {}", error);
    let empty = SiteData::default();
    let resolved = resolve(prefs, &empty, options.default_language);
    let mut doc = Document::new(template);
    doc.replace_text("pageTitle", &options.owner);
    render_load_error(&mut doc, resolved.ui);
    (Status::ServiceUnavailable, render_page(&doc, &resolved, back))
}
