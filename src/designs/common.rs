use std::time::Duration;

use crate::document::Document;
use crate::i18n::{Language, Resolved, UiStrings};
use crate::models::portfolio::{Project, PLACEHOLDER_IMAGE};
use crate::models::settings::Settings;
use crate::models::site_data::{SiteData, TextBundle};
use crate::render::{html_escape, initials};

/// Section anchors the navbar entries point at, by position.
pub const NAV_SECTIONS: [&str; 4] = ["home", "about", "projects", "contact"];

/// Tool chips shown on a project card before collapsing into `+N`.
const CARD_TOOLS: usize = 3;

/// Renderer knobs that come from the site config rather than the data file.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub owner: String,
    pub default_language: Language,
    pub related_cap: usize,
    pub gallery_interval: Option<Duration>,
    pub related_interval: Option<Duration>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            owner: String::new(),
            default_language: Language::Id,
            related_cap: 6,
            gallery_interval: Some(Duration::from_millis(3000)),
            related_interval: None,
        }
    }
}

impl RenderOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        let interval = |key: &str| match settings.get_u64(key) {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        };
        RenderOptions {
            owner: settings.get_or("site_owner", ""),
            default_language: Language::parse(&settings.get_or("default_language", "id"))
                .unwrap_or(Language::Id),
            related_cap: settings.get_u64("related_cap").max(1) as usize,
            gallery_interval: interval("gallery_interval_ms"),
            related_interval: interval("related_interval_ms"),
        }
    }
}

/// Everything one render pass needs, passed explicitly instead of living in
/// page-global variables. Built after preferences are read and data is loaded.
pub struct PageState<'a> {
    pub site: &'a SiteData,
    pub resolved: Resolved<'a>,
    pub options: &'a RenderOptions,
}

impl<'a> PageState<'a> {
    pub fn texts(&self) -> &'a TextBundle {
        self.resolved.bundle
    }

    pub fn ui(&self) -> &'static UiStrings {
        self.resolved.ui
    }

    pub fn lang(&self) -> Language {
        self.resolved.language
    }
}

/// Data paths are relative to the site root.
pub fn asset_url(path: &str) -> String {
    if path.starts_with('/') || path.starts_with("http://") || path.starts_with("https://") {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

/// Navbar items. On the home page links are in-page anchors; elsewhere they
/// point back at the home page, with the first entry going to `/` itself.
pub fn nav_html(texts: &TextBundle, on_home: bool) -> String {
    let mut html = String::new();
    for (index, (label, section)) in texts.navbar.iter().zip(NAV_SECTIONS).enumerate() {
        let href = match (on_home, index) {
            (true, _) => format!("#{}", section),
            (false, 0) => "/".to_string(),
            (false, _) => format!("/#{}", section),
        };
        html.push_str(&format!(
            "<li class=\"nav-item\"><a class=\"nav-link\" href=\"{}\">{}</a></li>",
            href,
            html_escape(label)
        ));
    }
    html
}

pub fn tag_list_html(items: &[String], class: &str) -> String {
    items
        .iter()
        .map(|item| format!("<span class=\"{}\">{}</span>", class, html_escape(item)))
        .collect()
}

pub fn project_card_html(project: &Project, state: &PageState<'_>, index: usize) -> String {
    let lang = state.lang();
    let title = project.title.get(lang);
    let description = project.short_description.get(lang);

    let mut tools: String = project
        .tools
        .iter()
        .take(CARD_TOOLS)
        .map(|tool| {
            format!(
                "<div class=\"tool-icon\" title=\"{}\">{}</div>",
                html_escape(tool),
                html_escape(&initials(tool))
            )
        })
        .collect();
    if project.tools.len() > CARD_TOOLS {
        let extra = project.tools.len() - CARD_TOOLS;
        tools.push_str(&format!(
            "<div class=\"tool-icon\" title=\"{} {}\">+{}</div>",
            extra,
            state.ui().more_tools,
            extra
        ));
    }

    format!(
        r#"<div class="col-lg-4 col-md-6" style="animation: fadeInUp 0.6s ease {delay:.1}s both">
<div class="project-card">
<div class="project-image-wrapper">
<img src="{image}" class="project-image" alt="{title}" onerror="this.src='{placeholder}'">
<div class="project-category-badge">{category}</div>
</div>
<div class="project-body">
<h5 class="project-title">{title}</h5>
<p class="project-description">{description}</p>
<div class="project-footer"><div class="project-tools">{tools}</div></div>
<a href="{href}" class="btn btn-primary w-100 mt-3">{button} <i class="fas fa-arrow-right ms-2"></i></a>
</div>
</div>
</div>"#,
        delay = index as f64 * 0.1,
        image = html_escape(&asset_url(project.thumbnail())),
        placeholder = PLACEHOLDER_IMAGE,
        title = html_escape(title),
        category = html_escape(&project.category),
        description = html_escape(description),
        tools = tools,
        href = project.detail_url(),
        button = html_escape(&state.texts().card_button),
    )
}

pub fn project_grid_html(projects: &[&Project], state: &PageState<'_>) -> String {
    if projects.is_empty() {
        return format!(
            "<div class=\"col-12\"><p class=\"text-center text-muted p-5\">{}</p></div>",
            html_escape(state.ui().no_projects)
        );
    }
    projects
        .iter()
        .enumerate()
        .map(|(i, project)| project_card_html(project, state, i))
        .collect()
}

/// Data failed to load: put a visible panel where the dynamic content would go.
pub fn render_load_error(doc: &mut Document, ui: &UiStrings) {
    let panel = format!(
        "<div class=\"col-12\"><div class=\"alert alert-danger text-center\" role=\"alert\">\
<i class=\"fas fa-exclamation-triangle me-2\"></i>{}\
<div class=\"mt-3\"><a href=\"/\" class=\"btn btn-primary\">{}</a></div></div></div>",
        html_escape(ui.load_error),
        html_escape(ui.load_error_home_link)
    );
    doc.replace_html("projectsGrid", panel.clone());
    doc.replace_html("projectHeader", panel);
}

pub fn render_footer(doc: &mut Document, state: &PageState<'_>) {
    doc.replace_text("footerText", &state.texts().footer);
    doc.replace_text("backToTop", state.ui().back_to_top);
}
