//! Home page renderer: hero, about/skills, filterable project grid, contact.

use super::common::{asset_url, nav_html, project_grid_html, render_footer, tag_list_html, PageState};
use super::contact::{render_form, ContactFormView};
use crate::document::{Document, PageTemplate};
use crate::filter::{ProjectFilter, ALL};
use crate::render::{html_escape, url_encode};

pub const HOME: PageTemplate = PageTemplate {
    name: "home",
    slots: &[
        "pageTitle",
        "navMenu",
        "heroGreeting",
        "heroSubtitle",
        "heroQuote",
        "heroWorksBtnText",
        "heroContactBtn",
        "yearsExp",
        "projectsCompleted",
        "aboutSubtitle",
        "aboutTitle",
        "aboutDesc",
        "heroCVBtn",
        "cvLink",
        "langLabel",
        "toolsLabel",
        "programmingLanguages",
        "devTools",
        "projectsSubtitle",
        "projectsTitle",
        "categoryFilters",
        "projectsGrid",
        "contactSubtitle",
        "contactTitle",
        "contactForm",
        "footerText",
        "backToTop",
    ],
};

/// Populate every home slot. The filter starts at "all" and the full grid is
/// drawn; returns the filter so callers can narrow it with [`apply_filter`].
pub fn render_home(doc: &mut Document, state: &PageState<'_>, form: &ContactFormView) -> ProjectFilter {
    let texts = state.texts();
    let ui = state.ui();

    doc.replace_text(
        "pageTitle",
        &format!("{} - {}", state.options.owner, texts.hero.subtitle),
    );
    doc.replace_html("navMenu", nav_html(texts, true));

    // Hero
    doc.replace_text("heroGreeting", &texts.hero.greeting);
    doc.replace_text("heroSubtitle", &texts.hero.subtitle);
    doc.replace_text("heroQuote", &texts.hero.quote);
    doc.replace_text("heroWorksBtnText", &texts.hero.my_works_button);
    doc.replace_text("heroContactBtn", ui.contact_me);
    doc.replace_text("yearsExp", ui.years_experience);
    doc.replace_text("projectsCompleted", ui.projects_completed);

    // About + skills
    doc.replace_text("aboutSubtitle", ui.about_subtitle);
    doc.replace_text("aboutTitle", &texts.about.title);
    doc.replace_text("aboutDesc", &texts.about.description);
    doc.replace_text("heroCVBtn", ui.my_cv);
    if !texts.about.cv.is_empty() {
        doc.set_attr("cvLink", "href", &asset_url(&texts.about.cv));
    }
    doc.replace_text("langLabel", &texts.skills.languages);
    doc.replace_text("toolsLabel", &texts.skills.tools);
    doc.replace_html(
        "programmingLanguages",
        tag_list_html(&state.site.skills.languages, "skill-tag"),
    );
    doc.replace_html("devTools", tag_list_html(&state.site.skills.tools, "skill-tag"));

    // Projects
    doc.replace_text("projectsSubtitle", ui.projects_subtitle);
    doc.replace_text("projectsTitle", &texts.projects_title);
    let filter = ProjectFilter::from_projects(&state.site.projects);
    render_filter_controls(doc, state, &filter);
    let all: Vec<_> = state.site.projects.iter().collect();
    doc.replace_html("projectsGrid", project_grid_html(&all, state));

    // Contact
    doc.replace_text("contactSubtitle", ui.contact_subtitle);
    doc.replace_text("contactTitle", &texts.contact);
    doc.replace_html("contactForm", render_form(form, &texts.form, ui));

    render_footer(doc, state);
    filter
}

/// Select `category` and redraw only the filter controls and the grid.
pub fn apply_filter(doc: &mut Document, state: &PageState<'_>, filter: &mut ProjectFilter, category: &str) {
    let visible = filter.set_category(state.site, category);
    render_filter_controls(doc, state, filter);
    doc.replace_html("projectsGrid", project_grid_html(&visible, state));
}

fn render_filter_controls(doc: &mut Document, state: &PageState<'_>, filter: &ProjectFilter) {
    let html: String = filter
        .controls()
        .into_iter()
        .map(|control| {
            let label = if control.value == ALL {
                state.ui().filter_all.to_string()
            } else {
                control.value.clone()
            };
            format!(
                "<a class=\"filter-btn{}\" data-category=\"{}\" href=\"/?category={}#projects\">{}</a>",
                if control.active { " active" } else { "" },
                html_escape(&control.value),
                url_encode(&control.value),
                html_escape(&label)
            )
        })
        .collect();
    doc.replace_html("categoryFilters", html);
}
