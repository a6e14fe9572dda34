//! Project detail page renderer: header, image gallery, problem/solution,
//! tools, related-projects carousel and call-to-action.

use std::time::Duration;

use super::common::{asset_url, nav_html, render_footer, tag_list_html, PageState};
use crate::carousel::{pad_cyclic, Carousel, GALLERY_PAGE_SIZE, RELATED_PAGE_SIZE};
use crate::document::{Document, PageTemplate};
use crate::filter::{related_projects, RELATED_MIN};
use crate::models::portfolio::{Project, PLACEHOLDER_IMAGE};
use crate::render::html_escape;

pub const DETAIL: PageTemplate = PageTemplate {
    name: "detail",
    slots: &[
        "pageTitle",
        "navMenu",
        "breadcrumbHome",
        "breadcrumbProjects",
        "breadcrumbCurrent",
        "projectHeader",
        "projectCategory",
        "projectTitle",
        "projectShortDesc",
        "backBtn",
        "projectCarouselContainer",
        "overviewTitle",
        "problemLabel",
        "solutionLabel",
        "toolsUsedLabel",
        "projectProblem",
        "projectSolution",
        "projectTools",
        "projectInfoTitle",
        "categoryLabel",
        "statusLabel",
        "projectCategoryInfo",
        "projectStatus",
        "relatedTitle",
        "relatedProjectsInner",
        "ctaTitle",
        "ctaDescription",
        "ctaButton",
        "footerText",
    ],
};

/// Carousel positions requested through the URL. `None` means the visitor
/// has not navigated that carousel yet.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DetailView {
    pub slide: Option<usize>,
    pub related: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailOutcome {
    Rendered,
    NotFound,
}

pub fn render_detail(
    doc: &mut Document,
    state: &PageState<'_>,
    project_id: Option<i64>,
    view: DetailView,
) -> DetailOutcome {
    let project = match project_id.and_then(|id| state.site.find_project(id)) {
        Some(p) => p,
        None => {
            render_not_found(doc, state);
            return DetailOutcome::NotFound;
        }
    };

    let texts = state.texts();
    let ui = state.ui();
    let lang = state.lang();
    let title = project.title.get(lang);

    doc.clear("projectHeader");
    doc.replace_text("pageTitle", &format!("{} - {}", title, state.options.owner));
    doc.replace_html("navMenu", nav_html(texts, false));

    // Breadcrumb + header
    doc.replace_text("breadcrumbHome", texts.nav(0));
    doc.replace_text("breadcrumbProjects", texts.nav(2));
    doc.replace_text("breadcrumbCurrent", title);
    doc.replace_text("projectCategory", &project.category);
    doc.replace_text("projectTitle", title);
    doc.replace_text("projectShortDesc", project.short_description.get(lang));
    let back = if texts.detail.back.is_empty() {
        ui.back_to_projects
    } else {
        texts.detail.back.as_str()
    };
    doc.replace_text("backBtn", back);

    doc.replace_html("projectCarouselContainer", gallery_html(project, state, view));

    // Overview
    doc.replace_text("overviewTitle", &texts.detail.overview);
    doc.replace_text("problemLabel", &texts.detail.problem);
    doc.replace_text("solutionLabel", &texts.detail.solution);
    doc.replace_text("toolsUsedLabel", &texts.detail.tools);
    doc.replace_text("projectProblem", project.problem.get(lang));
    doc.replace_text("projectSolution", project.solution.get(lang));
    doc.replace_html("projectTools", tag_list_html(&project.tools, "tool-item"));

    // Info panel
    doc.replace_text("projectInfoTitle", ui.project_info);
    doc.replace_text("categoryLabel", ui.category_label);
    doc.replace_text("statusLabel", ui.status_label);
    doc.replace_text("projectCategoryInfo", &project.category);
    doc.replace_text("projectStatus", ui.status_completed);

    // Related
    doc.replace_text("relatedTitle", &texts.detail.related);
    doc.replace_html("relatedProjectsInner", related_html(project, state, view));

    // CTA
    doc.replace_text("ctaTitle", &texts.detail.collab_title);
    doc.replace_text("ctaDescription", ui.cta_description);
    doc.replace_text("ctaButton", ui.contact_me);

    render_footer(doc, state);
    DetailOutcome::Rendered
}

/// Replace the header with a localized "not found" panel and blank every
/// other detail slot.
fn render_not_found(doc: &mut Document, state: &PageState<'_>) {
    let ui = state.ui();
    for slot in DETAIL.slots {
        doc.clear(slot);
    }
    let title = if state.texts().detail.not_found.is_empty() {
        ui.not_found_title
    } else {
        state.texts().detail.not_found.as_str()
    };
    doc.replace_text("pageTitle", &format!("{} - {}", title, state.options.owner));
    doc.replace_html(
        "projectHeader",
        format!(
            r#"<div class="text-center py-5">
<i class="fas fa-folder-open not-found-icon"></i>
<h2 class="mt-4">{}</h2>
<p class="text-muted mb-4">{}</p>
<a href="/#projects" class="btn btn-primary rounded-pill px-4"><i class="fas fa-arrow-left me-2"></i>{}</a>
</div>"#,
            html_escape(title),
            html_escape(ui.not_found_desc),
            html_escape(ui.back_to_projects)
        ),
    );
}

/// Link to this page with carousel positions. A position is only carried
/// once the visitor has navigated that carousel.
fn detail_href(id: i64, slide: Option<usize>, related: Option<usize>) -> String {
    let mut href = format!("/project?id={}", id);
    if let Some(slide) = slide {
        href.push_str(&format!("&amp;slide={}", slide));
    }
    if let Some(related) = related {
        href.push_str(&format!("&amp;related={}", related));
    }
    href
}

/// Build a carousel, then either apply the visitor's navigation (which stops
/// auto-advance) or leave it auto-advancing from slide 0.
fn positioned<T: Clone>(
    items: &[T],
    page_size: usize,
    interval: Option<Duration>,
    at: Option<usize>,
) -> Carousel<T> {
    let mut carousel = Carousel::paginate(items, page_size).with_auto_advance(interval);
    if let Some(index) = at {
        carousel.go_to(index);
    }
    carousel
}

fn gallery_html(project: &Project, state: &PageState<'_>, view: DetailView) -> String {
    let ui = state.ui();
    if project.images.is_empty() {
        return format!(
            "<div class=\"text-center text-muted p-5\"><i class=\"fas fa-image\"></i><p class=\"mt-3\">{}</p></div>",
            html_escape(ui.no_images)
        );
    }

    let carousel = positioned(
        &project.images,
        GALLERY_PAGE_SIZE,
        state.options.gallery_interval,
        view.slide,
    );
    let title = project.title.get(state.lang());

    let mut items = String::new();
    let mut indicators = String::new();
    for (index, slide) in carousel.slides().iter().enumerate() {
        let active = index == carousel.active();
        indicators.push_str(&format!(
            "<a href=\"{}\" class=\"{}\"{} aria-label=\"Slide {}\"></a>",
            detail_href(project.id, Some(index), view.related),
            if active { "active" } else { "" },
            if active { " aria-current=\"true\"" } else { "" },
            index + 1
        ));
        for image in slide {
            items.push_str(&format!(
                "<div class=\"carousel-item{}\"><img src=\"{}\" class=\"d-block w-100\" alt=\"{} - {} {}\" onerror=\"this.src='{}'\"></div>",
                if active { " active" } else { "" },
                html_escape(&asset_url(image)),
                html_escape(title),
                ui.image_alt,
                index + 1,
                PLACEHOLDER_IMAGE
            ));
        }
    }

    let controls = if carousel.has_controls() {
        format!(
            "<div class=\"carousel-indicators\">{}</div>",
            indicators
        )
    } else {
        String::new()
    };
    let arrows = if carousel.has_controls() {
        nav_arrows(
            &detail_href(project.id, Some(carousel.prev_index()), view.related),
            &detail_href(project.id, Some(carousel.next_index()), view.related),
            ui,
        )
    } else {
        String::new()
    };

    format!(
        "<div id=\"projectCarousel\" class=\"carousel slide\"{}>{}<div class=\"carousel-inner\">{}</div>{}</div>",
        interval_attr(&carousel),
        controls,
        items,
        arrows
    )
}

fn related_html(project: &Project, state: &PageState<'_>, view: DetailView) -> String {
    let ui = state.ui();
    let candidates = related_projects(state.site, project, state.options.related_cap);
    if candidates.is_empty() {
        return format!(
            "<div class=\"carousel-item active\"><div class=\"text-center text-muted p-5\"><p>{}</p></div></div>",
            html_escape(ui.no_related)
        );
    }

    let padded = pad_cyclic(&candidates, RELATED_MIN);
    let carousel = positioned(
        &padded,
        RELATED_PAGE_SIZE,
        state.options.related_interval,
        view.related,
    );
    let lang = state.lang();

    let mut slides = String::new();
    for (index, cards) in carousel.slides().iter().enumerate() {
        slides.push_str(&format!(
            "<div class=\"carousel-item{}\"><div class=\"row g-4\">",
            if index == carousel.active() { " active" } else { "" }
        ));
        for related in cards {
            let title = related.title.get(lang);
            slides.push_str(&format!(
                r#"<div class="col-md-4"><a href="{href}" class="related-project-card">
<img src="{image}" class="related-project-image" alt="{title}" onerror="this.src='{placeholder}'">
<div class="related-project-body"><span class="related-project-category">{category}</span>
<h6 class="related-project-title">{title}</h6>
<p class="related-project-desc">{desc}</p></div></a></div>"#,
                href = related.detail_url(),
                image = html_escape(&asset_url(related.thumbnail())),
                placeholder = PLACEHOLDER_IMAGE,
                title = html_escape(title),
                category = html_escape(&related.category),
                desc = html_escape(related.short_description.get(lang)),
            ));
        }
        slides.push_str("</div></div>");
    }

    let arrows = if carousel.has_controls() {
        nav_arrows(
            &detail_href(project.id, view.slide, Some(carousel.prev_index())),
            &detail_href(project.id, view.slide, Some(carousel.next_index())),
            ui,
        )
    } else {
        String::new()
    };

    format!(
        "<div id=\"relatedProjectsCarousel\" class=\"carousel slide\"{}><div class=\"carousel-inner\">{}</div>{}</div>",
        interval_attr(&carousel),
        slides,
        arrows
    )
}

fn interval_attr<T>(carousel: &Carousel<T>) -> String {
    match carousel.auto_advance() {
        Some(interval) if carousel.has_controls() => {
            format!(" data-interval=\"{}\"", interval.as_millis())
        }
        _ => String::new(),
    }
}

fn nav_arrows(prev: &str, next: &str, ui: &crate::i18n::UiStrings) -> String {
    format!(
        "<a class=\"carousel-control-prev\" href=\"{}\"><span class=\"carousel-control-prev-icon\" aria-hidden=\"true\"></span><span class=\"visually-hidden\">{}</span></a>\
<a class=\"carousel-control-next\" href=\"{}\"><span class=\"carousel-control-next-icon\" aria-hidden=\"true\"></span><span class=\"visually-hidden\">{}</span></a>",
        prev,
        html_escape(ui.previous),
        next,
        html_escape(ui.next)
    )
}
