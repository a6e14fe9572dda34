use std::net::IpAddr;
use std::sync::Arc;

use rocket::form::Form;
use rocket::http::Status;
use rocket::State;
use rocket_dyn_templates::Template;

use crate::designs::common::{PageState, RenderOptions};
use crate::designs::contact::ContactFormView;
use crate::designs::detail::{render_detail, DetailOutcome, DetailView, DETAIL};
use crate::designs::home::{apply_filter, render_home, HOME};
use crate::document::Document;
use crate::filter::ALL;
use crate::i18n::{resolve, Preferences};
use crate::loader::DataSource;
use crate::models::settings::Settings;
use crate::rate_limit::{self, RateLimiter};
use crate::relay::{self, ContactMessage, Relay, Submission, SubmissionLedger};
use crate::render::{render_page, url_encode};

use super::load_failed;

// ── Home ───────────────────────────────────────────────

#[get("/?<category>")]
pub async fn home(
    category: Option<String>,
    prefs: Preferences,
    source: &State<DataSource>,
    options: &State<RenderOptions>,
) -> (Status, Template) {
    home_page(category, ContactFormView::fresh(), prefs, source, options).await
}

#[get("/index.html?<category>")]
pub async fn home_legacy(
    category: Option<String>,
    prefs: Preferences,
    source: &State<DataSource>,
    options: &State<RenderOptions>,
) -> (Status, Template) {
    home_page(category, ContactFormView::fresh(), prefs, source, options).await
}

/// Load, resolve, render, then narrow the grid. Unknown categories fall back
/// to "all" so exactly one filter control is active.
async fn home_page(
    category: Option<String>,
    form: ContactFormView,
    prefs: Preferences,
    source: &DataSource,
    options: &RenderOptions,
) -> (Status, Template) {
    let back = match category.as_deref() {
        Some(c) if !c.is_empty() => format!("/?category={}", url_encode(c)),
        _ => "/".to_string(),
    };

    let site = match source.load().await {
        Ok(site) => site,
        Err(e) => return load_failed(&HOME, &e, &prefs, options, &back),
    };

    let state = PageState {
        site: &site,
        resolved: resolve(&prefs, &site, options.default_language),
        options,
    };
    let mut doc = Document::new(&HOME);
    let mut filter = render_home(&mut doc, &state, &form);

    let selected = category
        .filter(|c| filter.is_known(c))
        .unwrap_or_else(|| ALL.to_string());
    if selected != ALL {
        apply_filter(&mut doc, &state, &mut filter, &selected);
    }

    (Status::Ok, render_page(&doc, &state.resolved, &back))
}

// ── Project detail ─────────────────────────────────────

#[get("/project?<id>&<slide>&<related>")]
pub async fn project(
    id: Option<String>,
    slide: Option<String>,
    related: Option<String>,
    prefs: Preferences,
    source: &State<DataSource>,
    options: &State<RenderOptions>,
) -> (Status, Template) {
    detail_page(id, slide, related, prefs, source, options).await
}

#[get("/detail-project.html?<id>&<slide>&<related>")]
pub async fn project_legacy(
    id: Option<String>,
    slide: Option<String>,
    related: Option<String>,
    prefs: Preferences,
    source: &State<DataSource>,
    options: &State<RenderOptions>,
) -> (Status, Template) {
    detail_page(id, slide, related, prefs, source, options).await
}

fn parse_index(raw: Option<&str>) -> Option<usize> {
    raw.and_then(|s| s.trim().parse().ok())
}

async fn detail_page(
    id: Option<String>,
    slide: Option<String>,
    related: Option<String>,
    prefs: Preferences,
    source: &DataSource,
    options: &RenderOptions,
) -> (Status, Template) {
    // Missing or non-numeric ids render the not-found state
    let project_id = id.as_deref().and_then(|s| s.trim().parse::<i64>().ok());
    let view = DetailView {
        slide: parse_index(slide.as_deref()),
        related: parse_index(related.as_deref()),
    };
    let back = match project_id {
        Some(id) => format!("/project?id={}", id),
        None => "/project".to_string(),
    };

    let site = match source.load().await {
        Ok(site) => site,
        Err(e) => return load_failed(&DETAIL, &e, &prefs, options, &back),
    };

    let state = PageState {
        site: &site,
        resolved: resolve(&prefs, &site, options.default_language),
        options,
    };
    let mut doc = Document::new(&DETAIL);
    let status = match render_detail(&mut doc, &state, project_id, view) {
        DetailOutcome::Rendered => Status::Ok,
        DetailOutcome::NotFound => Status::NotFound,
    };

    (status, render_page(&doc, &state.resolved, &back))
}

// ── Contact form ───────────────────────────────────────

#[derive(Debug, FromForm)]
pub struct ContactForm {
    #[field(default = String::new())]
    pub name: String,
    #[field(default = String::new())]
    pub email: String,
    #[field(default = String::new())]
    pub message: String,
    #[field(default = String::new())]
    pub submission_id: String,
}

/// Forward the form to the relay once, then redraw the home page with the
/// outcome. Resubmitting an id that is in flight or already delivered is not
/// forwarded again. Each visitor gets `relay_rate_limit` sends per window.
#[post("/contact", data = "<form>")]
pub async fn contact_submit(
    form: Form<ContactForm>,
    client_ip: Option<IpAddr>,
    prefs: Preferences,
    source: &State<DataSource>,
    options: &State<RenderOptions>,
    relay: &State<Arc<dyn Relay>>,
    ledger: &State<SubmissionLedger>,
    settings: &State<Settings>,
    limiter: &State<RateLimiter>,
) -> (Status, Template) {
    let form = form.into_inner();
    let submission_id = if form.submission_id.trim().is_empty() {
        uuid::Uuid::new_v4().to_string()
    } else {
        form.submission_id.trim().to_string()
    };
    let message = ContactMessage {
        name: form.name,
        email: form.email,
        message: form.message,
    };
    let failed = |m: &ContactMessage| {
        ContactFormView::failed(&m.name, &m.email, &m.message, &submission_id)
    };

    let view = if !message.is_complete() {
        failed(&message)
    } else {
        match ledger.begin(&submission_id) {
            Submission::Done => {
                log::info!("Ignoring repeated contact submission {}", submission_id);
                ContactFormView::sent()
            }
            // The outcome is not known yet; keep the values in case it fails
            Submission::InFlight => {
                log::info!("Contact submission {} is still being sent", submission_id);
                ContactFormView::pending(&message.name, &message.email, &message.message, &submission_id)
            }
            Submission::Fresh if !visitor_allowed(settings, limiter, client_ip) => {
                ledger.finish(&submission_id, false);
                log::warn!("Contact form rate limit reached");
                failed(&message)
            }
            Submission::Fresh => {
                let result = relay::deliver(relay.inner().as_ref(), &message).await;
                ledger.finish(&submission_id, result.is_ok());
                match result {
                    Ok(()) => ContactFormView::sent(),
                    Err(e) => {
                        log::warn!("Contact relay failed: {}", e);
                        failed(&message)
                    }
                }
            }
        }
    };

    home_page(None, view, prefs, source, options).await
}

fn visitor_allowed(settings: &Settings, limiter: &RateLimiter, client_ip: Option<IpAddr>) -> bool {
    let max_attempts = settings.get_u64("relay_rate_limit").max(1);
    rate_limit::admit(limiter, &rate_limit::client_key("contact", client_ip), max_attempts)
}

pub fn routes() -> Vec<rocket::Route> {
    routes![home, home_legacy, project, project_legacy, contact_submit]
}
