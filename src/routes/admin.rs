use std::fs;
use std::net::IpAddr;

use rocket::form::Form;
use rocket::http::{CookieJar, Status};
use rocket::response::Redirect;
use rocket::State;
use rocket_dyn_templates::Template;
use serde_json::json;

use crate::auth::{self, AdminSession};
use crate::loader::{self, DataSource};
use crate::models::settings::Settings;
use crate::rate_limit::{self, RateLimiter};

fn admin_enabled(settings: &Settings) -> bool {
    !settings.get_or("admin_token", "").is_empty()
}

struct EditorView {
    data: String,
    error: Option<String>,
    issues: Vec<String>,
    saved: bool,
}

fn render_editor(source: &DataSource, view: EditorView) -> Template {
    let (source_label, editable) = match source {
        DataSource::File(path) => (path.display().to_string(), true),
        DataSource::Url { url, .. } => (url.clone(), false),
    };
    Template::render(
        "admin/editor",
        json!({
            "data": view.data,
            "error": view.error,
            "issues": view.issues,
            "saved": view.saved,
            "source": source_label,
            "editable": editable,
        }),
    )
}

/// File sources show the raw text, so a broken file can still be repaired.
/// URL sources are fetched and shown read-only.
async fn current_data(source: &DataSource) -> (String, Result<Vec<String>, String>) {
    match source {
        DataSource::File(path) => match fs::read_to_string(path) {
            Ok(raw) => {
                let report = loader::parse(&raw)
                    .map(|site| loader::validate(&site).iter().map(|i| i.to_string()).collect())
                    .map_err(|e| e.to_string());
                (raw, report)
            }
            Err(e) => (String::new(), Err(format!("Cannot read {}: {}", path.display(), e))),
        },
        DataSource::Url { .. } => match source.load().await {
            Ok(site) => {
                let issues = loader::validate(&site).iter().map(|i| i.to_string()).collect();
                (serde_json::to_string_pretty(&site).unwrap_or_default(), Ok(issues))
            }
            Err(e) => (String::new(), Err(e.to_string())),
        },
    }
}

// ── Editor ─────────────────────────────────────────────

#[get("/?<saved>")]
pub async fn editor(_admin: AdminSession, saved: Option<bool>, source: &State<DataSource>) -> Template {
    let (data, report) = current_data(source).await;
    let (issues, error) = match report {
        Ok(issues) => (issues, None),
        Err(e) => (Vec::new(), Some(e)),
    };
    render_editor(
        source,
        EditorView {
            data,
            error,
            issues,
            saved: saved.unwrap_or(false),
        },
    )
}

#[get("/", rank = 2)]
pub fn editor_redirect(settings: &State<Settings>) -> Result<Redirect, Status> {
    if admin_enabled(settings) {
        Ok(Redirect::to("/admin/login"))
    } else {
        Err(Status::NotFound)
    }
}

#[derive(Debug, FromForm)]
pub struct SaveForm {
    pub data: String,
}

#[post("/save", data = "<form>")]
pub fn save(
    _admin: AdminSession,
    form: Form<SaveForm>,
    source: &State<DataSource>,
) -> Result<Redirect, (Status, Template)> {
    let submitted = form.into_inner().data;
    let fail = |status: Status, message: String, data: String| -> Result<Redirect, (Status, Template)> {
        Err((
            status,
            render_editor(
                source,
                EditorView {
                    data,
                    error: Some(message),
                    issues: Vec::new(),
                    saved: false,
                },
            ),
        ))
    };

    let path = match source.path() {
        Some(p) => p.to_path_buf(),
        None => {
            return fail(
                Status::Forbidden,
                "The data source is a URL and cannot be edited here".into(),
                submitted,
            )
        }
    };

    let site = match loader::parse(&submitted) {
        Ok(site) => site,
        Err(e) => return fail(Status::UnprocessableEntity, e.to_string(), submitted),
    };

    for issue in loader::validate(&site) {
        log::warn!("Saved data: {}", issue);
    }

    match loader::write_file(&path, &site) {
        Ok(()) => {
            log::info!("Site data written to {}", path.display());
            Ok(Redirect::to("/admin?saved=true"))
        }
        Err(e) => {
            log::error!("Failed to write site data: {}", e);
            fail(Status::InternalServerError, e, submitted)
        }
    }
}

// ── Login / logout ─────────────────────────────────────

#[derive(Debug, FromForm)]
pub struct LoginForm {
    pub token: String,
}

fn login_template(error: Option<&str>) -> Template {
    Template::render("admin/login", json!({ "error": error }))
}

#[get("/login")]
pub fn login_page(settings: &State<Settings>) -> Result<Template, Status> {
    if !admin_enabled(settings) {
        return Err(Status::NotFound);
    }
    Ok(login_template(None))
}

#[post("/login", data = "<form>")]
pub fn login_submit(
    form: Form<LoginForm>,
    client_ip: Option<IpAddr>,
    settings: &State<Settings>,
    limiter: &State<RateLimiter>,
    cookies: &CookieJar<'_>,
) -> Result<Redirect, (Status, Template)> {
    if !admin_enabled(settings) {
        return Err((Status::NotFound, login_template(None)));
    }

    let rate_key = rate_limit::client_key("login", client_ip);
    let max_attempts = settings.get_u64("admin_login_rate_limit").max(1);
    if !rate_limit::admit(limiter, &rate_key, max_attempts) {
        return Err((
            Status::TooManyRequests,
            login_template(Some("Too many login attempts. Please try again in 15 minutes.")),
        ));
    }

    let configured = settings.get_or("admin_token", "");
    if auth::token_matches(&form.token, &configured) {
        auth::set_session_cookie(cookies, &configured);
        log::info!("Admin session started");
        Ok(Redirect::to("/admin"))
    } else {
        let left = limiter.remaining(&rate_key, max_attempts, rate_limit::WINDOW);
        log::warn!("Rejected admin login attempt ({} left)", left);
        Err((Status::Unauthorized, login_template(Some("Invalid token"))))
    }
}

#[get("/logout")]
pub fn logout(cookies: &CookieJar<'_>) -> Redirect {
    auth::clear_session_cookie(cookies);
    Redirect::to("/admin/login")
}

pub fn routes() -> Vec<rocket::Route> {
    routes![editor, editor_redirect, save, login_page, login_submit, logout]
}
