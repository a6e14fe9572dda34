use std::net::IpAddr;
use std::sync::Arc;

use rocket::http::Status;
use rocket::request::{FromRequest, Outcome, Request};
use rocket::serde::json::Json;
use rocket::State;
use serde_json::{json, Value};

use crate::auth;
use crate::designs::common::{project_grid_html, PageState, RenderOptions};
use crate::email::{relay_message, Mailer};
use crate::filter::{ProjectFilter, ALL};
use crate::i18n::{resolve, Language, Preferences};
use crate::loader::DataSource;
use crate::models::settings::Settings;
use crate::rate_limit::{self, RateLimiter};
use crate::relay::RELAY_TOKEN_HEADER;

type JsonReply = (Status, Json<Value>);

fn reply(status: Status, body: Value) -> JsonReply {
    (status, Json(body))
}

// ── Project grid fragment ──────────────────────────────

/// Grid markup for one category, for pages that filter without a reload.
#[get("/projects?<category>&<lang>")]
pub async fn projects_fragment(
    category: Option<String>,
    lang: Option<String>,
    prefs: Preferences,
    source: &State<DataSource>,
    options: &State<RenderOptions>,
) -> JsonReply {
    let site = match source.load().await {
        Ok(site) => site,
        Err(e) => {
            log::error!("Failed to load site data: {}", e);
            return reply(Status::ServiceUnavailable, json!({ "error": "Data unavailable" }));
        }
    };

    let prefs = Preferences {
        language: lang.as_deref().and_then(Language::parse).or(prefs.language),
        ..prefs
    };
    let state = PageState {
        site: &site,
        resolved: resolve(&prefs, &site, options.default_language),
        options,
    };

    let mut filter = ProjectFilter::from_projects(&site.projects);
    let selected = category
        .filter(|c| filter.is_known(c))
        .unwrap_or_else(|| ALL.to_string());
    let visible = filter.set_category(&site, &selected);

    reply(
        Status::Ok,
        json!({
            "category": selected,
            "count": visible.len(),
            "html": project_grid_html(&visible, &state),
        }),
    )
}

// ── Contact relay endpoint ─────────────────────────────

/// Whether the caller is this server's own relay client, identified by the
/// `relay_token` setting. Those calls were already limited per visitor.
pub struct RelayCaller {
    trusted: bool,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for RelayCaller {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let expected = request
            .rocket()
            .state::<Settings>()
            .map(|s| s.get_or("relay_token", ""))
            .unwrap_or_default();
        let trusted = match request.headers().get_one(RELAY_TOKEN_HEADER) {
            Some(presented) => auth::token_matches(presented, &expected),
            None => false,
        };
        Outcome::Success(RelayCaller { trusted })
    }
}

fn field<'a>(body: &'a Value, name: &str) -> Option<&'a str> {
    body.get(name)
        .and_then(|v| v.as_str())
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
}

/// Relay a contact message to the operator's inbox. The body is parsed by
/// hand so malformed JSON still gets a JSON error.
#[post("/send-email", data = "<body>")]
pub async fn send_email(
    body: String,
    client_ip: Option<IpAddr>,
    caller: RelayCaller,
    settings: &State<Settings>,
    limiter: &State<RateLimiter>,
    mailer: &State<Arc<dyn Mailer>>,
) -> JsonReply {
    let max_attempts = settings.get_u64("relay_rate_limit").max(1);
    let key = rate_limit::client_key("relay", client_ip);
    if !caller.trusted && !rate_limit::admit(limiter, &key, max_attempts) {
        return reply(
            Status::TooManyRequests,
            json!({ "error": "Too many requests. Please try again later." }),
        );
    }

    let parsed: Value = match serde_json::from_str(&body) {
        Ok(v) => v,
        Err(e) => {
            log::debug!("Rejected malformed relay body: {}", e);
            return reply(Status::BadRequest, json!({ "error": "Invalid JSON" }));
        }
    };

    let (name, email, message) = match (
        field(&parsed, "name"),
        field(&parsed, "email"),
        field(&parsed, "message"),
    ) {
        (Some(n), Some(e), Some(m)) => (n, e, m),
        _ => return reply(Status::BadRequest, json!({ "error": "Missing fields" })),
    };

    let (subject, html) = relay_message(name, email, message);
    match mailer.send(&subject, &html).await {
        Ok(()) => {
            log::info!("Relayed contact message from {}", email);
            reply(Status::Ok, json!({ "success": true, "message": "Email terkirim!" }))
        }
        Err(e) => {
            log::error!("Failed to relay contact message: {}", e);
            reply(
                Status::InternalServerError,
                json!({ "error": "Gagal mengirim email" }),
            )
        }
    }
}

fn method_not_allowed() -> JsonReply {
    reply(Status::MethodNotAllowed, json!({ "error": "Method not allowed" }))
}

#[get("/send-email")]
pub fn send_email_get() -> JsonReply {
    method_not_allowed()
}

#[put("/send-email")]
pub fn send_email_put() -> JsonReply {
    method_not_allowed()
}

#[patch("/send-email")]
pub fn send_email_patch() -> JsonReply {
    method_not_allowed()
}

#[delete("/send-email")]
pub fn send_email_delete() -> JsonReply {
    method_not_allowed()
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        projects_fragment,
        send_email,
        send_email_get,
        send_email_put,
        send_email_patch,
        send_email_delete
    ]
}
