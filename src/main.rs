#[macro_use]
extern crate rocket;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use rocket::fairing::{Fairing, Info, Kind};
use rocket::fs::FileServer;
use rocket::http::Header;
use rocket::response::content::RawHtml;
use rocket::{Build, Rocket};
use rocket_dyn_templates::Template;

mod auth;
mod boot;
mod carousel;
mod designs;
mod document;
mod email;
mod filter;
mod i18n;
mod loader;
mod models;
mod rate_limit;
mod relay;
mod render;
mod routes;

#[cfg(test)]
mod tests;

use designs::common::RenderOptions;
use email::{ConfiguredMailer, Mailer};
use loader::DataSource;
use models::settings::{Settings, SITE_CONFIG_PATH};
use rate_limit::RateLimiter;
use relay::{HttpRelay, Relay, SubmissionLedger};

/// Submission ids remembered by the contact form ledger.
const LEDGER_CAPACITY: usize = 1024;

pub struct NoCacheAdmin;

#[rocket::async_trait]
impl Fairing for NoCacheAdmin {
    fn info(&self) -> Info {
        Info { name: "No-Cache Admin Pages", kind: Kind::Response }
    }

    async fn on_response<'r>(&self, req: &'r rocket::Request<'_>, res: &mut rocket::Response<'r>) {
        if req.uri().path().starts_with("/admin") {
            res.set_header(Header::new("Cache-Control", "no-store, no-cache, must-revalidate, max-age=0"));
            res.set_header(Header::new("Pragma", "no-cache"));
        }
    }
}

#[catch(404)]
fn not_found() -> RawHtml<String> {
    RawHtml("<html><body style='font-family:sans-serif;text-align:center;padding:80px'><h1>404</h1><p>Page not found.</p><a href='/'>← Home</a></body></html>".to_string())
}

#[catch(500)]
fn server_error() -> RawHtml<String> {
    RawHtml("<html><body style='font-family:sans-serif;text-align:center;padding:80px'><h1>500</h1><p>Internal server error.</p><a href='/'>← Home</a></body></html>".to_string())
}

/// Assemble the server around an already-loaded configuration. The relay
/// client and the mailer are injected so tests can substitute recorders.
pub fn build_rocket(settings: Settings, relay: Arc<dyn Relay>, mailer: Arc<dyn Mailer>) -> Rocket<Build> {
    let source = DataSource::from_settings(&settings);
    let options = RenderOptions::from_settings(&settings);
    let figment = rocket::Config::figment().merge(("template_dir", "website/templates"));

    rocket::custom(figment)
        .manage(source)
        .manage(options)
        .manage(settings)
        .manage(relay)
        .manage(mailer)
        .manage(RateLimiter::new())
        .manage(SubmissionLedger::new(LEDGER_CAPACITY))
        .attach(Template::fairing())
        .attach(NoCacheAdmin)
        .mount("/assets", FileServer::from("website/static"))
        .mount("/", routes::public::routes())
        .mount("/", routes::prefs::routes())
        .mount("/api", routes::api::routes())
        .mount("/admin", routes::admin::routes())
        .register("/", catchers![not_found, server_error])
}

#[launch]
fn rocket() -> _ {
    env_logger::init();

    // Boot check: verify/create directories, validate critical files
    boot::run();

    let settings = match Settings::load(Path::new(SITE_CONFIG_PATH)) {
        Ok(s) => s,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };

    let source = DataSource::from_settings(&settings);
    if let DataSource::File(path) = &source {
        match loader::load_file(path) {
            Ok(site) => {
                for issue in loader::validate(&site) {
                    log::warn!("Site data: {}", issue);
                }
            }
            Err(e) => log::warn!("Site data not loadable yet: {}", e),
        }
    }

    let mut settings = settings;
    if settings.get_or("relay_token", "").is_empty() {
        // Fresh per process; only this server's own relay client learns it
        settings.set("relay_token", &uuid::Uuid::new_v4().to_string());
    }

    let timeout = Duration::from_secs(settings.get_u64("relay_timeout_secs").max(1));
    let relay: Arc<dyn Relay> = match HttpRelay::new(
        settings.get_or("relay_url", ""),
        timeout,
        settings.get("relay_token"),
    ) {
        Ok(r) => Arc::new(r),
        Err(e) => {
            log::error!("Failed to build relay client: {}", e);
            std::process::exit(1);
        }
    };

    let mailer = ConfiguredMailer::new(settings.all().clone());
    if !mailer.is_configured() {
        log::warn!("No email provider configured; /api/send-email will answer 500");
    }

    log::info!("Data source: {:?}", source);
    build_rocket(settings, relay, Arc::new(mailer))
}
