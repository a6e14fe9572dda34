use rocket::http::CookieJar;
use rocket::response::Redirect;
use rocket::State;

use crate::designs::common::RenderOptions;
use crate::i18n;
use crate::render::safe_back_path;

/// Flip the language cookie and go back to the page the visitor was on,
/// keeping its query (an active category filter survives the switch).
#[get("/toggle/language?<back>")]
pub fn toggle_language(
    back: Option<String>,
    cookies: &CookieJar<'_>,
    options: &State<RenderOptions>,
) -> Redirect {
    let language = i18n::toggle_language(cookies, options.default_language);
    log::debug!("Language switched to {}", language.code());
    Redirect::to(safe_back_path(back.as_deref()))
}

#[get("/toggle/theme?<back>")]
pub fn toggle_theme(back: Option<String>, cookies: &CookieJar<'_>) -> Redirect {
    let theme = i18n::toggle_theme(cookies);
    log::debug!("Theme switched to {}", theme.code());
    Redirect::to(safe_back_path(back.as_deref()))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![toggle_language, toggle_theme]
}
