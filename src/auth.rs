use rocket::http::{Cookie, CookieJar, SameSite, Status};
use rocket::request::{FromRequest, Outcome, Request};
use rocket::State;
use sha2::{Digest, Sha256};

use crate::models::settings::Settings;

const SESSION_COOKIE: &str = "portfolio_admin";

/// Guard for the data editor. Forwards with 404 when no admin token is
/// configured and 401 when the session cookie is missing or stale.
pub struct AdminSession;

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AdminSession {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let settings = match request.guard::<&State<Settings>>().await {
            Outcome::Success(s) => s,
            _ => return Outcome::Forward(Status::NotFound),
        };
        let token = settings.get_or("admin_token", "");
        if token.is_empty() {
            return Outcome::Forward(Status::NotFound);
        }

        let cookies = request.cookies();
        let presented = match cookies.get_private(SESSION_COOKIE) {
            Some(c) => c.value().to_string(),
            None => return Outcome::Forward(Status::Unauthorized),
        };

        if presented == token_hash(&token) {
            Outcome::Success(AdminSession)
        } else {
            cookies.remove_private(Cookie::from(SESSION_COOKIE));
            Outcome::Forward(Status::Unauthorized)
        }
    }
}

pub fn token_hash(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Constant-time comparison of a submitted token against the configured one.
pub fn token_matches(submitted: &str, configured: &str) -> bool {
    if configured.is_empty() {
        return false;
    }
    let a = token_hash(submitted);
    let b = token_hash(configured);
    a.bytes().zip(b.bytes()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

pub fn set_session_cookie(cookies: &CookieJar<'_>, token: &str) {
    let mut cookie = Cookie::new(SESSION_COOKIE, token_hash(token));
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Strict);
    cookie.set_path("/");
    cookies.add_private(cookie);
}

pub fn clear_session_cookie(cookies: &CookieJar<'_>) {
    cookies.remove_private(Cookie::from(SESSION_COOKIE));
}
