//! Language/theme resolution and the built-in UI strings that the data
//! file does not carry.

use rocket::http::{Cookie, CookieJar, SameSite};
use rocket::request::{FromRequest, Outcome, Request};
use serde::Serialize;

use crate::models::site_data::{SiteData, TextBundle};

pub const LANGUAGE_COOKIE: &str = "language";
pub const THEME_COOKIE: &str = "theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Language {
    Id,
    En,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::Id, Language::En];

    pub fn code(self) -> &'static str {
        match self {
            Language::Id => "id",
            Language::En => "en",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "id" => Some(Language::Id),
            "en" => Some(Language::En),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Language::Id => Language::En,
            Language::En => Language::Id,
        }
    }

    /// The toggle button shows the language you would switch *to*.
    pub fn toggle_label(self) -> &'static str {
        match self {
            Language::Id => "EN",
            Language::En => "ID",
        }
    }

    pub fn ui(self) -> &'static UiStrings {
        match self {
            Language::Id => &ID,
            Language::En => &EN,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn code(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn icon_class(self) -> &'static str {
        match self {
            Theme::Light => "fas fa-moon",
            Theme::Dark => "fas fa-sun",
        }
    }
}

/// Persisted choices, as read from the request cookies. `None` means the
/// visitor never toggled; [`resolve`] fills in the defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Preferences {
    pub language: Option<Language>,
    pub theme: Option<Theme>,
}

impl Preferences {
    pub fn from_cookies(cookies: &CookieJar<'_>) -> Self {
        Preferences {
            language: cookies
                .get(LANGUAGE_COOKIE)
                .and_then(|c| Language::parse(c.value())),
            theme: cookies
                .get(THEME_COOKIE)
                .and_then(|c| Theme::parse(c.value())),
        }
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Preferences {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        Outcome::Success(Preferences::from_cookies(request.cookies()))
    }
}

fn persist(cookies: &CookieJar<'_>, name: &'static str, value: &'static str) {
    let cookie = Cookie::build((name, value))
        .path("/")
        .same_site(SameSite::Lax)
        .permanent();
    cookies.add(cookie);
}

/// Flip the language, persist it and return the new value. Callers re-render.
pub fn toggle_language(cookies: &CookieJar<'_>, default: Language) -> Language {
    let current = Preferences::from_cookies(cookies).language.unwrap_or(default);
    let next = current.toggled();
    persist(cookies, LANGUAGE_COOKIE, next.code());
    next
}

/// Flip the theme and persist it. Only the theme attribute and icon change.
pub fn toggle_theme(cookies: &CookieJar<'_>) -> Theme {
    let current = Preferences::from_cookies(cookies).theme.unwrap_or(Theme::Light);
    let next = current.toggled();
    persist(cookies, THEME_COOKIE, next.code());
    next
}

/// Active language, theme and text bundle for one render pass.
#[derive(Debug, Clone)]
pub struct Resolved<'a> {
    pub language: Language,
    pub theme: Theme,
    pub bundle: &'a TextBundle,
    pub ui: &'static UiStrings,
}

pub fn resolve<'a>(prefs: &Preferences, site: &'a SiteData, default: Language) -> Resolved<'a> {
    let language = prefs.language.unwrap_or(default);
    Resolved {
        language,
        theme: prefs.theme.unwrap_or(Theme::Light),
        bundle: get_bundle(site, language, default),
        ui: language.ui(),
    }
}

static EMPTY_BUNDLE: std::sync::OnceLock<TextBundle> = std::sync::OnceLock::new();

/// Bundle for `language`, falling back to the default language's bundle, then
/// to any bundle, then to an empty one. Runs on every toggle so it never fails.
pub fn get_bundle(site: &SiteData, language: Language, default: Language) -> &TextBundle {
    if let Some(bundle) = site.bundle(language) {
        return bundle;
    }
    log::warn!("no text bundle for '{}', falling back", language.code());
    site.bundle(default)
        .or_else(|| site.texts.values().next())
        .unwrap_or_else(|| EMPTY_BUNDLE.get_or_init(TextBundle::default))
}

/// Copy hardcoded in the page scripts rather than the data file.
#[derive(Debug)]
pub struct UiStrings {
    pub filter_all: &'static str,
    pub no_projects: &'static str,
    pub contact_me: &'static str,
    pub years_experience: &'static str,
    pub projects_completed: &'static str,
    pub about_subtitle: &'static str,
    pub my_cv: &'static str,
    pub projects_subtitle: &'static str,
    pub contact_subtitle: &'static str,
    pub back_to_top: &'static str,
    pub back_to_projects: &'static str,
    pub not_found_title: &'static str,
    pub not_found_desc: &'static str,
    pub load_error: &'static str,
    pub load_error_home_link: &'static str,
    pub no_images: &'static str,
    pub no_related: &'static str,
    pub image_alt: &'static str,
    pub project_info: &'static str,
    pub category_label: &'static str,
    pub status_label: &'static str,
    pub status_completed: &'static str,
    pub cta_description: &'static str,
    pub previous: &'static str,
    pub next: &'static str,
    pub contact_sent: &'static str,
    pub contact_pending: &'static str,
    pub contact_failed: &'static str,
    pub more_tools: &'static str,
}

pub static ID: UiStrings = UiStrings {
    filter_all: "Semua",
    no_projects: "Tidak ada proyek ditemukan dalam kategori ini.",
    contact_me: "Hubungi Saya",
    years_experience: "Tahun Pengalaman",
    projects_completed: "Proyek Selesai",
    about_subtitle: "Kenali Saya Lebih Dekat",
    my_cv: "CV Saya",
    projects_subtitle: "Portfolio Saya",
    contact_subtitle: "Mari Berkolaborasi",
    back_to_top: "Kembali ke Atas",
    back_to_projects: "Kembali ke Proyek",
    not_found_title: "Proyek Tidak Ditemukan",
    not_found_desc: "Maaf, proyek yang Anda cari tidak tersedia atau telah dihapus.",
    load_error: "Gagal memuat data. Silakan refresh halaman.",
    load_error_home_link: "Kembali ke Beranda",
    no_images: "Tidak ada gambar tersedia untuk proyek ini.",
    no_related: "Tidak ada proyek terkait.",
    image_alt: "Gambar",
    project_info: "Informasi Proyek",
    category_label: "Kategori:",
    status_label: "Status:",
    status_completed: "Selesai",
    cta_description: "Mari wujudkan proyek digital Anda bersama saya. Hubungi sekarang untuk diskusi lebih lanjut.",
    previous: "Sebelumnya",
    next: "Berikutnya",
    contact_sent: "Pesan berhasil dikirim!",
    contact_pending: "Pesan Anda masih dikirim. Mohon tunggu sebentar.",
    contact_failed: "Gagal mengirim pesan.",
    more_tools: "lainnya",
};

pub static EN: UiStrings = UiStrings {
    filter_all: "All",
    no_projects: "No projects found in this category.",
    contact_me: "Contact Me",
    years_experience: "Years Experience",
    projects_completed: "Projects Completed",
    about_subtitle: "Get to Know Me",
    my_cv: "My CV",
    projects_subtitle: "My Portfolio",
    contact_subtitle: "Let's Collaborate",
    back_to_top: "Back to Top",
    back_to_projects: "Back to Projects",
    not_found_title: "Project Not Found",
    not_found_desc: "Sorry, the project you are looking for is not available or has been removed.",
    load_error: "Failed to load data. Please refresh the page.",
    load_error_home_link: "Back to Home",
    no_images: "No images available for this project.",
    no_related: "No related projects.",
    image_alt: "Image",
    project_info: "Project Info",
    category_label: "Category:",
    status_label: "Status:",
    status_completed: "Completed",
    cta_description: "Let's bring your digital project to life together. Contact me now for further discussion.",
    previous: "Previous",
    next: "Next",
    contact_sent: "Message sent successfully!",
    contact_pending: "Your message is still being sent. Please wait a moment.",
    contact_failed: "Failed to send message.",
    more_tools: "more",
};
