#![cfg(test)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use rocket::http::{ContentType, Header, Status};
use rocket::local::blocking::Client;
use serde_json::{json, Value};

use crate::build_rocket;
use crate::designs::common::{PageState, RenderOptions};
use crate::designs::contact::ContactFormView;
use crate::designs::detail::{render_detail, DetailOutcome, DetailView, DETAIL};
use crate::designs::home::{apply_filter, render_home, HOME};
use crate::document::Document;
use crate::email::Mailer;
use crate::filter::{self, related_projects, ALL};
use crate::i18n::{self, resolve, Language, Preferences, Theme};
use crate::loader::{self, DataIssue, DataSource, LoadError};
use crate::models::settings::Settings;
use crate::models::site_data::SiteData;
use crate::relay::{ContactMessage, Relay, RelayError, RelayReply, SubmissionLedger};
use crate::render::url_encode;

const FIXTURE: &str = r#"{
  "projects": [
    {
      "id": 1, "category": "Web",
      "title": {"id": "Toko Online", "en": "Online Store"},
      "short_description": {"id": "Toko daring kecil", "en": "A small web shop"},
      "problem": {"id": "Penjualan manual", "en": "Manual sales"},
      "solution": {"id": "Katalog dan keranjang", "en": "Catalog and cart"},
      "tools": ["Rust", "Rocket", "Tera", "SQLite"],
      "images": ["assets/img/shop-1.png", "assets/img/shop-2.png"]
    },
    {
      "id": 2, "category": "Mobile",
      "title": {"id": "Aplikasi Kasir", "en": "Cashier App"},
      "short_description": {"id": "Kasir untuk warung", "en": "Point of sale for small shops"},
      "problem": {"id": "Antrian panjang", "en": "Long queues"},
      "solution": {"id": "Pembayaran cepat", "en": "Fast checkout"},
      "tools": ["Flutter"],
      "images": ["assets/img/pos.png"]
    },
    {
      "id": 3, "category": "Web",
      "title": {"id": "Blog Pribadi", "en": "Personal Blog"},
      "short_description": {"id": "Catatan harian", "en": "Daily notes"},
      "problem": {"id": "Tidak ada wadah menulis", "en": "Nowhere to write"},
      "solution": {"id": "Blog statis", "en": "A static blog"},
      "tools": ["Hugo"],
      "images": []
    },
    {
      "id": 4, "category": "Design",
      "title": {"id": "Logo Kafe", "en": "Cafe Logo"},
      "short_description": {"id": "Identitas visual", "en": "Visual identity"},
      "problem": {"id": "Merek lama", "en": "Dated brand"},
      "solution": {"id": "Logo baru", "en": "Fresh logo"},
      "tools": ["Figma"],
      "images": ["assets/img/logo.png"]
    }
  ],
  "skills": {"languages": ["Rust", "Dart"], "tools": ["Git"]},
  "texts": {
    "id": {
      "navbar": ["Beranda", "Tentang", "Proyek", "Kontak"],
      "hero": {"greeting": "Halo, saya Deva", "subtitle": "Pengembang Web", "quote": "Sederhana itu indah", "my_works_button": "Lihat Karya"},
      "about": {"title": "Tentang Saya", "description": "Saya suka membangun aplikasi", "cv": "assets/cv.pdf"},
      "skills": {"languages": "Bahasa Pemrograman", "tools": "Perkakas"},
      "detail": {"overview": "Ringkasan", "problem": "Masalah", "solution": "Solusi", "tools": "Teknologi", "related": "Proyek Terkait", "collab_title": "Tertarik Bekerja Sama?", "back": "Kembali", "not_found": "Proyek Tidak Ditemukan"},
      "form": {"name": "Nama", "email": "Surel", "message": "Pesan", "send_button": "Kirim"},
      "footer": "Dibuat oleh Deva",
      "projects_title": "Proyek Saya",
      "contact": "Hubungi",
      "card_button": "Lihat Detail"
    },
    "en": {
      "navbar": ["Home", "About", "Projects", "Contact"],
      "hero": {"greeting": "Hello, I am Deva", "subtitle": "Web Developer", "quote": "Simple is beautiful", "my_works_button": "See Work"},
      "about": {"title": "About Me", "description": "I like building apps", "cv": "assets/cv.pdf"},
      "skills": {"languages": "Programming Languages", "tools": "Tooling"},
      "detail": {"overview": "Overview", "problem": "Problem", "solution": "Solution", "tools": "Technology", "related": "Related Projects", "collab_title": "Want to Work Together?", "back": "Back", "not_found": "Project Not Found"},
      "form": {"name": "Name", "email": "Email", "message": "Message", "send_button": "Send"},
      "footer": "Made by Deva",
      "projects_title": "My Projects",
      "contact": "Get In Touch",
      "card_button": "View Details"
    }
  }
}"#;

fn fixture() -> SiteData {
    loader::parse(FIXTURE).unwrap()
}

fn options() -> RenderOptions {
    RenderOptions {
        owner: "Deva".to_string(),
        ..RenderOptions::default()
    }
}

fn page_state<'a>(site: &'a SiteData, options: &'a RenderOptions, lang: Language) -> PageState<'a> {
    let prefs = Preferences {
        language: Some(lang),
        theme: None,
    };
    PageState {
        site,
        resolved: resolve(&prefs, site, Language::Id),
        options,
    }
}

fn count(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}

fn slot<'a>(doc: &'a Document, name: &str) -> &'a str {
    doc.html(name).unwrap_or_default()
}

// ═══════════════════════════════════════════════════════════
// Localization
// ═══════════════════════════════════════════════════════════

#[test]
fn language_parsing_is_case_insensitive() {
    assert_eq!(Language::parse("EN"), Some(Language::En));
    assert_eq!(Language::parse("id"), Some(Language::Id));
    assert_eq!(Language::parse("fr"), None);
    assert_eq!(Theme::parse("DARK"), Some(Theme::Dark));
    assert_eq!(Theme::parse("sepia"), None);
}

#[test]
fn toggle_label_names_the_other_language() {
    assert_eq!(Language::Id.toggle_label(), "EN");
    assert_eq!(Language::En.toggle_label(), "ID");
    assert_eq!(Language::Id.toggled(), Language::En);
    assert_eq!(Language::En.toggled(), Language::Id);
}

#[test]
fn theme_icon_tracks_theme() {
    assert_eq!(Theme::Dark.icon_class(), "fas fa-sun");
    assert_eq!(Theme::Light.icon_class(), "fas fa-moon");
    assert_eq!(Theme::Light.toggled(), Theme::Dark);
}

#[test]
fn resolve_uses_defaults_without_preferences() {
    let site = fixture();
    let resolved = resolve(&Preferences::default(), &site, Language::Id);
    assert_eq!(resolved.language, Language::Id);
    assert_eq!(resolved.theme, Theme::Light);
    assert_eq!(resolved.bundle.hero.greeting, "Halo, saya Deva");
    assert_eq!(resolved.ui.filter_all, "Semua");
}

#[test]
fn missing_bundle_falls_back_to_default_language() {
    let mut site = fixture();
    site.texts.remove("en");
    let bundle = i18n::get_bundle(&site, Language::En, Language::Id);
    assert_eq!(bundle.hero.greeting, "Halo, saya Deva");

    site.texts.clear();
    let bundle = i18n::get_bundle(&site, Language::En, Language::Id);
    assert_eq!(bundle.hero.greeting, "");
}

#[test]
fn switching_language_leaves_no_stale_text() {
    let site = fixture();
    let options = options();
    let mut doc = Document::new(&HOME);

    render_home(&mut doc, &page_state(&site, &options, Language::Id), &ContactFormView::fresh());
    assert_eq!(slot(&doc, "heroGreeting"), "Halo, saya Deva");

    render_home(&mut doc, &page_state(&site, &options, Language::En), &ContactFormView::fresh());
    assert_eq!(slot(&doc, "heroGreeting"), "Hello, I am Deva");
    assert_eq!(slot(&doc, "heroContactBtn"), "Contact Me");

    let rendered = doc.to_context().to_string();
    for indonesian in ["Halo", "Semua", "Lihat Detail", "Toko Online", "Beranda", "Hubungi Saya"] {
        assert!(!rendered.contains(indonesian), "stale text left behind: {}", indonesian);
    }
    assert!(rendered.contains("Online Store"));
    assert!(rendered.contains("View Details"));
}

// ═══════════════════════════════════════════════════════════
// Home page and filter
// ═══════════════════════════════════════════════════════════

#[test]
fn render_home_is_idempotent() {
    let site = fixture();
    let options = options();
    let state = page_state(&site, &options, Language::En);
    let form = ContactFormView::fresh();

    let mut once = Document::new(&HOME);
    render_home(&mut once, &state, &form);

    let mut twice = Document::new(&HOME);
    render_home(&mut twice, &state, &form);
    render_home(&mut twice, &state, &form);

    assert_eq!(once, twice);
    assert_eq!(count(slot(&twice, "projectsGrid"), "class=\"project-card\""), 4);
}

#[test]
fn home_title_and_nav_anchors() {
    let site = fixture();
    let options = options();
    let mut doc = Document::new(&HOME);
    render_home(&mut doc, &page_state(&site, &options, Language::En), &ContactFormView::fresh());

    assert_eq!(slot(&doc, "pageTitle"), "Deva - Web Developer");
    let nav = slot(&doc, "navMenu");
    assert!(nav.contains("href=\"#about\">About</a>"));
    assert!(nav.contains("href=\"#contact\">Contact</a>"));
    assert_eq!(doc.attr("cvLink", "href"), Some("/assets/cv.pdf"));
}

#[test]
fn home_renders_without_optional_slots() {
    let site = fixture();
    let options = options();
    let mut doc = Document::new(&HOME).without(&["heroQuote", "contactForm"]);
    render_home(&mut doc, &page_state(&site, &options, Language::Id), &ContactFormView::fresh());
    assert_eq!(doc.html("heroQuote"), None);
    assert_eq!(slot(&doc, "heroGreeting"), "Halo, saya Deva");
}

#[test]
fn exactly_one_filter_control_is_active() {
    let site = fixture();
    let options = options();
    let state = page_state(&site, &options, Language::En);
    let mut doc = Document::new(&HOME);
    let mut project_filter = render_home(&mut doc, &state, &ContactFormView::fresh());

    assert_eq!(project_filter.categories(), ["Web", "Mobile", "Design"]);
    assert_eq!(count(slot(&doc, "categoryFilters"), "filter-btn active"), 1);

    for category in [ALL, "Web", "Mobile", "Design", ALL] {
        apply_filter(&mut doc, &state, &mut project_filter, category);
        assert_eq!(project_filter.selected(), category);
        let controls = slot(&doc, "categoryFilters");
        assert_eq!(count(controls, "filter-btn active"), 1);
        assert!(controls.contains(&format!("filter-btn active\" data-category=\"{}\"", category)));

        let expected = filter::apply(&site.projects, category);
        let grid = slot(&doc, "projectsGrid");
        assert_eq!(count(grid, "class=\"project-card\""), expected.len());
        for project in expected {
            assert!(grid.contains(project.title.get(Language::En)));
        }
    }
}

#[test]
fn filtering_leaves_other_sections_alone() {
    let site = fixture();
    let options = options();
    let state = page_state(&site, &options, Language::En);
    let mut doc = Document::new(&HOME);
    let mut project_filter = render_home(&mut doc, &state, &ContactFormView::fresh());
    let before = doc.clone();

    apply_filter(&mut doc, &state, &mut project_filter, "Mobile");
    for name in HOME.slots {
        if *name != "categoryFilters" && *name != "projectsGrid" {
            assert_eq!(doc.html(name), before.html(name), "slot {} changed", name);
        }
    }
}

#[test]
fn unknown_category_shows_empty_message() {
    let site = fixture();
    let options = options();
    let state = page_state(&site, &options, Language::En);
    let mut doc = Document::new(&HOME);
    let mut project_filter = render_home(&mut doc, &state, &ContactFormView::fresh());

    apply_filter(&mut doc, &state, &mut project_filter, "Games");
    assert!(slot(&doc, "projectsGrid").contains("No projects found in this category."));
    assert_eq!(count(slot(&doc, "categoryFilters"), "filter-btn active"), 0);
    assert!(!project_filter.is_known("Games"));
}

#[test]
fn cards_collapse_extra_tools_and_use_placeholder() {
    let site = fixture();
    let options = options();
    let mut doc = Document::new(&HOME);
    render_home(&mut doc, &page_state(&site, &options, Language::En), &ContactFormView::fresh());
    let grid = slot(&doc, "projectsGrid");

    assert!(grid.contains(">RU</div>"));
    assert!(grid.contains(">RO</div>"));
    assert!(grid.contains(">+1</div>"));
    assert!(!grid.contains(">SQ</div>"));
    // Project 3 has no images
    assert!(grid.contains("src=\"/assets/img/placeholder.svg\" class=\"project-image\" alt=\"Personal Blog\""));
    assert!(grid.contains("href=\"/project?id=3\""));
}

#[test]
fn card_text_is_escaped() {
    let mut site = fixture();
    site.projects[0]
        .title
        .0
        .insert("en".to_string(), "<b>Bold</b>".to_string());
    let options = options();
    let mut doc = Document::new(&HOME);
    render_home(&mut doc, &page_state(&site, &options, Language::En), &ContactFormView::fresh());
    let grid = slot(&doc, "projectsGrid");
    assert!(grid.contains("&lt;b&gt;Bold&lt;/b&gt;"));
    assert!(!grid.contains("<b>Bold</b>"));
}

// ═══════════════════════════════════════════════════════════
// Related projects and carousels
// ═══════════════════════════════════════════════════════════

#[test]
fn related_backfills_from_other_categories() {
    let site = fixture();
    let current = site.find_project(1).unwrap();
    let ids: Vec<i64> = related_projects(&site, current, 6).iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![3, 2, 4]);
}

#[test]
fn related_cap_only_applies_when_backfilling() {
    let mut site = fixture();
    let template = site.projects[1].clone();
    site.projects.clear();
    for id in 1..=8 {
        let mut p = template.clone();
        p.id = id;
        p.category = "Mobile".to_string();
        site.projects.push(p);
    }
    let current = site.find_project(1).unwrap().clone();
    assert_eq!(related_projects(&site, &current, 2).len(), 7);

    for p in site.projects.iter_mut().skip(1) {
        p.category = "Other".to_string();
    }
    assert_eq!(related_projects(&site, &current, 5).len(), 5);
    assert_eq!(related_projects(&site, &current, 1).len(), 3);
}

#[test]
fn gallery_has_one_slide_per_image() {
    let site = fixture();
    let options = options();
    let mut doc = Document::new(&DETAIL);
    let outcome = render_detail(&mut doc, &page_state(&site, &options, Language::En), Some(1), DetailView::default());
    assert_eq!(outcome, DetailOutcome::Rendered);

    let gallery = slot(&doc, "projectCarouselContainer");
    assert_eq!(count(gallery, "class=\"carousel-item"), 2);
    assert_eq!(count(gallery, "carousel-item active"), 1);
    assert!(gallery.contains("carousel-indicators"));
    assert!(gallery.contains("data-interval=\"3000\""));
    assert!(gallery.contains("src=\"/assets/img/shop-1.png\""));
}

#[test]
fn gallery_navigation_wraps_and_stops_auto_advance() {
    let site = fixture();
    let options = options();
    let mut doc = Document::new(&DETAIL);
    let view = DetailView {
        slide: Some(1),
        related: None,
    };
    render_detail(&mut doc, &page_state(&site, &options, Language::En), Some(1), view);
    let gallery = slot(&doc, "projectCarouselContainer");

    assert!(!gallery.contains("data-interval"));
    // From the last slide, "next" wraps to the first
    assert!(gallery.contains(
        "class=\"carousel-control-next\" href=\"/project?id=1&amp;slide=0\""
    ));
    assert!(gallery.contains("<div class=\"carousel-item active\"><img src=\"/assets/img/shop-2.png\""));
}

#[test]
fn single_image_gallery_has_no_controls() {
    let site = fixture();
    let options = options();
    let mut doc = Document::new(&DETAIL);
    render_detail(&mut doc, &page_state(&site, &options, Language::En), Some(2), DetailView::default());
    let gallery = slot(&doc, "projectCarouselContainer");

    assert_eq!(count(gallery, "class=\"carousel-item"), 1);
    assert!(!gallery.contains("carousel-indicators"));
    assert!(!gallery.contains("carousel-control-next"));
    assert!(!gallery.contains("data-interval"));
}

#[test]
fn gallery_without_images_shows_message() {
    let site = fixture();
    let options = options();
    let mut doc = Document::new(&DETAIL);
    render_detail(&mut doc, &page_state(&site, &options, Language::En), Some(3), DetailView::default());
    assert!(slot(&doc, "projectCarouselContainer").contains("No images available for this project."));
}

#[test]
fn related_carousel_pads_to_three_cards() {
    let mut site = fixture();
    site.projects.truncate(2);
    let options = options();
    let mut doc = Document::new(&DETAIL);
    render_detail(&mut doc, &page_state(&site, &options, Language::En), Some(1), DetailView::default());
    let related = slot(&doc, "relatedProjectsInner");

    assert_eq!(count(related, "class=\"related-project-card\""), 3);
    assert_eq!(count(related, "href=\"/project?id=2\""), 3);
    assert!(!related.contains("carousel-control-next"));
}

#[test]
fn related_carousel_pages_by_three() {
    let mut site = fixture();
    let template = site.projects[3].clone();
    for id in 5..=8 {
        let mut p = template.clone();
        p.id = id;
        site.projects.push(p);
    }
    let options = options();
    let mut doc = Document::new(&DETAIL);
    // Project 4 has four Design siblings: 5..=8
    render_detail(&mut doc, &page_state(&site, &options, Language::En), Some(4), DetailView::default());
    let related = slot(&doc, "relatedProjectsInner");

    assert_eq!(count(related, "class=\"carousel-item"), 2);
    assert!(related.contains("carousel-control-next"));
    assert!(!related.contains("data-interval"));
}

#[test]
fn only_project_has_no_related() {
    let mut site = fixture();
    site.projects.truncate(1);
    let options = options();
    let mut doc = Document::new(&DETAIL);
    render_detail(&mut doc, &page_state(&site, &options, Language::En), Some(1), DetailView::default());
    assert!(slot(&doc, "relatedProjectsInner").contains("No related projects."));
}

// ═══════════════════════════════════════════════════════════
// Detail page
// ═══════════════════════════════════════════════════════════

#[test]
fn detail_fills_header_and_overview() {
    let site = fixture();
    let options = options();
    let mut doc = Document::new(&DETAIL);
    render_detail(&mut doc, &page_state(&site, &options, Language::En), Some(1), DetailView::default());

    assert_eq!(slot(&doc, "pageTitle"), "Online Store - Deva");
    assert_eq!(slot(&doc, "projectTitle"), "Online Store");
    assert_eq!(slot(&doc, "breadcrumbCurrent"), "Online Store");
    assert_eq!(slot(&doc, "projectCategory"), "Web");
    assert_eq!(slot(&doc, "projectProblem"), "Manual sales");
    assert_eq!(slot(&doc, "projectStatus"), "Completed");
    assert_eq!(count(slot(&doc, "projectTools"), "tool-item"), 4);
    assert_eq!(slot(&doc, "projectHeader"), "");
    assert!(slot(&doc, "navMenu").contains("href=\"/\">Home</a>"));
    assert!(slot(&doc, "navMenu").contains("href=\"/#projects\">Projects</a>"));
}

#[test]
fn detail_unknown_id_renders_not_found() {
    let site = fixture();
    let options = options();
    for id in [Some(99), None] {
        let mut doc = Document::new(&DETAIL);
        // Stale content from an earlier render must go
        render_detail(&mut doc, &page_state(&site, &options, Language::En), Some(1), DetailView::default());
        let outcome = render_detail(&mut doc, &page_state(&site, &options, Language::En), id, DetailView::default());

        assert_eq!(outcome, DetailOutcome::NotFound);
        assert!(slot(&doc, "projectHeader").contains("Project Not Found"));
        assert!(slot(&doc, "projectHeader").contains("href=\"/#projects\""));
        assert_eq!(slot(&doc, "projectTitle"), "");
        assert_eq!(slot(&doc, "relatedProjectsInner"), "");
    }
}

// ═══════════════════════════════════════════════════════════
// Data loader
// ═══════════════════════════════════════════════════════════

#[rocket::async_test]
async fn file_source_loads_and_validates() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.json");
    std::fs::write(&path, FIXTURE).unwrap();

    let site = DataSource::File(path).load().await.unwrap();
    assert_eq!(site.projects.len(), 4);

    let issues = loader::validate(&site);
    assert_eq!(issues, vec![DataIssue::NoImages(3)]);
}

#[rocket::async_test]
async fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = DataSource::File(dir.path().join("absent.json")).load().await;
    assert!(matches!(result, Err(LoadError::Io { .. })));
}

#[test]
fn malformed_json_is_a_parse_error() {
    assert!(matches!(loader::parse("{\"projects\": ["), Err(LoadError::Parse(_))));
}

#[test]
fn validate_reports_duplicates_and_missing_translations() {
    let mut site = fixture();
    let mut dup = site.projects[0].clone();
    dup.title.0.remove("en");
    site.projects.push(dup);
    site.texts.remove("en");

    let issues = loader::validate(&site);
    assert!(issues.contains(&DataIssue::MissingBundle(Language::En)));
    assert!(issues.contains(&DataIssue::DuplicateId(1)));
    assert!(issues.contains(&DataIssue::MissingTranslation {
        id: 1,
        lang: Language::En,
        field: "title"
    }));
}

#[test]
fn cache_buster_appends_token() {
    assert_eq!(
        loader::with_cache_buster("https://cdn.example/data.json", 42),
        "https://cdn.example/data.json?r=42"
    );
    assert_eq!(
        loader::with_cache_buster("https://cdn.example/data.json?v=2", 42),
        "https://cdn.example/data.json?v=2&r=42"
    );
}

#[test]
fn data_source_from_settings() {
    let settings = Settings::from_map(HashMap::from([(
        "data_source".to_string(),
        "https://cdn.example/data.json".to_string(),
    )]));
    assert!(matches!(DataSource::from_settings(&settings), DataSource::Url { cache_bust: false, .. }));

    let settings = Settings::from_map(HashMap::new());
    assert_eq!(
        DataSource::from_settings(&settings).path(),
        Some(Path::new("website/static/data/data.json"))
    );
}

#[test]
fn write_file_replaces_contents() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.json");
    std::fs::write(&path, "{}").unwrap();

    loader::write_file(&path, &fixture()).unwrap();
    let reloaded = loader::load_file(&path).unwrap();
    assert_eq!(reloaded.projects.len(), 4);

    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name() != "data.json")
        .collect();
    assert!(leftovers.is_empty());
}

// ═══════════════════════════════════════════════════════════
// Server fixtures
// ═══════════════════════════════════════════════════════════

struct RecordingRelay {
    calls: Mutex<Vec<ContactMessage>>,
    reply: RelayReply,
}

impl RecordingRelay {
    fn answering(status: u16, body: Value) -> Arc<Self> {
        Arc::new(RecordingRelay {
            calls: Mutex::new(Vec::new()),
            reply: RelayReply { status, body },
        })
    }

    fn calls(&self) -> Vec<ContactMessage> {
        self.calls.lock().unwrap().clone()
    }
}

#[rocket::async_trait]
impl Relay for RecordingRelay {
    async fn submit(&self, message: &ContactMessage) -> Result<RelayReply, RelayError> {
        self.calls.lock().unwrap().push(message.clone());
        Ok(self.reply.clone())
    }
}

struct RecordingMailer {
    sent: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl RecordingMailer {
    fn new(fail: bool) -> Arc<Self> {
        Arc::new(RecordingMailer {
            sent: Mutex::new(Vec::new()),
            fail,
        })
    }
}

#[rocket::async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, subject: &str, html_body: &str) -> Result<(), String> {
        if self.fail {
            return Err("smtp down".to_string());
        }
        self.sent
            .lock()
            .unwrap()
            .push((subject.to_string(), html_body.to_string()));
        Ok(())
    }
}

struct TestSite {
    client: Client,
    relay: Arc<RecordingRelay>,
    mailer: Arc<RecordingMailer>,
    data_path: std::path::PathBuf,
    _dir: tempfile::TempDir,
}

fn test_site_with(
    overrides: &[(&str, &str)],
    relay: Arc<RecordingRelay>,
    mailer: Arc<RecordingMailer>,
) -> TestSite {
    let dir = tempfile::tempdir().unwrap();
    let data_path = dir.path().join("data.json");
    std::fs::write(&data_path, FIXTURE).unwrap();

    let mut values: HashMap<String, String> = HashMap::from([
        ("data_source".to_string(), data_path.display().to_string()),
        ("site_owner".to_string(), "Deva".to_string()),
        ("relay_rate_limit".to_string(), "100".to_string()),
        ("admin_login_rate_limit".to_string(), "100".to_string()),
    ]);
    for (k, v) in overrides {
        values.insert(k.to_string(), v.to_string());
    }

    let rocket = build_rocket(Settings::from_map(values), relay.clone(), mailer.clone());
    let client = Client::tracked(rocket).expect("valid rocket instance");
    TestSite {
        client,
        relay,
        mailer,
        data_path,
        _dir: dir,
    }
}

fn test_site(overrides: &[(&str, &str)]) -> TestSite {
    test_site_with(
        overrides,
        RecordingRelay::answering(200, json!({"success": true, "message": "Email terkirim!"})),
        RecordingMailer::new(false),
    )
}

fn body_of(response: rocket::local::blocking::LocalResponse<'_>) -> String {
    response.into_string().unwrap_or_default()
}

// ═══════════════════════════════════════════════════════════
// Pages and preferences
// ═══════════════════════════════════════════════════════════

#[test]
fn home_route_uses_default_language_and_theme() {
    let site = test_site(&[]);
    let response = site.client.get("/").dispatch();
    assert_eq!(response.status(), Status::Ok);
    let body = body_of(response);

    assert!(body.contains("Halo, saya Deva"));
    assert!(body.contains("data-theme=\"light\""));
    assert!(body.contains("class=\"fas fa-moon\""));
    assert!(body.contains("<span id=\"langText\">EN</span>"));
    assert_eq!(count(&body, "class=\"project-card\""), 4);
}

#[test]
fn category_query_filters_grid() {
    let site = test_site(&[]);
    let body = body_of(site.client.get("/?category=Web").dispatch());
    assert_eq!(count(&body, "class=\"project-card\""), 2);
    assert!(body.contains("filter-btn active\" data-category=\"Web\""));

    // Unknown categories fall back to "all"
    let body = body_of(site.client.get("/index.html?category=Games").dispatch());
    assert_eq!(count(&body, "class=\"project-card\""), 4);
    assert_eq!(count(&body, "filter-btn active"), 1);
    assert!(body.contains("filter-btn active\" data-category=\"all\""));
}

#[test]
fn language_toggle_keeps_filter_and_persists() {
    let site = test_site(&[]);
    let back = url_encode("/?category=Web");
    let response = site
        .client
        .get(format!("/toggle/language?back={}", back))
        .dispatch();
    assert_eq!(response.status(), Status::SeeOther);
    assert_eq!(response.headers().get_one("Location"), Some("/?category=Web"));
    assert_eq!(
        site.client.cookies().get("language").map(|c| c.value().to_string()),
        Some("en".to_string())
    );

    let body = body_of(site.client.get("/?category=Web").dispatch());
    assert!(body.contains("Hello, I am Deva"));
    assert!(!body.contains("Halo, saya Deva"));
    assert!(body.contains("<span id=\"langText\">ID</span>"));
    assert!(body.contains("filter-btn active\" data-category=\"Web\""));

    // Toggling again returns to Indonesian
    site.client.get("/toggle/language").dispatch();
    let body = body_of(site.client.get("/").dispatch());
    assert!(body.contains("Halo, saya Deva"));
}

#[test]
fn theme_toggle_persists() {
    let site = test_site(&[]);
    let response = site.client.get("/toggle/theme?back=%2Fproject%3Fid%3D1").dispatch();
    assert_eq!(response.headers().get_one("Location"), Some("/project?id=1"));

    let body = body_of(site.client.get("/project?id=1").dispatch());
    assert!(body.contains("data-theme=\"dark\""));
    assert!(body.contains("class=\"fas fa-sun\""));
}

#[test]
fn toggle_refuses_offsite_redirects() {
    let site = test_site(&[]);
    for back in ["%2F%2Fevil.example", "https%3A%2F%2Fevil.example"] {
        let response = site
            .client
            .get(format!("/toggle/theme?back={}", back))
            .dispatch();
        assert_eq!(response.headers().get_one("Location"), Some("/"));
    }
}

#[test]
fn detail_route_end_to_end() {
    let site = test_site(&[]);

    let response = site.client.get("/project?id=1").dispatch();
    assert_eq!(response.status(), Status::Ok);
    let body = body_of(response);
    assert!(body.contains("Toko Online"));
    assert!(body.contains("id=\"relatedProjectsInner\""));
    assert!(body.contains("href=\"/project?id=2\""));

    let response = site.client.get("/detail-project.html?id=2").dispatch();
    assert_eq!(response.status(), Status::Ok);
    assert!(body_of(response).contains("Aplikasi Kasir"));

    for uri in ["/project?id=99", "/project?id=abc", "/project"] {
        let response = site.client.get(uri).dispatch();
        assert_eq!(response.status(), Status::NotFound, "{}", uri);
        let body = body_of(response);
        assert!(body.contains("Proyek Tidak Ditemukan"));
        assert!(!body.contains("id=\"relatedProjectsInner\""));
    }
}

#[test]
fn load_failure_shows_error_panel() {
    let site = test_site(&[("data_source", "/nonexistent/portfolio/data.json")]);

    let response = site.client.get("/").dispatch();
    assert_eq!(response.status(), Status::ServiceUnavailable);
    assert!(body_of(response).contains("Gagal memuat data. Silakan refresh halaman."));

    let response = site.client.get("/project?id=1").dispatch();
    assert_eq!(response.status(), Status::ServiceUnavailable);
    assert!(body_of(response).contains("Gagal memuat data. Silakan refresh halaman."));
}

#[test]
fn projects_fragment_endpoint() {
    let site = test_site(&[]);
    let response = site.client.get("/api/projects?category=Mobile&lang=en").dispatch();
    assert_eq!(response.status(), Status::Ok);
    let body: Value = response.into_json().unwrap();
    assert_eq!(body["category"], "Mobile");
    assert_eq!(body["count"], 1);
    assert!(body["html"].as_str().unwrap().contains("Cashier App"));

    let body: Value = site
        .client
        .get("/api/projects?category=Games")
        .dispatch()
        .into_json()
        .unwrap();
    assert_eq!(body["category"], "all");
    assert_eq!(body["count"], 4);
    assert!(body["html"].as_str().unwrap().contains("Toko Online"));
}

#[test]
fn static_assets_are_served() {
    let site = test_site(&[]);
    let response = site.client.get("/assets/img/placeholder.svg").dispatch();
    assert_eq!(response.status(), Status::Ok);
}

#[test]
fn site_script_filters_through_fragment_endpoint() {
    let site = test_site(&[]);
    let response = site.client.get("/assets/js/site.js").dispatch();
    assert_eq!(response.status(), Status::Ok);
    let script = body_of(response);
    assert!(script.contains("/api/projects?category="));
    assert!(script.contains("getElementById('projectsGrid')"));
}

// ═══════════════════════════════════════════════════════════
// Contact form (relay client)
// ═══════════════════════════════════════════════════════════

fn contact_body(id: &str) -> String {
    format!(
        "name={}&email={}&message={}&submission_id={}",
        url_encode("Budi Santoso"),
        url_encode("budi@example.com"),
        url_encode("Halo, mau kerja sama"),
        id
    )
}

#[test]
fn contact_posts_once_and_clears_on_success() {
    let site = test_site(&[]);
    let response = site
        .client
        .post("/contact")
        .header(ContentType::Form)
        .body(contact_body("sub-1"))
        .dispatch();
    assert_eq!(response.status(), Status::Ok);
    let body = body_of(response);

    assert_eq!(
        site.relay.calls(),
        vec![ContactMessage {
            name: "Budi Santoso".to_string(),
            email: "budi@example.com".to_string(),
            message: "Halo, mau kerja sama".to_string(),
        }]
    );
    assert!(body.contains("contact-flash-success"));
    assert!(body.contains("Pesan berhasil dikirim!"));
    assert!(!body.contains("value=\"Budi Santoso\""));
    assert!(body.contains("data-disable-on-submit"));
}

#[test]
fn contact_failure_keeps_fields() {
    let site = test_site_with(
        &[],
        RecordingRelay::answering(500, json!({"error": "Gagal mengirim email"})),
        RecordingMailer::new(false),
    );
    let body = body_of(
        site.client
            .post("/contact")
            .header(ContentType::Form)
            .body(contact_body("sub-2"))
            .dispatch(),
    );

    assert_eq!(site.relay.calls().len(), 1);
    assert!(body.contains("contact-flash-error"));
    assert!(body.contains("Gagal mengirim pesan."));
    assert!(body.contains("value=\"Budi Santoso\""));
    assert!(body.contains("value=\"budi@example.com\""));
    assert!(body.contains(">Halo, mau kerja sama</textarea>"));
    assert!(body.contains("value=\"sub-2\""));
}

#[test]
fn success_flag_is_required() {
    let site = test_site_with(
        &[],
        RecordingRelay::answering(200, json!({"success": false})),
        RecordingMailer::new(false),
    );
    let body = body_of(
        site.client
            .post("/contact")
            .header(ContentType::Form)
            .body(contact_body("sub-3"))
            .dispatch(),
    );
    assert!(body.contains("contact-flash-error"));
}

#[test]
fn resubmitted_form_is_not_forwarded_twice() {
    let site = test_site(&[]);
    for _ in 0..2 {
        let body = body_of(
            site.client
                .post("/contact")
                .header(ContentType::Form)
                .body(contact_body("same-id"))
                .dispatch(),
        );
        assert!(body.contains("contact-flash-success"));
    }
    assert_eq!(site.relay.calls().len(), 1);
}

#[test]
fn failed_submission_can_be_retried() {
    let site = test_site_with(
        &[],
        RecordingRelay::answering(502, Value::Null),
        RecordingMailer::new(false),
    );
    for _ in 0..2 {
        site.client
            .post("/contact")
            .header(ContentType::Form)
            .body(contact_body("retry-id"))
            .dispatch();
    }
    assert_eq!(site.relay.calls().len(), 2);
}

#[test]
fn incomplete_contact_form_is_not_forwarded() {
    let site = test_site(&[]);
    let body = body_of(
        site.client
            .post("/contact")
            .header(ContentType::Form)
            .body("name=Budi&email=&message=hi&submission_id=x")
            .dispatch(),
    );
    assert!(site.relay.calls().is_empty());
    assert!(body.contains("contact-flash-error"));
}

fn contact_from(site: &TestSite, ip: &str, id: &str) -> String {
    body_of(
        site.client
            .post("/contact")
            .header(ContentType::Form)
            .header(Header::new("X-Real-IP", ip.to_string()))
            .body(contact_body(id))
            .dispatch(),
    )
}

#[test]
fn contact_limit_is_per_visitor() {
    let site = test_site(&[("relay_rate_limit", "1")]);

    assert!(contact_from(&site, "203.0.113.1", "v1-a").contains("contact-flash-success"));
    // A second visitor is not affected by the first one's quota
    assert!(contact_from(&site, "203.0.113.2", "v2-a").contains("contact-flash-success"));

    let body = contact_from(&site, "203.0.113.1", "v1-b");
    assert!(body.contains("contact-flash-error"));
    assert!(body.contains("value=\"Budi Santoso\""));
    assert_eq!(site.relay.calls().len(), 2);

    // The refused id was released, not recorded as delivered
    assert!(contact_from(&site, "203.0.113.3", "v1-b").contains("contact-flash-success"));
    assert_eq!(site.relay.calls().len(), 3);
}

#[test]
fn in_flight_resubmission_is_not_reported_as_sent() {
    let site = test_site(&[]);
    let ledger = site.client.rocket().state::<SubmissionLedger>().unwrap();
    ledger.begin("busy-id");

    let body = body_of(
        site.client
            .post("/contact")
            .header(ContentType::Form)
            .body(contact_body("busy-id"))
            .dispatch(),
    );
    assert!(site.relay.calls().is_empty());
    assert!(!body.contains("contact-flash-success"));
    assert!(body.contains("contact-flash-pending"));
    assert!(body.contains("Pesan Anda masih dikirim."));
    assert!(body.contains("value=\"Budi Santoso\""));
    assert!(body.contains("value=\"busy-id\""));
}

// ═══════════════════════════════════════════════════════════
// Relay endpoint
// ═══════════════════════════════════════════════════════════

fn send_email(client: &Client, body: &str) -> (Status, Value) {
    let response = client
        .post("/api/send-email")
        .header(ContentType::JSON)
        .body(body.to_string())
        .dispatch();
    let status = response.status();
    (status, response.into_json().unwrap_or(Value::Null))
}

#[test]
fn relay_endpoint_sends_email() {
    let site = test_site(&[]);
    let (status, body) = send_email(
        &site.client,
        r#"{"name":"Budi","email":"budi@example.com","message":"Line one\n<b>two</b>"}"#,
    );
    assert_eq!(status, Status::Ok);
    assert_eq!(body, json!({"success": true, "message": "Email terkirim!"}));

    let sent = site.mailer.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "Pesan Baru dari Budi");
    assert!(sent[0].1.contains("<h4>Email: budi@example.com</h4>"));
    assert!(sent[0].1.contains("Line one<br>&lt;b&gt;two&lt;/b&gt;"));
}

#[test]
fn relay_endpoint_rejects_missing_fields() {
    let site = test_site(&[]);
    for payload in [
        r#"{"name":"Budi","email":"","message":"hi"}"#,
        r#"{"name":"Budi","message":"hi"}"#,
        r#"{"name":"   ","email":"a@b.c","message":"hi"}"#,
        r#"{}"#,
    ] {
        let (status, body) = send_email(&site.client, payload);
        assert_eq!(status, Status::BadRequest, "{}", payload);
        assert_eq!(body, json!({"error": "Missing fields"}));
    }
    assert!(site.mailer.sent.lock().unwrap().is_empty());
}

#[test]
fn relay_endpoint_rejects_malformed_json() {
    let site = test_site(&[]);
    let (status, body) = send_email(&site.client, "{name: nope");
    assert_eq!(status, Status::BadRequest);
    assert!(body.get("error").is_some());
}

#[test]
fn relay_endpoint_reports_transport_failure() {
    let site = test_site_with(
        &[],
        RecordingRelay::answering(200, json!({"success": true})),
        RecordingMailer::new(true),
    );
    let (status, body) = send_email(&site.client, r#"{"name":"A","email":"a@b.c","message":"hi"}"#);
    assert_eq!(status, Status::InternalServerError);
    assert_eq!(body, json!({"error": "Gagal mengirim email"}));
}

#[test]
fn relay_endpoint_only_accepts_post() {
    let site = test_site(&[]);
    let responses = [
        site.client.get("/api/send-email").dispatch(),
        site.client.put("/api/send-email").dispatch(),
        site.client.patch("/api/send-email").dispatch(),
        site.client.delete("/api/send-email").dispatch(),
    ];
    for response in responses {
        assert_eq!(response.status(), Status::MethodNotAllowed);
        let body: Value = response.into_json().unwrap();
        assert_eq!(body, json!({"error": "Method not allowed"}));
    }
}

#[test]
fn relay_endpoint_is_rate_limited() {
    let site = test_site(&[("relay_rate_limit", "2")]);
    let payload = r#"{"name":"A","email":"a@b.c","message":"hi"}"#;
    assert_eq!(send_email(&site.client, payload).0, Status::Ok);
    assert_eq!(send_email(&site.client, payload).0, Status::Ok);
    assert_eq!(send_email(&site.client, payload).0, Status::TooManyRequests);
}

#[test]
fn own_relay_client_bypasses_endpoint_limit() {
    let site = test_site(&[("relay_rate_limit", "1"), ("relay_token", "tok-123")]);
    let payload = r#"{"name":"A","email":"a@b.c","message":"hi"}"#;
    let relayed = |token: &str| {
        site.client
            .post("/api/send-email")
            .header(ContentType::JSON)
            .header(Header::new("X-Relay-Token", token.to_string()))
            .body(payload)
            .dispatch()
            .status()
    };

    for _ in 0..3 {
        assert_eq!(relayed("tok-123"), Status::Ok);
    }
    assert_eq!(site.mailer.sent.lock().unwrap().len(), 3);

    // Trusted calls do not use up the shared bucket; a wrong token does
    assert_eq!(relayed("nope"), Status::Ok);
    assert_eq!(relayed("nope"), Status::TooManyRequests);
    assert_eq!(send_email(&site.client, payload).0, Status::TooManyRequests);
}

// ═══════════════════════════════════════════════════════════
// Admin data editor
// ═══════════════════════════════════════════════════════════

#[test]
fn admin_is_hidden_without_token() {
    let site = test_site(&[]);
    assert_eq!(site.client.get("/admin").dispatch().status(), Status::NotFound);
    assert_eq!(site.client.get("/admin/login").dispatch().status(), Status::NotFound);
}

#[test]
fn admin_login_and_save() {
    let site = test_site(&[("admin_token", "s3cret")]);

    let response = site.client.get("/admin").dispatch();
    assert_eq!(response.status(), Status::SeeOther);
    assert_eq!(response.headers().get_one("Location"), Some("/admin/login"));

    let response = site
        .client
        .post("/admin/login")
        .header(ContentType::Form)
        .body("token=wrong")
        .dispatch();
    assert_eq!(response.status(), Status::Unauthorized);

    let response = site
        .client
        .post("/admin/login")
        .header(ContentType::Form)
        .body("token=s3cret")
        .dispatch();
    assert_eq!(response.status(), Status::SeeOther);

    let response = site.client.get("/admin").dispatch();
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(
        response.headers().get_one("Cache-Control"),
        Some("no-store, no-cache, must-revalidate, max-age=0")
    );
    let body = body_of(response);
    assert!(body.contains("<textarea name=\"data\""));
    assert!(body.contains("Toko Online"));
    assert!(body.contains("project 3 has no images"));

    // Broken JSON is refused and the file is untouched
    let response = site
        .client
        .post("/admin/save")
        .header(ContentType::Form)
        .body(format!("data={}", url_encode("{\"projects\": [")))
        .dispatch();
    assert_eq!(response.status(), Status::UnprocessableEntity);
    assert_eq!(loader::load_file(&site.data_path).unwrap().projects.len(), 4);

    let mut edited = fixture();
    edited.projects.truncate(1);
    let json = serde_json::to_string(&edited).unwrap();
    let response = site
        .client
        .post("/admin/save")
        .header(ContentType::Form)
        .body(format!("data={}", url_encode(&json)))
        .dispatch();
    assert_eq!(response.status(), Status::SeeOther);
    assert_eq!(loader::load_file(&site.data_path).unwrap().projects.len(), 1);

    // The public site picks up the change on the next request
    let body = body_of(site.client.get("/").dispatch());
    assert_eq!(count(&body, "class=\"project-card\""), 1);

    site.client.get("/admin/logout").dispatch();
    assert_eq!(site.client.get("/admin").dispatch().status(), Status::SeeOther);
}

#[test]
fn admin_login_is_rate_limited() {
    let site = test_site(&[("admin_token", "s3cret"), ("admin_login_rate_limit", "1")]);
    let attempt = |token: &str| {
        site.client
            .post("/admin/login")
            .header(ContentType::Form)
            .body(format!("token={}", token))
            .dispatch()
            .status()
    };
    assert_eq!(attempt("wrong"), Status::Unauthorized);
    assert_eq!(attempt("s3cret"), Status::TooManyRequests);
}

// ═══════════════════════════════════════════════════════════
// Boot check
// ═══════════════════════════════════════════════════════════

#[test]
fn boot_check_creates_directories_and_flags_missing_templates() {
    let dir = tempfile::tempdir().unwrap();
    let (warnings, errors) = crate::boot::check(dir.path());
    assert!(dir.path().join("website/templates/admin").is_dir());
    assert!(dir.path().join("website/static/data").is_dir());
    assert_eq!(errors, 5);
    assert!(warnings >= 3);
}

#[test]
fn boot_check_passes_on_repository_layout() {
    let (_, errors) = crate::boot::check(Path::new("."));
    assert_eq!(errors, 0);
}
