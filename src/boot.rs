use log::{error, info, warn};
use std::fs;
use std::path::Path;
use std::process;

use crate::models::settings::SITE_CONFIG_PATH;

/// Required directories that will be created if missing
const REQUIRED_DIRS: &[&str] = &[
    "website",
    "website/static",
    "website/static/css",
    "website/static/js",
    "website/static/img",
    "website/static/data",
    "website/templates",
    "website/templates/admin",
];

/// Critical template files. Pages cannot render without these
const CRITICAL_TEMPLATES: &[&str] = &[
    "website/templates/base.html.tera",
    "website/templates/home.html.tera",
    "website/templates/detail.html.tera",
    "website/templates/admin/login.html.tera",
    "website/templates/admin/editor.html.tera",
];

/// Static assets the pages link to
const STATIC_ASSETS: &[&str] = &[
    "website/static/css/style.css",
    "website/static/js/site.js",
    "website/static/img/placeholder.svg",
];

const DEFAULT_DATA_FILE: &str = "website/static/data/data.json";

/// Run all boot checks. Call this before Rocket launches.
/// Creates missing directories, warns about missing files, and
/// aborts if critical templates are absent.
pub fn run() {
    info!("Portfolio boot check starting...");

    let (warnings, errors) = check(Path::new("."));

    if errors > 0 {
        error!(
            "Boot check FAILED: {} error(s), {} warning(s). Aborting.",
            errors, warnings
        );
        process::exit(1);
    }

    if warnings > 0 {
        warn!(
            "Boot check passed with {} warning(s). Some features may not work correctly.",
            warnings
        );
    } else {
        info!("Boot check passed. All systems go.");
    }
}

/// Returns `(warnings, errors)` for the site rooted at `root`.
pub fn check(root: &Path) -> (u32, u32) {
    let mut warnings = 0u32;
    let mut errors = 0u32;

    // ── 1. Directories ─────────────────────────────────
    for dir in REQUIRED_DIRS {
        let path = root.join(dir);
        if !path.exists() {
            match fs::create_dir_all(&path) {
                Ok(_) => info!("  Created directory: {}", dir),
                Err(e) => {
                    error!("  FAILED to create directory {}: {}", dir, e);
                    errors += 1;
                }
            }
        }
    }

    // ── 2. Critical templates ──────────────────────────
    for file in CRITICAL_TEMPLATES {
        if !root.join(file).exists() {
            error!("  MISSING critical template: {}", file);
            errors += 1;
        }
    }

    // ── 3. Static assets ───────────────────────────────
    for file in STATIC_ASSETS {
        if !root.join(file).exists() {
            warn!("  Missing static asset: {}", file);
            warnings += 1;
        }
    }

    // ── 4. Default data file ────────────────────────────
    if !root.join(DEFAULT_DATA_FILE).exists() {
        warn!("  {} not found; pages will show the load error panel unless data_source points elsewhere", DEFAULT_DATA_FILE);
        warnings += 1;
    }

    // ── 5. Site config ──────────────────────────────────
    if !root.join(SITE_CONFIG_PATH).exists() {
        warn!("  {} not found, using built-in defaults", SITE_CONFIG_PATH);
        warnings += 1;
    }

    // ── 6. Data directory writable (admin editor) ──────
    let data_dir = root.join("website/static/data");
    if data_dir.exists() {
        let test_file = data_dir.join(".write_test");
        match fs::write(&test_file, "test") {
            Ok(_) => {
                let _ = fs::remove_file(&test_file);
            }
            Err(e) => {
                warn!("  Data directory not writable: {} (admin saves will fail)", e);
                warnings += 1;
            }
        }
    }

    // ── 7. Rocket.toml exists ───────────────────────────
    if !root.join("Rocket.toml").exists() {
        warn!("  Rocket.toml not found, using default config");
        warnings += 1;
    }

    (warnings, errors)
}
