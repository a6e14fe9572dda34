//! Fetches the site data document. One attempt per page request, no retry.

use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rand::Rng;
use thiserror::Error;

use crate::i18n::Language;
use crate::models::settings::Settings;
use crate::models::site_data::SiteData;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("request for site data failed: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("site data request returned HTTP {0}")]
    Status(u16),
    #[error("site data is not valid: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    File(PathBuf),
    Url { url: String, cache_bust: bool },
}

impl DataSource {
    pub fn from_settings(settings: &Settings) -> Self {
        let raw = settings.get_or("data_source", "website/static/data/data.json");
        if raw.starts_with("http://") || raw.starts_with("https://") {
            DataSource::Url {
                url: raw,
                cache_bust: settings.get_bool("data_cache_bust"),
            }
        } else {
            DataSource::File(PathBuf::from(raw))
        }
    }

    /// Only file sources can be rewritten by the admin editor.
    pub fn path(&self) -> Option<&Path> {
        match self {
            DataSource::File(p) => Some(p),
            DataSource::Url { .. } => None,
        }
    }

    pub async fn load(&self) -> Result<SiteData, LoadError> {
        match self {
            DataSource::File(path) => load_file(path),
            DataSource::Url { url, cache_bust } => {
                let target = if *cache_bust {
                    with_cache_buster(url, rand::thread_rng().gen())
                } else {
                    url.clone()
                };
                load_url(&target).await
            }
        }
    }
}

pub fn load_file(path: &Path) -> Result<SiteData, LoadError> {
    let raw = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&raw)
}

pub fn parse(raw: &str) -> Result<SiteData, LoadError> {
    Ok(serde_json::from_str(raw)?)
}

async fn load_url(url: &str) -> Result<SiteData, LoadError> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(LoadError::Status(status.as_u16()));
    }
    let body = response.text().await?;
    parse(&body)
}

/// Append `r=<token>` so intermediaries cannot serve a stale copy.
pub fn with_cache_buster(url: &str, token: u64) -> String {
    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{}{}r={}", url, sep, token)
}

/// Replace the data file contents atomically (temp file + rename).
pub fn write_file(path: &Path, data: &SiteData) -> Result<(), String> {
    let json = serde_json::to_string_pretty(data).map_err(|e| e.to_string())?;
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let tmp = dir.join(format!(
        ".{}.tmp",
        path.file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("data.json")
    ));
    let mut file = fs::File::create(&tmp).map_err(|e| format!("create {}: {}", tmp.display(), e))?;
    file.write_all(json.as_bytes())
        .and_then(|_| file.sync_all())
        .map_err(|e| format!("write {}: {}", tmp.display(), e))?;
    fs::rename(&tmp, path).map_err(|e| format!("rename to {}: {}", path.display(), e))?;
    Ok(())
}

/// Problems worth reporting but not worth refusing the document over.
#[derive(Debug, Clone, PartialEq)]
pub enum DataIssue {
    DuplicateId(i64),
    MissingBundle(Language),
    MissingTranslation { id: i64, lang: Language, field: &'static str },
    NoImages(i64),
}

impl std::fmt::Display for DataIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataIssue::DuplicateId(id) => write!(f, "project id {} is used more than once", id),
            DataIssue::MissingBundle(lang) => write!(f, "no text bundle for '{}'", lang.code()),
            DataIssue::MissingTranslation { id, lang, field } => {
                write!(f, "project {} has no '{}' {}", id, lang.code(), field)
            }
            DataIssue::NoImages(id) => write!(f, "project {} has no images", id),
        }
    }
}

pub fn validate(site: &SiteData) -> Vec<DataIssue> {
    let mut issues = Vec::new();

    for lang in Language::ALL {
        if site.bundle(lang).is_none() {
            issues.push(DataIssue::MissingBundle(lang));
        }
    }

    let mut seen = HashSet::new();
    for project in &site.projects {
        if !seen.insert(project.id) {
            issues.push(DataIssue::DuplicateId(project.id));
        }
        for lang in Language::ALL {
            for field in project.missing_fields(lang) {
                issues.push(DataIssue::MissingTranslation {
                    id: project.id,
                    lang,
                    field,
                });
            }
        }
        if project.images.is_empty() {
            issues.push(DataIssue::NoImages(project.id));
        }
    }

    issues
}
