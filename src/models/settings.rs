use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Default site config path, relative to the working directory.
pub const SITE_CONFIG_PATH: &str = "website/site.toml";

const ENV_PREFIX: &str = "PORTFOLIO_";

/// Flat key/value site configuration.
/// Sources, lowest precedence first: built-in defaults, `website/site.toml`,
/// `PORTFOLIO_<KEY>` environment variables, then the Gmail variables used
/// by the mail relay deployment (`MY_GMAIL`, `MY_GMAIL_APP_PASSWORD`).
#[derive(Debug, Clone)]
pub struct Settings {
    values: HashMap<String, String>,
}

fn defaults() -> Vec<(&'static str, &'static str)> {
    vec![
        ("site_owner", "Deva Adzny"),
        ("data_source", "website/static/data/data.json"),
        ("data_cache_bust", "false"),
        ("default_language", "id"),
        ("related_cap", "6"),
        ("gallery_interval_ms", "3000"),
        ("related_interval_ms", "0"),
        ("relay_url", "http://127.0.0.1:8000/api/send-email"),
        ("relay_timeout_secs", "15"),
        ("relay_rate_limit", "5"),
        ("relay_token", ""),
        ("email_chain", "gmail,smtp"),
        ("email_failover_enabled", "false"),
        ("email_gmail_address", ""),
        ("email_gmail_app_password", ""),
        ("email_smtp_host", ""),
        ("email_smtp_port", "587"),
        ("email_smtp_username", ""),
        ("email_smtp_password", ""),
        ("email_from_address", ""),
        ("contact_to", ""),
        ("admin_token", ""),
        ("admin_login_rate_limit", "5"),
    ]
}

impl Settings {
    pub fn from_map(overrides: HashMap<String, String>) -> Self {
        let mut values: HashMap<String, String> = defaults()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        values.extend(overrides);
        Settings { values }
    }

    /// Load defaults + TOML file + environment. A missing file is not an
    /// error; an unparsable one is.
    pub fn load(path: &Path) -> Result<Self, String> {
        let mut file_values = HashMap::new();
        if path.exists() {
            let raw = fs::read_to_string(path)
                .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
            file_values = parse_toml(&raw)?;
        } else {
            log::warn!("{} not found, using built-in defaults", path.display());
        }

        let mut settings = Settings::from_map(file_values);
        settings.apply_env(std::env::vars());
        Ok(settings)
    }

    fn apply_env<I: Iterator<Item = (String, String)>>(&mut self, vars: I) {
        for (key, value) in vars {
            if let Some(name) = key.strip_prefix(ENV_PREFIX) {
                self.set(&name.to_lowercase(), &value);
                continue;
            }
            match key.as_str() {
                "MY_GMAIL" => {
                    self.set("email_gmail_address", &value);
                    if self.get_or("contact_to", "").is_empty() {
                        self.set("contact_to", &value);
                    }
                }
                "MY_GMAIL_APP_PASSWORD" => self.set("email_gmail_app_password", &value),
                _ => {}
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key)
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false)
    }

    pub fn get_u64(&self, key: &str) -> u64 {
        self.get(key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0)
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }

    /// Whole map, for code that takes the provider-style `&HashMap` (mail transports).
    pub fn all(&self) -> &HashMap<String, String> {
        &self.values
    }
}

/// Flatten a TOML document into `key = "value"` pairs. Nested tables become
/// `table_key` (e.g. `[email] gmail_address` → `email_gmail_address`).
fn parse_toml(raw: &str) -> Result<HashMap<String, String>, String> {
    let table: toml::Table = raw.parse().map_err(|e| format!("Invalid site config: {}", e))?;
    let mut out = HashMap::new();
    flatten("", &table, &mut out);
    Ok(out)
}

fn flatten(prefix: &str, table: &toml::Table, out: &mut HashMap<String, String>) {
    for (key, value) in table {
        let full = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}_{}", prefix, key)
        };
        match value {
            toml::Value::Table(inner) => flatten(&full, inner, out),
            toml::Value::String(s) => {
                out.insert(full, s.clone());
            }
            toml::Value::Array(_) => {
                log::warn!("site config: ignoring array value for {}", full);
            }
            other => {
                out.insert(full, other.to_string());
            }
        }
    }
}
