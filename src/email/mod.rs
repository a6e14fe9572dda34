use std::collections::HashMap;

use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::render::html_escape;

/// Outbound mail for the contact relay. Boxed in managed state so tests can
/// swap in a recorder.
#[rocket::async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, subject: &str, html_body: &str) -> Result<(), String>;
}

/// Sends through the provider chain configured in the site settings, always
/// to the operator's own address.
pub struct ConfiguredMailer {
    settings: HashMap<String, String>,
}

impl ConfiguredMailer {
    pub fn new(settings: HashMap<String, String>) -> Self {
        ConfiguredMailer { settings }
    }

    pub fn is_configured(&self) -> bool {
        get_from_email(&self.settings).is_some()
    }
}

#[rocket::async_trait]
impl Mailer for ConfiguredMailer {
    async fn send(&self, subject: &str, html_body: &str) -> Result<(), String> {
        let from = get_from_email(&self.settings)
            .ok_or_else(|| "No email provider configured".to_string())?;
        let to = self
            .settings
            .get("contact_to")
            .cloned()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| from.clone());
        send_via_configured_provider(&self.settings, &from, &to, subject, html_body).await
    }
}

/// Subject and HTML body for a relayed contact message.
pub fn relay_message(name: &str, email: &str, message: &str) -> (String, String) {
    let subject = format!("Pesan Baru dari {}", name);
    let body = format!(
        "<h3>Nama: {}</h3>\n<h4>Email: {}</h4>\n<p>{}</p>",
        html_escape(name),
        html_escape(email),
        html_escape(message).replace('\n', "<br>")
    );
    (subject, body)
}

/// Determine the "from" email address from configured providers.
fn get_from_email(settings: &HashMap<String, String>) -> Option<String> {
    let from_addr = settings.get("email_from_address").cloned().unwrap_or_default();
    if !from_addr.is_empty() {
        return Some(from_addr);
    }

    for provider in provider_chain(settings) {
        let candidate = match provider {
            "gmail" => settings.get("email_gmail_address"),
            "smtp" => settings.get("email_smtp_username"),
            _ => None,
        };
        if let Some(addr) = candidate.filter(|s| !s.is_empty()) {
            return Some(addr.clone());
        }
    }
    None
}

fn provider_chain(settings: &HashMap<String, String>) -> Vec<&str> {
    settings
        .get("email_chain")
        .map(|s| s.as_str())
        .unwrap_or("gmail,smtp")
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Credentials for one SMTP submission endpoint.
#[derive(Debug, Clone, PartialEq)]
struct SmtpAccount {
    host: String,
    port: u16,
    username: String,
    password: String,
}

/// Resolve a chain entry to an SMTP account. Gmail is SMTP with an app
/// password on a fixed host.
fn account_for(provider: &str, settings: &HashMap<String, String>) -> Result<SmtpAccount, String> {
    let sg = |key: &str| settings.get(key).cloned().unwrap_or_default();
    match provider {
        "gmail" => {
            let address = sg("email_gmail_address");
            let app_password = sg("email_gmail_app_password");
            if address.is_empty() || app_password.is_empty() {
                return Err("Gmail address or app password not configured".into());
            }
            Ok(SmtpAccount {
                host: "smtp.gmail.com".into(),
                port: 587,
                username: address,
                password: app_password,
            })
        }
        "smtp" => {
            let host = sg("email_smtp_host");
            let username = sg("email_smtp_username");
            if host.is_empty() || username.is_empty() {
                return Err("SMTP host or username not configured".into());
            }
            Ok(SmtpAccount {
                host,
                port: sg("email_smtp_port").parse().unwrap_or(587),
                username,
                password: sg("email_smtp_password"),
            })
        }
        other => Err(format!("Unknown email provider: {}", other)),
    }
}

/// Send through the first provider in the chain. With failover enabled a
/// failing provider hands over to the next one.
async fn send_via_configured_provider(
    settings: &HashMap<String, String>,
    from: &str,
    to: &str,
    subject: &str,
    body: &str,
) -> Result<(), String> {
    let failover_enabled = settings.get("email_failover_enabled").map(|v| v.as_str()) == Some("true");
    let mut last_error = String::new();

    for provider_name in provider_chain(settings) {
        let result = match account_for(provider_name, settings) {
            Ok(account) => send_smtp(&account, from, to, subject, body).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => return Ok(()),
            Err(e) => {
                log::warn!("Email provider {} failed: {}", provider_name, e);
                last_error = e;
                if !failover_enabled {
                    return Err(last_error);
                }
            }
        }
    }

    if last_error.is_empty() {
        Err("No email provider configured or enabled".into())
    } else {
        Err(format!("All email providers failed. Last error: {}", last_error))
    }
}

async fn send_smtp(
    account: &SmtpAccount,
    from: &str,
    to: &str,
    subject: &str,
    body: &str,
) -> Result<(), String> {
    let email = Message::builder()
        .from(from.parse().map_err(|e| format!("Invalid from address: {}", e))?)
        .to(to.parse().map_err(|e| format!("Invalid to address: {}", e))?)
        .subject(subject)
        .header(ContentType::TEXT_HTML)
        .body(body.to_string())
        .map_err(|e| format!("Failed to build email: {}", e))?;

    let creds = Credentials::new(account.username.clone(), account.password.clone());

    let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&account.host)
        .map_err(|e| format!("SMTP relay error: {}", e))?
        .port(account.port)
        .credentials(creds)
        .build();

    mailer
        .send(email)
        .await
        .map_err(|e| format!("SMTP send error: {}", e))?;
    Ok(())
}
