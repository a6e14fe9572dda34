//! Client side of the contact relay: one JSON POST per submission, plus a
//! ledger that keeps a resubmitted form from being forwarded twice.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl ContactMessage {
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty()
            && !self.email.trim().is_empty()
            && !self.message.trim().is_empty()
    }
}

/// What the relay answered, before deciding success or failure.
#[derive(Debug, Clone, PartialEq)]
pub struct RelayReply {
    pub status: u16,
    pub body: serde_json::Value,
}

impl RelayReply {
    /// Only a 200 carrying `"success": true` counts as delivered.
    pub fn delivered(&self) -> bool {
        self.status == 200 && self.body.get("success").and_then(|v| v.as_bool()) == Some(true)
    }
}

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("relay unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("relay rejected the message (status {0})")]
    Rejected(u16),
}

#[rocket::async_trait]
pub trait Relay: Send + Sync {
    async fn submit(&self, message: &ContactMessage) -> Result<RelayReply, RelayError>;
}

/// Header carrying the shared relay token. The relay endpoint skips its own
/// per-client limit for callers that present it, since `/contact` has
/// already limited the visitor.
pub const RELAY_TOKEN_HEADER: &str = "X-Relay-Token";

/// Forwards to a relay endpoint over HTTP.
pub struct HttpRelay {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
}

impl HttpRelay {
    /// `token` is only attached when `url` points at this machine.
    pub fn new(url: impl Into<String>, timeout: Duration, token: Option<String>) -> Result<Self, RelayError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let url = url.into();
        let token = token.filter(|t| !t.is_empty() && is_loopback_url(&url));
        Ok(HttpRelay { client, url, token })
    }
}

/// True for `http(s)://localhost`, `127.0.0.0/8` and `[::1]` targets.
pub fn is_loopback_url(raw: &str) -> bool {
    match url::Url::parse(raw) {
        Ok(parsed) => match parsed.host() {
            Some(url::Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
            Some(url::Host::Ipv4(ip)) => ip.is_loopback(),
            Some(url::Host::Ipv6(ip)) => ip.is_loopback(),
            None => false,
        },
        Err(_) => false,
    }
}

#[rocket::async_trait]
impl Relay for HttpRelay {
    async fn submit(&self, message: &ContactMessage) -> Result<RelayReply, RelayError> {
        let mut request = self.client.post(&self.url).json(message);
        if let Some(token) = &self.token {
            request = request.header(RELAY_TOKEN_HEADER, token);
        }
        let response = request.send().await?;
        let status = response.status().as_u16();
        // Non-JSON replies still carry a status worth reporting
        let body = response.json().await.unwrap_or(serde_json::Value::Null);
        Ok(RelayReply { status, body })
    }
}

/// Forward one message and collapse every failure mode into `Err`.
pub async fn deliver(relay: &dyn Relay, message: &ContactMessage) -> Result<(), RelayError> {
    let reply = relay.submit(message).await?;
    if reply.delivered() {
        Ok(())
    } else {
        Err(RelayError::Rejected(reply.status))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// Never seen: forward it.
    Fresh,
    /// Currently being forwarded by another request.
    InFlight,
    /// Already delivered.
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Entry {
    InFlight,
    Done,
}

struct LedgerInner {
    entries: HashMap<String, Entry>,
    order: VecDeque<String>,
}

/// Bounded record of submission ids. Oldest ids are forgotten first.
pub struct SubmissionLedger {
    capacity: usize,
    inner: Mutex<LedgerInner>,
}

impl SubmissionLedger {
    pub fn new(capacity: usize) -> Self {
        SubmissionLedger {
            capacity: capacity.max(1),
            inner: Mutex::new(LedgerInner {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    /// Claim `id`. A fresh id is marked in flight before this returns.
    pub fn begin(&self, id: &str) -> Submission {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        match inner.entries.get(id) {
            Some(Entry::InFlight) => return Submission::InFlight,
            Some(Entry::Done) => return Submission::Done,
            None => {}
        }
        while inner.order.len() >= self.capacity {
            match inner.order.pop_front() {
                Some(old) => {
                    inner.entries.remove(&old);
                }
                None => break,
            }
        }
        inner.entries.insert(id.to_string(), Entry::InFlight);
        inner.order.push_back(id.to_string());
        Submission::Fresh
    }

    /// Settle a claimed id. A failure releases it so the visitor can retry.
    pub fn finish(&self, id: &str, delivered: bool) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if delivered {
            if let Some(entry) = inner.entries.get_mut(id) {
                *entry = Entry::Done;
            }
        } else {
            inner.entries.remove(id);
            inner.order.retain(|existing| existing != id);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).entries.len()
    }
}
