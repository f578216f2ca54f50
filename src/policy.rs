// Runtime policy: proxy endpoint, cleanup timeout, per-user denylist

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use url::Url;

/// Cleanup timeout applied when none is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    /// Timeout argument is not a positive integer
    InvalidTimeout(String),

    /// Proxy is not an http/https URL
    InvalidProxyFormat(String),

    /// Denylist entries are purely numeric user identifiers
    InvalidDenylistEntry(String),
}

impl fmt::Display for PolicyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTimeout(raw) => write!(f, "not a positive number of seconds: {}", raw),
            Self::InvalidProxyFormat(raw) => write!(f, "not an http/https proxy URL: {}", raw),
            Self::InvalidDenylistEntry(raw) => write!(f, "not a numeric user id: {}", raw),
        }
    }
}

impl std::error::Error for PolicyError {}

/// The process-wide mutable policy consulted by every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimePolicy {
    /// Proxy for provider and thumbnail traffic; `None` means direct
    pub proxy: Option<String>,
    /// Delay before a delivered file is reclaimed
    pub timeout_secs: u64,
    /// Requesters whose messages are silently ignored
    pub denylist: BTreeSet<String>,
}

impl Default for RuntimePolicy {
    fn default() -> Self {
        Self {
            proxy: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            denylist: BTreeSet::new(),
        }
    }
}

/// Single serializing access point for the runtime policy. Cheap to
/// clone; every clone shares the same state, so an administrative write
/// is visible to requests already in flight at their next read.
#[derive(Debug, Clone, Default)]
pub struct PolicyStore {
    inner: Arc<RwLock<RuntimePolicy>>,
}

impl PolicyStore {
    pub fn new(policy: RuntimePolicy) -> Self {
        Self {
            inner: Arc::new(RwLock::new(policy)),
        }
    }

    pub async fn snapshot(&self) -> RuntimePolicy {
        self.inner.read().await.clone()
    }

    pub async fn proxy(&self) -> Option<String> {
        self.inner.read().await.proxy.clone()
    }

    pub async fn timeout(&self) -> Duration {
        Duration::from_secs(self.inner.read().await.timeout_secs)
    }

    /// Exact string match against the raw requester id, checked before
    /// any network call is made on a request.
    pub async fn is_banned(&self, user_id: &str) -> bool {
        self.inner.read().await.denylist.contains(user_id)
    }

    /// Set or clear the proxy. Empty input clears; non-empty input is
    /// validated as an http/https URL before it is stored.
    pub async fn set_proxy(&self, raw: &str) -> Result<String, PolicyError> {
        let raw = raw.trim();
        if raw.is_empty() {
            self.inner.write().await.proxy = None;
            return Ok("Proxy cleared".to_string());
        }

        validate_proxy(raw)?;
        self.inner.write().await.proxy = Some(raw.to_string());
        Ok(format!("Proxy set to: {}", raw))
    }

    /// Set the cleanup timeout. Empty input resets to the default;
    /// anything else must parse as a strictly positive integer.
    pub async fn set_timeout(&self, raw: &str) -> Result<String, PolicyError> {
        let raw = raw.trim();
        if raw.is_empty() {
            self.inner.write().await.timeout_secs = DEFAULT_TIMEOUT_SECS;
            return Ok(format!(
                "Timeout reset to default ({}s)",
                DEFAULT_TIMEOUT_SECS
            ));
        }

        let secs: u64 = raw
            .parse()
            .map_err(|_| PolicyError::InvalidTimeout(raw.to_string()))?;
        if secs == 0 {
            return Err(PolicyError::InvalidTimeout(raw.to_string()));
        }

        self.inner.write().await.timeout_secs = secs;
        Ok(format!("Timeout set to: {}s", secs))
    }

    /// Add a user to the denylist. Idempotent; always returns the full
    /// current denylist rendering. An empty argument just renders the
    /// list.
    pub async fn ban_user(&self, user_id: &str) -> Result<String, PolicyError> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Ok(render_denylist(&self.inner.read().await.denylist));
        }

        validate_user_id(user_id)?;
        let mut policy = self.inner.write().await;
        let mut msg = if policy.denylist.insert(user_id.to_string()) {
            format!("Added to denylist: {}\n", user_id)
        } else {
            format!("User {} is already denylisted\n", user_id)
        };
        msg.push_str(&render_denylist(&policy.denylist));
        Ok(msg)
    }

    /// Remove a user from the denylist, reporting whether they were on
    /// it.
    pub async fn unban_user(&self, user_id: &str) -> Result<String, PolicyError> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Ok("Provide the user id to remove from the denylist".to_string());
        }

        if self.inner.write().await.denylist.remove(user_id) {
            Ok(format!("Removed from denylist: {}", user_id))
        } else {
            Ok(format!("User {} is not denylisted", user_id))
        }
    }
}

pub(crate) fn validate_proxy(raw: &str) -> Result<(), PolicyError> {
    let url = Url::parse(raw).map_err(|_| PolicyError::InvalidProxyFormat(raw.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(PolicyError::InvalidProxyFormat(raw.to_string()));
    }
    Ok(())
}

pub(crate) fn validate_user_id(id: &str) -> Result<(), PolicyError> {
    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PolicyError::InvalidDenylistEntry(id.to_string()));
    }
    Ok(())
}

fn render_denylist(denylist: &BTreeSet<String>) -> String {
    if denylist.is_empty() {
        "Denylist is empty".to_string()
    } else {
        let ids: Vec<&str> = denylist.iter().map(String::as_str).collect();
        format!("Current denylist: {}", ids.join(", "))
    }
}
