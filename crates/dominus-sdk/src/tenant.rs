//! Tenant Resolution
//!
//! Maps a portal hostname onto a tenant identifier using the configured
//! domain format (e.g. `{0}.zensuite.com.br`), falling back to a persisted
//! override. No match means root/host context and no tenant header is sent.

use std::sync::Arc;

use regex::Regex;
use tracing::debug;

use crate::error::{Error, Result};
use crate::store::{StateStore, KEY_TENANT_ID};

/// Compiled hostname-to-tenant matcher.
pub struct TenantResolver {
    pattern: Regex,
}

impl TenantResolver {
    /// Compile a domain format containing exactly one `{0}` placeholder.
    ///
    /// Literal parts are regex-escaped; the placeholder captures a single
    /// subdomain label (`[a-z0-9-]+`). Matching is case-insensitive and
    /// anchored over the full hostname.
    pub fn new(domain_format: &str) -> Result<Self> {
        if domain_format.matches("{0}").count() != 1 {
            return Err(Error::Config(format!(
                "tenant domain format must contain exactly one {{0}} placeholder: {domain_format:?}"
            )));
        }

        let mut source = String::from("(?i)^");
        for (i, literal) in domain_format.split("{0}").enumerate() {
            if i > 0 {
                source.push_str("([a-z0-9-]+)");
            }
            source.push_str(&regex::escape(literal));
        }
        source.push('$');

        let pattern = Regex::new(&source)
            .map_err(|e| Error::Config(format!("invalid tenant domain format: {e}")))?;

        Ok(Self { pattern })
    }

    /// Extract the tenant segment from a hostname, if it matches.
    pub fn resolve(&self, hostname: &str) -> Option<String> {
        self.pattern
            .captures(hostname)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_ascii_lowercase())
    }
}

/// Per-client tenant context: hostname resolution first, persisted override
/// second. Read-only from the request pipeline's point of view.
pub struct TenantContext {
    resolver: Option<TenantResolver>,
    host: Option<String>,
    store: Arc<dyn StateStore>,
}

impl TenantContext {
    pub fn new(
        resolver: Option<TenantResolver>,
        host: Option<String>,
        store: Arc<dyn StateStore>,
    ) -> Self {
        Self {
            resolver,
            host,
            store,
        }
    }

    /// Tenant identifier for outbound requests, or `None` for host context.
    pub fn current(&self) -> Option<String> {
        if let (Some(resolver), Some(host)) = (&self.resolver, &self.host) {
            if let Some(tenant) = resolver.resolve(host) {
                debug!(%tenant, %host, "tenant resolved from hostname");
                return Some(tenant);
            }
        }

        self.store
            .get(KEY_TENANT_ID)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    }

    /// Persist a tenant override, replacing any previous one.
    pub fn set_override(&self, tenant_id: &str) {
        self.store.set(KEY_TENANT_ID, tenant_id);
    }

    /// Remove the persisted override.
    pub fn clear_override(&self) {
        self.store.remove(KEY_TENANT_ID);
    }
}
