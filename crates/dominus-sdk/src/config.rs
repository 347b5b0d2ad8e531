//! Client Configuration

use std::time::Duration;

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// OAuth client id registered for the portal application
pub const DEFAULT_CLIENT_ID: &str = "Leads_App";

/// Scopes requested on password-grant logins
pub const DEFAULT_SCOPE: &str = "openid profile email offline_access Leads";

/// Configuration for [`ApiClient`](crate::ApiClient)
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the portal backend, without a trailing slash
    pub base_url: String,
    /// OAuth client id sent on token requests
    pub client_id: String,
    /// Scope string for password-grant logins
    pub scope: String,
    /// Tenant domain format with a `{0}` placeholder, e.g.
    /// `{0}.zensuite.com.br`. `None` disables hostname resolution.
    pub tenant_domain_format: Option<String>,
    /// Fallback `Accept-Language` culture
    pub default_culture: String,
    /// Request timeout applied by the underlying transport
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }

        Self {
            base_url,
            client_id: DEFAULT_CLIENT_ID.to_string(),
            scope: DEFAULT_SCOPE.to_string(),
            tenant_domain_format: None,
            default_culture: "en".to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    pub fn with_tenant_domain_format(mut self, format: impl Into<String>) -> Self {
        self.tenant_domain_format = Some(format.into());
        self
    }

    pub fn with_default_culture(mut self, culture: impl Into<String>) -> Self {
        self.default_culture = culture.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed() {
        let config = ClientConfig::new("https://api.example.com/");
        assert_eq!(config.base_url, "https://api.example.com");
    }

    #[test]
    fn builder_overrides_defaults() {
        let config = ClientConfig::new("https://api.example.com")
            .with_client_id("Other_App")
            .with_default_culture("pt-BR");
        assert_eq!(config.client_id, "Other_App");
        assert_eq!(config.default_culture, "pt-BR");
        assert_eq!(config.scope, DEFAULT_SCOPE);
    }
}
