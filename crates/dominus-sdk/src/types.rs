//! Wire Types
//!
//! DTOs for the token endpoint, userinfo, paged resource listings and the
//! application configuration document.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Response from `POST /connect/token`
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub expires_in: i64,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// Profile object from `GET /connect/userinfo`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(rename = "sub")]
    pub id: String,
    #[serde(default, rename = "preferred_username")]
    pub user_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, rename = "tenantid")]
    pub tenant_id: Option<String>,
    // The role claim is a bare string for single-role users.
    #[serde(default, deserialize_with = "string_or_seq")]
    pub role: Vec<String>,
}

fn string_or_seq<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrSeq {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<StringOrSeq>::deserialize(deserializer)? {
        Some(StringOrSeq::One(role)) => vec![role],
        Some(StringOrSeq::Many(roles)) => roles,
        None => vec![],
    })
}

/// Paged listing envelope returned by `/api/app/{resource}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub total_count: i64,
}

/// Query parameters for listing a resource
#[derive(Debug, Clone, Default)]
pub struct ListParams {
    pub filter: Option<String>,
    pub skip_count: Option<u32>,
    pub max_result_count: Option<u32>,
}

impl ListParams {
    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn skip(mut self, count: u32) -> Self {
        self.skip_count = Some(count);
        self
    }

    pub fn take(mut self, count: u32) -> Self {
        self.max_result_count = Some(count);
        self
    }

    pub(crate) fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(filter) = &self.filter {
            query.push(("filter", filter.clone()));
        }
        if let Some(skip) = self.skip_count {
            query.push(("skipCount", skip.to_string()));
        }
        if let Some(max) = self.max_result_count {
            query.push(("maxResultCount", max.to_string()));
        }
        query
    }
}

/// `GET /api/abp/application-configuration`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationConfiguration {
    pub current_user: CurrentUser,
    pub current_tenant: CurrentTenant,
    #[serde(default)]
    pub auth: AuthPolicies,
    #[serde(default)]
    pub localization: Localization,
}

impl ApplicationConfiguration {
    /// Whether the given policy is granted to the current user.
    pub fn has_permission(&self, policy: &str) -> bool {
        self.auth.granted_policies.get(policy).copied().unwrap_or(false)
    }

    /// Look up a localized string, searching a specific resource first and
    /// then all resources. Unknown keys come back verbatim.
    pub fn localize(&self, key: &str, resource: Option<&str>) -> String {
        if let Some(resource) = resource {
            if let Some(value) = self
                .localization
                .values
                .get(resource)
                .and_then(|r| r.get(key))
            {
                return value.clone();
            }
        }

        self.localization
            .values
            .values()
            .find_map(|r| r.get(key))
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub is_authenticated: bool,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentTenant {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub is_available: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthPolicies {
    #[serde(default)]
    pub granted_policies: HashMap<String, bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Localization {
    #[serde(default)]
    pub current_culture: Option<Culture>,
    #[serde(default)]
    pub values: HashMap<String, HashMap<String, String>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Culture {
    pub culture_name: String,
    #[serde(default)]
    pub display_name: Option<String>,
}
