//! Dominus Rust SDK
//!
//! Async client for the Dominus Leads Platform API: a multi-tenant
//! (ABP-style) portal backend. The SDK owns the authenticated request
//! pipeline — bearer-token attachment, tenant resolution, locale and CSRF
//! forwarding, and transparent refresh-then-retry-once on expired tokens.
//!
//! # Example
//!
//! ```rust,no_run
//! use dominus_sdk::{ApiClient, ClientConfig, ListParams, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = ClientConfig::new("https://acme.zensuite.com.br")
//!         .with_tenant_domain_format("{0}.zensuite.com.br");
//!     let client = ApiClient::new(config)?;
//!
//!     client.login("admin", "secret").await?;
//!
//!     let lawyers = client
//!         .resource::<serde_json::Value>("lawyers")
//!         .list(ListParams::default().filter("silva").take(20))
//!         .await?;
//!     println!("{} of {}", lawyers.items.len(), lawyers.total_count);
//!
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod resource;
pub mod session;
pub mod store;
pub mod tenant;
pub mod types;

pub use auth::{AuthEvent, AuthManager};
pub use client::{ApiClient, CSRF_HEADER, TENANT_HEADER, XSRF_COOKIE};
pub use config::ClientConfig;
pub use error::{Error, Result, ValidationIssue};
pub use resource::ResourceService;
pub use session::{AuthSession, SessionManager};
pub use store::{FileStore, MemoryStore, StateStore};
pub use tenant::{TenantContext, TenantResolver};
pub use types::{
    ApplicationConfiguration, ListParams, PagedResult, TokenResponse, UserInfo,
};

/// SDK version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
