//! Authenticated API Client
//!
//! Attaches identity, tenant and locale context to every outbound request
//! and recovers from expired-token failures transparently to callers: a 401
//! triggers at most one shared refresh and at most one replay of the
//! original request.

use std::sync::Arc;

use percent_encoding::percent_decode_str;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, error, warn};
use url::Url;

use crate::auth::{AuthEvent, AuthManager};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::resource::ResourceService;
use crate::session::{AuthSession, SessionManager};
use crate::store::{MemoryStore, StateStore, KEY_CULTURE};
use crate::tenant::{TenantContext, TenantResolver};
use crate::types::{ApplicationConfiguration, UserInfo};

/// Tenant marker header understood by the backend
pub const TENANT_HEADER: &str = "__tenant";

/// Anti-forgery header echoed from the XSRF cookie on mutating verbs
pub const CSRF_HEADER: &str = "RequestVerificationToken";

/// Cookie the backend sets with the anti-forgery token
pub const XSRF_COOKIE: &str = "XSRF-TOKEN";

/// Dominus API client
///
/// Cheap to clone; all clones share the session, cookie jar and tenant
/// context.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: reqwest::Client,
    jar: Arc<Jar>,
    base: Url,
    base_url: String,
    default_culture: String,
    store: Arc<dyn StateStore>,
    session: Arc<SessionManager>,
    tenant: TenantContext,
    auth: AuthManager,
}

impl ApiClient {
    /// Create a client with in-memory state.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::with_store(config, Arc::new(MemoryStore::new()))
    }

    /// Create a client backed by the given state store.
    pub fn with_store(config: ClientConfig, store: Arc<dyn StateStore>) -> Result<Self> {
        let base = Url::parse(&config.base_url)?;

        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        let user_agent = format!("dominus-rust/{}", crate::VERSION);
        headers.insert(
            header::USER_AGENT,
            HeaderValue::from_str(&user_agent)
                .map_err(|e| Error::Config(format!("invalid user agent: {e}")))?,
        );

        let jar = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .cookie_provider(jar.clone())
            .timeout(config.timeout)
            .build()?;

        let session = Arc::new(SessionManager::new(store.clone()));

        let resolver = config
            .tenant_domain_format
            .as_deref()
            .map(TenantResolver::new)
            .transpose()?;
        let tenant = TenantContext::new(
            resolver,
            base.host_str().map(str::to_owned),
            store.clone(),
        );

        let auth = AuthManager::new(config.clone(), http.clone(), session.clone());

        Ok(Self {
            inner: Arc::new(ClientInner {
                http,
                jar,
                base,
                base_url: config.base_url,
                default_culture: config.default_culture,
                store,
                session,
                tenant,
                auth,
            }),
        })
    }

    /// The session manager owning the tokens.
    pub fn session(&self) -> &SessionManager {
        &self.inner.session
    }

    /// The tenant context used for the `__tenant` header.
    pub fn tenant(&self) -> &TenantContext {
        &self.inner.tenant
    }

    /// The token lifecycle manager.
    pub fn auth(&self) -> &AuthManager {
        &self.inner.auth
    }

    /// Subscribe to session lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.inner.auth.subscribe()
    }

    /// Persist the preferred culture sent as `Accept-Language`.
    pub fn set_culture(&self, culture: &str) {
        self.inner.store.set(KEY_CULTURE, culture);
    }

    /// Log in with the password grant and hydrate the user profile.
    ///
    /// A userinfo failure after a successful token exchange is logged and
    /// ignored; the session is already established.
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthSession> {
        let tenant = self.inner.tenant.current();
        let session = self.inner.auth.login(username, password, tenant).await?;

        match self.userinfo().await {
            Ok(user) => self.inner.session.set_user(user),
            Err(e) => warn!(error = %e, "userinfo fetch after login failed"),
        }

        Ok(self.inner.session.get().unwrap_or(session))
    }

    /// Clear the session.
    pub fn logout(&self) {
        self.inner.auth.logout();
    }

    /// `GET /connect/userinfo`
    pub async fn userinfo(&self) -> Result<UserInfo> {
        self.get("/connect/userinfo", None).await
    }

    /// `GET /api/abp/application-configuration`
    pub async fn application_configuration(&self) -> Result<ApplicationConfiguration> {
        self.get("/api/abp/application-configuration", None).await
    }

    /// Typed access to a `/api/app/{resource}` collection.
    pub fn resource<T>(&self, name: &str) -> ResourceService<T>
    where
        T: DeserializeOwned + Send + Sync,
    {
        ResourceService::new(self.clone(), name)
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Option<&[(&str, String)]>,
    ) -> Result<T> {
        self.request(Method::GET, path, None::<&()>, query).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + Sync + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.request(Method::POST, path, Some(body), None).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + Sync + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.request(Method::PUT, path, Some(body), None).await
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        self.request::<(), ()>(Method::DELETE, path, None, None).await
    }

    /// Dispatch a request through the full pipeline.
    ///
    /// On a 401 the stored refresh token is exchanged once (shared across
    /// concurrent failures) and the request replayed with the new access
    /// token; a second 401 is surfaced unmodified. A refresh failure is
    /// terminal for the session and propagates without a replay.
    pub async fn request<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        query: Option<&[(&str, String)]>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + Sync + ?Sized,
    {
        let url = self.build_url(path, query)?;
        let token = self.inner.session.access_token();

        let response = self
            .dispatch(method.clone(), url.clone(), body, token.as_deref())
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            debug!(%url, "401 received, attempting token refresh");
            // With no refresh token to exchange, the session is cleared
            // upstream and the server's own 401 payload reaches the caller.
            let fresh = match self.inner.auth.refresh_if_stale(token.as_deref()).await {
                Ok(fresh) => fresh,
                Err(Error::LoginRequired(_)) => return self.read_response(response).await,
                Err(e) => return Err(e),
            };
            let replay = self.dispatch(method, url, body, Some(&fresh)).await?;
            return self.read_response(replay).await;
        }

        self.read_response(response).await
    }

    async fn dispatch<B: Serialize + Sync + ?Sized>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
        token: Option<&str>,
    ) -> Result<reqwest::Response> {
        let mutating = matches!(method.as_str(), "POST" | "PUT" | "PATCH" | "DELETE");
        let mut request = self.inner.http.request(method, url);

        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        if let Some(tenant) = self.inner.tenant.current() {
            request = request.header(TENANT_HEADER, tenant);
        }

        request = request.header(header::ACCEPT_LANGUAGE, self.culture());

        if mutating {
            if let Some(csrf) = self.csrf_token() {
                request = request.header(CSRF_HEADER, csrf);
            }
        }

        if let Some(body) = body {
            request = request.json(body);
        }

        Ok(request.send().await?)
    }

    async fn read_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();

        if status == StatusCode::NO_CONTENT {
            return Ok(serde_json::from_str("null")?);
        }

        let bytes = response.bytes().await?;

        if status.is_success() {
            if bytes.is_empty() {
                return Ok(serde_json::from_str("null")?);
            }
            return Ok(serde_json::from_slice(&bytes)?);
        }

        let api_error = Error::from_response(status.as_u16(), &bytes);

        match status {
            StatusCode::FORBIDDEN => {
                warn!("access forbidden, re-authentication required");
                self.inner.auth.notify_login_required("access forbidden");
            }
            StatusCode::BAD_REQUEST => {
                debug!(error = %api_error, "request rejected as invalid");
            }
            s if s.is_server_error() => {
                error!(status = s.as_u16(), "server error");
            }
            _ => {}
        }

        Err(api_error)
    }

    fn build_url(&self, path: &str, query: Option<&[(&str, String)]>) -> Result<Url> {
        let mut url = Url::parse(&format!("{}{}", self.inner.base_url, path))?;
        if let Some(query) = query {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn culture(&self) -> String {
        self.inner
            .store
            .get(KEY_CULTURE)
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| self.inner.default_culture.clone())
    }

    /// Read the anti-forgery token out of the cookie jar, if the backend
    /// has set one.
    fn csrf_token(&self) -> Option<String> {
        let cookies = self.inner.jar.cookies(&self.inner.base)?;
        let raw = cookies.to_str().ok()?;

        raw.split(';')
            .map(str::trim)
            .find_map(|pair| {
                let (name, value) = pair.split_once('=')?;
                (name == XSRF_COOKIE).then_some(value)
            })
            .and_then(|value| percent_decode_str(value).decode_utf8().ok())
            .map(|value| value.into_owned())
    }
}
