//! Token Lifecycle
//!
//! Password-grant login, refresh-token rotation and logout against the
//! `/connect/token` endpoint, with at-most-one in-flight refresh shared by
//! all pending requests.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::session::{AuthSession, SessionManager};
use crate::types::TokenResponse;

const EVENT_CAPACITY: usize = 16;

/// Session lifecycle notifications.
///
/// `LoginRequired` is the SDK counterpart of the portal's redirect to the
/// login route: the session is gone and the caller owns what happens next.
#[derive(Clone, Debug)]
pub enum AuthEvent {
    LoggedIn,
    LoggedOut,
    TokenRefreshed,
    LoginRequired { reason: String },
}

/// Manages tokens for one client instance.
pub struct AuthManager {
    config: ClientConfig,
    http: reqwest::Client,
    session: Arc<SessionManager>,
    // Serializes refreshes so N concurrent 401s produce one token request.
    refresh_lock: Mutex<()>,
    events: broadcast::Sender<AuthEvent>,
}

impl AuthManager {
    pub(crate) fn new(
        config: ClientConfig,
        http: reqwest::Client,
        session: Arc<SessionManager>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            config,
            http,
            session,
            refresh_lock: Mutex::new(()),
            events,
        }
    }

    /// Subscribe to session lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    /// Exchange credentials for tokens via the password grant.
    ///
    /// The tenant header is attached when one is resolved so the token
    /// endpoint authenticates against the right tenant partition.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        tenant: Option<String>,
    ) -> Result<AuthSession> {
        let form = [
            ("grant_type", "password"),
            ("client_id", self.config.client_id.as_str()),
            ("username", username),
            ("password", password),
            ("scope", self.config.scope.as_str()),
        ];

        let mut request = self.http.post(self.token_url()).form(&form);
        if let Some(tenant) = tenant {
            request = request.header(crate::client::TENANT_HEADER, tenant);
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "login rejected by token endpoint");
            return Err(Error::from_response(status.as_u16(), &bytes));
        }

        let token: TokenResponse = serde_json::from_slice(&bytes)?;
        let session = Self::session_from_token(token);
        self.session.set(session.clone());
        info!(username, "login succeeded");
        self.emit(AuthEvent::LoggedIn);

        Ok(session)
    }

    /// Refresh the session unless another task already did.
    ///
    /// `stale_token` is the access token the caller saw fail. After the lock
    /// is acquired, a current token different from the stale one means the
    /// refresh already happened and is returned without a network call. On
    /// any refresh failure the session is cleared and the failure is
    /// terminal.
    pub async fn refresh_if_stale(&self, stale_token: Option<&str>) -> Result<String> {
        let _guard = self.refresh_lock.lock().await;

        if let Some(current) = self.session.access_token() {
            if stale_token != Some(current.as_str()) {
                debug!("token already refreshed by a concurrent request");
                return Ok(current);
            }
        }

        let Some(refresh_token) = self.session.refresh_token() else {
            warn!("no refresh token available, login required");
            self.session.clear();
            self.emit(AuthEvent::LoginRequired {
                reason: "no refresh token".to_string(),
            });
            return Err(Error::LoginRequired("no refresh token available".to_string()));
        };

        match self.request_refresh(&refresh_token).await {
            Ok(token) => {
                let user = self.session.get().and_then(|s| s.user);
                let mut session = Self::session_from_token(token);
                session.user = user;
                // Both tokens are persisted before any caller can retry.
                self.session.set(session.clone());
                debug!("access token refreshed");
                self.emit(AuthEvent::TokenRefreshed);
                Ok(session.access_token)
            }
            Err(source) => {
                warn!(error = %source, "token refresh failed, clearing session");
                self.session.clear();
                self.emit(AuthEvent::LoginRequired {
                    reason: "token refresh failed".to_string(),
                });
                Err(Error::RefreshFailed {
                    source: Box::new(source),
                })
            }
        }
    }

    /// Destroy the session.
    pub fn logout(&self) {
        self.session.clear();
        info!("logged out");
        self.emit(AuthEvent::LoggedOut);
    }

    pub(crate) fn notify_login_required(&self, reason: &str) {
        self.emit(AuthEvent::LoginRequired {
            reason: reason.to_string(),
        });
    }

    async fn request_refresh(&self, refresh_token: &str) -> Result<TokenResponse> {
        let form = [
            ("grant_type", "refresh_token"),
            ("client_id", self.config.client_id.as_str()),
            ("refresh_token", refresh_token),
        ];

        let response = self.http.post(self.token_url()).form(&form).send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            return Err(Error::from_response(status.as_u16(), &bytes));
        }

        Ok(serde_json::from_slice(&bytes)?)
    }

    fn session_from_token(token: TokenResponse) -> AuthSession {
        AuthSession {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_at: Utc::now() + Duration::seconds(token.expires_in),
            token_type: token.token_type,
            user: None,
        }
    }

    fn token_url(&self) -> String {
        format!("{}/connect/token", self.config.base_url)
    }

    fn emit(&self, event: AuthEvent) {
        let _ = self.events.send(event);
    }
}
