//! Single-flight token refresh
//!
//! Any number of requests may hit a 401 at once; only one refresh call is
//! made. Callers arriving while it runs are queued and resolved, in arrival
//! order, with the outcome of that same call.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tokio::sync::{oneshot, Mutex};
use url::Url;

use crate::error::{extract_message, ClientError, ClientResult};
use crate::notify::{Notice, Notifier};
use crate::session::{SessionStore, TokenPair};

/// Exchanges a refresh token for a new credential pair
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self, refresh_token: &str) -> ClientResult<TokenPair>;
}

/// Calls the API's refresh endpoint: `POST {refreshToken}` -> `{token, refreshToken}`
#[derive(Clone)]
pub struct HttpTokenRefresher {
    http: Client,
    endpoint: Url,
}

impl HttpTokenRefresher {
    pub fn new(http: Client, endpoint: Url) -> Self {
        Self { http, endpoint }
    }
}

#[async_trait]
impl TokenRefresher for HttpTokenRefresher {
    async fn refresh(&self, refresh_token: &str) -> ClientResult<TokenPair> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&json!({ "refreshToken": refresh_token }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::from_status(status, extract_message(&body)));
        }

        response
            .json::<TokenPair>()
            .await
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }
}

type RefreshWaiter = oneshot::Sender<ClientResult<String>>;

enum RefreshState {
    Idle,
    /// The waiter queue only exists while a refresh is running
    Refreshing { waiters: VecDeque<RefreshWaiter> },
}

struct Inner {
    state: Mutex<RefreshState>,
    refresher: Arc<dyn TokenRefresher>,
    session: Arc<dyn SessionStore>,
    notifier: Arc<dyn Notifier>,
}

/// Refresh coordinator scoped to one client instance
#[derive(Clone)]
pub struct RefreshCoordinator {
    inner: Arc<Inner>,
}

impl RefreshCoordinator {
    pub fn new(
        refresher: Arc<dyn TokenRefresher>,
        session: Arc<dyn SessionStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(RefreshState::Idle),
                refresher,
                session,
                notifier,
            }),
        }
    }

    /// Start a refresh, or join the one in flight, and wait for its outcome.
    ///
    /// Returns the new access token. On failure every caller of the cycle
    /// gets [`ClientError::SessionExpired`] carrying the refresher's error,
    /// the session is cleared and a single [`Notice::SessionExpired`] is sent.
    pub async fn refresh_or_wait(&self, refresh_token: String) -> ClientResult<String> {
        let (tx, rx) = oneshot::channel();

        {
            let mut state = self.inner.state.lock().await;
            match &mut *state {
                RefreshState::Refreshing { waiters } => {
                    tracing::debug!(
                        queued = waiters.len() + 1,
                        "Waiting for in-flight token refresh"
                    );
                    waiters.push_back(tx);
                }
                RefreshState::Idle => {
                    *state = RefreshState::Refreshing {
                        waiters: VecDeque::from([tx]),
                    };
                    // Detached so a cancelled leader does not strand the queue
                    let inner = self.inner.clone();
                    tokio::spawn(async move { inner.run(refresh_token).await });
                }
            }
        }

        rx.await.unwrap_or(Err(ClientError::session_expired()))
    }

    pub async fn is_refreshing(&self) -> bool {
        matches!(*self.inner.state.lock().await, RefreshState::Refreshing { .. })
    }

    /// Callers currently waiting on the in-flight refresh, including the leader
    pub async fn pending(&self) -> usize {
        match &*self.inner.state.lock().await {
            RefreshState::Idle => 0,
            RefreshState::Refreshing { waiters } => waiters.len(),
        }
    }
}

impl Inner {
    async fn run(&self, refresh_token: String) {
        tracing::debug!("Refreshing access token");

        // A panicking refresher must still settle the cycle
        let refresher = self.refresher.clone();
        let outcome = tokio::spawn(async move { refresher.refresh(&refresh_token).await })
            .await
            .unwrap_or_else(|err| {
                Err(ClientError::RequestConfig(format!(
                    "refresh task failed: {err}"
                )))
            });

        let result = match outcome {
            Ok(tokens) => {
                self.session.replace(&tokens);
                tracing::info!("Access token refreshed");
                Ok(tokens.token)
            }
            Err(err) => {
                tracing::warn!(error = %err, "Token refresh failed, clearing session");
                self.session.clear();
                self.notifier.notify(Notice::SessionExpired);
                Err(ClientError::refresh_failed(err))
            }
        };

        let waiters = {
            let mut state = self.state.lock().await;
            match std::mem::replace(&mut *state, RefreshState::Idle) {
                RefreshState::Refreshing { waiters } => waiters,
                RefreshState::Idle => VecDeque::new(),
            }
        };

        for waiter in waiters {
            // A dropped receiver is a cancelled caller
            let _ = waiter.send(result.clone());
        }
    }
}
