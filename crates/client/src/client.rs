//! Authenticated API client
//!
//! Attaches the current session's credentials to every outbound call and
//! recovers from an expired access token by refreshing once and replaying.

use std::sync::Arc;

use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE},
    Client, Identity, Method, Response, StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::{extract_message, ClientError, ClientResult};
use crate::notify::{Notice, Notifier};
use crate::refresh::{HttpTokenRefresher, RefreshCoordinator, TokenRefresher};
use crate::session::{SessionStore, TokenPair};

/// Secondary header carrying the raw access token
pub const ACCESS_TOKEN_HEADER: &str = "x-access-token";

/// A request that can be sent, and replayed, by [`AuthenticatedClient`]
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn json_value(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn json<B: Serialize + ?Sized>(self, body: &B) -> ClientResult<Self> {
        let value =
            serde_json::to_value(body).map_err(|e| ClientError::RequestConfig(e.to_string()))?;
        Ok(self.json_value(value))
    }
}

/// HTTP client that injects session credentials and refreshes them on 401
#[derive(Clone)]
pub struct AuthenticatedClient {
    http: Client,
    config: Arc<ClientConfig>,
    session: Arc<dyn SessionStore>,
    coordinator: RefreshCoordinator,
    notifier: Arc<dyn Notifier>,
}

/// Build the underlying HTTP client: JSON headers, timeout and TLS options
pub fn build_http_client(config: &ClientConfig) -> ClientResult<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    let mut builder = Client::builder()
        .default_headers(headers)
        .timeout(config.timeout)
        .danger_accept_invalid_certs(config.accept_invalid_certs);

    if let Some(paths) = &config.tls_identity {
        let cert = std::fs::read(&paths.cert).map_err(|e| {
            ClientError::RequestConfig(format!("reading {}: {e}", paths.cert.display()))
        })?;
        let key = std::fs::read(&paths.key).map_err(|e| {
            ClientError::RequestConfig(format!("reading {}: {e}", paths.key.display()))
        })?;
        let identity = Identity::from_pkcs8_pem(&cert, &key)
            .map_err(|e| ClientError::RequestConfig(format!("invalid TLS identity: {e}")))?;
        builder = builder.identity(identity);
    }

    builder
        .build()
        .map_err(|e| ClientError::RequestConfig(e.to_string()))
}

impl AuthenticatedClient {
    /// Client refreshing through the API's own refresh endpoint
    pub fn new(
        config: ClientConfig,
        session: Arc<dyn SessionStore>,
        notifier: Arc<dyn Notifier>,
    ) -> ClientResult<Self> {
        let http = build_http_client(&config)?;
        let endpoint = config
            .endpoint(&config.refresh_path)
            .map_err(|e| ClientError::RequestConfig(e.to_string()))?;
        let refresher = Arc::new(HttpTokenRefresher::new(http.clone(), endpoint));

        Ok(Self::from_parts(http, config, session, notifier, refresher))
    }

    /// Client with a custom [`TokenRefresher`]
    pub fn with_refresher(
        config: ClientConfig,
        session: Arc<dyn SessionStore>,
        notifier: Arc<dyn Notifier>,
        refresher: Arc<dyn TokenRefresher>,
    ) -> ClientResult<Self> {
        let http = build_http_client(&config)?;
        Ok(Self::from_parts(http, config, session, notifier, refresher))
    }

    fn from_parts(
        http: Client,
        config: ClientConfig,
        session: Arc<dyn SessionStore>,
        notifier: Arc<dyn Notifier>,
        refresher: Arc<dyn TokenRefresher>,
    ) -> Self {
        let coordinator = RefreshCoordinator::new(refresher, session.clone(), notifier.clone());
        Self {
            http,
            config: Arc::new(config),
            session,
            coordinator,
            notifier,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<dyn SessionStore> {
        &self.session
    }

    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.coordinator
    }

    /// Store tokens obtained from a sign-in
    pub fn sign_in(&self, tokens: &TokenPair) {
        self.session.replace(tokens);
    }

    pub fn sign_out(&self) {
        self.session.clear();
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.send_json(ApiRequest::get(path)).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.report(ApiRequest::post(path).json(body))?;
        self.send_json(request).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.report(ApiRequest::put(path).json(body))?;
        self.send_json(request).await
    }

    pub async fn patch<B, T>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.report(ApiRequest::patch(path).json(body))?;
        self.send_json(request).await
    }

    pub async fn delete(&self, path: &str) -> ClientResult<()> {
        self.send(ApiRequest::delete(path)).await.map(|_| ())
    }

    /// Send a request, returning the successful response
    pub async fn send(&self, request: ApiRequest) -> ClientResult<Response> {
        let result = self.execute(&request).await;
        self.report(result)
    }

    /// Send a request and decode its JSON body
    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> ClientResult<T> {
        let result = match self.execute(&request).await {
            Ok(response) => response
                .json::<T>()
                .await
                .map_err(|e| ClientError::InvalidResponse(e.to_string())),
            Err(err) => Err(err),
        };
        self.report(result)
    }

    /// Notify about a failure. Session expiry is reported by whoever cleared the session.
    fn report<T>(&self, result: ClientResult<T>) -> ClientResult<T> {
        if let Err(err) = &result {
            if !err.is_session_expired() {
                tracing::debug!(error = %err, category = ?err.category(), "API request failed");
                self.notifier.notify(Notice::from_error(err));
            }
        }
        result
    }

    async fn execute(&self, request: &ApiRequest) -> ClientResult<Response> {
        let used = self.session.load();
        let response = self.dispatch(request, used.access_token.as_deref()).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return check_status(response).await;
        }

        let current = self.session.load();
        let Some(refresh_token) = current.refresh_token.clone() else {
            if current.access_token.is_some() {
                self.session.clear();
                self.notifier.notify(Notice::SessionExpired);
            }
            return Err(ClientError::session_expired());
        };

        if current.access_token.is_some() && current.access_token != used.access_token {
            // Someone else refreshed since this request was sent
            tracing::debug!(path = %request.path, "Replaying with already refreshed token");
        } else {
            self.coordinator.refresh_or_wait(refresh_token).await?;
        }

        let replay_session = self.session.load();
        let response = self
            .dispatch(request, replay_session.access_token.as_deref())
            .await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Http {
                status: StatusCode::UNAUTHORIZED.as_u16(),
                message: extract_message(&body),
            });
        }

        check_status(response).await
    }

    async fn dispatch(&self, request: &ApiRequest, token: Option<&str>) -> ClientResult<Response> {
        let url = self
            .config
            .endpoint(&request.path)
            .map_err(|e| ClientError::RequestConfig(e.to_string()))?;

        let mut builder = self.http.request(request.method.clone(), url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = token {
            builder = builder
                .bearer_auth(token)
                .header(ACCESS_TOKEN_HEADER, token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        Ok(builder.send().await?)
    }
}

async fn check_status(response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ClientError::from_status(status, extract_message(&body)))
}
