//! API client for the trading backend.
//!
//! One client, one unwrapping rule: a successful call resolves with the
//! envelope's `data` field, never the whole envelope. GET parameters are
//! URL-encoded query pairs; POST/PUT/DELETE bodies are JSON.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use reqwest::{header, Client, Method, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use crate::auth::SessionManager;
use crate::models::{Account, LoginData, OrderReceipt, OrderTicket, Quote};
use crate::notify::NoticeSender;

use super::ApiError;

/// Envelope code signaling success. Nothing else is success, including
/// codes in the 2xx range.
const SUCCESS_CODE: i64 = 200;

/// Envelope code signaling an expired or invalid session.
const UNAUTHORIZED_CODE: i64 = 401;

/// Generic notice for transport failures; the server's own message is
/// only trusted when an envelope actually arrived.
const NETWORK_ERROR_NOTICE: &str = "Network error, please try again";

/// Response envelope the backend wraps every payload in.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Envelope<T> {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<T>,
}

/// API client. Clone is cheap - reqwest::Client uses Arc internally for
/// connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: Arc<SessionManager>,
    notices: NoticeSender,
}

impl ApiClient {
    /// Create a client for `base_url`. The timeout bounds the whole call;
    /// a stalled request surfaces as a network failure.
    pub fn new(
        base_url: &str,
        timeout_secs: u64,
        session: Arc<SessionManager>,
        notices: NoticeSender,
    ) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
            notices,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attach the bearer token if the store has one. No token means no
    /// header at all - an empty bearer value is never sent.
    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        match self.session.token() {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// Send a prepared request and unwrap the envelope.
    ///
    /// Ordering within one call: the transport-401 check runs first, then
    /// envelope interpretation, and only then does the caller observe the
    /// result. Across concurrent calls two 401s may both expire the
    /// session; that path is idempotent.
    async fn execute<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ApiError> {
        let response = match self.authorized(req).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "Request failed to send");
                self.notices.error(NETWORK_ERROR_NOTICE);
                return Err(ApiError::Network(e));
            }
        };

        if response.status().as_u16() == 401 {
            self.session.expire_session();
            return Err(ApiError::Unauthorized);
        }

        let envelope: Envelope<T> = match response.json().await {
            Ok(env) => env,
            Err(e) => {
                warn!(error = %e, "Failed to parse response envelope");
                self.notices.error(NETWORK_ERROR_NOTICE);
                return Err(ApiError::Network(e));
            }
        };

        self.process_envelope(envelope)
    }

    /// Interpret an envelope: unwrap data on 200, expire the session on
    /// 401, surface the server message on anything else.
    fn process_envelope<T>(&self, envelope: Envelope<T>) -> Result<T, ApiError> {
        match envelope.code {
            SUCCESS_CODE => envelope
                .data
                .ok_or_else(|| ApiError::InvalidResponse("envelope has no data field".to_string())),
            UNAUTHORIZED_CODE => {
                self.session.expire_session();
                Err(ApiError::Unauthorized)
            }
            code => {
                let message = if envelope.message.is_empty() {
                    "Request failed".to_string()
                } else {
                    envelope.message
                };
                debug!(code, %message, "Application error envelope");
                self.notices.error(message.clone());
                Err(ApiError::Application { code, message })
            }
        }
    }

    // =========================================================================
    // Generic verbs
    // =========================================================================

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let mut req = self.client.get(self.url(path));
        if !params.is_empty() {
            req = req.query(params);
        }
        self.execute(req).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.execute(self.client.post(self.url(path)).json(body)).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.execute(self.client.put(self.url(path)).json(body)).await
    }

    pub async fn delete<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.execute(
            self.client
                .request(Method::DELETE, self.url(path))
                .json(body),
        )
        .await
    }

    // =========================================================================
    // Backend endpoints
    // =========================================================================

    /// Authenticate and return the token plus identity fields. The caller
    /// decides whether to persist them via the session manager.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginData, ApiError> {
        self.post(
            "/auth/login",
            &serde_json::json!({ "username": username, "password": password }),
        )
        .await
    }

    pub async fn register(&self, username: &str, password: &str) -> Result<LoginData, ApiError> {
        self.post(
            "/auth/register",
            &serde_json::json!({ "username": username, "password": password }),
        )
        .await
    }

    /// Fetch a quote for one symbol. Public endpoint.
    pub async fn fetch_quote(&self, symbol: &str) -> Result<Quote, ApiError> {
        self.get("/market/quote", &[("symbol", symbol)]).await
    }

    /// Fetch the logged-in user's account summary.
    pub async fn fetch_account(&self) -> Result<Account, ApiError> {
        self.get("/account", &[]).await
    }

    /// Submit an order ticket.
    pub async fn submit_order(&self, ticket: &OrderTicket) -> Result<OrderReceipt, ApiError> {
        self.post("/trade/order", ticket).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav::{HistoryNavigator, Navigator};
    use crate::notify::{notice_channel, Notice};
    use crate::routes::RouteTable;
    use crate::store::MemoryStore;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn client_fixture() -> (
        ApiClient,
        Arc<SessionManager>,
        Arc<HistoryNavigator>,
        UnboundedReceiver<Notice>,
    ) {
        let nav = Arc::new(HistoryNavigator::new());
        let (notices, rx) = notice_channel();
        let session = Arc::new(SessionManager::new(
            Arc::new(MemoryStore::new()),
            nav.clone(),
            notices.clone(),
            RouteTable::default(),
        ));
        session.initialize();
        let client =
            ApiClient::new("http://localhost:9999/api/v1", 10, session.clone(), notices).unwrap();
        (client, session, nav, rx)
    }

    fn envelope<T: DeserializeOwned>(json: &str) -> Envelope<T> {
        serde_json::from_str(json).expect("Failed to parse envelope fixture")
    }

    #[test]
    fn test_envelope_parses_with_defaults() {
        let env: Envelope<serde_json::Value> = envelope(r#"{"code": 200}"#);
        assert_eq!(env.code, 200);
        assert_eq!(env.message, "");
        assert!(env.data.is_none());
    }

    #[test]
    fn test_success_resolves_with_data_field() {
        let (client, _session, _nav, mut rx) = client_fixture();

        let env: Envelope<serde_json::Value> =
            envelope(r#"{"code": 200, "message": "ok", "data": {"id": 1}}"#);
        let data = client.process_envelope(env).unwrap();
        assert_eq!(data, serde_json::json!({"id": 1}));

        // No user-visible error was shown
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_success_without_data_is_invalid() {
        let (client, _session, _nav, _rx) = client_fixture();
        let env: Envelope<serde_json::Value> = envelope(r#"{"code": 200}"#);
        assert!(matches!(
            client.process_envelope(env),
            Err(ApiError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_application_error_rejects_with_server_message() {
        let (client, session, nav, mut rx) = client_fixture();
        session.set_login_info("tok", "42", "alice").unwrap();
        nav.push("/dashboard");

        let env: Envelope<serde_json::Value> =
            envelope(r#"{"code": 500, "message": "boom"}"#);
        let err = client.process_envelope(env).unwrap_err();
        assert_eq!(err.to_string(), "boom");

        // Surfaced to the user, but no state change and no redirect
        assert_eq!(rx.try_recv().unwrap(), Notice::error("boom"));
        assert!(session.is_logged_in());
        assert_eq!(nav.current_path(), "/dashboard");
    }

    #[test]
    fn test_envelope_401_expires_session_and_redirects() {
        let (client, session, nav, mut rx) = client_fixture();
        session.set_login_info("tok", "42", "alice").unwrap();
        nav.push("/dashboard");

        let env: Envelope<serde_json::Value> =
            envelope(r#"{"code": 401, "message": "expired"}"#);
        assert!(matches!(
            client.process_envelope(env),
            Err(ApiError::Unauthorized)
        ));

        assert!(!session.is_logged_in());
        assert_eq!(session.token(), None);
        assert_eq!(nav.current_path(), "/login");
        assert_eq!(
            rx.try_recv().unwrap(),
            Notice::error("Session expired, please log in again")
        );
    }

    #[test]
    fn test_envelope_401_on_login_page_does_not_loop() {
        let (client, session, nav, _rx) = client_fixture();
        nav.push("/login");

        let env: Envelope<serde_json::Value> =
            envelope(r#"{"code": 401, "message": "expired"}"#);
        let _ = client.process_envelope(env);

        // Still exactly one visit to /login
        assert_eq!(nav.history(), vec!["/", "/login"]);
    }

    #[test]
    fn test_base_url_join() {
        let (client, _, _, _) = client_fixture();
        assert_eq!(
            client.url("/trade/order"),
            "http://localhost:9999/api/v1/trade/order"
        );
    }
}
