//! Typed client for the wallet backend API.
//!
//! Every call is bounded by [`ClientOptions::timeout`]; dropping the
//! returned future cancels the request.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;

use super::ClientError;
use crate::objects::{
    ApiErrorBody, BalanceResponse, HistoryEntry, LoginRequest, LoginResponse, PayRequest,
    PayResponse, QuoteRequest, QuoteResponse, SendReceipt, SendRequest, UserId,
};

/// Tunables for [`BackendClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientOptions {
    /// Deadline for a whole request, connect to last body byte.
    pub timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

/// Typed HTTP client for the wallet backend.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: Client,
    base_url: Url,
    timeout: Duration,
}

impl BackendClient {
    /// Create a client with default options.
    ///
    /// * `base_url` – root URL of the backend (e.g. `http://localhost:5050`).
    pub fn new(base_url: Url) -> Result<Self, ClientError> {
        Self::with_options(base_url, ClientOptions::default())
    }

    /// Fails when the TLS backend or system resolver cannot be initialised.
    pub fn with_options(base_url: Url, options: ClientOptions) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(options.timeout).build()?;
        Ok(Self {
            http,
            base_url,
            timeout: options.timeout,
        })
    }

    /// Replace the default `reqwest::Client` with a custom one (e.g. to
    /// configure a proxy).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `POST /api/auth/login` – fetch or provision the user's wallet.
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ClientError> {
        let url = self.base_url.join("/api/auth/login")?;
        self.execute(self.http.post(url).json(request)).await
    }

    /// `POST /api/wallet/send` – send USDC to an address.
    pub async fn send(&self, request: &SendRequest) -> Result<SendReceipt, ClientError> {
        let url = self.base_url.join("/api/wallet/send")?;
        self.execute(self.http.post(url).json(request)).await
    }

    /// `GET /api/wallet/balance/{uid}`
    pub async fn balance(&self, uid: &UserId) -> Result<BalanceResponse, ClientError> {
        let url = self.user_path("/api/wallet/balance", uid)?;
        self.execute(self.http.get(url)).await
    }

    /// `GET /api/wallet/history/{uid}`
    pub async fn history(&self, uid: &UserId) -> Result<Vec<HistoryEntry>, ClientError> {
        let url = self.user_path("/api/wallet/history", uid)?;
        self.execute(self.http.get(url)).await
    }

    /// `POST /api/p2p/quote` – convert an INR amount to USDC.
    pub async fn quote(&self, request: &QuoteRequest) -> Result<QuoteResponse, ClientError> {
        let url = self.base_url.join("/api/p2p/quote")?;
        self.execute(self.http.post(url).json(request)).await
    }

    /// `POST /api/p2p/pay` – settle a scan-and-pay to a UPI merchant.
    pub async fn pay(&self, request: &PayRequest) -> Result<PayResponse, ClientError> {
        let url = self.base_url.join("/api/p2p/pay")?;
        self.execute(self.http.post(url).json(request)).await
    }

    fn user_path(&self, prefix: &str, uid: &UserId) -> Result<Url, ClientError> {
        let encoded = urlencoding::encode(uid.as_str());
        Ok(self.base_url.join(&format!("{prefix}/{encoded}"))?)
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ClientError> {
        let exchange = async {
            let resp = request.send().await?;
            parse_response(resp).await
        };
        tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| ClientError::Timeout(self.timeout))?
    }
}

async fn parse_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ClientError> {
    let status = resp.status();
    let bytes = resp.bytes().await?;
    if !status.is_success() {
        let message = serde_json::from_slice::<ApiErrorBody>(&bytes)
            .ok()
            .map(|b| b.error);
        let body = String::from_utf8_lossy(&bytes).into_owned();
        return Err(ClientError::Api {
            status,
            message,
            body,
        });
    }
    decode_body(&bytes)
}

/// Decode a 2xx body against the endpoint schema.
///
/// An empty body is read as `{}`; a body with a non-null `error` field is
/// a rejection regardless of status.
fn decode_body<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ClientError> {
    let value: serde_json::Value = if bytes.iter().all(u8::is_ascii_whitespace) {
        serde_json::Value::Object(serde_json::Map::new())
    } else {
        serde_json::from_slice(bytes)?
    };

    if let Some(error) = value.get("error").filter(|e| !e.is_null()) {
        let message = match error.as_str() {
            Some(text) => text.to_owned(),
            None => error.to_string(),
        };
        return Err(ClientError::Rejected(message));
    }

    Ok(serde_json::from_value(value)?)
}
