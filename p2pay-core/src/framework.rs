use async_trait::async_trait;
use kanau::processor::Processor;
use p2pay_sdk::client::{BackendClient, ClientError};
use p2pay_sdk::objects::{
    BalanceQuery, BalanceResponse, HistoryEntry, HistoryQuery, LoginRequest, LoginResponse,
    PayRequest, PayResponse, QuoteRequest, QuoteResponse, SendReceipt, SendRequest,
};

use crate::flow::quote::QuoteSource;

/// Executes backend requests over HTTP.
///
/// Each request type has its own `Processor` impl so flows can be written
/// against exactly the endpoints they call and tested with a stand-in.
#[derive(Debug, Clone)]
pub struct BackendProcessor {
    pub client: BackendClient,
}

impl BackendProcessor {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

impl Processor<LoginRequest> for BackendProcessor {
    type Output = LoginResponse;
    type Error = ClientError;
    #[tracing::instrument(skip_all, err, name = "API:Login")]
    async fn process(&self, request: LoginRequest) -> Result<LoginResponse, ClientError> {
        self.client.login(&request).await
    }
}

impl Processor<SendRequest> for BackendProcessor {
    type Output = SendReceipt;
    type Error = ClientError;
    #[tracing::instrument(skip_all, err, name = "API:Send")]
    async fn process(&self, request: SendRequest) -> Result<SendReceipt, ClientError> {
        self.client.send(&request).await
    }
}

impl Processor<BalanceQuery> for BackendProcessor {
    type Output = BalanceResponse;
    type Error = ClientError;
    #[tracing::instrument(skip_all, err, name = "API:Balance")]
    async fn process(&self, query: BalanceQuery) -> Result<BalanceResponse, ClientError> {
        self.client.balance(&query.uid).await
    }
}

impl Processor<HistoryQuery> for BackendProcessor {
    type Output = Vec<HistoryEntry>;
    type Error = ClientError;
    #[tracing::instrument(skip_all, err, name = "API:History")]
    async fn process(&self, query: HistoryQuery) -> Result<Vec<HistoryEntry>, ClientError> {
        self.client.history(&query.uid).await
    }
}

impl Processor<QuoteRequest> for BackendProcessor {
    type Output = QuoteResponse;
    type Error = ClientError;
    #[tracing::instrument(skip_all, err, name = "API:Quote")]
    async fn process(&self, request: QuoteRequest) -> Result<QuoteResponse, ClientError> {
        self.client.quote(&request).await
    }
}

impl Processor<PayRequest> for BackendProcessor {
    type Output = PayResponse;
    type Error = ClientError;
    #[tracing::instrument(skip_all, err, name = "API:Pay")]
    async fn process(&self, request: PayRequest) -> Result<PayResponse, ClientError> {
        self.client.pay(&request).await
    }
}

// Quotes are fetched from a spawned refresh task, so they go through an
// object-safe `Send` trait rather than `Processor`.
#[async_trait]
impl QuoteSource for BackendProcessor {
    async fn quote(&self, request: QuoteRequest) -> Result<QuoteResponse, ClientError> {
        self.client.quote(&request).await
    }
}
