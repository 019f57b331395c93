//! In-memory stand-ins for the backend, quote source, scanner and identity
//! provider.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use kanau::processor::Processor;
use p2pay_sdk::client::ClientError;
use p2pay_sdk::objects::{
    BalanceQuery, BalanceResponse, HistoryEntry, HistoryQuery, LoginRequest, LoginResponse,
    PayRequest, PayResponse, QuoteRequest, QuoteResponse, SendReceipt, SendRequest, UserId,
};
use reqwest::StatusCode;
use rust_decimal::Decimal;
use tokio::sync::mpsc;

use crate::auth::{IdentityError, IdentityProvider, OtpCode, PhoneNumber};
use crate::flow::quote::QuoteSource;
use crate::scanner::{QrScanner, ScanError, ScanEvent, ScanSession};

/// A scripted backend reply. `ClientError` is not `Clone`, so failures are
/// described here and built on demand.
#[derive(Debug, Clone)]
pub enum Reply<T> {
    Ok(T),
    Api(u16, Option<&'static str>),
    Rejected(&'static str),
    Timeout,
    /// Never answers, like a backend that hangs past any deadline.
    Stall,
}

impl<T> Reply<T> {
    async fn into_result(self) -> Result<T, ClientError> {
        match self {
            Reply::Stall => std::future::pending().await,
            Reply::Ok(value) => Ok(value),
            Reply::Api(status, message) => Err(ClientError::Api {
                status: StatusCode::from_u16(status).unwrap(),
                message: message.map(str::to_owned),
                body: message
                    .map(|m| format!(r#"{{"error":"{m}"}}"#))
                    .unwrap_or_default(),
            }),
            Reply::Rejected(message) => Err(ClientError::Rejected(message.to_owned())),
            Reply::Timeout => Err(ClientError::Timeout(Duration::from_secs(30))),
        }
    }
}

#[derive(Default)]
struct MockState {
    login: VecDeque<Reply<LoginResponse>>,
    send: VecDeque<Reply<SendReceipt>>,
    pay: VecDeque<Reply<PayResponse>>,
    balance: VecDeque<Reply<BalanceResponse>>,
    history: VecDeque<Reply<Vec<HistoryEntry>>>,
    login_requests: Vec<LoginRequest>,
    send_requests: Vec<SendRequest>,
    pay_requests: Vec<PayRequest>,
    balance_queries: usize,
    history_queries: usize,
}

/// Backend whose replies are queued per endpoint. An endpoint with an empty
/// queue answers with a 503.
#[derive(Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_login(&self, reply: Reply<LoginResponse>) -> &Self {
        self.state.lock().unwrap().login.push_back(reply);
        self
    }

    pub fn push_send(&self, reply: Reply<SendReceipt>) -> &Self {
        self.state.lock().unwrap().send.push_back(reply);
        self
    }

    pub fn push_pay(&self, reply: Reply<PayResponse>) -> &Self {
        self.state.lock().unwrap().pay.push_back(reply);
        self
    }

    pub fn push_balance(&self, reply: Reply<BalanceResponse>) -> &Self {
        self.state.lock().unwrap().balance.push_back(reply);
        self
    }

    pub fn push_history(&self, reply: Reply<Vec<HistoryEntry>>) -> &Self {
        self.state.lock().unwrap().history.push_back(reply);
        self
    }

    pub fn login_requests(&self) -> Vec<LoginRequest> {
        self.state.lock().unwrap().login_requests.clone()
    }

    pub fn send_requests(&self) -> Vec<SendRequest> {
        self.state.lock().unwrap().send_requests.clone()
    }

    pub fn pay_requests(&self) -> Vec<PayRequest> {
        self.state.lock().unwrap().pay_requests.clone()
    }

    pub fn balance_queries(&self) -> usize {
        self.state.lock().unwrap().balance_queries
    }

    pub fn history_queries(&self) -> usize {
        self.state.lock().unwrap().history_queries
    }
}

fn next<T>(queue: &mut VecDeque<Reply<T>>) -> Reply<T> {
    queue.pop_front().unwrap_or(Reply::Api(503, None))
}

impl Processor<LoginRequest> for MockBackend {
    type Output = LoginResponse;
    type Error = ClientError;
    async fn process(&self, request: LoginRequest) -> Result<LoginResponse, ClientError> {
        let reply = {
            let mut state = self.state.lock().unwrap();
            state.login_requests.push(request);
            next(&mut state.login)
        };
        reply.into_result().await
    }
}

impl Processor<SendRequest> for MockBackend {
    type Output = SendReceipt;
    type Error = ClientError;
    async fn process(&self, request: SendRequest) -> Result<SendReceipt, ClientError> {
        let reply = {
            let mut state = self.state.lock().unwrap();
            state.send_requests.push(request);
            next(&mut state.send)
        };
        reply.into_result().await
    }
}

impl Processor<PayRequest> for MockBackend {
    type Output = PayResponse;
    type Error = ClientError;
    async fn process(&self, request: PayRequest) -> Result<PayResponse, ClientError> {
        let reply = {
            let mut state = self.state.lock().unwrap();
            state.pay_requests.push(request);
            next(&mut state.pay)
        };
        reply.into_result().await
    }
}

impl Processor<BalanceQuery> for MockBackend {
    type Output = BalanceResponse;
    type Error = ClientError;
    async fn process(&self, _query: BalanceQuery) -> Result<BalanceResponse, ClientError> {
        let reply = {
            let mut state = self.state.lock().unwrap();
            state.balance_queries += 1;
            next(&mut state.balance)
        };
        reply.into_result().await
    }
}

impl Processor<HistoryQuery> for MockBackend {
    type Output = Vec<HistoryEntry>;
    type Error = ClientError;
    async fn process(&self, _query: HistoryQuery) -> Result<Vec<HistoryEntry>, ClientError> {
        let reply = {
            let mut state = self.state.lock().unwrap();
            state.history_queries += 1;
            next(&mut state.history)
        };
        reply.into_result().await
    }
}

/// Quote source pricing at a fixed 88.5 INR/USDC.
#[derive(Default)]
pub struct MockQuotes {
    latency: HashMap<String, Duration>,
    failing: HashSet<String>,
    requests: Mutex<Vec<String>>,
}

impl MockQuotes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(mut self, amount_inr: &str, latency: Duration) -> Self {
        self.latency.insert(amount_inr.to_owned(), latency);
        self
    }

    pub fn failing_for(mut self, amount_inr: &str) -> Self {
        self.failing.insert(amount_inr.to_owned());
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn rate() -> Decimal {
        Decimal::new(885, 1)
    }
}

#[async_trait]
impl QuoteSource for MockQuotes {
    async fn quote(&self, request: QuoteRequest) -> Result<QuoteResponse, ClientError> {
        self.requests
            .lock()
            .unwrap()
            .push(request.amount_inr.clone());
        if let Some(latency) = self.latency.get(&request.amount_inr) {
            tokio::time::sleep(*latency).await;
        }
        if self.failing.contains(&request.amount_inr) {
            return Err(ClientError::Timeout(Duration::from_secs(30)));
        }
        let inr: Decimal = request.amount_inr.parse().unwrap();
        Ok(QuoteResponse {
            amount_usdc: (inr / Self::rate()).round_dp(2),
            rate: Self::rate(),
        })
    }
}

/// Scanner that replays queued events. The feed stays open until the mock
/// is dropped, like a camera that keeps looking.
#[derive(Default)]
pub struct MockScanner {
    script: Mutex<Vec<ScanEvent>>,
    feed: Mutex<Option<mpsc::Sender<ScanEvent>>>,
    unavailable: bool,
    pub activations: AtomicUsize,
    pub releases: Arc<AtomicUsize>,
}

impl MockScanner {
    pub fn with_events(events: Vec<ScanEvent>) -> Self {
        Self {
            script: Mutex::new(events),
            ..Self::default()
        }
    }

    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

impl QrScanner for MockScanner {
    fn activate(&self) -> Result<ScanSession, ScanError> {
        if self.unavailable {
            return Err(ScanError::Unavailable("no camera".to_owned()));
        }
        self.activations.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::channel(16);
        for event in self.script.lock().unwrap().drain(..) {
            tx.try_send(event).unwrap();
        }
        *self.feed.lock().unwrap() = Some(tx);
        let releases = self.releases.clone();
        Ok(ScanSession::new(rx, move || {
            releases.fetch_add(1, Ordering::SeqCst);
        }))
    }
}

/// Identity provider accepting one fixed code.
pub struct MockIdentity {
    pub code: &'static str,
    pub uid: &'static str,
    pub request_failures: Mutex<VecDeque<IdentityError>>,
    pub verifiers_created: AtomicUsize,
    pub codes_requested: Mutex<Vec<String>>,
}

impl MockIdentity {
    pub fn new(code: &'static str, uid: &'static str) -> Self {
        Self {
            code,
            uid,
            request_failures: Mutex::new(VecDeque::new()),
            verifiers_created: AtomicUsize::new(0),
            codes_requested: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_next_request(&self, error: IdentityError) {
        self.request_failures.lock().unwrap().push_back(error);
    }
}

#[async_trait]
impl IdentityProvider for MockIdentity {
    type Verifier = usize;
    type Challenge = String;

    fn create_verifier(&self) -> Result<usize, IdentityError> {
        Ok(self.verifiers_created.fetch_add(1, Ordering::SeqCst) + 1)
    }

    async fn request_code(
        &self,
        phone: &PhoneNumber,
        _verifier: &usize,
    ) -> Result<String, IdentityError> {
        if let Some(error) = self.request_failures.lock().unwrap().pop_front() {
            return Err(error);
        }
        self.codes_requested
            .lock()
            .unwrap()
            .push(phone.as_str().to_owned());
        Ok(format!("challenge:{}", phone.as_str()))
    }

    async fn confirm_code(&self, _challenge: &String, code: &OtpCode) -> Result<UserId, IdentityError> {
        if code.as_str() == self.code {
            Ok(UserId::from(self.uid))
        } else {
            Err(IdentityError::Rejected("invalid-verification-code".to_owned()))
        }
    }
}
