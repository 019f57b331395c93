//! Request and response schemas for the p2pay backend.
//!
//! Every endpoint has an explicit schema so that a response which does not
//! match is reported as malformed instead of being read field-by-field.

pub mod account;
pub mod p2p;
pub mod wallet;

pub use account::{LoginRequest, LoginResponse, UserId};
pub use p2p::{PayRequest, PayResponse, QuoteRequest, QuoteResponse};
pub use wallet::{
    BalanceQuery, BalanceResponse, HistoryEntry, HistoryQuery, SendReceipt, SendRequest,
    TransactionDirection, TransactionId,
};

use serde::{Deserialize, Serialize};

/// Error body returned by the backend on failure.
///
/// A success status carrying this field is still a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub error: String,
}
