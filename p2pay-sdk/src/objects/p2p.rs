//! INR → USDC conversion: quoting and scan-and-pay settlement.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::account::UserId;

/// `POST /api/p2p/quote` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub amount_inr: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    pub amount_usdc: Decimal,
    /// INR per USDC.
    pub rate: Decimal,
}

/// `POST /api/p2p/pay` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayRequest {
    pub uid: UserId,
    pub amount_usdc: String,
    pub amount_inr: String,
    pub upi_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayResponse {
    #[serde(default)]
    pub new_balance: Option<Decimal>,
}
