//! Wallet endpoints: direct send, balance and history.

use serde::{Deserialize, Serialize};

use super::account::UserId;

/// `POST /api/wallet/send` body.
///
/// `amount` is forwarded as the decimal text the user typed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendRequest {
    pub uid: UserId,
    pub to: String,
    pub amount: String,
}

/// Successful send response. The backend is not required to return
/// anything beyond a success status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendReceipt {
    #[serde(default)]
    pub tx_hash: Option<String>,
}

/// `GET /api/wallet/balance/{uid}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceQuery {
    pub uid: UserId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub address: String,
    pub balance: rust_decimal::Decimal,
    pub symbol: String,
}

/// `GET /api/wallet/history/{uid}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    pub uid: UserId,
}

/// Transaction identifiers come back as either strings or integers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TransactionId {
    Number(i64),
    Text(String),
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionId::Number(n) => write!(f, "{n}"),
            TransactionId::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionDirection {
    Send,
    Receive,
    /// Anything else the backend records, e.g. P2P conversions.
    Other,
}

/// One row of the transaction history, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(default)]
    pub id: Option<TransactionId>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub to: String,
    /// Signed display amount, e.g. `-10 USDC`.
    pub amount: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub status: String,
}

impl HistoryEntry {
    pub fn direction(&self) -> TransactionDirection {
        match self.kind.as_str() {
            "Send" => TransactionDirection::Send,
            "Receive" => TransactionDirection::Receive,
            _ => TransactionDirection::Other,
        }
    }

    /// Outgoing entries carry a leading minus sign on the amount.
    pub fn is_outgoing(&self) -> bool {
        self.amount.trim_start().starts_with('-')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_parsing() {
        let json = r#"[
            {"id": 7, "type": "Send", "to": "0xabc", "amount": "-10 USDC", "date": "2024-01-01", "status": "Completed"},
            {"id": "p2p-1", "type": "P2P", "to": "shop@upi", "amount": "-5", "date": "2024-01-02", "status": "Pending"},
            {"type": "Receive", "amount": "+3"}
        ]"#;
        let entries: Vec<HistoryEntry> = serde_json::from_str(json).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].id, Some(TransactionId::Number(7)));
        assert_eq!(entries[0].direction(), TransactionDirection::Send);
        assert!(entries[0].is_outgoing());
        assert_eq!(entries[1].id.as_ref().map(ToString::to_string).as_deref(), Some("p2p-1"));
        assert_eq!(entries[1].direction(), TransactionDirection::Other);
        assert_eq!(entries[2].direction(), TransactionDirection::Receive);
        assert!(!entries[2].is_outgoing());
        assert!(entries[2].id.is_none());
    }

    #[test]
    fn test_send_receipt_from_empty_object() {
        let receipt: SendReceipt = serde_json::from_str("{}").unwrap();
        assert_eq!(receipt, SendReceipt::default());
    }

    #[test]
    fn test_balance_requires_symbol() {
        assert!(serde_json::from_str::<BalanceResponse>(r#"{"address":"0x1","balance":"1"}"#).is_err());
        let ok: BalanceResponse =
            serde_json::from_str(r#"{"address":"0x1","balance":"1.23456","symbol":"ETH"}"#).unwrap();
        assert_eq!(ok.symbol, "ETH");
    }
}
