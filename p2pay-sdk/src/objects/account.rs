//! Account identity and login.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Opaque user identifier issued by the identity provider after phone
/// verification. Stable per account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(CompactString);

impl UserId {
    pub fn new(id: impl Into<CompactString>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// `POST /api/auth/login` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub uid: UserId,
}

/// Wallet provisioned (or looked up) by the backend for the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub wallet_address: String,
    #[serde(default)]
    pub balance: Option<rust_decimal::Decimal>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_response_accepts_string_or_number_balance() {
        let from_str: LoginResponse =
            serde_json::from_str(r#"{"walletAddress":"0xabc","balance":"12.5"}"#).unwrap();
        let from_num: LoginResponse =
            serde_json::from_str(r#"{"walletAddress":"0xabc","balance":12.5}"#).unwrap();
        assert_eq!(from_str.balance, from_num.balance);
        assert_eq!(from_str.wallet_address, "0xabc");
    }

    #[test]
    fn test_login_response_requires_address() {
        assert!(serde_json::from_str::<LoginResponse>(r#"{"balance":"1"}"#).is_err());
    }

    #[test]
    fn test_user_id_is_transparent() {
        let req = LoginRequest {
            uid: UserId::from("abc123"),
        };
        assert_eq!(serde_json::to_string(&req).unwrap(), r#"{"uid":"abc123"}"#);
    }
}
