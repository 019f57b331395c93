//! Signed-in session: who the user is and which wallet they hold.

use kanau::processor::Processor;
use p2pay_sdk::client::ClientError;
use p2pay_sdk::objects::{LoginRequest, LoginResponse, UserId};
use p2pay_sdk::wallet::derive_address;
use rust_decimal::Decimal;
use tracing::{info, warn};

/// Shown when the backend could not be reached and the wallet address was
/// derived locally.
pub const OFFLINE_MODE_MESSAGE: &str = "Failed to connect to server. Using offline mode.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionMode {
    /// Wallet reported by the backend.
    Online,
    /// Wallet derived locally from the user id. May not be the wallet the
    /// backend holds for this user.
    Offline,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("user identifier is empty")]
    EmptyIdentifier,
    #[error("no wallet could be derived for this user")]
    Derivation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    uid: UserId,
    wallet_address: String,
    balance: Option<Decimal>,
    mode: SessionMode,
}

impl Session {
    pub fn new(
        uid: UserId,
        wallet_address: String,
        balance: Option<Decimal>,
        mode: SessionMode,
    ) -> Self {
        Self {
            uid,
            wallet_address,
            balance,
            mode,
        }
    }

    pub fn uid(&self) -> &UserId {
        &self.uid
    }

    pub fn wallet_address(&self) -> &str {
        &self.wallet_address
    }

    /// Balance returned at login, if any.
    pub fn initial_balance(&self) -> Option<Decimal> {
        self.balance
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn is_offline(&self) -> bool {
        self.mode == SessionMode::Offline
    }

    /// Banner text for the session, if it needs one.
    pub fn notice(&self) -> Option<&'static str> {
        self.is_offline().then_some(OFFLINE_MODE_MESSAGE)
    }
}

/// Fetch (or provision) the user's wallet from the backend.
///
/// When the login call fails for any reason, the address is derived
/// locally from `uid` and the session is marked [`SessionMode::Offline`].
pub async fn establish_session<B>(backend: &B, uid: UserId) -> Result<Session, SessionError>
where
    B: Processor<LoginRequest, Output = LoginResponse, Error = ClientError>,
{
    if uid.is_empty() {
        return Err(SessionError::EmptyIdentifier);
    }

    match backend.process(LoginRequest { uid: uid.clone() }).await {
        Ok(response) => {
            info!(uid = %uid, wallet = %response.wallet_address, "Session established");
            Ok(Session::new(
                uid,
                response.wallet_address,
                response.balance,
                SessionMode::Online,
            ))
        }
        Err(e) => {
            warn!(uid = %uid, error = %e, "Login failed, falling back to offline mode");
            let address = derive_address(uid.as_str()).ok_or(SessionError::Derivation)?;
            // The backend's wallet for this user is not guaranteed to be the
            // one derived here.
            warn!(
                uid = %uid,
                wallet = %address,
                "Offline wallet address was derived locally and may not match the backend wallet"
            );
            Ok(Session::new(uid, address, None, SessionMode::Offline))
        }
    }
}
