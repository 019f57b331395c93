//! Phone sign-in.
//!
//! The identity provider owns the SMS/OTP protocol. This module sequences
//! it (`Phone -> Otp -> Provisioning -> Done`), validates input before
//! anything is sent, and hands the verified user id to
//! [`establish_session`].

pub mod phone;
pub mod verifier;

pub use phone::{OtpCode, PhoneNumber};
pub use verifier::{VerifierSlot, VerifierState};

use async_trait::async_trait;
use kanau::processor::Processor;
use p2pay_sdk::client::ClientError;
use p2pay_sdk::objects::{LoginRequest, LoginResponse, UserId};
use tracing::{error, info, warn};

use crate::session::{Session, SessionError, establish_session};

/// Country calling code prefixed to numbers entered without one.
pub const DEFAULT_COUNTRY_CODE: &str = "+91";

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// The anti-abuse verifier expired and must be re-created.
    #[error("verifier expired")]
    VerifierExpired,
    /// The provider refused the request (wrong code, blocked number, ...).
    #[error("{0}")]
    Rejected(String),
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

/// Phone/OTP identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Anti-abuse verifier that must accompany a code request.
    type Verifier: Send + Sync;
    /// Handle for confirming the code that was sent.
    type Challenge: Send + Sync;

    fn create_verifier(&self) -> Result<Self::Verifier, IdentityError>;

    async fn request_code(
        &self,
        phone: &PhoneNumber,
        verifier: &Self::Verifier,
    ) -> Result<Self::Challenge, IdentityError>;

    async fn confirm_code(
        &self,
        challenge: &Self::Challenge,
        code: &OtpCode,
    ) -> Result<UserId, IdentityError>;
}

/// Failures surfaced to the user. `Display` is the text to show.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Please enter a valid phone number.")]
    InvalidPhone,
    #[error("Please enter the full 6-digit code.")]
    IncompleteCode,
    #[error("Invalid code. Please try again.")]
    CodeRejected,
    #[error("Verification expired. Please try again.")]
    VerificationExpired,
    #[error("Failed to send SMS: {0}")]
    CodeRequest(IdentityError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("cannot {action} while {stage}")]
    InvalidTransition {
        stage: &'static str,
        action: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthStage {
    Phone,
    Otp,
    /// Code accepted; the wallet is being fetched or derived.
    Provisioning,
    Done,
}

impl AuthStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthStage::Phone => "phone",
            AuthStage::Otp => "otp",
            AuthStage::Provisioning => "provisioning",
            AuthStage::Done => "done",
        }
    }
}

/// Sign-in flow from phone number to established [`Session`].
pub struct AuthFlow<P: IdentityProvider, B> {
    provider: P,
    backend: B,
    country_code: String,
    verifier: VerifierSlot<P::Verifier>,
    challenge: Option<P::Challenge>,
    phone: Option<PhoneNumber>,
    stage: AuthStage,
    session: Option<Session>,
}

impl<P, B> AuthFlow<P, B>
where
    P: IdentityProvider,
    B: Processor<LoginRequest, Output = LoginResponse, Error = ClientError>,
{
    pub fn new(provider: P, backend: B, country_code: impl Into<String>) -> Self {
        Self {
            provider,
            backend,
            country_code: country_code.into(),
            verifier: VerifierSlot::new(),
            challenge: None,
            phone: None,
            stage: AuthStage::Phone,
            session: None,
        }
    }

    pub fn stage(&self) -> AuthStage {
        self.stage
    }

    /// Number the code was sent to.
    pub fn phone(&self) -> Option<&PhoneNumber> {
        self.phone.as_ref()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn verifier_state(&self) -> VerifierState<&P::Verifier> {
        self.verifier.state()
    }

    /// Called when the provider reports the verifier expired outside a
    /// request.
    pub fn verifier_expired(&mut self) {
        self.verifier.mark_expired();
    }

    /// Validate the number and ask the provider to send a code.
    pub async fn submit_phone(&mut self, input: &str) -> Result<AuthStage, AuthError> {
        self.require(AuthStage::Phone, "submit phone number")?;
        let phone = PhoneNumber::parse(input, &self.country_code).ok_or(AuthError::InvalidPhone)?;

        let verifier = self
            .verifier
            .get_or_init(|| self.provider.create_verifier())
            .map_err(AuthError::CodeRequest)?;

        match self.provider.request_code(&phone, verifier).await {
            Ok(challenge) => {
                info!(phone = %phone, "Verification code sent");
                self.challenge = Some(challenge);
                self.phone = Some(phone);
                self.stage = AuthStage::Otp;
                Ok(self.stage)
            }
            Err(IdentityError::VerifierExpired) => {
                warn!("Verifier expired while requesting a code");
                self.verifier.mark_expired();
                Err(AuthError::VerificationExpired)
            }
            Err(e) => {
                error!(error = %e, "Error sending SMS");
                self.verifier.reset();
                Err(AuthError::CodeRequest(e))
            }
        }
    }

    /// Confirm the code, then fetch or derive the user's wallet.
    pub async fn submit_code(&mut self, input: &str) -> Result<&Session, AuthError> {
        self.require(AuthStage::Otp, "submit code")?;
        let code = OtpCode::parse(input).ok_or(AuthError::IncompleteCode)?;
        let Some(challenge) = self.challenge.as_ref() else {
            self.back_to_phone();
            return Err(AuthError::VerificationExpired);
        };

        let uid = match self.provider.confirm_code(challenge, &code).await {
            Ok(uid) => uid,
            Err(IdentityError::VerifierExpired) => {
                warn!("Verification expired before the code was confirmed");
                self.verifier.mark_expired();
                self.back_to_phone();
                return Err(AuthError::VerificationExpired);
            }
            Err(e) => {
                error!(error = %e, "Error verifying OTP");
                return Err(AuthError::CodeRejected);
            }
        };

        self.stage = AuthStage::Provisioning;
        info!(uid = %uid, "Phone verified");
        let session = match establish_session(&self.backend, uid).await {
            Ok(session) => session,
            Err(e) => {
                self.back_to_phone();
                return Err(e.into());
            }
        };
        self.challenge = None;
        self.stage = AuthStage::Done;
        let session: &Session = self.session.insert(session);
        Ok(session)
    }

    /// Abandon the sent code and enter a different number.
    pub fn change_number(&mut self) -> Result<(), AuthError> {
        self.require(AuthStage::Otp, "change number")?;
        self.back_to_phone();
        Ok(())
    }

    /// Consume the flow, returning the session once signed in.
    pub fn into_session(self) -> Option<Session> {
        self.session
    }

    fn back_to_phone(&mut self) {
        self.challenge = None;
        self.phone = None;
        self.stage = AuthStage::Phone;
    }

    fn require(&self, stage: AuthStage, action: &'static str) -> Result<(), AuthError> {
        if self.stage != stage {
            return Err(AuthError::InvalidTransition {
                stage: self.stage.as_str(),
                action,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{OFFLINE_MODE_MESSAGE, SessionMode};
    use crate::testing::{MockBackend, MockIdentity, Reply};
    use std::sync::atomic::Ordering;

    fn flow(backend: &MockBackend) -> AuthFlow<MockIdentity, MockBackend> {
        AuthFlow::new(
            MockIdentity::new("123456", "firebase-uid"),
            backend.clone(),
            DEFAULT_COUNTRY_CODE,
        )
    }

    #[tokio::test]
    async fn test_sign_in_online() {
        let backend = MockBackend::new();
        backend.push_login(Reply::Ok(LoginResponse {
            wallet_address: "0xWallet".to_owned(),
            balance: None,
        }));
        let mut flow = flow(&backend);

        assert_eq!(flow.submit_phone("98765 43210").await.unwrap(), AuthStage::Otp);
        assert_eq!(flow.phone().unwrap().as_str(), "+919876543210");

        let session = flow.submit_code("123456").await.unwrap();
        assert_eq!(session.wallet_address(), "0xWallet");
        assert_eq!(session.uid().as_str(), "firebase-uid");
        assert_eq!(flow.stage(), AuthStage::Done);
        assert_eq!(backend.login_requests()[0].uid.as_str(), "firebase-uid");
    }

    #[tokio::test]
    async fn test_sign_in_offline_fallback() {
        let backend = MockBackend::new();
        let mut flow = flow(&backend);

        flow.submit_phone("9876543210").await.unwrap();
        let session = flow.submit_code("123456").await.unwrap();
        assert_eq!(session.mode(), SessionMode::Offline);
        assert_eq!(session.notice(), Some(OFFLINE_MODE_MESSAGE));
        assert_eq!(
            session.wallet_address(),
            p2pay_sdk::wallet::derive_address("firebase-uid").unwrap()
        );
    }

    #[tokio::test]
    async fn test_invalid_phone_sends_nothing() {
        let backend = MockBackend::new();
        let mut flow = flow(&backend);

        let err = flow.submit_phone("12345").await.unwrap_err();
        assert_eq!(err.to_string(), "Please enter a valid phone number.");
        assert_eq!(flow.stage(), AuthStage::Phone);
        assert!(flow.provider.codes_requested.lock().unwrap().is_empty());
        assert_eq!(flow.verifier_state(), VerifierState::Uninitialized);
    }

    #[tokio::test]
    async fn test_wrong_and_incomplete_code_stay_on_otp() {
        let backend = MockBackend::new();
        let mut flow = flow(&backend);
        flow.submit_phone("9876543210").await.unwrap();

        let err = flow.submit_code("123").await.unwrap_err();
        assert_eq!(err.to_string(), "Please enter the full 6-digit code.");

        let err = flow.submit_code("000000").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid code. Please try again.");
        assert_eq!(flow.stage(), AuthStage::Otp);
        assert!(backend.login_requests().is_empty());
    }

    #[tokio::test]
    async fn test_failed_code_request_resets_verifier() {
        let backend = MockBackend::new();
        let mut flow = flow(&backend);
        flow.provider
            .fail_next_request(IdentityError::Rejected("too-many-requests".to_owned()));

        let err = flow.submit_phone("9876543210").await.unwrap_err();
        assert!(matches!(err, AuthError::CodeRequest(IdentityError::Rejected(_))));
        assert_eq!(flow.verifier_state(), VerifierState::Uninitialized);
        assert_eq!(flow.stage(), AuthStage::Phone);

        flow.submit_phone("9876543210").await.unwrap();
        assert_eq!(flow.provider.verifiers_created.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_expired_verifier_is_recreated() {
        let backend = MockBackend::new();
        let mut flow = flow(&backend);
        flow.provider.fail_next_request(IdentityError::VerifierExpired);

        let err = flow.submit_phone("9876543210").await.unwrap_err();
        assert_eq!(err.to_string(), "Verification expired. Please try again.");
        assert_eq!(flow.verifier_state(), VerifierState::Expired);

        flow.submit_phone("9876543210").await.unwrap();
        assert_eq!(flow.verifier_state(), VerifierState::Ready(&2));
    }

    #[tokio::test]
    async fn test_change_number_returns_to_phone() {
        let backend = MockBackend::new();
        let mut flow = flow(&backend);
        flow.submit_phone("9876543210").await.unwrap();

        flow.change_number().unwrap();
        assert_eq!(flow.stage(), AuthStage::Phone);
        assert!(flow.phone().is_none());
        assert!(matches!(
            flow.submit_code("123456").await,
            Err(AuthError::InvalidTransition { .. })
        ));
    }
}
