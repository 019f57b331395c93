//! Direct USDC send.
//!
//! ```text
//! Input --submit--> Confirming --ok--> Success --dismiss--> Input (fresh)
//!                        |
//!                        +--error/cancel--> Input (error set, fields kept)
//! ```

use kanau::processor::Processor;
use p2pay_sdk::client::ClientError;
use p2pay_sdk::objects::{SendReceipt, SendRequest, UserId};
use p2pay_sdk::wallet::truncate_address;
use tracing::{debug, error, info};

use super::{FlowError, InFlight, NOT_LOGGED_IN_MESSAGE, is_blank};
use crate::events::channels::emit;
use crate::events::{FlowEvent, FlowEventSender, FlowKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SendStage {
    /// Collecting recipient and amount. May carry an error from the last
    /// attempt.
    Input,
    /// The send request is in flight.
    Confirming,
    Success,
}

impl SendStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            SendStage::Input => "input",
            SendStage::Confirming => "confirming",
            SendStage::Success => "success",
        }
    }
}

/// State machine behind the "Send USDC" modal.
pub struct SendFlow<B> {
    backend: B,
    uid: UserId,
    events: FlowEventSender,
    stage: SendStage,
    recipient: String,
    amount: String,
    error: Option<String>,
}

impl<B> SendFlow<B>
where
    B: Processor<SendRequest, Output = SendReceipt, Error = ClientError>,
{
    pub fn new(backend: B, uid: UserId, events: FlowEventSender) -> Self {
        Self {
            backend,
            uid,
            events,
            stage: SendStage::Input,
            recipient: String::new(),
            amount: String::new(),
            error: None,
        }
    }

    pub fn stage(&self) -> SendStage {
        self.stage
    }

    pub fn recipient(&self) -> &str {
        &self.recipient
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }

    /// Message from the last failed attempt, shown above the submit button.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn set_recipient(&mut self, recipient: impl Into<String>) -> Result<(), FlowError> {
        self.require(SendStage::Input, "edit recipient")?;
        self.recipient = recipient.into();
        Ok(())
    }

    pub fn set_amount(&mut self, amount: impl Into<String>) -> Result<(), FlowError> {
        self.require(SendStage::Input, "edit amount")?;
        self.amount = amount.into();
        Ok(())
    }

    /// Whether the submit control should be enabled.
    pub fn can_submit(&self) -> bool {
        self.stage == SendStage::Input && !is_blank(&self.recipient) && !is_blank(&self.amount)
    }

    /// Send the funds. Issues exactly one request.
    ///
    /// Returns the stage the flow settled in: `Success`, or `Input` with
    /// [`error`](Self::error) set. Dropping the future before it resolves
    /// also leaves the flow in `Input`, with a network error.
    pub async fn submit(&mut self) -> Result<SendStage, FlowError> {
        self.require(SendStage::Input, "submit")?;
        if is_blank(&self.recipient) {
            return Err(FlowError::MissingField("recipient"));
        }
        if is_blank(&self.amount) {
            return Err(FlowError::MissingField("amount"));
        }

        self.error = None;
        if self.uid.is_empty() {
            self.error = Some(NOT_LOGGED_IN_MESSAGE.to_owned());
            return Ok(self.stage);
        }

        info!(to = %self.recipient, amount = %self.amount, "Submitting send");
        let request = SendRequest {
            uid: self.uid.clone(),
            to: self.recipient.trim().to_owned(),
            amount: self.amount.trim().to_owned(),
        };

        let in_flight = InFlight::begin(
            &mut self.stage,
            &mut self.error,
            SendStage::Confirming,
            SendStage::Input,
        );
        match self.backend.process(request).await {
            Ok(receipt) => {
                info!(tx_hash = ?receipt.tx_hash, "Send succeeded");
                in_flight.settle(SendStage::Success, None);
            }
            Err(e) => {
                error!(error = %e, "Send failed");
                in_flight.settle(SendStage::Input, Some(e.user_message()));
            }
        }
        Ok(self.stage)
    }

    /// Success text, e.g. `You successfully sent 10 USDC to 0xabc1...`.
    pub fn summary(&self) -> Option<String> {
        (self.stage == SendStage::Success).then(|| {
            format!(
                "You successfully sent {} USDC to {}",
                self.amount.trim(),
                truncate_address(self.recipient.trim())
            )
        })
    }

    /// Acknowledge a successful send: reset to a fresh form and ask the
    /// host to refresh account data.
    pub fn dismiss(&mut self) -> Result<(), FlowError> {
        self.require(SendStage::Success, "dismiss")?;
        self.stage = SendStage::Input;
        self.recipient.clear();
        self.amount.clear();
        self.error = None;
        emit(
            &self.events,
            FlowEvent::DataRefreshRequested {
                source: FlowKind::Send,
            },
        );
        Ok(())
    }

    /// Discard the flow. Nothing is committed or kept.
    pub fn close(self) {
        debug!(stage = self.stage.as_str(), "Send flow closed");
    }

    fn require(&self, stage: SendStage, action: &'static str) -> Result<(), FlowError> {
        if self.stage != stage {
            return Err(FlowError::InvalidTransition {
                stage: self.stage.as_str(),
                action,
            });
        }
        Ok(())
    }
}
