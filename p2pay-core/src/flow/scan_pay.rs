//! Scan-and-pay: pay a merchant's UPI id in INR, settled from the user's
//! USDC balance at a live quote.
//!
//! ```text
//! Input --start_scan--> Scanning --decode/fail/cancel--> Input
//! Input --continue_to_review--> Review --pay--> Processing --ok--> Success
//!                                 ^                  |
//!                                 +------retry------ Failed <--error/cancel--+
//! ```

use std::sync::Arc;

use kanau::processor::Processor;
use p2pay_sdk::client::ClientError;
use p2pay_sdk::objects::{PayRequest, PayResponse, UserId};
use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

use super::quote::{Quote, QuoteOutcome, QuoteRefresher, QuoteSource};
use super::{FlowError, FlowOptions, InFlight, NOT_LOGGED_IN_MESSAGE, is_blank};
use crate::events::channels::emit;
use crate::events::{FlowEvent, FlowEventSender, FlowKind};
use crate::scanner::{QrScanner, ScanEvent, ScanSession, payee_from_qr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanPayStage {
    Input,
    /// The camera is live. Only a decode, a decoder failure or a cancel
    /// leaves this stage.
    Scanning,
    /// Fields and quote are frozen for confirmation.
    Review,
    Processing,
    Success,
    /// Terminal until retried; fields cannot be edited.
    Failed,
}

impl ScanPayStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanPayStage::Input => "input",
            ScanPayStage::Scanning => "scanning",
            ScanPayStage::Review => "review",
            ScanPayStage::Processing => "processing",
            ScanPayStage::Success => "success",
            ScanPayStage::Failed => "failed",
        }
    }
}

/// State machine behind the "Scan & Pay" modal.
pub struct ScanPayFlow<B> {
    backend: B,
    uid: UserId,
    events: FlowEventSender,
    scanner: Arc<dyn QrScanner>,
    quotes: QuoteRefresher,
    session: Option<ScanSession>,
    stage: ScanPayStage,
    merchant: String,
    amount_inr: String,
    quote: Quote,
    new_balance: Option<Decimal>,
    error: Option<String>,
}

impl<B> ScanPayFlow<B>
where
    B: Processor<PayRequest, Output = PayResponse, Error = ClientError>,
{
    pub fn new(
        backend: B,
        quotes: Arc<dyn QuoteSource>,
        scanner: Arc<dyn QrScanner>,
        uid: UserId,
        options: FlowOptions,
        events: FlowEventSender,
    ) -> Self {
        Self {
            backend,
            uid,
            events,
            scanner,
            quotes: QuoteRefresher::new(quotes, options.quote_debounce),
            session: None,
            stage: ScanPayStage::Input,
            merchant: String::new(),
            amount_inr: String::new(),
            quote: Quote::placeholder(),
            new_balance: None,
            error: None,
        }
    }

    pub fn stage(&self) -> ScanPayStage {
        self.stage
    }

    /// Merchant UPI id.
    pub fn merchant(&self) -> &str {
        &self.merchant
    }

    pub fn amount_inr(&self) -> &str {
        &self.amount_inr
    }

    /// The quote currently displayed. Frozen once the flow enters review.
    pub fn quote(&self) -> &Quote {
        &self.quote
    }

    pub fn amount_usdc(&self) -> Decimal {
        self.quote.amount_usdc
    }

    pub fn rate(&self) -> Decimal {
        self.quote.rate
    }

    /// Balance the backend reported after a successful payment.
    pub fn new_balance(&self) -> Option<Decimal> {
        self.new_balance
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_scanner_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn set_merchant(&mut self, merchant: impl Into<String>) -> Result<(), FlowError> {
        self.require(ScanPayStage::Input, "edit merchant")?;
        self.merchant = merchant.into();
        Ok(())
    }

    /// Update the INR amount and reschedule the quote refresh.
    ///
    /// An empty amount cancels any outstanding refresh and shows `0.00`
    /// without a request.
    pub fn set_amount_inr(&mut self, amount: impl Into<String>) -> Result<(), FlowError> {
        self.require(ScanPayStage::Input, "edit amount")?;
        self.amount_inr = amount.into();

        if is_blank(&self.amount_inr) {
            self.quotes.invalidate();
            self.quote = Quote {
                amount_inr: String::new(),
                amount_usdc: Quote::placeholder().amount_usdc,
                rate: self.quote.rate,
            };
        } else {
            self.quotes.schedule(self.amount_inr.trim().to_owned());
        }
        Ok(())
    }

    /// Apply a quote that has already arrived, without waiting.
    ///
    /// Returns `true` when the displayed quote changed.
    pub fn poll_quotes(&mut self) -> bool {
        match self.quotes.try_recv() {
            Some(outcome) => self.apply_quote(outcome),
            None => false,
        }
    }

    /// Wait for the outstanding quote refresh, if any, and apply it.
    ///
    /// Returns `true` when the displayed quote changed.
    pub async fn wait_for_quote(&mut self) -> bool {
        match self.quotes.recv().await {
            Some(outcome) => self.apply_quote(outcome),
            None => false,
        }
    }

    fn apply_quote(&mut self, outcome: QuoteOutcome) -> bool {
        if outcome.generation != self.quotes.generation() {
            debug!(
                generation = outcome.generation,
                current = self.quotes.generation(),
                "Discarding stale quote"
            );
            return false;
        }
        match outcome.result {
            Ok(response) => {
                debug!(amount_inr = %outcome.amount_inr, amount_usdc = %response.amount_usdc, rate = %response.rate, "Quote updated");
                self.quote = Quote::from_response(outcome.amount_inr, response);
                true
            }
            Err(e) => {
                warn!(amount_inr = %outcome.amount_inr, error = %e, "Quote refresh failed, keeping previous quote");
                false
            }
        }
    }

    /// Activate the camera.
    pub fn start_scan(&mut self) -> Result<(), FlowError> {
        self.require(ScanPayStage::Input, "start scanning")?;
        let session = self.scanner.activate()?;
        self.session = Some(session);
        self.stage = ScanPayStage::Scanning;
        info!("QR scanner activated");
        Ok(())
    }

    /// Wait for the scanner to produce a payee.
    ///
    /// A decode writes the merchant; a decoder failure leaves it untouched.
    /// Either way the camera is released and the flow returns to `Input`.
    /// Blank decodes are skipped while the camera keeps looking.
    pub async fn next_scan_event(&mut self) -> Result<ScanPayStage, FlowError> {
        self.require(ScanPayStage::Scanning, "read scanner")?;
        loop {
            let event = match self.session.as_mut() {
                Some(session) => session.next_event().await,
                None => None,
            };
            match event {
                Some(ScanEvent::Decoded(text)) => match payee_from_qr(&text) {
                    Some(payee) => {
                        info!(merchant = %payee, "QR code decoded");
                        self.merchant = payee;
                        break;
                    }
                    None => debug!("Ignoring QR code without a payee"),
                },
                Some(ScanEvent::Failed(reason)) => {
                    warn!(reason = %reason, "QR decoding failed");
                    break;
                }
                None => {
                    warn!("QR scanner stopped reporting");
                    break;
                }
            }
        }
        self.stop_scanner();
        Ok(self.stage)
    }

    /// Close the camera without changing any field.
    pub fn cancel_scan(&mut self) -> Result<(), FlowError> {
        self.require(ScanPayStage::Scanning, "cancel scanning")?;
        self.stop_scanner();
        debug!("QR scan cancelled");
        Ok(())
    }

    fn stop_scanner(&mut self) {
        self.session = None;
        self.stage = ScanPayStage::Input;
    }

    /// Freeze merchant, amount and quote for confirmation.
    ///
    /// A refresh still waiting out its debounce or in flight is awaited
    /// first, so review shows the quote for the amount as typed whenever
    /// the quote service answers.
    pub async fn continue_to_review(&mut self) -> Result<(), FlowError> {
        self.require(ScanPayStage::Input, "review")?;
        if is_blank(&self.merchant) {
            return Err(FlowError::MissingField("merchant"));
        }
        if is_blank(&self.amount_inr) {
            return Err(FlowError::MissingField("amount"));
        }
        if self.quotes.is_pending() {
            self.wait_for_quote().await;
        }
        self.error = None;
        self.stage = ScanPayStage::Review;
        debug!(
            merchant = %self.merchant,
            amount_inr = %self.amount_inr,
            amount_usdc = %self.quote.amount_usdc,
            "Reviewing payment"
        );
        Ok(())
    }

    /// Execute the payment. Issues exactly one request.
    ///
    /// Dropping the future before it resolves leaves the flow in `Failed`
    /// with a network error. The backend may still have executed the
    /// payment, so the host should refresh the balance before retrying.
    pub async fn pay(&mut self) -> Result<ScanPayStage, FlowError> {
        self.require(ScanPayStage::Review, "pay")?;

        if self.uid.is_empty() {
            self.error = Some(NOT_LOGGED_IN_MESSAGE.to_owned());
            self.stage = ScanPayStage::Failed;
            return Ok(self.stage);
        }

        let request = PayRequest {
            uid: self.uid.clone(),
            amount_usdc: self.quote.amount_usdc.to_string(),
            amount_inr: self.amount_inr.trim().to_owned(),
            upi_id: self.merchant.trim().to_owned(),
        };
        info!(
            upi_id = %request.upi_id,
            amount_inr = %request.amount_inr,
            amount_usdc = %request.amount_usdc,
            "Submitting payment"
        );

        let in_flight = InFlight::begin(
            &mut self.stage,
            &mut self.error,
            ScanPayStage::Processing,
            ScanPayStage::Failed,
        );
        match self.backend.process(request).await {
            Ok(response) => {
                info!(new_balance = ?response.new_balance, "Payment succeeded");
                self.new_balance = response.new_balance;
                in_flight.settle(ScanPayStage::Success, None);
            }
            Err(e) => {
                error!(error = %e, "Payment failed");
                in_flight.settle(ScanPayStage::Failed, Some(e.user_message()));
            }
        }
        Ok(self.stage)
    }

    /// Return to review after a failure, fields unchanged.
    pub fn retry(&mut self) -> Result<(), FlowError> {
        self.require(ScanPayStage::Failed, "retry")?;
        self.error = None;
        self.stage = ScanPayStage::Review;
        Ok(())
    }

    /// Success text, e.g. `Successfully sent 5.65 USDC to merchant@upi`.
    pub fn summary(&self) -> Option<String> {
        (self.stage == ScanPayStage::Success).then(|| {
            format!(
                "Successfully sent {} USDC to {}",
                self.quote.amount_usdc,
                self.merchant.trim()
            )
        })
    }

    /// Remaining balance line shown on success, e.g. `42.5 USDC`.
    pub fn remaining_balance_display(&self) -> Option<String> {
        if self.stage != ScanPayStage::Success {
            return None;
        }
        self.new_balance.map(|balance| format!("{balance} USDC"))
    }

    /// Acknowledge a successful payment: reset to a fresh form and ask the
    /// host to refresh account data.
    pub fn dismiss(&mut self) -> Result<(), FlowError> {
        self.require(ScanPayStage::Success, "dismiss")?;
        self.quotes.invalidate();
        self.stage = ScanPayStage::Input;
        self.merchant.clear();
        self.amount_inr.clear();
        self.quote = Quote::placeholder();
        self.new_balance = None;
        self.error = None;
        emit(
            &self.events,
            FlowEvent::DataRefreshRequested {
                source: FlowKind::ScanPay,
            },
        );
        Ok(())
    }

    /// Discard the flow. Releases the camera and cancels any pending quote.
    pub fn close(self) {
        debug!(stage = self.stage.as_str(), "Scan-pay flow closed");
    }

    fn require(&self, stage: ScanPayStage, action: &'static str) -> Result<(), FlowError> {
        if self.stage != stage {
            return Err(FlowError::InvalidTransition {
                stage: self.stage.as_str(),
                action,
            });
        }
        Ok(())
    }
}
