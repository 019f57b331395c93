//! Debounced INR → USDC quote refresh.
//!
//! Every amount change calls [`QuoteRefresher::schedule`], which replaces
//! the outstanding refresh. Replacing it aborts the old task (waiting or
//! mid-request) and drops its result slot, so only the most recently
//! scheduled refresh can ever deliver a quote.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use p2pay_sdk::client::ClientError;
use p2pay_sdk::objects::{QuoteRequest, QuoteResponse};
use rust_decimal::Decimal;
use tokio::sync::oneshot;
use tracing::debug;

use super::debounce::DelayedTask;

/// Something that can price an INR amount in USDC.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn quote(&self, request: QuoteRequest) -> Result<QuoteResponse, ClientError>;
}

/// A priced conversion as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub amount_inr: String,
    pub amount_usdc: Decimal,
    /// INR per USDC.
    pub rate: Decimal,
}

impl Quote {
    /// Rate shown before the first quote arrives.
    pub fn fallback_rate() -> Decimal {
        Decimal::new(885, 1)
    }

    /// What is displayed before any quote arrives: `0.00` USDC at the
    /// fallback rate.
    pub fn placeholder() -> Self {
        Self {
            amount_inr: String::new(),
            amount_usdc: Decimal::new(0, 2),
            rate: Self::fallback_rate(),
        }
    }

    pub fn from_response(amount_inr: String, response: QuoteResponse) -> Self {
        Self {
            amount_inr,
            amount_usdc: response.amount_usdc,
            rate: response.rate,
        }
    }
}

/// Result of one refresh.
#[derive(Debug)]
pub struct QuoteOutcome {
    pub generation: u64,
    pub amount_inr: String,
    pub result: Result<QuoteResponse, ClientError>,
}

struct PendingRefresh {
    generation: u64,
    // Held only so that dropping the slot aborts the task.
    _task: DelayedTask,
    outcome: oneshot::Receiver<QuoteOutcome>,
}

/// Owns at most one outstanding quote refresh.
pub struct QuoteRefresher {
    source: Arc<dyn QuoteSource>,
    delay: Duration,
    generation: u64,
    pending: Option<PendingRefresh>,
}

impl QuoteRefresher {
    pub fn new(source: Arc<dyn QuoteSource>, delay: Duration) -> Self {
        Self {
            source,
            delay,
            generation: 0,
            pending: None,
        }
    }

    /// Schedule a refresh for `amount_inr`, superseding any outstanding one.
    ///
    /// Returns the generation number of the new refresh.
    pub fn schedule(&mut self, amount_inr: String) -> u64 {
        self.generation += 1;
        let generation = self.generation;
        let source = self.source.clone();
        let (tx, rx) = oneshot::channel();

        let task = DelayedTask::schedule(self.delay, async move {
            debug!(generation, amount_inr = %amount_inr, "Fetching quote");
            let result = source
                .quote(QuoteRequest {
                    amount_inr: amount_inr.clone(),
                })
                .await;
            let _ = tx.send(QuoteOutcome {
                generation,
                amount_inr,
                result,
            });
        });

        if let Some(old) = self.pending.replace(PendingRefresh {
            generation,
            _task: task,
            outcome: rx,
        }) {
            debug!(superseded = old.generation, generation, "Quote refresh superseded");
        }
        generation
    }

    /// Cancel the outstanding refresh, if any. Nothing scheduled before
    /// this call will be delivered.
    pub fn invalidate(&mut self) {
        self.generation += 1;
        if let Some(old) = self.pending.take() {
            debug!(generation = old.generation, "Quote refresh cancelled");
        }
    }

    /// Generation of the most recent `schedule` or `invalidate`.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Wait for the outstanding refresh to deliver.
    ///
    /// Returns `None` immediately when nothing is outstanding, or when the
    /// refresh task ended without reporting.
    pub async fn recv(&mut self) -> Option<QuoteOutcome> {
        let pending = self.pending.as_mut()?;
        let outcome = (&mut pending.outcome).await.ok();
        self.pending = None;
        outcome
    }

    /// Take the outstanding refresh's result if it has already arrived.
    pub fn try_recv(&mut self) -> Option<QuoteOutcome> {
        let pending = self.pending.as_mut()?;
        match pending.outcome.try_recv() {
            Ok(outcome) => {
                self.pending = None;
                Some(outcome)
            }
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => {
                self.pending = None;
                None
            }
        }
    }
}
