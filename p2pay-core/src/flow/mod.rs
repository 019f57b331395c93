//! Payment flow controllers.
//!
//! - [`send::SendFlow`]: `Input -> Confirming -> {Success | Input with error}`
//! - [`scan_pay::ScanPayFlow`]: `Input -> Scanning -> Input -> Review ->
//!   Processing -> {Success | Failed}`, with `Failed -> Review` on retry
//!
//! A flow instance lives exactly as long as the modal that hosts it. All
//! methods take `&mut self`, so a flow can never have two outbound
//! requests in flight at once. Dropping a `submit`/`pay` future before it
//! settles leaves the flow in its error stage with a network error.

pub mod debounce;
pub mod quote;
pub mod scan_pay;
pub mod send;

pub use debounce::DelayedTask;
pub use quote::{Quote, QuoteOutcome, QuoteRefresher, QuoteSource};
pub use scan_pay::{ScanPayFlow, ScanPayStage};
pub use send::{SendFlow, SendStage};

use std::time::Duration;

use p2pay_sdk::client::NETWORK_ERROR_MESSAGE;
use tracing::warn;

use crate::scanner::ScanError;

/// Quote refresh delay after the last amount change.
pub const DEFAULT_QUOTE_DEBOUNCE: Duration = Duration::from_millis(500);

/// Shown when a flow is submitted without a signed-in user.
pub const NOT_LOGGED_IN_MESSAGE: &str = "Not logged in";

/// Tunables shared by the flow controllers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowOptions {
    /// Inactivity window before a quote refresh is issued.
    pub quote_debounce: Duration,
}

impl Default for FlowOptions {
    fn default() -> Self {
        Self {
            quote_debounce: DEFAULT_QUOTE_DEBOUNCE,
        }
    }
}

/// Errors returned for actions a flow refuses to take.
///
/// Backend failures are not errors at this level: they move the flow into
/// an error-carrying stage instead.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    /// A required field is empty. No request was sent.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// The action is not available in the current stage.
    #[error("cannot {action} while {stage}")]
    InvalidTransition {
        stage: &'static str,
        action: &'static str,
    },

    /// The QR scanner could not be activated.
    #[error("scanner error: {0}")]
    Scanner(#[from] ScanError),
}

pub(crate) fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Marks a flow's backend request as in flight.
///
/// If the guard is dropped without [`settle`](Self::settle), the request
/// future was cancelled: the flow moves to `cancelled` with
/// [`NETWORK_ERROR_MESSAGE`].
pub(crate) struct InFlight<'a, S: Copy> {
    stage: &'a mut S,
    error: &'a mut Option<String>,
    cancelled: S,
    settled: bool,
}

impl<'a, S: Copy> InFlight<'a, S> {
    pub(crate) fn begin(
        stage: &'a mut S,
        error: &'a mut Option<String>,
        in_flight: S,
        cancelled: S,
    ) -> Self {
        *stage = in_flight;
        *error = None;
        Self {
            stage,
            error,
            cancelled,
            settled: false,
        }
    }

    pub(crate) fn settle(mut self, stage: S, error: Option<String>) {
        *self.stage = stage;
        *self.error = error;
        self.settled = true;
    }
}

impl<S: Copy> Drop for InFlight<'_, S> {
    fn drop(&mut self) {
        if !self.settled {
            warn!("Request cancelled before the backend answered");
            *self.stage = self.cancelled;
            *self.error = Some(NETWORK_ERROR_MESSAGE.to_owned());
        }
    }
}
