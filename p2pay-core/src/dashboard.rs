//! Account view: wallet address, balance and transaction history.
//!
//! The backend is authoritative for all of it. [`Dashboard`] keeps the last
//! fetched values in a `watch` channel and re-fetches whenever a flow asks
//! for it through [`FlowEvent::DataRefreshRequested`].

use kanau::processor::Processor;
use p2pay_sdk::client::ClientError;
use p2pay_sdk::objects::{BalanceQuery, BalanceResponse, HistoryEntry, HistoryQuery};
use rust_decimal::{Decimal, RoundingStrategy};
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::events::{FlowEvent, FlowEventReceiver};
use crate::session::Session;

/// Symbol shown until the backend reports one.
pub const DEFAULT_SYMBOL: &str = "ETH";

/// Decimal places shown for the balance.
pub const BALANCE_DISPLAY_DP: u32 = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSnapshot {
    pub address: String,
    pub balance: Option<Decimal>,
    pub symbol: String,
    /// Newest first, as returned by the backend.
    pub history: Vec<HistoryEntry>,
}

impl AccountSnapshot {
    fn from_session(session: &Session) -> Self {
        Self {
            address: session.wallet_address().to_owned(),
            balance: session.initial_balance(),
            symbol: DEFAULT_SYMBOL.to_owned(),
            history: Vec::new(),
        }
    }

    /// Balance with exactly four decimal places, `0.00` before anything is
    /// known.
    pub fn balance_display(&self) -> String {
        match self.balance {
            Some(balance) => format_balance(balance),
            None => "0.00".to_owned(),
        }
    }
}

fn format_balance(balance: Decimal) -> String {
    let mut rounded =
        balance.round_dp_with_strategy(BALANCE_DISPLAY_DP, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(BALANCE_DISPLAY_DP);
    rounded.to_string()
}

/// Which parts of the snapshot a refresh managed to update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshOutcome {
    pub balance: bool,
    pub history: bool,
}

pub struct Dashboard<B> {
    backend: B,
    session: Session,
    snapshot: watch::Sender<AccountSnapshot>,
}

impl<B> Dashboard<B>
where
    B: Processor<BalanceQuery, Output = BalanceResponse, Error = ClientError>
        + Processor<HistoryQuery, Output = Vec<HistoryEntry>, Error = ClientError>,
{
    pub fn new(backend: B, session: Session) -> Self {
        let (snapshot, _) = watch::channel(AccountSnapshot::from_session(&session));
        Self {
            backend,
            session,
            snapshot,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Address to show on the receive screen.
    pub fn receive_address(&self) -> String {
        self.snapshot.borrow().address.clone()
    }

    pub fn snapshot(&self) -> AccountSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AccountSnapshot> {
        self.snapshot.subscribe()
    }

    /// Re-fetch balance and history. A failed fetch is logged and leaves
    /// the previous values in place.
    pub async fn refresh(&self) -> RefreshOutcome {
        let uid = self.session.uid().clone();
        let mut outcome = RefreshOutcome::default();

        match Processor::<BalanceQuery>::process(&self.backend, BalanceQuery { uid: uid.clone() })
            .await
        {
            Ok(response) => {
                debug!(balance = %response.balance, symbol = %response.symbol, "Balance fetched");
                self.snapshot.send_modify(|snapshot| {
                    if !response.address.is_empty() {
                        snapshot.address = response.address;
                    }
                    snapshot.balance = Some(response.balance);
                    if !response.symbol.is_empty() {
                        snapshot.symbol = response.symbol;
                    }
                });
                outcome.balance = true;
            }
            Err(e) => error!(uid = %uid, error = %e, "Failed to fetch balance"),
        }

        match Processor::<HistoryQuery>::process(&self.backend, HistoryQuery { uid: uid.clone() })
            .await
        {
            Ok(history) => {
                debug!(entries = history.len(), "History fetched");
                self.snapshot.send_modify(|snapshot| snapshot.history = history);
                outcome.history = true;
            }
            Err(e) => error!(uid = %uid, error = %e, "Failed to fetch history"),
        }

        outcome
    }

    /// Refresh once, then again on every refresh request, until shutdown
    /// is signalled or every event sender is gone.
    pub async fn run(self, mut events: FlowEventReceiver, mut shutdown_rx: watch::Receiver<bool>) {
        self.refresh().await;

        loop {
            tokio::select! {
                biased;

                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!("Dashboard received shutdown signal");
                        break;
                    }
                }

                event = events.recv() => match event {
                    Some(FlowEvent::DataRefreshRequested { source }) => {
                        info!(%source, "Refreshing account data");
                        self.refresh().await;
                    }
                    None => {
                        info!("Flow event channel closed");
                        break;
                    }
                },
            }
        }

        info!("Dashboard stopped");
    }
}
