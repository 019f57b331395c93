//! Events emitted by flows to the hosting page.
//!
//! A finished payment does not reload anything by itself. The flow emits
//! `DataRefreshRequested` and whoever owns the account view (see
//! [`crate::dashboard::Dashboard::run`]) re-fetches balance and history.

pub mod channels;
pub mod types;

pub use channels::{DEFAULT_CHANNEL_BUFFER, FlowEventReceiver, FlowEventSender, flow_event_channel};
pub use types::{FlowEvent, FlowKind};
