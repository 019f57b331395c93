//! Event channel factory and handles.

use super::types::FlowEvent;
use tokio::sync::mpsc;

/// Default buffer size for the flow event channel.
///
/// Events are only emitted on user dismissal, so a small buffer suffices.
pub const DEFAULT_CHANNEL_BUFFER: usize = 16;

/// Sender handle for FlowEvent events.
pub type FlowEventSender = mpsc::Sender<FlowEvent>;
/// Receiver handle for FlowEvent events.
pub type FlowEventReceiver = mpsc::Receiver<FlowEvent>;

/// Create a new FlowEvent channel.
///
/// Clone the sender into every flow opened from the same page.
pub fn flow_event_channel() -> (FlowEventSender, FlowEventReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_BUFFER)
}

/// Emit an event without blocking the caller.
///
/// A full or closed channel only means nobody is listening for refreshes
/// right now, which is not an error for the flow.
pub(crate) fn emit(sender: &FlowEventSender, event: FlowEvent) {
    if let Err(e) = sender.try_send(event) {
        tracing::debug!(error = %e, "Flow event dropped");
    }
}
