//! Event type definitions.

/// Which flow produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowKind {
    Send,
    ScanPay,
}

impl std::fmt::Display for FlowKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlowKind::Send => write!(f, "send"),
            FlowKind::ScanPay => write!(f, "scan-pay"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowEvent {
    /// A payment completed and was dismissed; authoritative account data
    /// (balance, history) is stale and should be re-fetched.
    DataRefreshRequested { source: FlowKind },
}
