//! QR scanner capability.
//!
//! The camera and QR decoder are external. An implementation hands out a
//! [`ScanSession`] per activation; the session releases the camera when it
//! is dropped, so leaving the scanning stage by any path frees it.

use tokio::sync::mpsc;

/// Something the decoder reported while active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    /// Text decoded from a QR code (e.g. a UPI id or `upi://pay?...` URI).
    Decoded(String),
    /// The decoder failed; the session is no longer useful.
    Failed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("camera unavailable: {0}")]
    Unavailable(String),
}

/// Camera + QR decoder.
pub trait QrScanner: Send + Sync {
    /// Acquire the camera and start decoding.
    fn activate(&self) -> Result<ScanSession, ScanError>;
}

type ReleaseHook = Box<dyn FnOnce() + Send>;

/// An active scanner. Dropping it releases the camera exactly once.
pub struct ScanSession {
    events: mpsc::Receiver<ScanEvent>,
    release: Option<ReleaseHook>,
}

impl ScanSession {
    pub fn new(events: mpsc::Receiver<ScanEvent>, release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            events,
            release: Some(Box::new(release)),
        }
    }

    /// Next decoder event, or `None` once the decoder stops reporting.
    pub async fn next_event(&mut self) -> Option<ScanEvent> {
        self.events.recv().await
    }
}

impl std::fmt::Debug for ScanSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanSession")
            .field("released", &self.release.is_none())
            .finish()
    }
}

impl Drop for ScanSession {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            tracing::debug!("Releasing QR scanner");
            release();
        }
    }
}

/// Extract the payee address from decoded QR text.
///
/// Accepts a bare UPI id or a `upi://pay?pa=<id>&...` payment URI.
pub fn payee_from_qr(text: &str) -> Option<String> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    match url::Url::parse(text) {
        Ok(uri) if uri.scheme().eq_ignore_ascii_case("upi") => uri
            .query_pairs()
            .find(|(key, _)| key == "pa")
            .map(|(_, value)| value.trim().to_owned())
            .filter(|value| !value.is_empty()),
        _ => Some(text.to_owned()),
    }
}
