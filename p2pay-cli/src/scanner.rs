//! QR "scanner" that reads decoded QR text from stdin, one line per code.
//!
//! Pair it with any external decoder, e.g. `zbarcam --raw | p2pay pay --scan`.

use p2pay_core::scanner::{QrScanner, ScanError, ScanEvent, ScanSession};
use tokio::sync::mpsc;

pub struct StdinScanner;

impl QrScanner for StdinScanner {
    fn activate(&self) -> Result<ScanSession, ScanError> {
        let (tx, rx) = mpsc::channel(4);
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| ScanError::Unavailable(e.to_string()))?;

        // Stops after the first non-blank line so later prompts still get
        // their own input.
        handle.spawn_blocking(move || {
            let stdin = std::io::stdin();
            loop {
                let mut line = String::new();
                let event = match stdin.read_line(&mut line) {
                    Ok(0) => break,
                    Ok(_) => ScanEvent::Decoded(line.trim().to_owned()),
                    Err(e) => ScanEvent::Failed(e.to_string()),
                };
                let done = !matches!(&event, ScanEvent::Decoded(text) if text.is_empty());
                if tx.blocking_send(event).is_err() || done {
                    break;
                }
            }
        });

        Ok(ScanSession::new(rx, || tracing::debug!("Stdin scanner released")))
    }
}
