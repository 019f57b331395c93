//! Lifecycle of the anti-abuse verifier the identity provider requires
//! before it will send a code.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifierState<V> {
    Uninitialized,
    Ready(V),
    /// The provider invalidated the verifier; the next use re-creates it.
    Expired,
}

/// Holds at most one verifier and re-creates it lazily.
#[derive(Debug)]
pub struct VerifierSlot<V> {
    verifier: Option<V>,
    expired: bool,
}

impl<V> Default for VerifierSlot<V> {
    fn default() -> Self {
        Self {
            verifier: None,
            expired: false,
        }
    }
}

impl<V> VerifierSlot<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// The ready verifier, creating it with `init` first if the slot is
    /// empty or expired. A failed `init` leaves the slot unchanged.
    pub fn get_or_init<E>(&mut self, init: impl FnOnce() -> Result<V, E>) -> Result<&V, E> {
        let verifier = match self.verifier.take() {
            Some(verifier) => verifier,
            None => init()?,
        };
        self.expired = false;
        Ok(self.verifier.insert(verifier))
    }

    pub fn mark_expired(&mut self) {
        if self.verifier.take().is_some() {
            tracing::debug!("Verifier expired");
            self.expired = true;
        }
    }

    pub fn reset(&mut self) {
        self.verifier = None;
        self.expired = false;
    }

    pub fn state(&self) -> VerifierState<&V> {
        match (&self.verifier, self.expired) {
            (Some(verifier), _) => VerifierState::Ready(verifier),
            (None, true) => VerifierState::Expired,
            (None, false) => VerifierState::Uninitialized,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.verifier.is_some()
    }
}
