//! Bounded pool of reusable cancellation tokens

use super::cancel::CancellationToken;
use std::sync::{Mutex, PoisonError};

/// Default number of idle tokens kept for reuse.
pub const DEFAULT_POOL_CAPACITY: usize = 8;

/// Lends cancellation tokens out and takes them back after a run.
///
/// A returned token is only kept if nothing else still holds a clone of
/// it; otherwise a late `cancel()` from the old holder could abort the
/// next borrower.
#[derive(Debug)]
pub struct TokenPool {
    idle: Mutex<Vec<CancellationToken>>,
    capacity: usize,
}

impl TokenPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            idle: Mutex::new(Vec::with_capacity(capacity)),
            capacity,
        }
    }

    /// Borrow a fresh (uncancelled) token.
    pub fn acquire(&self) -> CancellationToken {
        let pooled = self
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop();
        match pooled {
            Some(token) => {
                token.reset();
                token
            }
            None => CancellationToken::new(),
        }
    }

    /// Return a token after its run completed or was cancelled.
    pub fn release(&self, token: CancellationToken) {
        if !token.is_unshared() {
            return;
        }
        let mut idle = self.idle.lock().unwrap_or_else(PoisonError::into_inner);
        if idle.len() < self.capacity {
            idle.push(token);
        }
    }

    /// Number of idle tokens.
    pub fn idle_count(&self) -> usize {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl Default for TokenPool {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_CAPACITY)
    }
}
