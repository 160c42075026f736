//! Request ids and staleness detection
//!
//! Every pipeline invocation takes the next request id. A continuation
//! may only touch caller-visible state while its id is still the latest;
//! otherwise its result is dropped without an error.

use super::cancel::CancellationToken;
use super::pool::TokenPool;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

/// Why a run must stop before mutating anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Interrupted {
    /// A newer request superseded this one; drop silently
    #[error("request superseded by a newer one")]
    Stale,
    /// The request's token was aborted
    #[error("request cancelled")]
    Cancelled,
}

/// Identity and cancellation handle of one pipeline run.
#[derive(Debug)]
pub struct RequestToken {
    request_id: u64,
    cancellation: CancellationToken,
}

impl RequestToken {
    pub fn request_id(&self) -> u64 {
        self.request_id
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

/// Hands out request tokens and answers "is this still the latest request".
#[derive(Debug, Default)]
pub struct RequestTracker {
    latest: AtomicU64,
    pool: TokenPool,
    in_flight: Mutex<Option<(u64, CancellationToken)>>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pool_capacity(capacity: usize) -> Self {
        Self {
            pool: TokenPool::new(capacity),
            ..Self::default()
        }
    }

    /// Start a new request, aborting whichever request was in flight.
    pub fn begin(&self) -> RequestToken {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((_, previous)) = in_flight.take() {
            previous.cancel();
        }
        let request_id = self.latest.fetch_add(1, Ordering::AcqRel) + 1;
        let cancellation = self.pool.acquire();
        *in_flight = Some((request_id, cancellation.clone()));
        RequestToken {
            request_id,
            cancellation,
        }
    }

    /// Hand the token back once the run completed or was cancelled.
    pub fn finish(&self, token: RequestToken) {
        {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            if matches!(&*in_flight, Some((id, _)) if *id == token.request_id) {
                in_flight.take();
            }
        }
        self.pool.release(token.cancellation);
    }

    /// Abort the request currently in flight, if any.
    pub fn cancel_in_flight(&self) -> bool {
        let in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        match &*in_flight {
            Some((_, token)) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn latest_request_id(&self) -> u64 {
        self.latest.load(Ordering::Acquire)
    }

    pub fn is_current(&self, token: &RequestToken) -> bool {
        self.latest_request_id() == token.request_id
    }

    /// Gate for every step that issues a dependent query or mutates state.
    ///
    /// Staleness is checked first: a superseded request is also aborted,
    /// and must still be dropped silently.
    pub fn check(&self, token: &RequestToken) -> Result<(), Interrupted> {
        if !self.is_current(token) {
            return Err(Interrupted::Stale);
        }
        if token.is_cancelled() {
            return Err(Interrupted::Cancelled);
        }
        Ok(())
    }

    pub fn idle_tokens(&self) -> usize {
        self.pool.idle_count()
    }
}
