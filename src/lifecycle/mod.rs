//! Request lifecycle: pooled cancellation tokens and stale-request detection

mod cancel;
mod pool;
mod tracker;

pub use cancel::CancellationToken;
pub use pool::{TokenPool, DEFAULT_POOL_CAPACITY};
pub use tracker::{Interrupted, RequestToken, RequestTracker};
