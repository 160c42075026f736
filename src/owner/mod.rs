//! Owner identity, deduplication, and privacy-aware formatting
//!
//! Both halves are pure functions with no I/O, callable independently of
//! the pipeline.

mod format;
mod identity;

pub use format::{
    format_owner_info, mask_address, mask_name, MASK_TOKEN, MAX_ASTERISKS, MIN_MASK_LENGTH,
};
pub use identity::{dedupe, identity_key, IdentityContext};
