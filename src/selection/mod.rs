//! Selection reconciliation and the toggle early exit

mod reconcile;

pub use reconcile::{reconcile, removal_only, Reconciliation};
