//! Scroll-to-annotation reconciliation

mod reconciler;

pub use reconciler::{RetryPolicy, ScrollOutcome, ScrollReconciler};
