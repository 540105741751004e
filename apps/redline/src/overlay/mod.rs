//! Highlight overlay
//!
//! Projects stored annotation positions onto rendered pages, tracks the draft
//! annotation and resolves pointer positions to annotation ids.

mod cell;
mod engine;
mod frame;
mod hover;
mod types;

pub use cell::LatestCell;
pub use engine::OverlayEngine;
pub use frame::{RecomputeReason, RecomputeRequest, RecomputeScheduler};
pub use hover::{HoverChange, HoverDebouncer};
pub use types::{
    DraftOverlay, DraftProposal, DraftSubmission, OverlayFilter, OverlayRect, OverlaySnapshot,
    ReviewState,
};
