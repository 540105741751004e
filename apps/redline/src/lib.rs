//! Redline
//!
//! PDF annotation positioning and reconciliation for document review.
//!
//! # Modules
//!
//! - `geometry`: Pixel <-> percentage rectangle conversion
//! - `outline`: Outline flattening and section inference
//! - `overlay`: Highlight overlay, draft state machine and hit-testing
//! - `scroll`: Scroll-to-annotation against a lazily rendered viewer
//! - `session`: One document view wiring everything together
//! - `store`: Annotation persistence (in-memory and SQLite)

pub mod annotations;
pub mod config;
pub mod error;
pub mod events;
pub mod geometry;
pub mod outline;
pub mod overlay;
pub mod scroll;
pub mod session;
pub mod store;
pub mod surface;

pub use config::Config;
pub use error::{GeometryError, OutlineError, Result, ReviewError, StoreError};
pub use session::ReviewSession;
