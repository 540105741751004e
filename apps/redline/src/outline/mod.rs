//! PDF outline (bookmark) indexing
//!
//! Flattens a document's outline tree into a page-sorted index and infers a
//! default section label for new annotations from it.

mod indexer;
mod section;
mod types;

pub use indexer::{build_index, normalize_from_bottom, DestinationResolver};
pub use section::{
    guess_section, guess_section_with, nearest_preceding_entries, PageEntries, SectionStrategy,
};
pub use types::{
    DestinationKind, OutlineDest, OutlineEntry, OutlineIndex, OutlineNode, PageRef, RawDestination,
};
