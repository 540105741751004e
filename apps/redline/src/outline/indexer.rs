//! Outline flattening
//!
//! The tree is walked with an explicit work stack of `(node, level)` pairs so
//! pathological nesting cannot exhaust the call stack. Each destination is
//! resolved independently: a corrupt bookmark is logged and dropped while the
//! rest of the outline is still indexed.

use async_trait::async_trait;

use super::types::{OutlineDest, OutlineEntry, OutlineIndex, OutlineNode, PageRef, RawDestination};
use crate::error::OutlineError;

/// Destination lookups provided by the rendering surface
#[async_trait]
pub trait DestinationResolver: Send + Sync {
    /// Resolve a named or inline destination to an explicit destination array
    async fn resolve_destination(&self, dest: &OutlineDest) -> Result<RawDestination, OutlineError>;

    /// Zero-based index of the referenced page
    async fn page_index(&self, page_ref: &PageRef) -> Result<u32, OutlineError>;

    /// Unscaled page height in PDF units
    async fn page_height(&self, page_index: u32) -> Result<f64, OutlineError>;
}

/// Convert a bottom-up PDF coordinate into a top-down page fraction
pub fn normalize_from_bottom(raw: f64, page_height: f64) -> f64 {
    1.0 - (raw / page_height).clamp(0.0, 1.0)
}

/// Flatten an outline tree into a page-sorted index.
///
/// Entries keep document reading order (a node precedes its children) except
/// for the final stable sort by page number. The index is returned only once
/// every node has been visited.
pub async fn build_index(roots: &[OutlineNode], resolver: &dyn DestinationResolver) -> OutlineIndex {
    let mut entries = Vec::new();
    let mut dropped = 0usize;
    let mut stack: Vec<(&OutlineNode, u32)> = roots.iter().rev().map(|node| (node, 0)).collect();

    while let Some((node, level)) = stack.pop() {
        if let Some(dest) = &node.dest {
            match resolve_entry(node, dest, level, resolver).await {
                Ok(entry) => entries.push(entry),
                Err(err) => {
                    dropped += 1;
                    tracing::warn!(
                        title = %node.title,
                        level,
                        destination = %dest,
                        error = %err,
                        "Dropping unresolvable outline entry"
                    );
                }
            }
        }

        stack.extend(node.children.iter().rev().map(|child| (child, level + 1)));
    }

    tracing::debug!(entries = entries.len(), dropped, "Outline index built");
    OutlineIndex::new(entries)
}

async fn resolve_entry(
    node: &OutlineNode,
    dest: &OutlineDest,
    level: u32,
    resolver: &dyn DestinationResolver,
) -> Result<OutlineEntry, OutlineError> {
    let explicit = resolver.resolve_destination(dest).await?;
    let page_index = resolver.page_index(&explicit.page_ref).await?;
    let page_number = page_index
        .checked_add(1)
        .ok_or_else(|| OutlineError::InvalidPageRef(explicit.page_ref.to_string()))?;

    let y_normalized_from_top = match explicit.vertical_coordinate().filter(|v| v.is_finite()) {
        Some(raw) => match resolver.page_height(page_index).await {
            Ok(height) if height.is_finite() && height > 0.0 => Some(normalize_from_bottom(raw, height)),
            Ok(height) => {
                tracing::debug!(page_index, height, "Unusable page height, keeping entry without offset");
                None
            }
            Err(err) => {
                tracing::debug!(page_index, error = %err, "Page height unavailable, keeping entry without offset");
                None
            }
        },
        None => None,
    };

    Ok(OutlineEntry {
        title: node.title.trim().to_string(),
        page_number,
        y_normalized_from_top,
        level,
    })
}
