//! Section inference
//!
//! Suggests a section label for a new annotation from the outline index. The
//! result is only a default: the UI always lets the reviewer type their own.

use serde::{Deserialize, Serialize};

use super::types::OutlineEntry;

/// How an intra-page position picks among a page's own bookmarks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionStrategy {
    /// Split the page into equal bands, one per on-page entry
    #[default]
    Bands,
    /// Use each entry's own vertical offset when every on-page entry has one
    Offsets,
}

impl SectionStrategy {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "bands" => Some(Self::Bands),
            "offsets" => Some(Self::Offsets),
            _ => None,
        }
    }
}

/// Outline entries surrounding a page
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageEntries<'a> {
    /// Last entry on an earlier page
    pub previous: Option<&'a OutlineEntry>,
    /// Entries on the page itself, in index order
    pub on_page: Vec<&'a OutlineEntry>,
}

/// Split a page-sorted index around `page_number`.
pub fn nearest_preceding_entries(index: &[OutlineEntry], page_number: u32) -> PageEntries<'_> {
    let split = index.partition_point(|entry| entry.page_number < page_number);
    PageEntries {
        previous: index[..split].last(),
        on_page: index[split..]
            .iter()
            .take_while(|entry| entry.page_number == page_number)
            .collect(),
    }
}

/// Suggest a section label using equal page bands.
pub fn guess_section(index: &[OutlineEntry], page_number: u32, y_normalized: Option<f64>) -> String {
    guess_section_with(index, page_number, y_normalized, SectionStrategy::Bands)
}

/// Suggest a section label for a position on `page_number`.
///
/// `y_normalized` is the position's top edge as a page fraction (0.0 = top).
pub fn guess_section_with(
    index: &[OutlineEntry],
    page_number: u32,
    y_normalized: Option<f64>,
    strategy: SectionStrategy,
) -> String {
    let PageEntries { previous, on_page } = nearest_preceding_entries(index, page_number);

    let Some(first) = on_page.first() else {
        return previous.map(|entry| entry.title.clone()).unwrap_or_default();
    };
    let Some(y) = y_normalized.filter(|y| y.is_finite()) else {
        return first.title.clone();
    };

    if strategy == SectionStrategy::Offsets {
        if let Some(title) = by_offsets(&on_page, previous, y) {
            return title;
        }
    }

    on_page[band_index(y, on_page.len())].title.clone()
}

fn band_index(y: f64, bands: usize) -> usize {
    let last = bands.saturating_sub(1) as f64;
    (y * bands as f64).floor().clamp(0.0, last) as usize
}

fn by_offsets(on_page: &[&OutlineEntry], previous: Option<&OutlineEntry>, y: f64) -> Option<String> {
    let offsets: Option<Vec<f64>> = on_page.iter().map(|e| e.y_normalized_from_top).collect();
    let offsets = offsets?;

    let chosen = on_page
        .iter()
        .zip(offsets)
        .filter(|(_, offset)| *offset <= y)
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(entry, _)| *entry);

    match chosen {
        Some(entry) => Some(entry.title.clone()),
        None => Some(previous.unwrap_or(on_page[0]).title.clone()),
    }
}
