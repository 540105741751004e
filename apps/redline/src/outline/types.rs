//! Outline data types

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Indirect reference to a page object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRef {
    pub num: u32,
    pub gen: u16,
}

impl PageRef {
    pub fn new(num: u32, gen: u16) -> Self {
        Self { num, gen }
    }
}

impl fmt::Display for PageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} R", self.num, self.gen)
    }
}

/// Destination view type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DestinationKind {
    /// `[page /XYZ left top zoom]`
    Xyz,
    /// `[page /Fit]`
    Fit,
    /// `[page /FitH top]`
    FitH,
    /// `[page /FitV left]`
    FitV,
    /// `[page /FitR left bottom right top]`
    FitR,
    /// `[page /FitB]`
    FitB,
    /// `[page /FitBH top]`
    FitBH,
    /// `[page /FitBV left]`
    FitBV,
    /// Anything a producer invented
    Other(String),
}

impl DestinationKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "XYZ" => Self::Xyz,
            "Fit" => Self::Fit,
            "FitH" => Self::FitH,
            "FitV" => Self::FitV,
            "FitR" => Self::FitR,
            "FitB" => Self::FitB,
            "FitBH" => Self::FitBH,
            "FitBV" => Self::FitBV,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Explicit destination: target page, view type and the type's parameters
///
/// `args` holds the array elements after the type name. PDF `null` entries
/// are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDestination {
    pub page_ref: PageRef,
    pub kind: DestinationKind,
    pub args: Vec<Option<f64>>,
}

impl RawDestination {
    pub fn new(page_ref: PageRef, kind: DestinationKind, args: Vec<Option<f64>>) -> Self {
        Self {
            page_ref,
            kind,
            args,
        }
    }

    /// Vertical coordinate measured from the page bottom, if the type has one
    pub fn vertical_coordinate(&self) -> Option<f64> {
        let index = match self.kind {
            // [left, top, zoom]
            DestinationKind::Xyz => 1,
            // [top]
            DestinationKind::FitH | DestinationKind::FitBH => 0,
            // [left, bottom, right, top]: anchor on the bottom edge
            DestinationKind::FitR => 1,
            _ => return None,
        };
        self.args.get(index).copied().flatten()
    }
}

/// Where an outline node points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OutlineDest {
    /// Named destination, looked up in the document's name tree
    Named(String),
    /// Destination array stored inline
    Explicit(RawDestination),
}

impl fmt::Display for OutlineDest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutlineDest::Named(name) => write!(f, "named destination {:?}", name),
            OutlineDest::Explicit(dest) => write!(f, "{:?} destination on {}", dest.kind, dest.page_ref),
        }
    }
}

/// One node of the outline tree as exposed by the rendering surface
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OutlineNode {
    pub title: String,
    pub dest: Option<OutlineDest>,
    pub children: Vec<OutlineNode>,
}

impl OutlineNode {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            dest: None,
            children: Vec::new(),
        }
    }

    pub fn with_dest(mut self, dest: OutlineDest) -> Self {
        self.dest = Some(dest);
        self
    }

    pub fn with_children(mut self, children: Vec<OutlineNode>) -> Self {
        self.children = children;
        self
    }
}

/// A flattened bookmark
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlineEntry {
    pub title: String,
    /// Page number (1-indexed)
    pub page_number: u32,
    /// Vertical position (0.0 = page top), `None` when the destination type
    /// carries no offset
    pub y_normalized_from_top: Option<f64>,
    /// Nesting depth (0 = top level)
    pub level: u32,
}

impl OutlineEntry {
    pub fn new(title: &str, page_number: u32) -> Self {
        Self {
            title: title.to_string(),
            page_number,
            y_normalized_from_top: None,
            level: 0,
        }
    }

    pub fn with_offset(mut self, y_normalized_from_top: f64) -> Self {
        self.y_normalized_from_top = Some(y_normalized_from_top);
        self
    }

    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }
}

/// Page-sorted, immutable outline index for one document
///
/// Cloning shares the underlying entries.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OutlineIndex {
    entries: Arc<[OutlineEntry]>,
}

impl OutlineIndex {
    /// Build an index, sorting by page number (stable on ties)
    pub fn new(mut entries: Vec<OutlineEntry>) -> Self {
        entries.sort_by_key(|entry| entry.page_number);
        Self {
            entries: entries.into(),
        }
    }

    pub fn entries(&self) -> &[OutlineEntry] {
        &self.entries
    }
}

impl Deref for OutlineIndex {
    type Target = [OutlineEntry];

    fn deref(&self) -> &Self::Target {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertical_coordinate_by_kind() {
        let page = PageRef::new(12, 0);

        let xyz = RawDestination::new(page, DestinationKind::Xyz, vec![Some(72.0), Some(700.0), None]);
        assert_eq!(xyz.vertical_coordinate(), Some(700.0));

        let fit_h = RawDestination::new(page, DestinationKind::FitH, vec![Some(500.0)]);
        assert_eq!(fit_h.vertical_coordinate(), Some(500.0));

        let fit_bh = RawDestination::new(page, DestinationKind::FitBH, vec![Some(420.0)]);
        assert_eq!(fit_bh.vertical_coordinate(), Some(420.0));

        let fit_r = RawDestination::new(
            page,
            DestinationKind::FitR,
            vec![Some(10.0), Some(300.0), Some(200.0), Some(400.0)],
        );
        assert_eq!(fit_r.vertical_coordinate(), Some(300.0));

        let fit = RawDestination::new(page, DestinationKind::Fit, vec![]);
        assert_eq!(fit.vertical_coordinate(), None);
    }

    #[test]
    fn test_null_top_has_no_offset() {
        let dest = RawDestination::new(PageRef::new(1, 0), DestinationKind::Xyz, vec![None, None, None]);
        assert_eq!(dest.vertical_coordinate(), None);

        let short = RawDestination::new(PageRef::new(1, 0), DestinationKind::FitH, vec![]);
        assert_eq!(short.vertical_coordinate(), None);
    }

    #[test]
    fn test_kind_from_name() {
        assert_eq!(DestinationKind::from_name("XYZ"), DestinationKind::Xyz);
        assert_eq!(DestinationKind::from_name("FitBH"), DestinationKind::FitBH);
        assert_eq!(
            DestinationKind::from_name("Zoom"),
            DestinationKind::Other("Zoom".to_string())
        );
    }

    #[test]
    fn test_index_sort_is_stable() {
        let index = OutlineIndex::new(vec![
            OutlineEntry::new("C", 3),
            OutlineEntry::new("A1", 1),
            OutlineEntry::new("B", 2),
            OutlineEntry::new("A2", 1),
        ]);

        let titles: Vec<_> = index.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["A1", "A2", "B", "C"]);
    }

    #[test]
    fn test_entry_serialization() {
        let entry = OutlineEntry::new("Intro", 2).with_offset(0.25).with_level(1);
        let json = serde_json::to_string(&entry).unwrap();

        assert!(json.contains("\"pageNumber\":2"));
        assert!(json.contains("\"yNormalizedFromTop\":0.25"));
    }
}
