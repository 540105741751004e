//! Annotation module
//!
//! Review annotations anchored to a highlighted region of a PDF page.
//!
//! - Annotation types: comment, edit, discussion
//! - Lifecycle status: proposed, accepted, rejected
//! - Position stored as a page-relative percentage rectangle

mod types;

pub use types::{
    Annotation, AnnotationId, AnnotationPatch, AnnotationStatus, AnnotationType, NewAnnotation,
};
