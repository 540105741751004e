//! Scroll reconciler
//!
//! Brings an annotation into view on a viewer that renders pages lazily.
//! When the target page is already rendered the container is scrolled
//! directly; otherwise the viewer is asked to jump to the page and the layout
//! is polled a bounded number of times until the page shows up.
//!
//! Every request carries a token from a monotonic counter. Only the newest
//! token may act: an older request checks its token before every side effect
//! and stops as soon as a newer one has been registered.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::annotations::AnnotationId;
use crate::geometry::to_pixels;
use crate::overlay::{LatestCell, OverlaySnapshot};
use crate::surface::ViewerSurface;

/// Bounded polling parameters for the assisted phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            interval: Duration::from_millis(100),
        }
    }
}

/// How a scroll request ended
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum ScrollOutcome {
    /// The container was scrolled; `attempts` is 0 for the direct phase
    Scrolled { scroll_top: f64, attempts: u32 },
    /// A newer request took over
    Superseded,
    /// The target never appeared within the attempt bound
    Abandoned { attempts: u32 },
}

pub struct ScrollReconciler {
    surface: Arc<dyn ViewerSurface>,
    overlay: LatestCell<OverlaySnapshot>,
    policy: RetryPolicy,
    leading_margin_px: f64,
    latest: AtomicU64,
}

impl ScrollReconciler {
    pub fn new(
        surface: Arc<dyn ViewerSurface>,
        overlay: LatestCell<OverlaySnapshot>,
        policy: RetryPolicy,
        leading_margin_px: f64,
    ) -> Self {
        Self {
            surface,
            overlay,
            policy,
            leading_margin_px,
            latest: AtomicU64::new(0),
        }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Allocate the next token and mark it as the newest request
    pub fn issue_token(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn latest_token(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    pub fn is_current(&self, token: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == token
    }

    /// Scroll to an annotation with a fresh token
    pub async fn scroll_to_annotation(&self, target: AnnotationId) -> ScrollOutcome {
        let token = self.issue_token();
        self.scroll_to(target, token).await
    }

    /// Scroll to an annotation under an explicit token
    ///
    /// Registering the token supersedes every older request, including ones
    /// already polling. A token lower than the newest one is stale on arrival.
    pub async fn scroll_to(&self, target: AnnotationId, token: u64) -> ScrollOutcome {
        self.latest.fetch_max(token, Ordering::SeqCst);
        tokio::task::yield_now().await;
        if !self.is_current(token) {
            return self.superseded(target, token, 0);
        }

        if let Some(scroll_top) = self.scroll_offset(target) {
            return self.scroll(target, token, scroll_top, 0);
        }

        let mut jumped = false;
        self.jump_if_known(target, token, &mut jumped);

        for attempt in 1..=self.policy.max_attempts {
            tokio::time::sleep(self.policy.interval).await;
            if !self.is_current(token) {
                return self.superseded(target, token, attempt);
            }

            if let Some(scroll_top) = self.scroll_offset(target) {
                return self.scroll(target, token, scroll_top, attempt);
            }
            tracing::trace!(annotation_id = %target, token, attempt, "Target not rendered yet");

            // The overlay may only learn the target's page after the first jump
            self.jump_if_known(target, token, &mut jumped);
        }

        if !self.is_current(token) {
            return self.superseded(target, token, self.policy.max_attempts);
        }
        tracing::debug!(
            annotation_id = %target,
            token,
            attempts = self.policy.max_attempts,
            "Scroll target never rendered, abandoning"
        );
        ScrollOutcome::Abandoned {
            attempts: self.policy.max_attempts,
        }
    }

    /// Container offset that puts the target just below the leading margin
    fn scroll_offset(&self, target: AnnotationId) -> Option<f64> {
        let snapshot = self.overlay.get();
        let position = snapshot.position_of(target)?;
        let layout = self.surface.page_layout(position.page_number)?;
        let rect = to_pixels(position, layout.size.width_px, layout.size.height_px)?;
        Some((layout.offset_top + rect.y1 - self.leading_margin_px).max(0.0))
    }

    fn jump_if_known(&self, target: AnnotationId, token: u64, jumped: &mut bool) {
        if *jumped {
            return;
        }
        let snapshot = self.overlay.get();
        if let Some(position) = snapshot.position_of(target) {
            tracing::debug!(
                annotation_id = %target,
                token,
                page_number = position.page_number,
                "Jumping to target page"
            );
            self.surface.jump_to_page(position.page_number);
            *jumped = true;
        }
    }

    fn scroll(&self, target: AnnotationId, token: u64, scroll_top: f64, attempts: u32) -> ScrollOutcome {
        self.surface.set_scroll_top(scroll_top);
        tracing::debug!(annotation_id = %target, token, scroll_top, attempts, "Scrolled to annotation");
        ScrollOutcome::Scrolled { scroll_top, attempts }
    }

    fn superseded(&self, target: AnnotationId, token: u64, attempts: u32) -> ScrollOutcome {
        tracing::debug!(
            annotation_id = %target,
            token,
            latest = self.latest_token(),
            attempts,
            "Scroll request superseded"
        );
        ScrollOutcome::Superseded
    }
}
