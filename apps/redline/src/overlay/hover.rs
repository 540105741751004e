//! Hover popover debouncing
//!
//! A popover is shown only after the pointer has rested on the same highlight
//! for the configured delay. Leaving hides it at once.

use std::time::Duration;

use tokio::time::Instant;

use crate::annotations::AnnotationId;

/// Visible change produced by the debouncer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverChange {
    Shown(AnnotationId),
    Hidden,
}

#[derive(Debug, Clone)]
pub struct HoverDebouncer {
    delay: Duration,
    pending: Option<(AnnotationId, Instant)>,
    shown: Option<AnnotationId>,
}

impl HoverDebouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
            shown: None,
        }
    }

    /// Pointer moved over `target` (or over no highlight)
    pub fn pointer_over(&mut self, target: Option<AnnotationId>, now: Instant) -> Option<HoverChange> {
        let Some(id) = target else {
            self.pending = None;
            return self.shown.take().map(|_| HoverChange::Hidden);
        };

        if self.shown == Some(id) {
            self.pending = None;
            return None;
        }

        let hidden = self.shown.take().is_some();
        if !matches!(self.pending, Some((pending, _)) if pending == id) {
            self.pending = Some((id, now + self.delay));
        }

        if self.delay.is_zero() {
            return self.tick(now).or(hidden.then_some(HoverChange::Hidden));
        }
        hidden.then_some(HoverChange::Hidden)
    }

    /// Show the pending popover once its delay has elapsed
    pub fn tick(&mut self, now: Instant) -> Option<HoverChange> {
        let (id, ready_at) = self.pending?;
        if ready_at > now {
            return None;
        }
        self.pending = None;
        self.shown = Some(id);
        Some(HoverChange::Shown(id))
    }

    /// When the pending popover becomes due
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.map(|(_, ready_at)| ready_at)
    }

    pub fn shown(&self) -> Option<AnnotationId> {
        self.shown
    }

    /// Drop a hidden target, e.g. after the annotation was deleted
    pub fn forget(&mut self, id: AnnotationId) -> Option<HoverChange> {
        if matches!(self.pending, Some((pending, _)) if pending == id) {
            self.pending = None;
        }
        if self.shown == Some(id) {
            self.shown = None;
            return Some(HoverChange::Hidden);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    const DELAY: Duration = Duration::from_millis(300);

    #[test]
    fn test_shows_after_delay() {
        let start = Instant::now();
        let id = Uuid::new_v4();
        let mut hover = HoverDebouncer::new(DELAY);

        assert_eq!(hover.pointer_over(Some(id), start), None);
        assert_eq!(hover.tick(start + Duration::from_millis(299)), None);
        assert_eq!(hover.tick(start + DELAY), Some(HoverChange::Shown(id)));
        assert_eq!(hover.shown(), Some(id));
    }

    #[test]
    fn test_moving_within_target_keeps_deadline() {
        let start = Instant::now();
        let id = Uuid::new_v4();
        let mut hover = HoverDebouncer::new(DELAY);

        hover.pointer_over(Some(id), start);
        hover.pointer_over(Some(id), start + Duration::from_millis(200));
        assert_eq!(hover.deadline(), Some(start + DELAY));
    }

    #[test]
    fn test_leaving_hides_immediately() {
        let start = Instant::now();
        let id = Uuid::new_v4();
        let mut hover = HoverDebouncer::new(DELAY);

        hover.pointer_over(Some(id), start);
        hover.tick(start + DELAY);
        assert_eq!(hover.pointer_over(None, start + DELAY), Some(HoverChange::Hidden));
        assert_eq!(hover.shown(), None);
    }

    #[test]
    fn test_leaving_before_delay_never_shows() {
        let start = Instant::now();
        let id = Uuid::new_v4();
        let mut hover = HoverDebouncer::new(DELAY);

        hover.pointer_over(Some(id), start);
        assert_eq!(hover.pointer_over(None, start + Duration::from_millis(100)), None);
        assert_eq!(hover.tick(start + DELAY * 2), None);
    }

    #[test]
    fn test_switching_targets_hides_then_restarts_delay() {
        let start = Instant::now();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let mut hover = HoverDebouncer::new(DELAY);

        hover.pointer_over(Some(a), start);
        hover.tick(start + DELAY);

        let later = start + DELAY + Duration::from_millis(50);
        assert_eq!(hover.pointer_over(Some(b), later), Some(HoverChange::Hidden));
        assert_eq!(hover.deadline(), Some(later + DELAY));
    }
}
