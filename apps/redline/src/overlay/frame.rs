//! Recompute coalescing
//!
//! Overlay geometry is recomputed at most once per animation frame. Any
//! number of requests between two frames collapse into one pending slot; a
//! new request replaces the pending one instead of queueing behind it.

/// What triggered a recompute request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecomputeReason {
    AnnotationsChanged,
    PageRendered(u32),
    PageRemoved(u32),
    ViewportChanged,
    FilterChanged,
    DraftChanged,
}

/// A pending recompute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecomputeRequest {
    /// Monotonic generation assigned at request time
    pub generation: u64,
    /// Reason of the most recent request folded into this one
    pub reason: RecomputeReason,
}

/// Single-slot frame scheduler
#[derive(Debug, Default)]
pub struct RecomputeScheduler {
    pending: Option<RecomputeRequest>,
    next_generation: u64,
    coalesced: u64,
}

impl RecomputeScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a recompute for the next frame, replacing any pending one
    pub fn request(&mut self, reason: RecomputeReason) -> u64 {
        self.next_generation += 1;
        let request = RecomputeRequest {
            generation: self.next_generation,
            reason,
        };
        if self.pending.replace(request).is_some() {
            self.coalesced += 1;
        }
        request.generation
    }

    /// Take the pending request when a frame arrives
    pub fn take_due(&mut self) -> Option<RecomputeRequest> {
        self.pending.take()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Requests folded into a later one
    pub fn coalesced(&self) -> u64 {
        self.coalesced
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requests_collapse_into_latest() {
        let mut scheduler = RecomputeScheduler::new();
        scheduler.request(RecomputeReason::PageRendered(1));
        scheduler.request(RecomputeReason::PageRendered(2));
        let last = scheduler.request(RecomputeReason::ViewportChanged);

        let due = scheduler.take_due().unwrap();
        assert_eq!(due.generation, last);
        assert_eq!(due.reason, RecomputeReason::ViewportChanged);
        assert_eq!(scheduler.coalesced(), 2);
        assert!(scheduler.take_due().is_none());
    }

    #[test]
    fn test_generations_increase_across_frames() {
        let mut scheduler = RecomputeScheduler::new();
        let first = scheduler.request(RecomputeReason::AnnotationsChanged);
        scheduler.take_due();
        let second = scheduler.request(RecomputeReason::AnnotationsChanged);
        assert!(second > first);
        assert!(scheduler.is_pending());
    }
}
