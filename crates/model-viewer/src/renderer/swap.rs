//! Active/inactive model slots with a deferred, ring-synchronised flip.
//!
//! A newly loaded model is staged into the inactive slot together with the
//! ring index current at that moment. The flip happens when the ring cursor
//! comes back to that index, and the model it replaced is dropped one full
//! cycle after that, when no frame in flight can still reference it.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapEvent {
    Committed,
    Retired,
}

pub struct ModelSlots<M> {
    slots: [Option<M>; 2],
    active: usize,
    /// Ring index recorded when the inactive slot was filled.
    pending: Option<usize>,
    /// Ring index recorded at the last commit; the inactive slot still holds
    /// the superseded model until then.
    retire: Option<usize>,
}

impl<M> Default for ModelSlots<M> {
    fn default() -> Self {
        Self {
            slots: [None, None],
            active: 0,
            pending: None,
            retire: None,
        }
    }
}

impl<M> ModelSlots<M> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&M> {
        self.slots[self.active].as_ref()
    }

    /// True when the inactive slot is free for a new model.
    pub fn can_stage(&self) -> bool {
        self.pending.is_none() && self.retire.is_none()
    }

    pub fn is_swap_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Makes `model` active immediately. Only valid before any frame that
    /// could reference the current model has been submitted.
    pub fn install(&mut self, model: M) {
        self.slots[self.active] = Some(model);
    }

    /// Puts `model` into the inactive slot, to become active when the ring
    /// cursor returns to `ring_index`. Hands the model back if a previous
    /// swap is still pending or retiring.
    pub fn stage(&mut self, model: M, ring_index: usize) -> Result<(), M> {
        if !self.can_stage() {
            return Err(model);
        }
        self.slots[1 - self.active] = Some(model);
        self.pending = Some(ring_index);
        Ok(())
    }

    /// Call once per frame right after the ring has advanced to `ring_index`.
    pub fn on_frame(&mut self, ring_index: usize) -> Option<SwapEvent> {
        if self.pending == Some(ring_index) {
            self.active = 1 - self.active;
            self.pending = None;
            self.retire = Some(ring_index);
            return Some(SwapEvent::Committed);
        }
        if self.retire == Some(ring_index) {
            self.slots[1 - self.active] = None;
            self.retire = None;
            return Some(SwapEvent::Retired);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::fence::SimulatedTimeline;
    use crate::renderer::frame::{FrameRing, FRAME_COUNT};

    #[test]
    fn commit_happens_exactly_one_ring_cycle_after_staging() {
        let gpu = SimulatedTimeline::default();
        let mut ring = FrameRing::new(FRAME_COUNT, |_| ());
        let mut slots = ModelSlots::new();
        slots.install("old");

        for _ in 0..2 {
            let k = ring.advance(&gpu);
            assert_eq!(slots.on_frame(k), None);
        }

        let k = ring.advance(&gpu);
        assert_eq!(slots.on_frame(k), None);
        assert!(slots.stage("new", k).is_ok());

        for _ in 1..FRAME_COUNT {
            let i = ring.advance(&gpu);
            assert_ne!(i, k);
            assert_eq!(slots.on_frame(i), None);
            assert_eq!(slots.active(), Some(&"old"));
        }

        let i = ring.advance(&gpu);
        assert_eq!(i, k);
        assert_eq!(slots.on_frame(i), Some(SwapEvent::Committed));
        assert_eq!(slots.active(), Some(&"new"));
    }

    #[test]
    fn superseded_model_is_dropped_one_cycle_after_commit() {
        let mut slots = ModelSlots::new();
        slots.install(1);
        slots.stage(2, 0).unwrap();
        assert_eq!(slots.on_frame(0), Some(SwapEvent::Committed));

        // still retiring: a further model has to wait
        assert!(!slots.can_stage());
        assert_eq!(slots.stage(3, 1), Err(3));

        assert_eq!(slots.on_frame(1), None);
        assert_eq!(slots.on_frame(2), None);
        assert!(slots.slots[1 - slots.active].is_some());
        assert_eq!(slots.on_frame(0), Some(SwapEvent::Retired));
        assert!(slots.slots[1 - slots.active].is_none());

        assert!(slots.can_stage());
        assert_eq!(slots.active(), Some(&2));
    }

    #[test]
    fn second_stage_while_pending_is_refused() {
        let mut slots = ModelSlots::<u8>::new();
        slots.stage(1, 2).unwrap();
        assert!(slots.is_swap_pending());
        assert_eq!(slots.stage(9, 0), Err(9));
        assert_eq!(slots.active(), None);
        assert_eq!(slots.on_frame(2), Some(SwapEvent::Committed));
        assert_eq!(slots.active(), Some(&1));
    }
}
