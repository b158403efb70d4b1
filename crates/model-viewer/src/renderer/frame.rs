//! The ring of per-frame resources that bounds how far the CPU runs ahead of
//! the GPU.

use super::fence::Timeline;
use super::uniforms::PassConstants;

/// Frames that may be in flight at once.
pub const FRAME_COUNT: usize = 3;

struct Slot<T> {
    resources: T,
    /// Fence value of the last submission that used `resources`.
    fence_value: u64,
}

/// Fixed ring of `T`, one per frame in flight. A slot becomes current again
/// only after the fence value recorded at its last submission is reached.
pub struct FrameRing<T> {
    slots: Vec<Slot<T>>,
    cursor: usize,
}

impl<T> FrameRing<T> {
    /// # Panics
    /// If `count` is zero.
    pub fn new(count: usize, mut make: impl FnMut(usize) -> T) -> Self {
        assert!(count > 0, "frame ring needs at least one slot");
        Self {
            slots: (0..count)
                .map(|i| Slot {
                    resources: make(i),
                    fence_value: 0,
                })
                .collect(),
            cursor: 0,
        }
    }

    /// Moves to the next slot and blocks until the GPU is done with it.
    pub fn advance(&mut self, timeline: &impl Timeline) -> usize {
        self.cursor = (self.cursor + 1) % self.slots.len();
        let fence = self.slots[self.cursor].fence_value;
        if fence != 0 && !timeline.is_reached(fence) {
            log::trace!("Frame slot {} waiting on fence {}", self.cursor, fence);
            timeline.wait(fence);
        }
        self.cursor
    }

    pub fn current(&self) -> &T {
        &self.slots[self.cursor].resources
    }

    /// Tags the current slot with the fence value of the submission that just
    /// used it.
    pub fn mark_submitted(&mut self, fence_value: u64) {
        self.slots[self.cursor].fence_value = fence_value;
    }

    pub fn fence_value(&self, slot: usize) -> u64 {
        self.slots[slot].fence_value
    }

    /// Blocks until every submission recorded in the ring has completed.
    pub fn flush(&self, timeline: &impl Timeline) {
        let newest = self.slots.iter().map(|s| s.fence_value).max().unwrap_or(0);
        timeline.wait(newest);
    }
}

/// Per-frame uniform memory: the pass constants and the bind group that
/// exposes them to both pipelines.
pub struct FrameResources {
    pub uniforms: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl FrameResources {
    pub fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, index: usize) -> Self {
        let uniforms = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("Frame {index} Pass Constants")),
            size: std::mem::size_of::<PassConstants>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("Frame {index} Bind Group")),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniforms.as_entire_binding(),
            }],
        });

        Self {
            uniforms,
            bind_group,
        }
    }

    pub fn write(&self, queue: &wgpu::Queue, constants: &PassConstants) {
        queue.write_buffer(&self.uniforms, 0, bytemuck::bytes_of(constants));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::fence::SimulatedTimeline;

    /// Runs `frames` submissions; the closure is told each reused slot and
    /// may complete GPU work.
    fn run(frames: u64, gpu: &SimulatedTimeline, mut between: impl FnMut(u64)) -> Vec<usize> {
        let mut ring = FrameRing::new(FRAME_COUNT, |i| i);
        let mut order = Vec::new();
        for submission in 1..=frames {
            let slot = ring.advance(gpu);
            // the slot's previous submission must be finished before reuse
            assert!(gpu.is_reached(ring.fence_value(slot)));
            order.push(*ring.current());
            ring.mark_submitted(submission);
            between(submission);
        }
        order
    }

    #[test]
    fn slots_cycle_round_robin() {
        let gpu = SimulatedTimeline::default();
        let order = run(7, &gpu, |s| gpu.complete_through(s));
        assert_eq!(order, vec![1, 2, 0, 1, 2, 0, 1]);
        assert!(gpu.blocked_on.borrow().is_empty());
    }

    #[test]
    fn reuse_waits_for_submission_n_frames_back() {
        let gpu = SimulatedTimeline::default();
        run(10, &gpu, |_| {});
        // submission i reuses the slot of submission i - 3
        assert_eq!(*gpu.blocked_on.borrow(), vec![1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn gpu_one_frame_behind_never_stalls() {
        let gpu = SimulatedTimeline::default();
        run(12, &gpu, |s| gpu.complete_through(s.saturating_sub(1)));
        assert!(gpu.blocked_on.borrow().is_empty());
    }

    #[test]
    fn flush_waits_for_newest_submission() {
        let gpu = SimulatedTimeline::default();
        let mut ring = FrameRing::new(FRAME_COUNT, |_| ());
        for value in 1..=5 {
            ring.advance(&gpu);
            ring.mark_submitted(value);
        }
        let before = gpu.completed();
        ring.flush(&gpu);
        assert!(before < 5);
        assert_eq!(gpu.completed(), 5);
    }
}
