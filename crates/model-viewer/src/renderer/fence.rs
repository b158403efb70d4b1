//! Fence values for a queue that has no user-visible fence object.
//!
//! Every submission is assigned the next value of a monotonically increasing
//! counter; the value is marked complete from the queue's work-done callback.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A monotonically increasing completion counter.
pub trait Timeline {
    /// Highest value known to be reached.
    fn completed(&self) -> u64;

    /// Blocks until `value` has been reached.
    fn wait(&self, value: u64);

    fn is_reached(&self, value: u64) -> bool {
        self.completed() >= value
    }
}

/// Fence backed by `Queue::on_submitted_work_done`.
pub struct QueueFence {
    device: Arc<wgpu::Device>,
    next: u64,
    completed: Arc<AtomicU64>,
}

impl QueueFence {
    pub fn new(device: Arc<wgpu::Device>) -> Self {
        Self {
            device,
            next: 0,
            completed: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Call right after `queue.submit`; returns the value that submission
    /// signals on completion.
    pub fn signal(&mut self, queue: &wgpu::Queue) -> u64 {
        self.next += 1;
        let value = self.next;
        let completed = self.completed.clone();
        queue.on_submitted_work_done(move || {
            completed.fetch_max(value, Ordering::AcqRel);
        });
        value
    }
}

impl Timeline for QueueFence {
    fn completed(&self) -> u64 {
        self.completed.load(Ordering::Acquire)
    }

    fn wait(&self, value: u64) {
        while !self.is_reached(value) {
            // Maintain::Wait fires the work-done callbacks of finished submissions.
            self.device.poll(wgpu::Maintain::Wait);
        }
    }
}

/// Manually driven timeline standing in for the GPU in tests.
#[cfg(test)]
#[derive(Default)]
pub struct SimulatedTimeline {
    pub completed: std::cell::Cell<u64>,
    /// Values passed to `wait` that had not been reached yet.
    pub blocked_on: std::cell::RefCell<Vec<u64>>,
}

#[cfg(test)]
impl SimulatedTimeline {
    pub fn complete_through(&self, value: u64) {
        self.completed.set(self.completed.get().max(value));
    }
}

#[cfg(test)]
impl Timeline for SimulatedTimeline {
    fn completed(&self) -> u64 {
        self.completed.get()
    }

    /// Records the stall and lets the "GPU" catch up to `value`.
    fn wait(&self, value: u64) {
        if !self.is_reached(value) {
            self.blocked_on.borrow_mut().push(value);
            self.complete_through(value);
        }
    }
}
