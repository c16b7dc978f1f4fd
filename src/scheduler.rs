use std::time::Duration;

/// Cooperative timer and animation-frame queue driven by a virtual clock.
///
/// Nothing runs on its own: the owner calls [`Scheduler::advance`] from its
/// event loop and executes whatever tasks come back. Tasks are plain data so
/// the owner dispatches them with full access to its own state.
#[derive(Debug)]
pub struct Scheduler<T> {
    now: Duration,
    timers: Vec<Timer<T>>,
    frame_queue: Vec<T>,
    next_seq: u64,
}

#[derive(Debug)]
struct Timer<T> {
    deadline: Duration,
    seq: u64,
    task: T,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            timers: Vec::new(),
            frame_queue: Vec::new(),
            next_seq: 0,
        }
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn set_timeout(&mut self, delay: Duration, task: T) {
        let seq = self.next_seq;
        self.next_seq = seq.wrapping_add(1);
        self.timers.push(Timer {
            deadline: self.now.saturating_add(delay),
            seq,
            task,
        });
    }

    /// Queues `task` for the next frame. Tasks requested while a frame's
    /// tasks are being executed land on the frame after.
    pub fn request_animation_frame(&mut self, task: T) {
        self.frame_queue.push(task);
    }

    pub fn has_pending(&self) -> bool {
        !self.timers.is_empty() || !self.frame_queue.is_empty()
    }

    /// Moves the clock forward by `elapsed` and renders one frame.
    ///
    /// Returns expired timers ordered by deadline (ties in scheduling order)
    /// followed by the tasks queued for this frame.
    pub fn advance(&mut self, elapsed: Duration) -> Vec<T> {
        self.now = self.now.saturating_add(elapsed);
        let now = self.now;
        let (mut due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.timers)
            .into_iter()
            .partition(|t| t.deadline <= now);
        self.timers = pending;
        due.sort_by_key(|t| (t.deadline, t.seq));
        let mut out: Vec<T> = due.into_iter().map(|t| t.task).collect();
        out.append(&mut self.frame_queue);
        out
    }
}
