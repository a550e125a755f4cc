use std::time::{Duration, Instant};

/// Soft wall-clock budget for one slice of import work.
///
/// The clock is restarted whenever the pipeline resumes after yielding; work checks
/// `exceeded()` at coarse intervals and yields once the slice has run too long.
#[derive(Debug, Clone)]
pub struct FrameBudget {
    max_frame_time: Duration,
    slice_start: Instant,
}

impl FrameBudget {
    pub fn new(max_frame_time: Duration) -> Self {
        Self {
            max_frame_time,
            slice_start: Instant::now(),
        }
    }

    /// Start a new slice.
    pub fn restart(&mut self) {
        self.slice_start = Instant::now();
    }

    /// Time spent in the current slice.
    pub fn elapsed(&self) -> Duration {
        self.slice_start.elapsed()
    }

    /// Whether the current slice has used up its budget. A zero budget is always used up.
    pub fn exceeded(&self) -> bool {
        self.elapsed() >= self.max_frame_time
    }

    pub fn max_frame_time(&self) -> Duration {
        self.max_frame_time
    }

    pub fn set_max_frame_time(&mut self, max_frame_time: Duration) {
        self.max_frame_time = max_frame_time;
    }
}
