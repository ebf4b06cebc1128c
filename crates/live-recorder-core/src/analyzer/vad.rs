use std::collections::VecDeque;

/// Averages the first `frames_needed` levels into a background estimate.
#[derive(Debug, Clone)]
pub(crate) struct Calibration {
    frames_needed: usize,
    frames_seen: usize,
    sum: f32,
    background: Option<f32>,
}

impl Calibration {
    pub(crate) fn new(frames_needed: usize) -> Self {
        Self {
            frames_needed: frames_needed.max(1),
            frames_seen: 0,
            sum: 0.0,
            background: None,
        }
    }

    /// Feed one level. Returns the scaled background once enough frames are in.
    pub(crate) fn feed(&mut self, level: f32, multiplier: f32) -> Option<f32> {
        if self.background.is_some() {
            return self.background;
        }

        self.sum += level;
        self.frames_seen += 1;

        if self.frames_seen >= self.frames_needed {
            let average = self.sum / self.frames_seen as f32;
            self.background = Some(average * multiplier);
        }

        self.background
    }

    pub(crate) fn background(&self) -> Option<f32> {
        self.background
    }

    pub(crate) fn is_complete(&self) -> bool {
        self.background.is_some()
    }

    pub(crate) fn frames_needed(&self) -> usize {
        self.frames_needed
    }
}

/// Fixed-capacity history of recent levels.
#[derive(Debug, Clone)]
pub(crate) struct VadWindow {
    levels: VecDeque<f32>,
    capacity: usize,
}

impl VadWindow {
    pub(crate) fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            levels: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub(crate) fn push(&mut self, level: f32) {
        if self.levels.len() == self.capacity {
            self.levels.pop_front();
        }
        self.levels.push_back(level);
    }

    /// Fraction of the window's capacity holding levels above `threshold`.
    ///
    /// Divides by capacity, not by fill, so a spike right after calibration
    /// cannot reach the ratio on its own.
    pub(crate) fn ratio_above(&self, threshold: f32) -> f32 {
        let above = self.levels.iter().filter(|&&l| l > threshold).count();
        above as f32 / self.capacity as f32
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    pub(crate) fn clear(&mut self) {
        self.levels.clear();
    }
}
