//! Progress Reporter Module
//! Tracks prediction progress as ticks: one initial tick, then one per
//! finished column.

/// Tick counter shown as the progress bar.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressReporter {
    tick: usize,
    total: usize,
    visible: bool,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a run over `columns` columns. Starts at the initial tick.
    pub fn start(&mut self, columns: usize) {
        self.total = columns + 1;
        self.tick = 1;
        self.visible = self.tick < self.total;
    }

    /// Record one finished column. Reaching the total hides the indicator.
    pub fn advance(&mut self) {
        if self.total == 0 {
            return;
        }
        self.tick = (self.tick + 1).min(self.total);
        if self.tick == self.total {
            self.visible = false;
        }
    }

    /// Jump to the terminal tick.
    pub fn finish(&mut self) {
        self.tick = self.total;
        self.visible = false;
    }

    /// Back to idle, e.g. after a cancelled or failed run.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn tick(&self) -> usize {
        self.tick
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_finished(&self) -> bool {
        self.total > 0 && self.tick == self.total
    }

    /// Rounded percentage of ticks done. 100 only at the terminal tick.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        if self.is_finished() {
            return 100;
        }
        let pct = (self.tick as f64 / self.total as f64 * 100.0).round() as u8;
        pct.min(99)
    }

    pub fn fraction(&self) -> f32 {
        f32::from(self.percent()) / 100.0
    }

    pub fn label(&self) -> String {
        format!("Graph {}/{}", self.tick, self.total)
    }
}
