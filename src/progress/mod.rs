//! Progress bookkeeping for a mirror run
//!
//! The tracker owns a [`ProgressState`] and pushes it to a [`ProgressSink`] after
//! every change. It only counts; it never blocks and never retries.

mod display;

pub use display::{IndicatifSink, LogSink};

/// Per-unit and aggregate counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressState {
    /// Resources of the current unit that have a result
    pub unit_completed: u64,
    /// Resources queued for the current unit
    pub unit_total: u64,
    /// Units fully processed
    pub aggregate_completed: u64,
    /// Units selected for the run
    pub aggregate_total: u64,
}

impl ProgressState {
    /// Human-readable lines; the unit line is omitted while no unit is downloading
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![format!(
            "Courses: {}/{}",
            self.aggregate_completed, self.aggregate_total
        )];
        if self.unit_total > 0 {
            lines.push(format!(
                "Files: {}/{}",
                self.unit_completed, self.unit_total
            ));
        }
        lines
    }
}

/// Receives the progress state after every mutation
pub trait ProgressSink {
    fn render(&mut self, state: &ProgressState);

    /// Removes any in-progress display
    fn clear(&mut self) {}
}

/// Owns the run's progress state and forwards it to a sink
pub struct ProgressTracker {
    state: ProgressState,
    sink: Box<dyn ProgressSink>,
}

impl ProgressTracker {
    pub fn new(sink: Box<dyn ProgressSink>) -> Self {
        Self {
            state: ProgressState::default(),
            sink,
        }
    }

    pub fn state(&self) -> ProgressState {
        self.state
    }

    /// Starts a run over `units` units
    pub fn start_run(&mut self, units: u64) {
        self.state = ProgressState {
            aggregate_total: units,
            ..ProgressState::default()
        };
        self.render();
    }

    /// Starts downloading `resources` resources for the current unit
    pub fn start_unit(&mut self, resources: u64) {
        self.state.unit_completed = 0;
        self.state.unit_total = resources;
        self.render();
    }

    /// Records one resource result, whatever its outcome
    pub fn resource_done(&mut self) {
        self.state.unit_completed += 1;
        self.render();
    }

    /// Marks the current unit as processed and resets the unit counters
    pub fn finish_unit(&mut self) {
        self.state.aggregate_completed += 1;
        self.state.unit_completed = 0;
        self.state.unit_total = 0;
        self.render();
    }

    /// Ends the run and clears the display
    pub fn finish(&mut self) {
        self.sink.clear();
    }

    fn render(&mut self) {
        self.sink.render(&self.state);
    }
}
