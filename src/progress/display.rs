use super::{ProgressSink, ProgressState};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

const AGGREGATE_TEMPLATE: &str =
    "{prefix:>8.cyan.bold} [{elapsed_precise}] {wide_bar:.cyan/blue} {pos}/{len}";

const UNIT_TEMPLATE: &str = "{prefix:>8.green.bold} {wide_bar:.green/white} {pos}/{len} {wide_msg}";

const PB_CHARS: &str = "█▓▒░  ";

fn bar_style(template: &str) -> ProgressStyle {
    match ProgressStyle::with_template(template) {
        Ok(style) => style.progress_chars(PB_CHARS),
        Err(_) => ProgressStyle::default_bar(),
    }
}

/// Terminal display: one bar for courses and, while downloading, one for files
pub struct IndicatifSink {
    multi: MultiProgress,
    aggregate: ProgressBar,
    unit: Option<ProgressBar>,
}

impl IndicatifSink {
    pub fn new() -> Self {
        let multi = MultiProgress::new();
        let aggregate = multi.add(ProgressBar::new(0));
        aggregate.set_style(bar_style(AGGREGATE_TEMPLATE));
        aggregate.set_prefix("Courses");

        Self {
            multi,
            aggregate,
            unit: None,
        }
    }
}

impl Default for IndicatifSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for IndicatifSink {
    fn render(&mut self, state: &ProgressState) {
        self.aggregate.set_length(state.aggregate_total);
        self.aggregate.set_position(state.aggregate_completed);

        if state.unit_total == 0 {
            if let Some(bar) = self.unit.take() {
                bar.finish_and_clear();
                self.multi.remove(&bar);
            }
            return;
        }

        let multi = &self.multi;
        let bar = self.unit.get_or_insert_with(|| {
            let bar = multi.add(ProgressBar::new(state.unit_total));
            bar.set_style(bar_style(UNIT_TEMPLATE));
            bar.set_prefix("Files");
            bar
        });
        bar.set_length(state.unit_total);
        bar.set_position(state.unit_completed);
    }

    fn clear(&mut self) {
        if let Some(bar) = self.unit.take() {
            bar.finish_and_clear();
        }
        self.aggregate.finish_and_clear();
        let _ = self.multi.clear();
    }
}

/// Headless display: writes the progress lines through tracing
#[derive(Debug, Default)]
pub struct LogSink {
    last: Option<ProgressState>,
}

impl ProgressSink for LogSink {
    fn render(&mut self, state: &ProgressState) {
        if self.last.as_ref() == Some(state) {
            return;
        }

        let unit_boundary = state.unit_total == 0 || state.unit_completed == state.unit_total;
        for line in state.lines() {
            if unit_boundary {
                tracing::info!("{}", line);
            } else {
                tracing::debug!("{}", line);
            }
        }
        self.last = Some(*state);
    }
}
