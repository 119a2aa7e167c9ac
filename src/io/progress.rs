//! Terminal progress bar for inpainting runs

use crate::algorithm::inpainting::InpaintingObserver;
use crate::io::configuration::PROGRESS_BAR_WIDTH;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::LazyLock;

static PROGRESS_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template(&format!(
            "{{prefix}} [{{bar:{PROGRESS_BAR_WIDTH}.cyan/blue}}] {{pos}}/{{len}} {{msg}}"
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ")
});

/// Reports inpainting iterations on a progress bar
///
/// The bar is created on the first `on_start` and shows the current threshold.
pub struct ProgressObserver {
    label: String,
    bar: Option<ProgressBar>,
}

impl ProgressObserver {
    /// Create an observer whose bar is prefixed with `label`
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            bar: None,
        }
    }

    /// Iterations reported so far
    pub fn position(&self) -> u64 {
        self.bar.as_ref().map_or(0, ProgressBar::position)
    }
}

impl InpaintingObserver for ProgressObserver {
    fn on_start(&mut self, iterations: usize) {
        let bar = ProgressBar::new(iterations as u64);
        bar.set_style(PROGRESS_STYLE.clone());
        bar.set_prefix(self.label.clone());
        self.bar = Some(bar);
    }

    fn on_iteration(&mut self, iteration: usize, threshold: f64) {
        if let Some(ref bar) = self.bar {
            bar.set_position(iteration as u64);
            bar.set_message(format!("threshold {threshold:.3e}"));
        }
    }

    fn on_finish(&mut self) {
        if let Some(ref bar) = self.bar {
            bar.abandon_with_message("done");
        }
    }
}
