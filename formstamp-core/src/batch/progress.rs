//! Progress tracking for batch generation
//!
//! Progress is counted in document units: every data row is worth two units
//! (one per template) whether its documents are generated, skipped or fail.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Progress information for a running batch
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// Units expected for the whole workbook
    pub total_units: usize,
    /// Units accounted for so far
    pub completed_units: usize,
    /// What was just processed
    pub label: String,
    /// Start time of the batch
    pub start_time: Instant,
    /// Estimated time remaining
    pub estimated_remaining: Option<Duration>,
    /// Current throughput (units per second)
    pub throughput: f64,
}

impl ProgressInfo {
    /// Get progress percentage (0.0 - 100.0)
    pub fn percentage(&self) -> f64 {
        if self.total_units == 0 {
            100.0
        } else {
            (self.completed_units as f64 / self.total_units as f64) * 100.0
        }
    }

    /// Fraction in `0.0..=1.0`
    pub fn fraction(&self) -> f64 {
        (self.percentage() / 100.0).clamp(0.0, 1.0)
    }

    pub fn is_complete(&self) -> bool {
        self.completed_units >= self.total_units
    }

    /// Get elapsed time
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Calculate estimated time remaining
    pub fn calculate_eta(&self) -> Option<Duration> {
        if self.completed_units == 0 || self.throughput <= 0.0 {
            return None;
        }

        let remaining = self.total_units.saturating_sub(self.completed_units);
        let seconds_remaining = remaining as f64 / self.throughput;
        Some(Duration::from_secs_f64(seconds_remaining))
    }

    /// Format progress as a string
    pub fn format_progress(&self) -> String {
        format!(
            "Progress: {}/{} PDFs ({:.1}%) - {}",
            self.completed_units,
            self.total_units,
            self.percentage(),
            self.label
        )
    }

    /// Format ETA as a string
    pub fn format_eta(&self) -> String {
        match self.estimated_remaining {
            Some(duration) => {
                let secs = duration.as_secs();
                if secs < 60 {
                    format!("{secs}s")
                } else if secs < 3600 {
                    format!("{}m {}s", secs / 60, secs % 60)
                } else {
                    format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
                }
            }
            None => "calculating...".to_string(),
        }
    }
}

/// Unit counters shared with progress observers
#[derive(Debug)]
pub struct BatchProgress {
    total_units: AtomicUsize,
    completed_units: AtomicUsize,
    start_time: Instant,
}

impl Default for BatchProgress {
    fn default() -> Self {
        Self::new(0)
    }
}

impl BatchProgress {
    pub fn new(total_units: usize) -> Self {
        Self {
            total_units: AtomicUsize::new(total_units),
            completed_units: AtomicUsize::new(0),
            start_time: Instant::now(),
        }
    }

    /// Account for `units` more units; returns the new completed count
    pub fn advance(&self, units: usize) -> usize {
        self.completed_units.fetch_add(units, Ordering::SeqCst) + units
    }

    pub fn completed_units(&self) -> usize {
        self.completed_units.load(Ordering::SeqCst)
    }

    pub fn total_units(&self) -> usize {
        self.total_units.load(Ordering::SeqCst)
    }

    /// Get current progress information
    pub fn get_info(&self, label: impl Into<String>) -> ProgressInfo {
        let total = self.total_units();
        let completed = self.completed_units();

        let elapsed = self.start_time.elapsed();
        let throughput = if elapsed.as_secs_f64() > 0.0 {
            completed as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };

        let mut info = ProgressInfo {
            total_units: total,
            completed_units: completed,
            label: label.into(),
            start_time: self.start_time,
            estimated_remaining: None,
            throughput,
        };

        info.estimated_remaining = info.calculate_eta();
        info
    }
}

/// Trait for progress callbacks
pub trait ProgressCallback: Send + Sync {
    /// Called after every unit of work
    fn on_progress(&self, info: &ProgressInfo);
}

impl<F> ProgressCallback for F
where
    F: Fn(&ProgressInfo) + Send + Sync,
{
    fn on_progress(&self, info: &ProgressInfo) {
        self(info)
    }
}

/// Progress bar renderer for terminal output
pub struct ProgressBar {
    width: usize,
    show_eta: bool,
}

impl Default for ProgressBar {
    fn default() -> Self {
        Self {
            width: 40,
            show_eta: true,
        }
    }
}

impl ProgressBar {
    pub fn new(width: usize) -> Self {
        Self {
            width,
            ..Default::default()
        }
    }

    pub fn without_eta(mut self) -> Self {
        self.show_eta = false;
        self
    }

    /// Render the progress bar
    pub fn render(&self, info: &ProgressInfo) -> String {
        let filled = (info.fraction() * self.width as f64) as usize;
        let empty = self.width.saturating_sub(filled);

        let mut parts = vec![
            format!(
                "[{}{}] {:.1}%",
                "=".repeat(filled),
                " ".repeat(empty),
                info.percentage()
            ),
            format!("{}/{}", info.completed_units, info.total_units),
        ];

        if self.show_eta && !info.is_complete() {
            parts.push(format!("ETA: {}", info.format_eta()));
        }
        if !info.label.is_empty() {
            parts.push(info.label.clone());
        }

        parts.join(" | ")
    }
}
