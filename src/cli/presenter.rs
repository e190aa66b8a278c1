//! CLI presenter for output formatting

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::domain::session::Question;

/// Presenter for CLI output formatting
pub struct Presenter {
    spinner: Option<ProgressBar>,
    is_spinner_active: Arc<AtomicBool>,
}

impl Presenter {
    /// Create a new presenter
    pub fn new() -> Self {
        Self {
            spinner: None,
            is_spinner_active: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start a spinner with message
    pub fn start_spinner(&mut self, message: &str) {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
                .template("{spinner:.cyan} {msg}")
                .unwrap(),
        );
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        self.spinner = Some(spinner);
        self.is_spinner_active.store(true, Ordering::SeqCst);
    }

    /// Update spinner message
    pub fn update_spinner(&self, message: &str) {
        if let Some(ref spinner) = self.spinner {
            spinner.set_message(message.to_string());
        }
    }

    /// Mark spinner as success and finish
    pub fn spinner_success(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_with_message(format!("{} {}", "✓".green(), message));
        }
        self.is_spinner_active.store(false, Ordering::SeqCst);
    }

    /// Mark spinner as failed and finish
    pub fn spinner_fail(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_with_message(format!("{} {}", "✗".red(), message));
        }
        self.is_spinner_active.store(false, Ordering::SeqCst);
    }

    /// Stop spinner without status
    pub fn stop_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
        self.is_spinner_active.store(false, Ordering::SeqCst);
    }

    /// Print info message to stderr
    pub fn info(&self, message: &str) {
        eprintln!("{} {}", "ℹ".cyan(), message);
    }

    /// Print success message to stderr
    pub fn success(&self, message: &str) {
        eprintln!("{} {}", "✓".green(), message);
    }

    /// Print warning message to stderr
    pub fn warn(&self, message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print error message to stderr
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Output text to stdout (questions, transcripts, reports)
    pub fn output(&self, text: &str) {
        println!("{}", text);
    }

    /// Output text to stdout without newline
    pub fn output_inline(&self, text: &str) {
        print!("{}", text);
        let _ = io::stdout().flush();
    }

    /// Print a dimmed key-hint line to stderr
    pub fn hint(&self, message: &str) {
        eprintln!("  {}", message.dimmed());
    }

    /// Print the banner for a question about to be asked
    pub fn question_header(&self, index: usize, total: usize, question: &Question) {
        println!();
        println!(
            "{} {}",
            format!("Question {}/{}", index + 1, total).bold(),
            format!(
                "[{} · {} · {}s]",
                question.category.as_str(),
                question.difficulty.as_str(),
                question.time_limit_secs
            )
            .dimmed()
        );
        println!("  {}", question.prompt.bold().white());
    }

    /// Format a countdown progress bar for the answer time limit
    pub fn format_progress(&self, elapsed_secs: u32, limit_secs: u32) -> String {
        let percent = if limit_secs > 0 {
            (elapsed_secs as f64 / limit_secs as f64 * 100.0).min(100.0)
        } else {
            0.0
        };

        // Build progress bar
        let bar_width = 20;
        let filled = ((percent / 100.0) * bar_width as f64) as usize;
        let empty = bar_width - filled;

        format!(
            "[{}{}] {:>3}s / {}s",
            "█".repeat(filled).cyan(),
            "░".repeat(empty),
            elapsed_secs,
            limit_secs
        )
    }

    /// Show a progress spinner for recording
    pub fn show_recording_progress(&mut self, message: &str) {
        self.start_spinner(message);
    }

    /// Update recording progress with an optional live transcript tail
    pub fn update_recording_progress(&self, elapsed_secs: u32, limit_secs: u32, tail: &str) {
        let progress = self.format_progress(elapsed_secs, limit_secs);
        if tail.is_empty() {
            self.update_spinner(&format!("Recording... {}", progress));
        } else {
            self.update_spinner(&format!("Recording... {} {}", progress, tail.dimmed()));
        }
    }

    /// Print a key-value pair (for config list)
    pub fn key_value(&self, key: &str, value: &str) {
        println!("{}: {}", key.cyan(), value);
    }

    /// Print one row of the queue listing
    pub fn queue_row(&self, status: &str, detail: &str) {
        let label = match status {
            "pending" => status.yellow(),
            "syncing" => status.cyan(),
            "failed" => status.red(),
            _ => status.normal(),
        };
        println!("  {:<10} {}", label, detail);
    }
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_progress_at_start() {
        let presenter = Presenter::new();
        let progress = presenter.format_progress(0, 120);
        assert!(progress.contains("0s / 120s"));
    }

    #[test]
    fn format_progress_at_half() {
        let presenter = Presenter::new();
        let progress = presenter.format_progress(60, 120);
        assert!(progress.contains("60s / 120s"));
    }

    #[test]
    fn format_progress_at_limit() {
        let presenter = Presenter::new();
        let progress = presenter.format_progress(120, 120);
        assert!(progress.contains("120s / 120s"));
    }

    #[test]
    fn format_progress_with_zero_limit() {
        let presenter = Presenter::new();
        let progress = presenter.format_progress(5, 0);
        assert!(progress.contains("5s / 0s"));
    }
}
