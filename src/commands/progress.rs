//! Progress bars for write and verify sessions

use avrprog_core::flash::{WriteProgress, WriteReport};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress reporter using indicatif progress bars
pub struct IndicatifProgress {
    multi: MultiProgress,
    current_bar: Option<ProgressBar>,
}

impl Default for IndicatifProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl IndicatifProgress {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            current_bar: None,
        }
    }

    fn create_bar(&mut self, total: u64, phase: &'static str) {
        let pb = self.multi.add(ProgressBar::new(total));
        pb.set_style(
            ProgressStyle::default_bar()
                .template(&format!(
                    "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{bytes}}/{{total_bytes}} ({{bytes_per_sec}}, {{eta}}) {}",
                    phase
                ))
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        self.current_bar = Some(pb);
    }

    fn create_spinner(&mut self, message: String) {
        let pb = self.multi.add(ProgressBar::new_spinner());
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(message);
        pb.enable_steady_tick(Duration::from_millis(100));
        self.current_bar = Some(pb);
    }

    fn set_position(&self, position: usize) {
        if let Some(pb) = &self.current_bar {
            pb.set_position(position as u64);
        }
    }

    /// Finish the current bar or spinner with `message`
    pub fn finish(&mut self, message: &str) {
        if let Some(pb) = self.current_bar.take() {
            pb.finish_with_message(message.to_string());
        }
    }

    /// Stop the current bar without marking it complete
    pub fn abandon(&mut self, message: &str) {
        if let Some(pb) = self.current_bar.take() {
            pb.abandon_with_message(message.to_string());
        }
    }
}

impl WriteProgress for IndicatifProgress {
    fn erasing(&mut self, flash_size: usize) {
        self.create_spinner(format!("Erasing {} bytes of flash...", flash_size));
    }

    fn erase_complete(&mut self) {
        self.finish("Erase complete");
    }

    fn writing(&mut self, bytes_to_write: usize) {
        self.create_bar(bytes_to_write as u64, "Writing");
    }

    fn write_progress(&mut self, bytes_written: usize) {
        self.set_position(bytes_written);
    }

    fn verifying(&mut self, bytes_to_verify: usize) {
        self.finish("Write complete");
        self.create_bar(bytes_to_verify as u64, "Verifying");
    }

    fn verify_progress(&mut self, bytes_verified: usize) {
        self.set_position(bytes_verified);
    }

    fn complete(&mut self, report: &WriteReport) {
        match report.verification {
            Some(v) if !v.is_match() => self.abandon("Verification failed!"),
            Some(_) => self.finish("Verification passed"),
            None => self.finish("Write complete"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phases_hand_over_bars() {
        let mut progress = IndicatifProgress::default();
        progress.multi.set_draw_target(indicatif::ProgressDrawTarget::hidden());

        progress.erasing(32 * 1024);
        assert!(progress.current_bar.is_some());
        progress.erase_complete();
        assert!(progress.current_bar.is_none());

        progress.writing(256);
        progress.write_progress(128);
        assert_eq!(progress.current_bar.as_ref().map(|pb| pb.position()), Some(128));

        progress.complete(&WriteReport::default());
        assert!(progress.current_bar.is_none());
    }
}
