//! Helper functions
//!
//! Formatting used by the run report and the command-line output.
//!
//! # Example
//!
//! ```rust
//! use optout_proof::utils::Helpers;
//!
//! assert_eq!(Helpers::format_bytes(1536), "1.50 KB");
//! assert_eq!(Helpers::format_proof(&[0.0, 1.5e-7], 3), "[0.000, 0.000]");
//! ```

use std::time::Duration;

/// Helper functions
pub struct Helpers;

impl Helpers {
    /// Format bytes to human-readable string
    ///
    /// # Arguments
    /// * `bytes` - Number of bytes
    ///
    /// # Returns
    /// Formatted string (e.g., "1.00 KB", "1.50 MB")
    pub fn format_bytes(bytes: u64) -> String {
        const KB: u64 = 1024;
        const MB: u64 = KB * 1024;
        const GB: u64 = MB * 1024;

        if bytes >= GB {
            format!("{:.2} GB", bytes as f64 / GB as f64)
        } else if bytes >= MB {
            format!("{:.2} MB", bytes as f64 / MB as f64)
        } else if bytes >= KB {
            format!("{:.2} KB", bytes as f64 / KB as f64)
        } else {
            format!("{} B", bytes)
        }
    }

    /// Format a duration as seconds, milliseconds or microseconds
    ///
    /// # Arguments
    /// * `duration` - Elapsed time
    ///
    /// # Returns
    /// Formatted string (e.g., "1.23s", "500ms", "42µs")
    pub fn format_duration(duration: Duration) -> String {
        if duration.as_secs() >= 1 {
            format!("{:.2}s", duration.as_secs_f64())
        } else if duration.as_millis() >= 1 {
            format!("{}ms", duration.as_millis())
        } else {
            format!("{}µs", duration.as_micros())
        }
    }

    /// Format a proof vector with a fixed number of decimals
    ///
    /// Negative zeros produced by approximate arithmetic print as `0`.
    pub fn format_proof(values: &[f64], decimals: usize) -> String {
        let body: Vec<String> = values
            .iter()
            .map(|v| {
                let s = format!("{:.*}", decimals, v);
                match s.strip_prefix('-') {
                    Some(rest) if rest.chars().all(|c| c == '0' || c == '.') => rest.to_string(),
                    _ => s,
                }
            })
            .collect();
        format!("[{}]", body.join(", "))
    }
}
