//! Incremental parsing of the download utility's stdout.
//!
//! The utility prints lines like:
//!
//! ```text
//! 54.2% of ~1.40 GB @ 4.1 MB/s ETA: 00:05:32
//! ```
//!
//! Only the tokens we need are extracted; anything else on the line is
//! ignored.

use once_cell::sync::Lazy;
use regex_lite::Regex;

static PERCENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)%").expect("valid regex"));

static SIZE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"of ~?(\d+(?:\.\d+)?)\s*([KMG]i?B)").expect("valid regex"));

static ETA_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"ETA[:\s]+(\d{1,2}):(\d{2}):(\d{2})").expect("valid regex"));

/// Progress signals extracted from one output line.
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    pub percent: f64,
    pub total_bytes: Option<u64>,
    pub eta_secs: Option<u64>,
}

impl Progress {
    /// Bytes still to transfer, when the total size is known.
    pub fn bytes_left(&self) -> Option<u64> {
        self.total_bytes
            .map(|total| (total as f64 * (100.0 - self.percent) / 100.0) as u64)
    }
}

fn unit_multiplier(unit: &str) -> f64 {
    match unit {
        "KB" | "KiB" => 1024.0,
        "MB" | "MiB" => 1024.0 * 1024.0,
        _ => 1024.0 * 1024.0 * 1024.0,
    }
}

/// Parse one stdout line; `None` when it carries no percentage token.
pub fn parse_progress(line: &str) -> Option<Progress> {
    let percent: f64 = PERCENT_RE
        .captures(line)?
        .get(1)?
        .as_str()
        .parse()
        .ok()?;

    let total_bytes = SIZE_RE.captures(line).and_then(|caps| {
        let value: f64 = caps.get(1)?.as_str().parse().ok()?;
        let unit = caps.get(2)?.as_str();
        Some((value * unit_multiplier(unit)) as u64)
    });

    let eta_secs = ETA_RE.captures(line).and_then(|caps| {
        let hours: u64 = caps.get(1)?.as_str().parse().ok()?;
        let minutes: u64 = caps.get(2)?.as_str().parse().ok()?;
        let seconds: u64 = caps.get(3)?.as_str().parse().ok()?;
        Some(hours * 3600 + minutes * 60 + seconds)
    });

    Some(Progress {
        percent: percent.min(100.0),
        total_bytes,
        eta_secs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_progress_line() {
        let progress = parse_progress("54.2% of ~1.40 GB @ 4.1 MB/s ETA: 00:05:32").unwrap();

        assert!((progress.percent - 54.2).abs() < 0.001);
        assert_eq!(progress.total_bytes, Some(1503238553));
        assert_eq!(progress.eta_secs, Some(332));
    }

    #[test]
    fn test_percent_only_line() {
        let progress = parse_progress("12% done").unwrap();

        assert_eq!(progress.percent, 12.0);
        assert!(progress.total_bytes.is_none());
        assert!(progress.eta_secs.is_none());
    }

    #[test]
    fn test_line_without_percent_is_none() {
        assert!(parse_progress("INFO: starting transfer").is_none());
        assert!(parse_progress("").is_none());
    }

    #[test]
    fn test_percent_is_clamped() {
        assert_eq!(parse_progress("101.5%").unwrap().percent, 100.0);
    }

    #[test]
    fn test_megabyte_sizes() {
        let progress = parse_progress("10% of 700.0 MB ETA: 00:01:00").unwrap();
        assert_eq!(progress.total_bytes, Some(734003200));
    }

    #[test]
    fn test_bytes_left() {
        let progress = parse_progress("75% of 1.00 GB").unwrap();
        assert_eq!(progress.bytes_left(), Some(268435456));
    }

    #[test]
    fn test_bytes_left_unknown_total() {
        let progress = parse_progress("75%").unwrap();
        assert!(progress.bytes_left().is_none());
    }
}
