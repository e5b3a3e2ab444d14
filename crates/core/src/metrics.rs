//! Metrics collection and reporting for encode/decode streams.
//!
//! Each `HuffmanWriter` and `HuffmanReader` keeps one `CodecMetrics` and
//! updates it as characters and bytes flow through. The numbers make the
//! adaptive model's behaviour observable: how quickly the code converges,
//! how many bytes each flush produced, and the overall compression ratio.
//!
//! # Thread Safety
//!
//! `CodecMetrics` is plain data owned by a single stream. Copy it out with
//! `clone()` if another thread needs to look at it.

use std::time::{Duration, Instant};

/// Counters for one encode or decode stream.
#[derive(Debug, Clone)]
pub struct CodecMetrics {
    // === Timing ===
    /// When the stream was opened
    pub start_time: Instant,

    /// When the stream was closed (set on completion)
    pub end_time: Option<Instant>,

    // === Characters ===
    /// Characters passed through the model (sentinel excluded)
    pub characters: u64,

    /// Characters seen for the first time (sent as literals)
    pub new_characters: u64,

    // === Bits and bytes ===
    /// Code bits produced or consumed
    pub bits: u64,

    /// Bytes written to the sink or read from the source
    pub bytes: u64,

    /// Flushes (writer) or chunk pulls (reader)
    pub transfers: u64,
}

impl CodecMetrics {
    /// Create new metrics with start time set to now.
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            end_time: None,
            characters: 0,
            new_characters: 0,
            bits: 0,
            bytes: 0,
            transfers: 0,
        }
    }

    /// Mark the stream as complete.
    pub fn complete(&mut self) {
        if self.end_time.is_none() {
            self.end_time = Some(Instant::now());
        }
    }

    /// Get total duration (or current elapsed if not complete).
    pub fn duration(&self) -> Duration {
        match self.end_time {
            Some(end) => end.duration_since(self.start_time),
            None => self.start_time.elapsed(),
        }
    }

    /// Compressed size relative to 4-byte characters (bytes / (characters * 4)).
    ///
    /// Returns 0.0 if no characters were processed.
    pub fn compression_ratio(&self) -> f64 {
        if self.characters == 0 {
            0.0
        } else {
            self.bytes as f64 / (self.characters as f64 * 4.0)
        }
    }

    /// Average code bits per character.
    pub fn bits_per_character(&self) -> f64 {
        if self.characters == 0 {
            0.0
        } else {
            self.bits as f64 / self.characters as f64
        }
    }

    /// Compute throughput in characters/second.
    pub fn throughput_cps(&self) -> f64 {
        let duration_secs = self.duration().as_secs_f64();
        if duration_secs == 0.0 {
            0.0
        } else {
            self.characters as f64 / duration_secs
        }
    }

    /// Print a human-readable summary to stdout.
    pub fn print_summary(&self, title: &str) {
        println!("\n=== {} ===", title);
        println!("Duration: {} ms", self.duration().as_millis());
        println!("Characters: {} ({} distinct)", self.characters, self.new_characters);
        println!("Code bits: {} ({:.2} bits/char)", self.bits, self.bits_per_character());
        println!("Bytes: {} in {} transfers", self.bytes, self.transfers);
        println!("Ratio vs UTF-32: {:.1}%", self.compression_ratio() * 100.0);
        println!("Throughput: {:.0} chars/s", self.throughput_cps());
    }

    /// Export metrics as a simple text format (for parsing/testing).
    pub fn export_text(&self) -> String {
        format!(
            "duration_ms={}\n\
             characters={}\n\
             new_characters={}\n\
             bits={}\n\
             bytes={}\n\
             transfers={}\n\
             bits_per_character={:.4}\n\
             compression_ratio={:.4}\n",
            self.duration().as_millis(),
            self.characters,
            self.new_characters,
            self.bits,
            self.bytes,
            self.transfers,
            self.bits_per_character(),
            self.compression_ratio(),
        )
    }
}

impl Default for CodecMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = CodecMetrics::new();
        assert!(metrics.end_time.is_none());
        assert!(metrics.duration().as_millis() < 100); // Should be recent
        assert_eq!(metrics.compression_ratio(), 0.0);
        assert_eq!(metrics.bits_per_character(), 0.0);
    }

    #[test]
    fn test_ratios() {
        let mut metrics = CodecMetrics::new();
        metrics.characters = 100;
        metrics.bits = 250;
        metrics.bytes = 40;

        assert_eq!(metrics.bits_per_character(), 2.5);
        assert_eq!(metrics.compression_ratio(), 0.1);
    }

    #[test]
    fn test_complete_is_sticky() {
        let mut metrics = CodecMetrics::new();
        metrics.complete();
        let first = metrics.end_time;
        std::thread::sleep(Duration::from_millis(5));
        metrics.complete();
        assert_eq!(metrics.end_time, first);
    }

    #[test]
    fn test_export_text() {
        let mut metrics = CodecMetrics::new();
        metrics.characters = 1000;
        metrics.bytes = 300;
        metrics.transfers = 10;

        let text = metrics.export_text();
        assert!(text.contains("characters=1000"));
        assert!(text.contains("bytes=300"));
        assert!(text.contains("transfers=10"));
    }
}
