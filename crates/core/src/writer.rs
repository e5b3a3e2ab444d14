//! Streaming text writer: characters in, adaptive Huffman bytes out.
//!
//! `HuffmanWriter` encodes each character through its `AdaptiveModel`,
//! queues the code bits, and hands whole bytes to the sink whenever at least
//! `preferred_buffer_size` of them are pending.
//!
//! # Stream Format
//!
//! ```text
//! +---------------------------+
//! | codes of written chars    |  packed LSB-first, no header
//! +---------------------------+
//! | code of SENTINEL (U+0003) |  written by close()
//! +---------------------------+
//! | 1-bit padding             |  up to the next byte boundary
//! +---------------------------+
//! ```
//!
//! # Lifecycle
//!
//! Open until `close()` (or `finish()`, or drop). Closing writes the
//! sentinel and the padding, flushes, releases the sink and resets the
//! model; every later `write`/`flush` fails with `Error::Disposed`.

use crate::bitio::BitBuffer;
use crate::config::{validate_line_ending, StreamConfig, DEFAULT_PREFERRED_BUFFER_SIZE};
use crate::error::{Error, Result};
use crate::metrics::CodecMetrics;
use crate::model::{AdaptiveModel, SENTINEL};
use std::io::Write;
use tracing::debug;

/// Adaptive Huffman encoder over a byte sink.
///
/// # Thread Safety
/// Not thread-safe; every write mutates the model in place.
#[derive(Debug)]
pub struct HuffmanWriter<W: Write> {
    /// `None` once closed
    sink: Option<W>,
    model: AdaptiveModel,
    pending: BitBuffer,
    preferred_buffer_size: usize,
    line_ending: String,
    metrics: CodecMetrics,
}

impl<W: Write> HuffmanWriter<W> {
    /// Create a writer with the default configuration.
    pub fn new(sink: W) -> Self {
        Self::from_parts(sink, StreamConfig::default())
    }

    /// Create a writer with a custom configuration.
    ///
    /// # Errors
    /// Returns `Error::Config` if the configuration is invalid.
    pub fn with_config(sink: W, config: &StreamConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_parts(sink, config.clone()))
    }

    fn from_parts(sink: W, config: StreamConfig) -> Self {
        Self {
            sink: Some(sink),
            model: AdaptiveModel::new(),
            pending: BitBuffer::with_capacity(config.preferred_buffer_size),
            preferred_buffer_size: config.preferred_buffer_size,
            line_ending: config.line_ending,
            metrics: CodecMetrics::new(),
        }
    }

    /// Encode `text`, flushing whenever the buffer reaches its threshold.
    ///
    /// # Errors
    /// - `Error::Disposed` if the writer is closed
    /// - `Error::SentinelInInput` if `text` contains `SENTINEL`; nothing is
    ///   written in that case
    /// - `Error::Io` if a flush fails
    pub fn write(&mut self, text: &str) -> Result<()> {
        if self.sink.is_none() {
            return Err(Error::Disposed);
        }
        if let Some(position) = text.chars().position(|c| c == SENTINEL) {
            return Err(Error::SentinelInInput { position });
        }

        for character in text.chars() {
            self.encode(character);
            if self.should_flush() {
                self.flush()?;
            }
        }
        Ok(())
    }

    /// Encode `text` followed by the line ending.
    pub fn write_line(&mut self, text: &str) -> Result<()> {
        self.write(text)?;
        let line_ending = std::mem::take(&mut self.line_ending);
        let result = self.write(&line_ending);
        self.line_ending = line_ending;
        result
    }

    /// Write every complete pending byte to the sink and flush the sink.
    ///
    /// Bits that do not fill a byte stay buffered.
    pub fn flush(&mut self) -> Result<()> {
        let sink = self.sink.as_mut().ok_or(Error::Disposed)?;

        let bytes = self.pending.take_whole_bytes();
        if !bytes.is_empty() {
            sink.write_all(&bytes)?;
            self.metrics.bytes += bytes.len() as u64;
            self.metrics.transfers += 1;
            debug!(bytes = bytes.len(), "flushed encoded bytes");
        }
        sink.flush()?;
        Ok(())
    }

    /// Finish the stream and release the sink.
    ///
    /// Idempotent: closing a closed writer does nothing.
    pub fn close(&mut self) -> Result<()> {
        self.shutdown().map(|_| ())
    }

    /// Finish the stream and hand the sink back.
    ///
    /// # Errors
    /// Returns `Error::Disposed` if the writer was already closed.
    pub fn finish(mut self) -> Result<W> {
        self.shutdown()?.ok_or(Error::Disposed)
    }

    /// Write the sentinel and padding, flush, and release the sink.
    ///
    /// The sink is taken out first so it is released even if the final
    /// write fails.
    fn shutdown(&mut self) -> Result<Option<W>> {
        let Some(mut sink) = self.sink.take() else {
            return Ok(None);
        };

        let bits = self.model.encode(SENTINEL);
        self.metrics.bits += bits.len() as u64;
        self.pending.extend_from_slice(&bits);
        self.pending.pad_with_ones();

        let bytes = self.pending.take_whole_bytes();
        self.pending.clear();
        self.model.reset();
        self.metrics.complete();

        sink.write_all(&bytes)?;
        sink.flush()?;
        self.metrics.bytes += bytes.len() as u64;
        self.metrics.transfers += 1;

        debug!(
            characters = self.metrics.characters,
            bytes = self.metrics.bytes,
            "closed huffman writer"
        );
        Ok(Some(sink))
    }

    fn encode(&mut self, character: char) {
        let distinct = self.model.distinct_characters();
        let bits = self.model.encode(character);

        self.metrics.characters += 1;
        self.metrics.bits += bits.len() as u64;
        if self.model.distinct_characters() > distinct {
            self.metrics.new_characters += 1;
        }
        self.pending.extend_from_slice(&bits);
    }

    fn should_flush(&self) -> bool {
        self.pending.whole_bytes() >= self.preferred_buffer_size
    }

    pub fn is_closed(&self) -> bool {
        self.sink.is_none()
    }

    pub fn preferred_buffer_size(&self) -> usize {
        self.preferred_buffer_size
    }

    /// Change the flush threshold; 0 restores the default.
    ///
    /// Flushes immediately if more whole bytes than the new threshold are
    /// already pending.
    ///
    /// # Errors
    /// - `Error::Disposed` if the writer is closed
    /// - `Error::Io` if the flush fails
    pub fn set_preferred_buffer_size(&mut self, size: usize) -> Result<()> {
        if self.sink.is_none() {
            return Err(Error::Disposed);
        }
        self.preferred_buffer_size = if size == 0 {
            DEFAULT_PREFERRED_BUFFER_SIZE
        } else {
            size
        };

        if self.should_flush() {
            self.flush()?;
        }
        Ok(())
    }

    pub fn line_ending(&self) -> &str {
        &self.line_ending
    }

    /// # Errors
    /// - `Error::Disposed` if the writer is closed
    /// - `Error::Config` for an empty ending or one containing the sentinel
    pub fn set_line_ending(&mut self, line_ending: impl Into<String>) -> Result<()> {
        if self.sink.is_none() {
            return Err(Error::Disposed);
        }
        let line_ending = line_ending.into();
        validate_line_ending(&line_ending)?;
        self.line_ending = line_ending;
        Ok(())
    }

    /// Bits encoded but not yet written to the sink.
    pub fn pending_bits(&self) -> usize {
        self.pending.len()
    }

    pub fn metrics(&self) -> &CodecMetrics {
        &self.metrics
    }

    /// The model, for inspection.
    pub fn model(&self) -> &AdaptiveModel {
        &self.model
    }

    /// The sink, or `None` once closed.
    pub fn get_ref(&self) -> Option<&W> {
        self.sink.as_ref()
    }
}

impl<W: Write> Drop for HuffmanWriter<W> {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            debug!(error = %e, "failed to close huffman writer on drop");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::HuffmanReader;
    use std::io;

    /// Sink that counts flushes and can be told to fail.
    #[derive(Debug, Default)]
    struct RecordingSink {
        data: Vec<u8>,
        flushes: usize,
        fail_writes: bool,
    }

    impl Write for RecordingSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.fail_writes {
                return Err(io::Error::new(io::ErrorKind::Other, "sink failure"));
            }
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            self.flushes += 1;
            Ok(())
        }
    }

    #[test]
    fn test_empty_stream_is_sentinel_literal() {
        let writer = HuffmanWriter::new(Vec::new());
        let bytes = writer.finish().unwrap();

        // 30 zero bits then 1, 1 (U+0003 MSB-first), packed LSB-first
        assert_eq!(bytes, vec![0x00, 0x00, 0x00, 0xC0]);
    }

    #[test]
    fn test_output_is_padded_to_bytes() {
        let mut writer = HuffmanWriter::new(Vec::new());
        writer.write("mississippi river").unwrap();
        let bytes = writer.finish().unwrap();

        // 339 code bits (including the sentinel) padded to 344
        assert_eq!(bytes.len(), 43);
        // Padding bits are ones
        assert_eq!(bytes[42] & 0b1111_1000, 0b1111_1000);
    }

    #[test]
    fn test_buffers_until_threshold() {
        let mut writer = HuffmanWriter::new(Vec::new());
        writer.write("a").unwrap();

        // 32 bits = 4 bytes, below the default 32-byte threshold
        assert_eq!(writer.get_ref().map(Vec::len), Some(0));
        assert_eq!(writer.pending_bits(), 32);

        writer.set_preferred_buffer_size(2).unwrap();
        assert_eq!(writer.get_ref().map(Vec::len), Some(4));
        assert_eq!(writer.pending_bits(), 0);
    }

    #[test]
    fn test_flush_keeps_partial_byte() {
        let mut writer = HuffmanWriter::new(Vec::new());
        writer.write("ab").unwrap();
        // 32 + 33 bits
        writer.flush().unwrap();

        assert_eq!(writer.get_ref().map(Vec::len), Some(8));
        assert_eq!(writer.pending_bits(), 1);
    }

    #[test]
    fn test_small_threshold_flushes_per_character() {
        let config = StreamConfig {
            preferred_buffer_size: 1,
            ..StreamConfig::default()
        };
        let mut writer = HuffmanWriter::with_config(RecordingSink::default(), &config).unwrap();
        writer.write("xyz").unwrap();

        let sink = writer.get_ref().unwrap();
        assert!(sink.flushes >= 3);
        assert!(sink.data.len() >= 12);
    }

    #[test]
    fn test_zero_threshold_restores_default() {
        let mut writer = HuffmanWriter::new(Vec::new());
        writer.set_preferred_buffer_size(7).unwrap();
        assert_eq!(writer.preferred_buffer_size(), 7);
        writer.set_preferred_buffer_size(0).unwrap();
        assert_eq!(writer.preferred_buffer_size(), DEFAULT_PREFERRED_BUFFER_SIZE);
    }

    #[test]
    fn test_write_line_appends_line_ending() {
        let mut plain = HuffmanWriter::new(Vec::new());
        plain.write("hi").unwrap();
        plain.write("||").unwrap();
        let expected = plain.finish().unwrap();

        let mut lined = HuffmanWriter::new(Vec::new());
        lined.set_line_ending("||").unwrap();
        lined.write_line("hi").unwrap();
        assert_eq!(lined.line_ending(), "||");
        assert_eq!(lined.finish().unwrap(), expected);
    }

    #[test]
    fn test_rejects_sentinel_in_input() {
        let mut writer = HuffmanWriter::new(Vec::new());
        let result = writer.write("ab\u{3}c");
        assert!(matches!(result, Err(Error::SentinelInInput { position: 2 })));

        // Nothing from the rejected text was encoded
        assert_eq!(writer.pending_bits(), 0);
        assert_eq!(writer.metrics().characters, 0);
    }

    #[test]
    fn test_rejects_bad_line_ending() {
        let mut writer = HuffmanWriter::new(Vec::new());
        assert!(matches!(writer.set_line_ending(""), Err(Error::Config(_))));
        assert!(writer.set_line_ending("\u{3}").is_err());
    }

    #[test]
    fn test_use_after_close() {
        let mut writer = HuffmanWriter::new(Vec::new());
        writer.write("abc").unwrap();
        writer.close().unwrap();
        assert!(writer.is_closed());

        assert!(matches!(writer.write("d"), Err(Error::Disposed)));
        assert!(matches!(writer.flush(), Err(Error::Disposed)));
        assert!(matches!(writer.write_line("d"), Err(Error::Disposed)));
        assert!(matches!(writer.set_preferred_buffer_size(1), Err(Error::Disposed)));
        assert!(matches!(writer.set_line_ending("\n"), Err(Error::Disposed)));

        // Closing again is a no-op
        writer.close().unwrap();
        assert!(matches!(writer.finish(), Err(Error::Disposed)));
    }

    #[test]
    fn test_drop_closes_stream() {
        let text = "dropped without close";
        let mut bytes = Vec::new();
        {
            let mut writer = HuffmanWriter::new(&mut bytes);
            writer.write(text).unwrap();
        }

        // Sentinel and padding were written: whole bytes, readable to the end
        assert!(!bytes.is_empty());
        let mut reader = HuffmanReader::new(&bytes[..]);
        assert_eq!(reader.read_to_end().unwrap(), text);
        assert!(reader.is_eof());
    }

    #[test]
    fn test_drop_after_close_writes_nothing_more() {
        let mut bytes = Vec::new();
        let closed_len = {
            let mut writer = HuffmanWriter::new(&mut bytes);
            writer.write("once").unwrap();
            writer.close().unwrap();
            writer.metrics().bytes
        };
        assert_eq!(bytes.len() as u64, closed_len);
    }

    #[test]
    fn test_close_propagates_sink_failure() {
        let sink = RecordingSink {
            fail_writes: true,
            ..RecordingSink::default()
        };
        let mut writer = HuffmanWriter::new(sink);
        writer.write("abc").unwrap();

        assert!(matches!(writer.close(), Err(Error::Io(_))));
        // The sink was released regardless
        assert!(writer.is_closed());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = StreamConfig {
            preferred_buffer_size: 0,
            ..StreamConfig::default()
        };
        assert!(HuffmanWriter::with_config(Vec::new(), &config).is_err());
    }

    #[test]
    fn test_metrics_track_characters() {
        let mut writer = HuffmanWriter::new(Vec::new());
        writer.write("aab").unwrap();

        let metrics = writer.metrics();
        assert_eq!(metrics.characters, 3);
        assert_eq!(metrics.new_characters, 2);
        assert_eq!(metrics.bits, writer.pending_bits() as u64);
    }
}
