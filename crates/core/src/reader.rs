//! Streaming text reader: adaptive Huffman bytes in, characters out.
//!
//! `HuffmanReader` pulls fixed-size chunks from its source, unpacks them to
//! bits and feeds them to its `AdaptiveModel`. Decoded characters wait in a
//! queue; the reader keeps at least one character of lookahead so it can
//! report end-of-stream as soon as the next queued character is the
//! sentinel.
//!
//! # End of Stream
//!
//! The stream ends at the first `SENTINEL`. Anything decoded after it (the
//! writer's padding) is ignored. A source that runs dry without a sentinel
//! ends the stream too, so a truncated or empty source never loops.
//!
//! Once end-of-stream has been reported every read fails with
//! `Error::EndOfStream`.
//!
//! # Corrupt Input
//!
//! If a chunk holds a code the model cannot decode, the characters decoded
//! before it are still handed out. After them every read fails with the
//! same `Error::Model`; the reader never decodes past the bad code.

use crate::bitio::unpack;
use crate::config::{validate_line_ending, StreamConfig};
use crate::error::{Error, ModelError, Result};
use crate::metrics::CodecMetrics;
use crate::model::{AdaptiveModel, SENTINEL};
use std::collections::VecDeque;
use std::io::{ErrorKind, Read};
use tracing::{debug, trace};

/// Adaptive Huffman decoder over a byte source.
///
/// # Thread Safety
/// Not thread-safe; every read may mutate the model in place.
#[derive(Debug)]
pub struct HuffmanReader<R: Read> {
    /// `None` once closed
    source: Option<R>,
    model: AdaptiveModel,
    /// Decoded characters not yet handed out
    queue: VecDeque<char>,
    /// Read buffer, one chunk long
    chunk: Vec<u8>,
    /// Set when the sentinel was returned or is next in the queue
    eof: bool,
    /// Set when the source returned 0 bytes or the sentinel was decoded
    exhausted: bool,
    /// Decode failure, reported once the queue drains
    failure: Option<ModelError>,
    line_ending: String,
    metrics: CodecMetrics,
}

impl<R: Read> HuffmanReader<R> {
    /// Create a reader with the default configuration.
    pub fn new(source: R) -> Self {
        Self::from_parts(source, StreamConfig::default())
    }

    /// Create a reader with a custom configuration.
    ///
    /// # Errors
    /// Returns `Error::Config` if the configuration is invalid.
    pub fn with_config(source: R, config: &StreamConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_parts(source, config.clone()))
    }

    fn from_parts(source: R, config: StreamConfig) -> Self {
        Self {
            source: Some(source),
            model: AdaptiveModel::new(),
            queue: VecDeque::new(),
            chunk: vec![0; config.read_chunk_size],
            eof: false,
            exhausted: false,
            failure: None,
            line_ending: config.line_ending,
            metrics: CodecMetrics::new(),
        }
    }

    /// Read one character.
    ///
    /// Returns `Ok(None)` when the end-of-stream sentinel is reached; the
    /// sentinel itself is never returned.
    ///
    /// # Errors
    /// - `Error::Disposed` if the reader is closed
    /// - `Error::EndOfStream` if end-of-stream was already reported
    /// - `Error::Io` if pulling more input fails
    /// - `Error::Model` once every character before a corrupt code has been
    ///   read; repeated on every later call
    pub fn read_char(&mut self) -> Result<Option<char>> {
        self.ensure_readable()?;

        while self.queue.len() < 2 && !self.exhausted {
            self.pull_chunk()?;
        }

        if self.queue.is_empty() {
            if let Some(failure) = &self.failure {
                return Err(failure.clone().into());
            }
        }

        let character = self.queue.pop_front().unwrap_or(SENTINEL);
        if character == SENTINEL || self.queue.front() == Some(&SENTINEL) {
            self.mark_eof();
        }

        if character == SENTINEL {
            Ok(None)
        } else {
            self.metrics.characters += 1;
            Ok(Some(character))
        }
    }

    /// Read up to `count` characters into `buffer[offset..]`.
    ///
    /// Stops early at the end of the buffer or the end of the stream.
    /// Returns the number of characters stored.
    ///
    /// # Errors
    /// - `Error::InvalidArgument` if `offset` is past the end of `buffer`
    /// - anything `read_char` can return
    pub fn read_into(&mut self, buffer: &mut [char], offset: usize, count: usize) -> Result<usize> {
        if offset > buffer.len() {
            return Err(Error::InvalidArgument(format!(
                "offset {offset} is past the end of a buffer of length {}",
                buffer.len()
            )));
        }
        self.ensure_readable()?;

        let end = offset.saturating_add(count).min(buffer.len());
        let mut stored = 0;
        for slot in &mut buffer[offset..end] {
            match self.read_char()? {
                Some(character) => {
                    *slot = character;
                    stored += 1;
                }
                None => break,
            }
            if self.eof {
                break;
            }
        }
        Ok(stored)
    }

    /// Read up to and including the next line ending, which is stripped.
    ///
    /// The last line of a stream may end without a line ending.
    pub fn read_line(&mut self) -> Result<String> {
        self.ensure_readable()?;

        let mut line = String::new();
        while let Some(character) = self.read_char()? {
            line.push(character);
            if line.ends_with(self.line_ending.as_str()) {
                line.truncate(line.len() - self.line_ending.len());
                break;
            }
            if self.eof {
                break;
            }
        }
        Ok(line)
    }

    /// Read everything up to the end of the stream.
    pub fn read_to_end(&mut self) -> Result<String> {
        self.ensure_readable()?;

        let mut text = String::new();
        while let Some(character) = self.read_char()? {
            text.push(character);
            if self.eof {
                break;
            }
        }
        Ok(text)
    }

    /// Pull one chunk from the source and decode it into the queue.
    fn pull_chunk(&mut self) -> Result<()> {
        let source = self.source.as_mut().ok_or(Error::Disposed)?;

        let read = loop {
            match source.read(&mut self.chunk) {
                Ok(read) => break read,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        };

        if read == 0 {
            self.exhausted = true;
            if self.model.has_partial_code() {
                debug!("source ended in the middle of a code");
            }
            if self.queue.is_empty() {
                self.queue.push_back(SENTINEL);
            }
            return Ok(());
        }

        let bits = unpack(&self.chunk[..read]);
        let distinct = self.model.distinct_characters();
        let mut decoded = Vec::new();
        let outcome = self.model.decode_into(&bits, &mut decoded);

        self.metrics.bytes += read as u64;
        self.metrics.bits += bits.len() as u64;
        self.metrics.transfers += 1;
        self.metrics.new_characters += (self.model.distinct_characters() - distinct) as u64;
        trace!(bytes = read, characters = decoded.len(), "decoded chunk");

        if decoded.contains(&SENTINEL) {
            // Whatever follows the sentinel is padding.
            self.exhausted = true;
        } else if let Err(error) = outcome {
            match error {
                Error::Model(failure) => {
                    debug!(error = %failure, decoded = decoded.len(), "corrupt code in chunk");
                    self.failure = Some(failure);
                    self.exhausted = true;
                }
                other => return Err(other),
            }
        }
        self.queue.extend(decoded);
        Ok(())
    }

    fn ensure_readable(&self) -> Result<()> {
        if self.source.is_none() {
            return Err(Error::Disposed);
        }
        if self.eof {
            return Err(Error::EndOfStream);
        }
        Ok(())
    }

    fn mark_eof(&mut self) {
        if !self.eof {
            self.eof = true;
            self.metrics.complete();
            debug!(characters = self.metrics.characters, "reached end of stream");
        }
    }

    /// Release the source and reset the model.
    ///
    /// Idempotent: closing a closed reader does nothing.
    pub fn close(&mut self) {
        if self.source.take().is_some() {
            self.model.reset();
            self.queue.clear();
            self.failure = None;
            self.metrics.complete();
            debug!(bytes = self.metrics.bytes, "closed huffman reader");
        }
    }

    /// True once the end of the stream has been reached.
    pub fn is_eof(&self) -> bool {
        self.eof
    }

    pub fn is_closed(&self) -> bool {
        self.source.is_none()
    }

    pub fn line_ending(&self) -> &str {
        &self.line_ending
    }

    /// # Errors
    /// Returns `Error::Config` for an empty ending or one containing the sentinel.
    pub fn set_line_ending(&mut self, line_ending: impl Into<String>) -> Result<()> {
        let line_ending = line_ending.into();
        validate_line_ending(&line_ending)?;
        self.line_ending = line_ending;
        Ok(())
    }

    pub fn metrics(&self) -> &CodecMetrics {
        &self.metrics
    }

    /// The model, for inspection.
    pub fn model(&self) -> &AdaptiveModel {
        &self.model
    }
}

impl<R: Read> Drop for HuffmanReader<R> {
    fn drop(&mut self) {
        self.close();
    }
}
