//! ahuff-core: adaptive Huffman text compression
//!
//! This library provides a one-pass Huffman codec that needs no frequency
//! table. Encoder and decoder start from the same empty model and update it
//! after every character, so they stay in lock-step from the data alone.
//!
//! # Architecture
//!
//! The system is designed around clear module boundaries:
//! - `tree`: arena-backed code tree overlaid with a frequency-ordered list
//! - `model`: encode a character to bits, decode bits back (resumable)
//! - `bitio`: packing bit sequences into bytes and back
//! - `writer`: buffered text writer over any `std::io::Write`
//! - `reader`: text reader over any `std::io::Read`
//! - `config`: buffer sizes and line endings
//! - `metrics`: observable codec behaviour
//!
//! # Example
//!
//! ```
//! use ahuff_core::{HuffmanReader, HuffmanWriter};
//!
//! let mut writer = HuffmanWriter::new(Vec::new());
//! writer.write("mississippi river").unwrap();
//! let bytes = writer.finish().unwrap();
//!
//! let mut reader = HuffmanReader::new(&bytes[..]);
//! assert_eq!(reader.read_to_end().unwrap(), "mississippi river");
//! ```
//!
//! # Design Principles
//!
//! - **No panics**: All errors are structured and recoverable
//! - **Single owner**: a model serves one direction of one stream
//! - **Streaming**: input may arrive in chunks of any size

pub mod bitio;
pub mod config;
pub mod error;
pub mod metrics;
pub mod model;
pub mod reader;
pub mod tree;
pub mod writer;

// Re-export commonly used types
pub use config::StreamConfig;
pub use error::{Error, Result};
pub use model::{AdaptiveModel, SENTINEL};
pub use reader::HuffmanReader;
pub use writer::HuffmanWriter;
