//! Error types for the adaptive Huffman codec.
//!
//! Every fallible operation returns a structured error. The model itself
//! performs no I/O, so its only failures come from corrupt input; stream
//! errors come from misuse (closed streams, reads past the end) or from the
//! underlying byte sink/source.

use thiserror::Error;

/// Top-level error type for all operations in the crate.
///
/// Each variant corresponds to a specific failure domain:
/// - Bit I/O: packing bits into bytes
/// - Model: decoding a bit stream the model cannot make sense of
/// - Stream state: use after close, reads past the end of the stream
/// - I/O: failures reported by the byte sink or source
#[derive(Debug, Error)]
pub enum Error {
    /// Bit packing failed (e.g., a partial trailing byte)
    #[error("bit I/O error: {0}")]
    BitIo(#[from] BitIoError),

    /// Adaptive model error (e.g., invalid literal in the bit stream)
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// An argument was outside its valid range
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The writer or reader was used after `close()`
    #[error("stream has been closed")]
    Disposed,

    /// A read was attempted after the end of the stream was reported
    #[error("attempted to read past the end of the stream")]
    EndOfStream,

    /// Text to be written contains the reserved end-of-stream character
    #[error("input contains the reserved end-of-stream character at index {position}")]
    SentinelInInput { position: usize },

    /// Byte sink or source I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

/// Bit/byte packing errors.
#[derive(Debug, Error)]
pub enum BitIoError {
    /// Only whole bytes can be packed
    #[error("cannot pack {bits} bits: not a multiple of 8")]
    PartialByte { bits: usize },
}

/// Adaptive model errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// A literal read from the stream is not a Unicode scalar value
    #[error("literal {0:#010x} is not a valid character")]
    InvalidLiteral(u32),

    /// The decode cursor landed on a node it can never legally occupy
    #[error("decode cursor at node {node} which is not part of the code tree")]
    InvalidCursor { node: usize },

    /// One of the tree/list invariants does not hold
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

/// Type alias for Result with our Error type
pub type Result<T> = std::result::Result<T, Error>;
