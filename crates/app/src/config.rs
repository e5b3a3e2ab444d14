//! Command-line configuration for the ahuff tool.
//!
//! Parses arguments with clap and turns the shared stream options into an
//! `ahuff_core::StreamConfig`.
//!
//! # Philosophy
//!
//! `ahuff demo` works with ZERO arguments, using a time-based seed that is
//! printed so the run can be reproduced with `--seed`.

use ahuff_core::config::{DEFAULT_PREFERRED_BUFFER_SIZE, DEFAULT_READ_CHUNK_SIZE};
use ahuff_core::StreamConfig;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "ahuff", version)]
#[command(about = "Adaptive Huffman text compression", long_about = None)]
pub struct Cli {
    /// Log flushes, chunk pulls and end-of-stream events
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Don't print metrics summaries
    #[arg(long, global = true)]
    pub no_metrics: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compress a UTF-8 text file
    Encode {
        /// Text file to compress
        #[arg(long = "in")]
        input: PathBuf,
        /// Compressed output file
        #[arg(long = "out")]
        output: PathBuf,
        #[command(flatten)]
        stream: StreamArgs,
    },
    /// Decompress a file produced by `encode`
    Decode {
        /// Compressed input file
        #[arg(long = "in")]
        input: PathBuf,
        /// Text output file
        #[arg(long = "out")]
        output: PathBuf,
        #[command(flatten)]
        stream: StreamArgs,
    },
    /// Round-trip generated sample text in memory
    Demo {
        /// Random seed for determinism (default: time-based)
        #[arg(long)]
        seed: Option<u64>,
        /// Number of characters to generate
        #[arg(long, default_value_t = 16 * 1024)]
        size: usize,
        #[command(flatten)]
        stream: StreamArgs,
    },
}

/// Options shared by every subcommand that opens a stream.
#[derive(Debug, Clone, Args)]
pub struct StreamArgs {
    /// Writer flush threshold in bytes
    #[arg(long, default_value_t = DEFAULT_PREFERRED_BUFFER_SIZE)]
    pub buffer_size: usize,

    /// Bytes the reader pulls per chunk
    #[arg(long, default_value_t = DEFAULT_READ_CHUNK_SIZE)]
    pub chunk_size: usize,

    /// Line ending; accepts \n, \r and \t escapes (default: platform)
    #[arg(long)]
    pub line_ending: Option<String>,
}

impl StreamArgs {
    /// Build and validate the stream configuration.
    pub fn to_config(&self) -> ahuff_core::Result<StreamConfig> {
        let mut config = StreamConfig {
            preferred_buffer_size: self.buffer_size,
            read_chunk_size: self.chunk_size,
            ..StreamConfig::default()
        };
        if let Some(ending) = &self.line_ending {
            config.line_ending = unescape(ending);
        }
        config.validate()?;
        Ok(config)
    }
}

/// Resolve a seed (explicit or time-based).
pub fn resolve_seed(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(|| {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|t| t.as_millis() as u64)
            .unwrap_or_default()
    })
}

/// Print the configuration in human-readable form.
pub fn print_config(config: &StreamConfig) {
    println!("=== Configuration ===");
    println!("Buffer size: {} bytes", config.preferred_buffer_size);
    println!("Chunk size:  {} bytes", config.read_chunk_size);
    println!("Line ending: {:?}", config.line_ending);
    println!();
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
