// src/main.rs
mod config;
mod input_gen;
mod logger;

use ahuff_core::{HuffmanReader, HuffmanWriter, Result, StreamConfig};
use clap::Parser;
use config::{print_config, resolve_seed, Cli, Command};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{error, info};

fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init(cli.verbose);

    let span = tracing::info_span!("command_execution", command = ?std::env::args().collect::<Vec<_>>());
    let _enter = span.enter();

    let show_metrics = !cli.no_metrics;
    match cli.command {
        Command::Encode { input, output, stream } => {
            encode_file(&input, &output, &stream.to_config()?, show_metrics)
        }
        Command::Decode { input, output, stream } => {
            decode_file(&input, &output, &stream.to_config()?, show_metrics)
        }
        Command::Demo { seed, size, stream } => {
            let config = stream.to_config()?;
            if run_demo(resolve_seed(seed), size, &config, show_metrics)? {
                Ok(())
            } else {
                std::process::exit(1);
            }
        }
    }
}

fn encode_file(input: &Path, output: &Path, config: &StreamConfig, show_metrics: bool) -> Result<()> {
    let text = std::fs::read_to_string(input)?;
    info!(input = %input.display(), characters = text.chars().count(), "Encoding");

    let sink = BufWriter::new(File::create(output)?);
    let mut writer = HuffmanWriter::with_config(sink, config)?;
    writer.write(&text)?;
    writer.close()?;

    info!(output = %output.display(), bytes = writer.metrics().bytes, "Encoded");
    if show_metrics {
        writer.metrics().print_summary("Encoder Metrics");
    }
    Ok(())
}

fn decode_file(input: &Path, output: &Path, config: &StreamConfig, show_metrics: bool) -> Result<()> {
    info!(input = %input.display(), "Decoding");

    let source = BufReader::new(File::open(input)?);
    let mut reader = HuffmanReader::with_config(source, config)?;
    let text = reader.read_to_end()?;

    let mut sink = BufWriter::new(File::create(output)?);
    sink.write_all(text.as_bytes())?;
    sink.flush()?;

    info!(output = %output.display(), characters = reader.metrics().characters, "Decoded");
    if show_metrics {
        reader.metrics().print_summary("Decoder Metrics");
    }
    reader.close();
    Ok(())
}

/// Encode generated text into memory, decode it again and compare.
fn run_demo(seed: u64, size: usize, config: &StreamConfig, show_metrics: bool) -> Result<bool> {
    println!("=== Adaptive Huffman Demo ===");
    println!("Seed: {} (use --seed {} to reproduce)", seed, seed);
    println!("Characters: {}", size);
    println!();
    print_config(config);

    let text = input_gen::generate_sample_text(seed, size);

    let mut bytes = Vec::new();
    let mut writer = HuffmanWriter::with_config(&mut bytes, config)?;
    writer.write(&text)?;
    writer.close()?;
    let encoder_metrics = writer.metrics().clone();
    drop(writer);

    let mut reader = HuffmanReader::with_config(&bytes[..], config)?;
    let decoded = reader.read_to_end()?;

    if show_metrics {
        encoder_metrics.print_summary("Encoder Metrics");
        reader.metrics().print_summary("Decoder Metrics");
    }

    println!();
    if decoded == text {
        println!("✓ Round trip succeeded: {} characters in {} bytes", size, bytes.len());
        Ok(true)
    } else {
        let diverged = text
            .chars()
            .zip(decoded.chars())
            .take_while(|(a, b)| a == b)
            .count();
        error!(diverged_at = diverged, expected = size, got = decoded.chars().count(), "Round trip mismatch");
        println!("✗ Round trip FAILED");
        Ok(false)
    }
}
