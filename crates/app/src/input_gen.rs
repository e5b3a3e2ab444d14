//! Sample text generation for the demo command.
//!
//! When no input file is given, we generate text with interesting
//! compression characteristics: a mix of repetitive and varied characters.
//!
//! # Design
//!
//! Generated text has:
//! - Some highly compressible sections (runs of one character)
//! - Some moderately compressible sections (words from a small vocabulary)
//! - Some poorly compressible sections (random letters and symbols)
//! - A sprinkling of non-ASCII characters, each introduced by a literal
//!
//! This makes the adaptive model's behaviour visible in metrics.

use ahuff_core::SENTINEL;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const VOCABULARY: [&str; 12] = [
    "the", "river", "flows", "past", "old", "mill", "and", "under", "a", "stone", "bridge", "slowly",
];

const EXOTIC: [char; 8] = ['é', 'ß', 'λ', 'Ж', '日', '本', '€', '🎉'];

/// Generate `size_chars` characters of sample text.
///
/// # Arguments
/// - `seed`: random seed for determinism
/// - `size_chars`: exact number of characters produced
pub fn generate_sample_text(seed: u64, size_chars: usize) -> String {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut text: Vec<char> = Vec::with_capacity(size_chars);

    while text.len() < size_chars {
        let section = rng.gen_range(64..=512);

        match rng.gen_range(0..10) {
            // 20% runs of one character
            0..=1 => {
                let c = rng.gen_range(b'a'..=b'z') as char;
                text.extend(std::iter::repeat(c).take(section));
            }

            // 50% prose from a small vocabulary
            2..=6 => {
                let mut written = 0;
                while written < section {
                    let word = VOCABULARY[rng.gen_range(0..VOCABULARY.len())];
                    text.extend(word.chars());
                    text.push(if rng.gen_ratio(1, 10) { '\n' } else { ' ' });
                    written += word.len() + 1;
                }
            }

            // 30% random printable ASCII with the odd exotic character
            _ => {
                for _ in 0..section {
                    let c = if rng.gen_ratio(1, 20) {
                        EXOTIC[rng.gen_range(0..EXOTIC.len())]
                    } else {
                        rng.gen_range(b' '..=b'~') as char
                    };
                    text.push(c);
                }
            }
        }
    }

    text.truncate(size_chars);
    debug_assert!(!text.contains(&SENTINEL));
    text.into_iter().collect()
}
