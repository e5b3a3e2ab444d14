//! The adaptive Huffman model: encode and resumable decode.
//!
//! Encoder and decoder each own an `AdaptiveModel` and feed it the same
//! character sequence, so both trees evolve identically and no frequency
//! table is ever transmitted.
//!
//! # Code Format
//!
//! A character already in the tree is sent as its root-to-leaf path. A
//! first-seen character is sent as the path to the empty leaf followed by a
//! 32-bit literal of its Unicode scalar value, most significant bit first.
//!
//! # Resumable Decoding
//!
//! `decode` accepts any slice of the bit stream. A chunk that ends halfway
//! down a path or halfway through a literal leaves the cursor and the partial
//! literal in place for the next call.

use crate::error::{ModelError, Result};
use crate::tree::{CodeTree, NodeId, NodeKind};
use tracing::trace;

/// Reserved character marking the end of a stream (U+0003, END OF TEXT).
pub const SENTINEL: char = '\u{3}';

/// Width of the literal that introduces a first-seen character.
pub const LITERAL_BITS: usize = 32;

/// One direction of one stream: either encode or decode, never both.
#[derive(Debug, Clone)]
pub struct AdaptiveModel {
    tree: CodeTree,
    /// Decode position, persisted across `decode` calls
    cursor: NodeId,
    /// Bits of a literal received so far
    literal: Vec<bool>,
}

impl AdaptiveModel {
    pub fn new() -> Self {
        let tree = CodeTree::new();
        let cursor = tree.root();
        Self {
            tree,
            cursor,
            literal: Vec::with_capacity(LITERAL_BITS),
        }
    }

    /// Encode one character and update the model.
    ///
    /// Never idempotent: encoding the same character twice usually yields
    /// two different codes.
    pub fn encode(&mut self, character: char) -> Vec<bool> {
        let mut node = self.tree.find_node(character);
        let mut bits = self.tree.bits_for_node(node);

        if node == self.tree.empty_leaf() {
            push_literal(&mut bits, character);
            node = self.tree.insert_new_character(character);
            trace!(?character, "new symbol");
        }

        self.tree.update_after_symbol(node);
        bits
    }

    /// Decode as many characters as `bits` completes.
    ///
    /// # Errors
    /// - `ModelError::InvalidLiteral` if a literal is not a valid `char`
    /// - `ModelError::InvalidCursor` if the model state is corrupt
    pub fn decode(&mut self, bits: &[bool]) -> Result<Vec<char>> {
        let mut decoded = Vec::new();
        self.decode_into(bits, &mut decoded)?;
        Ok(decoded)
    }

    /// Like `decode`, but appends to `out` as it goes.
    ///
    /// On error `out` keeps every character decoded before the bad code.
    /// The model is left mid-code and should be reset before reuse.
    pub fn decode_into(&mut self, bits: &[bool], out: &mut Vec<char>) -> Result<()> {
        for &bit in bits {
            match self.tree.kind(self.cursor) {
                NodeKind::Branch { left, right } => {
                    self.cursor = if bit { right } else { left };
                    if let NodeKind::Character(character) = self.tree.kind(self.cursor) {
                        self.tree.update_after_symbol(self.cursor);
                        out.push(character);
                        self.cursor = self.tree.root();
                    }
                }
                NodeKind::Empty => {
                    self.literal.push(bit);
                    if self.literal.len() == LITERAL_BITS {
                        let character = read_literal(&self.literal)?;
                        self.literal.clear();

                        let leaf = self.tree.insert_new_character(character);
                        self.tree.update_after_symbol(leaf);
                        trace!(?character, "new symbol");

                        out.push(character);
                        self.cursor = self.tree.root();
                    }
                }
                NodeKind::Character(_) | NodeKind::Head | NodeKind::Tail => {
                    return Err(ModelError::InvalidCursor { node: self.cursor }.into());
                }
            }
        }

        Ok(())
    }

    /// Restore the single-empty-leaf state and drop any partial decode.
    pub fn reset(&mut self) {
        self.tree.reset();
        self.cursor = self.tree.root();
        self.literal.clear();
    }

    /// Current code length of `character`, or `None` if it was never seen.
    pub fn code_length(&self, character: char) -> Option<usize> {
        let node = self.tree.find_node(character);
        if node == self.tree.empty_leaf() {
            None
        } else {
            Some(self.tree.bits_for_node(node).len())
        }
    }

    /// Number of distinct characters the model has seen.
    pub fn distinct_characters(&self) -> usize {
        self.tree.distinct_characters()
    }

    /// True when a decode has stopped in the middle of a code.
    pub fn has_partial_code(&self) -> bool {
        self.cursor != self.tree.root() || !self.literal.is_empty()
    }

    pub fn tree(&self) -> &CodeTree {
        &self.tree
    }

    /// Check the tree/list invariants.
    pub fn validate(&self) -> Result<()> {
        self.tree.validate()
    }
}

impl Default for AdaptiveModel {
    fn default() -> Self {
        Self::new()
    }
}

fn push_literal(bits: &mut Vec<bool>, character: char) {
    let value = character as u32;
    bits.extend((0..LITERAL_BITS).rev().map(|shift| (value >> shift) & 1 == 1));
}

fn read_literal(bits: &[bool]) -> Result<char> {
    let value = bits
        .iter()
        .fold(0u32, |value, &bit| (value << 1) | bit as u32);
    char::from_u32(value).ok_or_else(|| ModelError::InvalidLiteral(value).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn encode_all(model: &mut AdaptiveModel, text: &str) -> Vec<bool> {
        text.chars().flat_map(|c| model.encode(c)).collect()
    }

    #[test]
    fn test_first_character_is_a_bare_literal() {
        let mut model = AdaptiveModel::new();
        let bits = model.encode('A');

        // Root is the empty leaf: no path bits, just the literal
        assert_eq!(bits.len(), LITERAL_BITS);
        assert_eq!(read_literal(&bits).unwrap(), 'A');
    }

    #[test]
    fn test_repeated_character_shrinks_to_one_bit() {
        let mut model = AdaptiveModel::new();
        let lengths: Vec<usize> = "aaaa".chars().map(|c| model.encode(c).len()).collect();
        assert_eq!(lengths, vec![32, 1, 1, 1]);
    }

    #[test]
    fn test_second_new_character_carries_path_to_empty_leaf() {
        let mut model = AdaptiveModel::new();
        let lengths: Vec<usize> = "abab".chars().map(|c| model.encode(c).len()).collect();
        assert_eq!(lengths, vec![32, 33, 1, 2]);
    }

    #[test]
    fn test_decode_round_trip() {
        let text = "the quick brown fox jumps over the lazy dog";
        let mut encoder = AdaptiveModel::new();
        let bits = encode_all(&mut encoder, text);

        let mut decoder = AdaptiveModel::new();
        let decoded: String = decoder.decode(&bits).unwrap().into_iter().collect();
        assert_eq!(decoded, text);
        assert!(!decoder.has_partial_code());
    }

    #[test]
    fn test_decode_non_ascii() {
        let text = "naïve café, Straße 日本語 🎉🎉";
        let mut encoder = AdaptiveModel::new();
        let bits = encode_all(&mut encoder, text);

        let mut decoder = AdaptiveModel::new();
        let decoded: String = decoder.decode(&bits).unwrap().into_iter().collect();
        assert_eq!(decoded, text);
    }

    #[test]
    fn test_decode_resumes_at_every_split() {
        let text = "mississippi river";
        let mut encoder = AdaptiveModel::new();
        let bits = encode_all(&mut encoder, text);

        for split in 0..=bits.len() {
            let mut decoder = AdaptiveModel::new();
            let mut decoded = decoder.decode(&bits[..split]).unwrap();
            decoded.extend(decoder.decode(&bits[split..]).unwrap());

            let decoded: String = decoded.into_iter().collect();
            assert_eq!(decoded, text, "split at bit {split}");
        }
    }

    #[test]
    fn test_decode_bit_by_bit() {
        let text = "abracadabra";
        let mut encoder = AdaptiveModel::new();
        let bits = encode_all(&mut encoder, text);

        let mut decoder = AdaptiveModel::new();
        let mut decoded = String::new();
        for bit in &bits {
            decoded.extend(decoder.decode(std::slice::from_ref(bit)).unwrap());
        }
        assert_eq!(decoded, text);
    }

    #[test]
    fn test_partial_literal_is_kept() {
        let mut encoder = AdaptiveModel::new();
        let bits = encoder.encode('x');

        let mut decoder = AdaptiveModel::new();
        assert!(decoder.decode(&bits[..10]).unwrap().is_empty());
        assert!(decoder.has_partial_code());
        assert_eq!(decoder.decode(&bits[10..]).unwrap(), vec!['x']);
    }

    #[test]
    fn test_invalid_literal() {
        // 0xD800 is a surrogate, not a char
        let mut bits = Vec::new();
        bits.extend((0..32).rev().map(|shift| (0xD800u32 >> shift) & 1 == 1));

        let mut decoder = AdaptiveModel::new();
        let result = decoder.decode(&bits);
        assert!(matches!(
            result,
            Err(crate::error::Error::Model(ModelError::InvalidLiteral(0xD800)))
        ));
    }

    #[test]
    fn test_decode_into_keeps_prefix_on_error() {
        let mut encoder = AdaptiveModel::new();
        let mut bits = encode_all(&mut encoder, "ok");
        bits.extend(encoder.tree().bits_for_node(encoder.tree().empty_leaf()));
        bits.extend((0..32).rev().map(|shift| (0xD800u32 >> shift) & 1 == 1));

        let mut decoder = AdaptiveModel::new();
        let mut decoded = Vec::new();
        let result = decoder.decode_into(&bits, &mut decoded);

        assert!(matches!(
            result,
            Err(crate::error::Error::Model(ModelError::InvalidLiteral(0xD800)))
        ));
        assert_eq!(decoded, vec!['o', 'k']);
    }

    #[test]
    fn test_invariants_hold_after_every_symbol() {
        let mut rng = ChaCha8Rng::seed_from_u64(2024);
        let alphabet: Vec<char> = "abcdefghijklmnopqrstuvwxyz ,.\n".chars().collect();

        for _ in 0..20 {
            let mut encoder = AdaptiveModel::new();
            let mut decoder = AdaptiveModel::new();
            let len = rng.gen_range(1..500);

            for _ in 0..len {
                let span = rng.gen_range(1..=alphabet.len());
                let character = alphabet[rng.gen_range(0..span)];
                let bits = encoder.encode(character);
                encoder.validate().unwrap();

                assert_eq!(decoder.decode(&bits).unwrap(), vec![character]);
                decoder.validate().unwrap();
            }
        }
    }

    #[test]
    fn test_dominant_character_code_never_grows() {
        let mut model = AdaptiveModel::new();
        encode_all(&mut model, "bcdefg");

        let mut previous = usize::MAX;
        for _ in 0..1000 {
            model.encode('a');
            let length = model.code_length('a').unwrap();
            assert!(length <= previous, "code for 'a' grew to {length}");
            previous = length;
        }
        assert_eq!(previous, 1);
    }

    #[test]
    fn test_frequent_characters_get_shortest_codes() {
        let mut model = AdaptiveModel::new();
        encode_all(&mut model, "mississippi river");

        let shortest = "mississippi river"
            .chars()
            .filter_map(|c| model.code_length(c))
            .min()
            .unwrap();
        assert_eq!(model.code_length('i'), Some(shortest));
        assert_eq!(model.code_length('s'), Some(shortest));
        assert_eq!(model.code_length('z'), None);
    }

    #[test]
    fn test_reset_clears_decode_state() {
        let mut encoder = AdaptiveModel::new();
        let bits = encode_all(&mut encoder, "hello");

        let mut decoder = AdaptiveModel::new();
        decoder.decode(&bits[..5]).unwrap();
        decoder.reset();
        assert!(!decoder.has_partial_code());
        assert_eq!(decoder.distinct_characters(), 0);

        let decoded: String = decoder.decode(&bits).unwrap().into_iter().collect();
        assert_eq!(decoded, "hello");
    }
}
