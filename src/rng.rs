// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::types::card::Card;

/// Supplies the draws used to fuzz intervals.
///
/// A draw depends only on the card it is for, so previewing an answer and
/// then giving it produce the same interval.
pub trait RandomSource {
    /// A value in `[0, 1)`.
    fn draw(&self, card: &Card) -> f64;
}

/// Derives draws by hashing the card's identity and review count with a
/// per-collection salt.
pub struct CardSeeded {
    salt: u64,
}

impl CardSeeded {
    pub fn new(salt: u64) -> Self {
        Self { salt }
    }
}

impl RandomSource for CardSeeded {
    fn draw(&self, card: &Card) -> f64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"fuzz");
        hasher.update(&self.salt.to_le_bytes());
        hasher.update(&card.id.0.to_le_bytes());
        hasher.update(&card.reps.to_le_bytes());
        unit(hasher.finalize())
    }
}

/// Always returns the same draw.
pub struct FixedDraw(pub f64);

impl RandomSource for FixedDraw {
    fn draw(&self, _card: &Card) -> f64 {
        self.0
    }
}

/// A stable pseudo-random sort key for `id` under `salt`.
pub fn shuffle_key(salt: i64, id: i64) -> u64 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(b"shuffle");
    hasher.update(&salt.to_le_bytes());
    hasher.update(&id.to_le_bytes());
    first_u64(hasher.finalize())
}

fn first_u64(hash: blake3::Hash) -> u64 {
    let bytes = hash.as_bytes();
    let mut word = [0u8; 8];
    word.copy_from_slice(&bytes[..8]);
    u64::from_le_bytes(word)
}

/// Maps a hash to `[0, 1)` using its top 53 bits.
fn unit(hash: blake3::Hash) -> f64 {
    (first_u64(hash) >> 11) as f64 / (1u64 << 53) as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::id::CardId;
    use crate::types::id::DeckId;

    #[test]
    fn test_draw_is_deterministic() {
        let source = CardSeeded::new(7);
        let card = Card::new(CardId(42), DeckId(1), 0);
        assert_eq!(source.draw(&card), source.draw(&card));
    }

    #[test]
    fn test_draw_depends_on_reps() {
        let source = CardSeeded::new(7);
        let mut card = Card::new(CardId(42), DeckId(1), 0);
        let first = source.draw(&card);
        card.reps += 1;
        assert_ne!(first, source.draw(&card));
    }

    #[test]
    fn test_draw_in_unit_interval() {
        let source = CardSeeded::new(0);
        for id in 0..500 {
            let card = Card::new(CardId(id), DeckId(1), 0);
            let draw = source.draw(&card);
            assert!((0.0..1.0).contains(&draw));
        }
    }

    #[test]
    fn test_shuffle_key_is_stable() {
        assert_eq!(shuffle_key(1, 2), shuffle_key(1, 2));
        assert_ne!(shuffle_key(1, 2), shuffle_key(2, 2));
    }
}
