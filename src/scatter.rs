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

use std::collections::HashMap;
use std::collections::VecDeque;

use crate::deck::DeckTree;
use crate::types::id::CardId;
use crate::types::id::DeckId;

/// Interleave cards from different decks so that no deck dominates a run of
/// consecutive draws.
///
/// Cards are grouped by deck. Groups are ordered parents first, then by
/// where their first card appears in the input, and drained round-robin
/// one card at a time. Within a deck the input order is kept, so with a
/// single deck the output is the input.
pub fn scatter(candidates: &[(CardId, DeckId)], tree: &DeckTree) -> Vec<CardId> {
    let mut groups: Vec<(DeckId, VecDeque<CardId>)> = Vec::new();
    let mut index: HashMap<DeckId, usize> = HashMap::new();
    for (card, deck) in candidates {
        let slot = *index.entry(*deck).or_insert_with(|| {
            groups.push((*deck, VecDeque::new()));
            groups.len() - 1
        });
        groups[slot].1.push_back(*card);
    }
    // Stable, so ties keep first-appearance order.
    groups.sort_by_key(|(deck, _)| tree.depth(*deck));

    let mut order = Vec::with_capacity(candidates.len());
    while order.len() < candidates.len() {
        for (_, cards) in groups.iter_mut() {
            if let Some(card) = cards.pop_front() {
                order.push(card);
            }
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::tests::deck;

    fn tree() -> DeckTree {
        DeckTree::new(&[
            deck(1, "Languages"),
            deck(2, "Languages::Japanese"),
            deck(3, "Languages::French"),
            deck(4, "Geography"),
        ])
    }

    fn ids(ids: &[i64]) -> Vec<CardId> {
        ids.iter().map(|id| CardId(*id)).collect()
    }

    #[test]
    fn test_empty() {
        assert!(scatter(&[], &tree()).is_empty());
    }

    #[test]
    fn test_single_deck_is_identity() {
        let candidates: Vec<(CardId, DeckId)> =
            [5, 3, 9, 1, 7].iter().map(|id| (CardId(*id), DeckId(2))).collect();
        assert_eq!(scatter(&candidates, &tree()), ids(&[5, 3, 9, 1, 7]));
    }

    #[test]
    fn test_siblings_are_interleaved() {
        let candidates = vec![
            (CardId(1), DeckId(2)),
            (CardId(2), DeckId(2)),
            (CardId(3), DeckId(2)),
            (CardId(4), DeckId(3)),
            (CardId(5), DeckId(3)),
        ];
        assert_eq!(scatter(&candidates, &tree()), ids(&[1, 4, 2, 5, 3]));
    }

    #[test]
    fn test_parents_come_first() {
        let candidates = vec![
            (CardId(1), DeckId(2)),
            (CardId(2), DeckId(1)),
            (CardId(3), DeckId(4)),
            (CardId(4), DeckId(2)),
            (CardId(5), DeckId(1)),
        ];
        assert_eq!(scatter(&candidates, &tree()), ids(&[2, 3, 1, 5, 4]));
    }

    #[test]
    fn test_is_a_permutation() {
        let candidates: Vec<(CardId, DeckId)> = (0..100)
            .map(|i| (CardId(i), DeckId(1 + (i * 7) % 4)))
            .collect();
        let mut output = scatter(&candidates, &tree());
        assert_eq!(output.len(), candidates.len());
        output.sort();
        let mut input: Vec<CardId> = candidates.iter().map(|(card, _)| *card).collect();
        input.sort();
        assert_eq!(output, input);
    }

    #[test]
    fn test_no_run_while_siblings_remain() {
        let candidates: Vec<(CardId, DeckId)> = (0..30)
            .map(|i| (CardId(i), if i < 20 { DeckId(2) } else { DeckId(3) }))
            .collect();
        let output = scatter(&candidates, &tree());
        let deck_of = |card: CardId| if card.0 < 20 { 2 } else { 3 };
        for pair in output[..20].windows(2) {
            assert_ne!(deck_of(pair[0]), deck_of(pair[1]));
        }
    }
}
