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

use serde::Serialize;

use crate::types::id::DeckId;

/// Separates the components of a nested deck name.
pub const SEPARATOR: &str = "::";

#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct Deck {
    pub id: DeckId,
    /// Full name, e.g. `Languages::Japanese::Kanji`.
    pub name: String,
    /// Name of the configuration preset the deck uses.
    pub preset: String,
}

impl Deck {
    /// The name of the parent deck, if this deck is nested.
    pub fn parent_name(&self) -> Option<&str> {
        self.name.rsplit_once(SEPARATOR).map(|(parent, _)| parent)
    }
}

/// Parent links between decks, derived from their names.
pub struct DeckTree {
    parents: HashMap<DeckId, DeckId>,
}

impl DeckTree {
    pub fn new(decks: &[Deck]) -> Self {
        let by_name: HashMap<&str, DeckId> =
            decks.iter().map(|deck| (deck.name.as_str(), deck.id)).collect();
        let mut parents = HashMap::new();
        for deck in decks {
            // Skip over missing intermediate decks to the nearest ancestor.
            let mut name = deck.parent_name();
            while let Some(candidate) = name {
                if let Some(parent) = by_name.get(candidate) {
                    parents.insert(deck.id, *parent);
                    break;
                }
                name = candidate.rsplit_once(SEPARATOR).map(|(parent, _)| parent);
            }
        }
        Self { parents }
    }

    pub fn parent(&self, deck: DeckId) -> Option<DeckId> {
        self.parents.get(&deck).copied()
    }

    /// Number of ancestors. Top-level decks have depth zero.
    pub fn depth(&self, deck: DeckId) -> usize {
        let mut depth = 0;
        let mut current = deck;
        while let Some(parent) = self.parent(current) {
            depth += 1;
            current = parent;
            if depth > self.parents.len() {
                break;
            }
        }
        depth
    }

    /// Whether `deck` is `ancestor` or nested anywhere beneath it.
    pub fn is_within(&self, deck: DeckId, ancestor: DeckId) -> bool {
        let mut current = Some(deck);
        let mut steps = 0;
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
            steps += 1;
            if steps > self.parents.len() {
                break;
            }
        }
        false
    }
}
