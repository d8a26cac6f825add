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

//! The boundaries between the scheduler and whatever stores the
//! collection.

use std::collections::BTreeMap;

use crate::config::DEFAULT_PRESET;
use crate::config::DeckConfig;
use crate::deck::Deck;
use crate::error::ErrorKind;
use crate::error::Fallible;
use crate::error::fail_with;
use crate::types::card::Card;
use crate::types::id::CardId;
use crate::types::id::DeckId;
use crate::types::review::DailyCounts;
use crate::types::review::ReviewEntry;
use crate::types::review::ReviewKind;
use crate::types::timestamp::Timestamp;

pub trait CardStore {
    fn card(&self, id: CardId) -> Fallible<Card>;

    /// All cards in the given decks, suspended ones included.
    fn cards_in_decks(&self, decks: &[DeckId]) -> Fallible<Vec<Card>>;

    fn update_card(&mut self, card: &Card) -> Fallible<()>;
}

pub trait DeckStore {
    fn decks(&self) -> Fallible<Vec<Deck>>;

    fn conf_for_deck(&self, deck: DeckId) -> Fallible<DeckConfig>;
}

/// Append-only record of answers.
pub trait ReviewLog {
    fn log_review(&mut self, entry: &ReviewEntry) -> Fallible<()>;

    /// Entries logged in `[start, end)`, oldest first.
    fn reviews_between(&self, start: Timestamp, end: Timestamp) -> Fallible<Vec<ReviewEntry>>;

    /// How many new and review cards of `deck` were answered in
    /// `[start, end)`.
    fn studied_between(
        &self,
        deck: DeckId,
        start: Timestamp,
        end: Timestamp,
    ) -> Fallible<DailyCounts> {
        let mut counts = DailyCounts::default();
        for entry in self.reviews_between(start, end)? {
            if entry.deck_id != deck {
                continue;
            }
            match entry.kind {
                ReviewKind::New => counts.new += 1,
                ReviewKind::Review => counts.review += 1,
                ReviewKind::Learn | ReviewKind::Relearn => {}
            }
        }
        Ok(counts)
    }
}

/// Everything the scheduler needs from a collection.
pub trait Store: CardStore + DeckStore + ReviewLog {
    /// Persist an answered card together with its log entry.
    fn record_answer(&mut self, card: &Card, entry: &ReviewEntry) -> Fallible<()> {
        self.update_card(card)?;
        self.log_review(entry)
    }
}

/// A collection held entirely in memory.
#[derive(Default)]
pub struct MemoryCollection {
    cards: BTreeMap<CardId, Card>,
    decks: Vec<Deck>,
    presets: BTreeMap<String, DeckConfig>,
    log: Vec<ReviewEntry>,
}

impl MemoryCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_deck(&mut self, name: &str, preset: &str) -> DeckId {
        let id = DeckId(self.decks.len() as i64 + 1);
        self.decks.push(Deck {
            id,
            name: name.to_string(),
            preset: preset.to_string(),
        });
        id
    }

    pub fn set_preset(&mut self, name: &str, config: DeckConfig) {
        self.presets.insert(name.to_string(), config);
    }

    /// Add a new card at the back of the new queue.
    pub fn add_card(&mut self, deck: DeckId) -> CardId {
        let id = CardId(self.cards.len() as i64 + 1);
        let position = self.cards.len() as i64;
        self.cards.insert(id, Card::new(id, deck, position));
        id
    }

    /// Insert or replace a card as-is.
    pub fn put_card(&mut self, card: Card) {
        self.cards.insert(card.id, card);
    }

    pub fn log(&self) -> &[ReviewEntry] {
        &self.log
    }
}

impl CardStore for MemoryCollection {
    fn card(&self, id: CardId) -> Fallible<Card> {
        match self.cards.get(&id) {
            Some(card) => Ok(card.clone()),
            None => fail_with(ErrorKind::NotFound, format!("no card with ID {id}")),
        }
    }

    fn cards_in_decks(&self, decks: &[DeckId]) -> Fallible<Vec<Card>> {
        Ok(self
            .cards
            .values()
            .filter(|card| decks.contains(&card.deck_id))
            .cloned()
            .collect())
    }

    fn update_card(&mut self, card: &Card) -> Fallible<()> {
        match self.cards.get_mut(&card.id) {
            Some(stored) => {
                *stored = card.clone();
                Ok(())
            }
            None => fail_with(ErrorKind::NotFound, format!("no card with ID {}", card.id)),
        }
    }
}

impl DeckStore for MemoryCollection {
    fn decks(&self) -> Fallible<Vec<Deck>> {
        Ok(self.decks.clone())
    }

    fn conf_for_deck(&self, deck: DeckId) -> Fallible<DeckConfig> {
        let Some(deck) = self.decks.iter().find(|d| d.id == deck) else {
            return fail_with(ErrorKind::NotFound, format!("no deck with ID {deck}"));
        };
        match self.presets.get(&deck.preset) {
            Some(config) => Ok(config.clone()),
            None if deck.preset == DEFAULT_PRESET => Ok(DeckConfig::default()),
            None => fail_with(
                ErrorKind::NotFound,
                format!("no preset named '{}'", deck.preset),
            ),
        }
    }
}

impl ReviewLog for MemoryCollection {
    fn log_review(&mut self, entry: &ReviewEntry) -> Fallible<()> {
        self.log.push(entry.clone());
        Ok(())
    }

    fn reviews_between(&self, start: Timestamp, end: Timestamp) -> Fallible<Vec<ReviewEntry>> {
        Ok(self
            .log
            .iter()
            .filter(|entry| start <= entry.reviewed_at && entry.reviewed_at < end)
            .cloned()
            .collect())
    }
}

impl Store for MemoryCollection {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::grade::Grade;

    fn entry(deck: DeckId, at: i64, kind: ReviewKind) -> ReviewEntry {
        ReviewEntry {
            card_id: CardId(1),
            deck_id: deck,
            reviewed_at: Timestamp::from_secs(at),
            grade: Grade::Good,
            interval: 1,
            last_interval: 0,
            ease: 2500,
            time_taken_ms: 1000,
            kind,
        }
    }

    #[test]
    fn test_cards_and_decks() -> Fallible<()> {
        let mut col = MemoryCollection::new();
        let a = col.add_deck("A", DEFAULT_PRESET);
        let b = col.add_deck("B", "custom");
        let c1 = col.add_card(a);
        let c2 = col.add_card(b);
        assert_eq!(col.card(c1)?.due, 0);
        assert_eq!(col.card(c2)?.due, 1);
        assert_eq!(col.cards_in_decks(&[a])?.len(), 1);
        assert_eq!(col.conf_for_deck(a)?, DeckConfig::default());
        assert_eq!(col.conf_for_deck(b).err().unwrap().kind(), ErrorKind::NotFound);
        col.set_preset("custom", DeckConfig::default());
        assert!(col.conf_for_deck(b).is_ok());
        Ok(())
    }

    #[test]
    fn test_update_missing_card() {
        let mut col = MemoryCollection::new();
        let card = Card::new(CardId(9), DeckId(1), 0);
        assert_eq!(col.update_card(&card).err().unwrap().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_studied_between() -> Fallible<()> {
        let mut col = MemoryCollection::new();
        let deck = col.add_deck("A", DEFAULT_PRESET);
        col.log_review(&entry(deck, 10, ReviewKind::New))?;
        col.log_review(&entry(deck, 20, ReviewKind::Learn))?;
        col.log_review(&entry(deck, 30, ReviewKind::Review))?;
        col.log_review(&entry(deck, 40, ReviewKind::Review))?;
        col.log_review(&entry(DeckId(99), 40, ReviewKind::Review))?;
        col.log_review(&entry(deck, 100, ReviewKind::New))?;
        let counts = col.studied_between(deck, Timestamp::from_secs(0), Timestamp::from_secs(100))?;
        assert_eq!(counts, DailyCounts { new: 1, review: 2 });
        Ok(())
    }
}
