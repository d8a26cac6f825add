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

use crate::collection::Collection;
use crate::db::CardText;
use crate::error::Fallible;
use crate::types::id::CardId;
use crate::types::id::DeckId;
use crate::types::timestamp::Timestamp;

/// Add a card, creating its deck if needed.
pub fn add_card(directory: Option<String>, deck: &str, front: &str, back: &str) -> Fallible<()> {
    let mut coll: Collection = Collection::new(directory)?;
    let deck_id: DeckId = coll.db.get_or_create_deck(deck)?;
    let text = CardText {
        front: front.to_string(),
        back: back.to_string(),
    };
    let card_id: CardId = coll.db.add_card(deck_id, &text, Timestamp::now())?;
    println!("Added card {card_id} to {deck}.");
    Ok(())
}

/// Point a deck at a configuration preset.
pub fn set_preset(directory: Option<String>, deck: &str, preset: &str) -> Fallible<()> {
    let mut coll: Collection = Collection::new(directory)?;
    let deck_id: DeckId = coll.deck_id(deck)?;
    // Fail early on presets the config file doesn't define.
    coll.config.preset(preset)?;
    coll.db.set_deck_preset(deck_id, preset)?;
    println!("{deck} now uses the '{preset}' preset.");
    Ok(())
}

/// Suspend a card, or put a suspended card back in its queue.
pub fn suspend_card(directory: Option<String>, card: i64, suspended: bool) -> Fallible<()> {
    let mut coll: Collection = Collection::new(directory)?;
    coll.db.set_suspended(CardId(card), suspended)?;
    if suspended {
        println!("Suspended card {card}.");
    } else {
        println!("Unsuspended card {card}.");
    }
    Ok(())
}

/// Move the cards of a deck's subdecks into the deck.
pub fn flatten_deck(directory: Option<String>, deck: &str) -> Fallible<()> {
    let mut coll: Collection = Collection::new(directory)?;
    let deck_id: DeckId = coll.deck_id(deck)?;
    let moved = coll.db.flatten_deck(deck_id)?;
    println!("Moved {moved} cards into {deck}.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::error::ErrorKind;
    use crate::store::CardStore;
    use crate::store::DeckStore;
    use crate::types::card_type::Queue;

    #[test]
    fn test_add_and_suspend() -> Fallible<()> {
        let dir = tempdir()?;
        let directory = dir.path().display().to_string();
        add_card(Some(directory.clone()), "Capitals", "France", "Paris")?;
        add_card(Some(directory.clone()), "Capitals", "Peru", "Lima")?;
        suspend_card(Some(directory.clone()), 2, true)?;

        let coll = Collection::new(Some(directory.clone()))?;
        let deck = coll.deck_id("Capitals")?;
        let cards = coll.cards_in_decks(&[deck])?;
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].queue, Queue::New);
        assert_eq!(cards[1].queue, Queue::Suspended);
        assert_eq!(coll.db.card_text(cards[1].id)?.back, "Lima");
        Ok(())
    }

    #[test]
    fn test_set_preset() -> Fallible<()> {
        let dir = tempdir()?;
        let directory = dir.path().display().to_string();
        std::fs::write(
            dir.path().join("config.toml"),
            "[presets.gentle.review]\nper_day = 50\n",
        )?;
        add_card(Some(directory.clone()), "A", "q", "a")?;
        set_preset(Some(directory.clone()), "A", "gentle")?;
        let err = set_preset(Some(directory.clone()), "A", "missing")
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let coll = Collection::new(Some(directory))?;
        let deck = coll.deck_id("A")?;
        assert_eq!(coll.conf_for_deck(deck)?.review.per_day, 50);
        Ok(())
    }

    #[test]
    fn test_flatten_deck() -> Fallible<()> {
        let dir = tempdir()?;
        let directory = dir.path().display().to_string();
        add_card(Some(directory.clone()), "Capitals::Europe", "France", "Paris")?;
        add_card(Some(directory.clone()), "Capitals::America", "Peru", "Lima")?;
        add_card(Some(directory.clone()), "Capitals", "Japan", "Tokyo")?;
        flatten_deck(Some(directory.clone()), "Capitals")?;

        let coll = Collection::new(Some(directory.clone()))?;
        let deck = coll.deck_id("Capitals")?;
        assert_eq!(coll.cards_in_decks(&[deck])?.len(), 3);
        let err = flatten_deck(Some(directory), "Geography").err().unwrap();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        Ok(())
    }
}
