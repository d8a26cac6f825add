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

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::Row;
use rusqlite::Transaction;
use rusqlite::config::DbConfig;

use crate::config::DEFAULT_PRESET;
use crate::deck::Deck;
use crate::deck::DeckTree;
use crate::error::ErrorKind;
use crate::error::Fallible;
use crate::error::fail_with;
use crate::types::card::Card;
use crate::types::card::Left;
use crate::types::card_type::CardType;
use crate::types::card_type::Queue;
use crate::types::id::CardId;
use crate::types::id::DeckId;
use crate::types::review::DailyCounts;
use crate::types::review::ReviewEntry;
use crate::types::review::ReviewKind;
use crate::types::timestamp::Timestamp;

pub struct Database {
    conn: Connection,
}

/// The text shown when a card is drilled.
#[derive(Clone, PartialEq, Debug)]
pub struct CardText {
    pub front: String,
    pub back: String,
}

const CARD_COLUMNS: &str =
    "card_id, deck_id, queue, card_type, interval, last_interval, ease, due, left_steps, lapses, reps";

const REVIEW_COLUMNS: &str =
    "card_id, deck_id, reviewed_at, grade, interval, last_interval, ease, time_taken_ms, kind";

impl Database {
    pub fn new(database_path: &str) -> Fallible<Self> {
        let mut conn = Connection::open(database_path)?;
        conn.set_db_config(DbConfig::SQLITE_DBCONFIG_ENABLE_FKEY, true)?;
        {
            let tx = conn.transaction()?;
            if !probe_schema_exists(&tx)? {
                log::debug!("Creating schema in {database_path}.");
                tx.execute_batch(include_str!("schema.sql"))?;
                tx.commit()?;
            }
        }
        Ok(Self { conn })
    }

    pub fn find_deck(&self, name: &str) -> Fallible<Option<DeckId>> {
        let sql = "select deck_id from decks where name = ?;";
        let deck_id: Option<DeckId> = self
            .conn
            .query_row(sql, [name], |row| row.get(0))
            .optional()?;
        Ok(deck_id)
    }

    /// Return the ID of the deck with the given name, creating it with the
    /// default preset if it doesn't exist.
    pub fn get_or_create_deck(&mut self, name: &str) -> Fallible<DeckId> {
        if let Some(deck_id) = self.find_deck(name)? {
            return Ok(deck_id);
        }
        log::debug!("Creating deck: {name}");
        let sql = "insert into decks (name, preset) values (?, ?) returning deck_id;";
        let deck_id: DeckId = self
            .conn
            .query_row(sql, (name, DEFAULT_PRESET), |row| row.get(0))?;
        Ok(deck_id)
    }

    pub fn set_deck_preset(&mut self, deck: DeckId, preset: &str) -> Fallible<()> {
        let sql = "update decks set preset = ? where deck_id = ?;";
        let changed = self.conn.execute(sql, (preset, deck))?;
        if changed == 0 {
            return fail_with(ErrorKind::NotFound, format!("no deck with ID {deck}"));
        }
        Ok(())
    }

    pub fn decks(&self) -> Fallible<Vec<Deck>> {
        let mut decks = Vec::new();
        let mut stmt = self
            .conn
            .prepare("select deck_id, name, preset from decks order by deck_id;")?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            decks.push(Deck {
                id: row.get(0)?,
                name: row.get(1)?,
                preset: row.get(2)?,
            });
        }
        Ok(decks)
    }

    /// Add a new card at the back of the new queue.
    pub fn add_card(
        &mut self,
        deck: DeckId,
        text: &CardText,
        added_at: Timestamp,
    ) -> Fallible<CardId> {
        let tx = self.conn.transaction()?;
        let position: i64 = tx.query_row("select count(*) from cards;", [], |row| row.get(0))?;
        let sql = "insert into cards (deck_id, front, back, added_at, queue, card_type, interval, last_interval, ease, due, left_steps, lapses, reps) values (?, ?, ?, ?, ?, ?, 0, 0, 0, ?, 0, 0, 0) returning card_id;";
        let card_id: CardId = tx.query_row(
            sql,
            (
                deck,
                &text.front,
                &text.back,
                added_at,
                Queue::New,
                CardType::New,
                position,
            ),
            |row| row.get(0),
        )?;
        tx.commit()?;
        log::debug!("Added card {card_id} to deck {deck}.");
        Ok(card_id)
    }

    pub fn card_text(&self, card: CardId) -> Fallible<CardText> {
        let sql = "select front, back from cards where card_id = ?;";
        let text = self
            .conn
            .query_row(sql, [card], |row| {
                Ok(CardText {
                    front: row.get(0)?,
                    back: row.get(1)?,
                })
            })
            .optional()?;
        match text {
            Some(text) => Ok(text),
            None => fail_with(ErrorKind::NotFound, format!("no card with ID {card}")),
        }
    }

    pub fn card(&self, card: CardId) -> Fallible<Card> {
        let sql = format!("select {CARD_COLUMNS} from cards where card_id = ?;");
        let found = self.conn.query_row(&sql, [card], read_card).optional()?;
        match found {
            Some(found) => Ok(found),
            None => fail_with(ErrorKind::NotFound, format!("no card with ID {card}")),
        }
    }

    pub fn cards_in_decks(&self, decks: &[DeckId]) -> Fallible<Vec<Card>> {
        let sql = format!("select {CARD_COLUMNS} from cards where deck_id = ? order by card_id;");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut cards = Vec::new();
        for deck in decks {
            let mut rows = stmt.query([deck])?;
            while let Some(row) = rows.next()? {
                cards.push(read_card(row)?);
            }
        }
        Ok(cards)
    }

    pub fn update_card(&mut self, card: &Card) -> Fallible<()> {
        update_card(&self.conn, card)
    }

    /// Take a card out of its queue, or put it back.
    pub fn set_suspended(&mut self, card: CardId, suspended: bool) -> Fallible<()> {
        let mut found = self.card(card)?;
        found.queue = if suspended {
            Queue::Suspended
        } else {
            match found.card_type {
                CardType::New => Queue::New,
                CardType::Learning => Queue::Learning,
                CardType::Review => Queue::Review,
                CardType::Relearning => Queue::Relearning,
            }
        };
        self.update_card(&found)
    }

    /// Move the cards of every subdeck of `parent` into `parent` itself.
    /// The subdecks are kept, empty. Returns how many cards moved.
    pub fn flatten_deck(&mut self, parent: DeckId) -> Fallible<usize> {
        let decks = self.decks()?;
        if !decks.iter().any(|deck| deck.id == parent) {
            return fail_with(ErrorKind::NotFound, format!("no deck with ID {parent}"));
        }
        let tree = DeckTree::new(&decks);
        let tx = self.conn.transaction()?;
        let mut moved = 0;
        for deck in &decks {
            if deck.id != parent && tree.is_within(deck.id, parent) {
                moved += tx.execute(
                    "update cards set deck_id = ? where deck_id = ?;",
                    (parent, deck.id),
                )?;
            }
        }
        tx.commit()?;
        log::debug!("Moved {moved} cards into deck {parent}.");
        Ok(moved)
    }

    pub fn log_review(&mut self, entry: &ReviewEntry) -> Fallible<()> {
        insert_review(&self.conn, entry)
    }

    /// Save an answered card and its log entry in one transaction.
    pub fn record_answer(&mut self, card: &Card, entry: &ReviewEntry) -> Fallible<()> {
        let tx = self.conn.transaction()?;
        update_card(&tx, card)?;
        insert_review(&tx, entry)?;
        tx.commit()?;
        Ok(())
    }

    pub fn reviews_between(&self, start: Timestamp, end: Timestamp) -> Fallible<Vec<ReviewEntry>> {
        let sql = format!(
            "select {REVIEW_COLUMNS} from reviews where reviewed_at >= ? and reviewed_at < ? order by reviewed_at, review_id;"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query((start, end))?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            let time_taken_ms: i64 = row.get(7)?;
            entries.push(ReviewEntry {
                card_id: row.get(0)?,
                deck_id: row.get(1)?,
                reviewed_at: row.get(2)?,
                grade: row.get(3)?,
                interval: row.get(4)?,
                last_interval: row.get(5)?,
                ease: row.get(6)?,
                time_taken_ms: time_taken_ms.max(0) as u64,
                kind: row.get(8)?,
            });
        }
        Ok(entries)
    }

    pub fn studied_between(
        &self,
        deck: DeckId,
        start: Timestamp,
        end: Timestamp,
    ) -> Fallible<DailyCounts> {
        let sql = "select kind, count(*) from reviews where deck_id = ? and reviewed_at >= ? and reviewed_at < ? group by kind;";
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query((deck, start, end))?;
        let mut counts = DailyCounts::default();
        while let Some(row) = rows.next()? {
            let kind: ReviewKind = row.get(0)?;
            let count: u32 = row.get(1)?;
            match kind {
                ReviewKind::New => counts.new = count,
                ReviewKind::Review => counts.review = count,
                ReviewKind::Learn | ReviewKind::Relearn => {}
            }
        }
        Ok(counts)
    }
}

fn read_card(row: &Row) -> rusqlite::Result<Card> {
    Ok(Card {
        id: row.get(0)?,
        deck_id: row.get(1)?,
        queue: row.get(2)?,
        card_type: row.get(3)?,
        interval: row.get(4)?,
        last_interval: row.get(5)?,
        ease: row.get(6)?,
        due: row.get(7)?,
        left: Left::from_raw(row.get(8)?),
        lapses: row.get(9)?,
        reps: row.get(10)?,
        timer_started_at: None,
    })
}

fn update_card(conn: &Connection, card: &Card) -> Fallible<()> {
    let sql = "update cards set queue = ?, card_type = ?, interval = ?, last_interval = ?, ease = ?, due = ?, left_steps = ?, lapses = ?, reps = ? where card_id = ?;";
    let changed = conn.execute(
        sql,
        (
            card.queue,
            card.card_type,
            card.interval,
            card.last_interval,
            card.ease,
            card.due,
            card.left.raw(),
            card.lapses,
            card.reps,
            card.id,
        ),
    )?;
    if changed == 0 {
        return fail_with(ErrorKind::NotFound, format!("no card with ID {}", card.id));
    }
    Ok(())
}

fn insert_review(conn: &Connection, entry: &ReviewEntry) -> Fallible<()> {
    let sql = format!("insert into reviews ({REVIEW_COLUMNS}) values (?, ?, ?, ?, ?, ?, ?, ?, ?);");
    conn.execute(
        &sql,
        (
            entry.card_id,
            entry.deck_id,
            entry.reviewed_at,
            entry.grade,
            entry.interval,
            entry.last_interval,
            entry.ease,
            entry.time_taken_ms as i64,
            entry.kind,
        ),
    )?;
    Ok(())
}

fn probe_schema_exists(tx: &Transaction) -> Fallible<bool> {
    let sql = "select count(*) from sqlite_master where type='table' AND name=?;";
    let count: i64 = tx.query_row(sql, ["cards"], |row| row.get(0))?;
    Ok(count > 0)
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::types::grade::Grade;

    fn text(front: &str) -> CardText {
        CardText {
            front: front.to_string(),
            back: "back".to_string(),
        }
    }

    fn entry(card: &Card, at: i64, kind: ReviewKind) -> ReviewEntry {
        ReviewEntry {
            card_id: card.id,
            deck_id: card.deck_id,
            reviewed_at: Timestamp::from_secs(at),
            grade: Grade::Good,
            interval: card.interval,
            last_interval: card.last_interval,
            ease: card.ease,
            time_taken_ms: 4500,
            kind,
        }
    }

    #[test]
    fn test_decks() -> Fallible<()> {
        let mut db = Database::new(":memory:")?;
        let a = db.get_or_create_deck("Languages")?;
        let b = db.get_or_create_deck("Languages::French")?;
        assert_eq!(db.get_or_create_deck("Languages")?, a);
        assert_eq!(db.find_deck("Languages::French")?, Some(b));
        assert_eq!(db.find_deck("Geography")?, None);
        db.set_deck_preset(b, "intense")?;
        let decks = db.decks()?;
        assert_eq!(decks.len(), 2);
        assert_eq!(decks[0].preset, DEFAULT_PRESET);
        assert_eq!(decks[1].preset, "intense");
        let err = db.set_deck_preset(DeckId(99), "x").err().unwrap();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        Ok(())
    }

    #[test]
    fn test_cards() -> Fallible<()> {
        let mut db = Database::new(":memory:")?;
        let deck = db.get_or_create_deck("A")?;
        let first = db.add_card(deck, &text("one"), Timestamp::from_secs(0))?;
        let second = db.add_card(deck, &text("two"), Timestamp::from_secs(0))?;
        assert_eq!(db.card(first)?, Card::new(first, deck, 0));
        assert_eq!(db.card(second)?.due, 1);
        assert_eq!(db.card_text(second)?, text("two"));
        assert_eq!(db.cards_in_decks(&[deck])?.len(), 2);
        assert!(db.cards_in_decks(&[DeckId(99)])?.is_empty());
        assert_eq!(db.card(CardId(99)).err().unwrap().kind(), ErrorKind::NotFound);
        Ok(())
    }

    #[test]
    fn test_update_and_suspend() -> Fallible<()> {
        let mut db = Database::new(":memory:")?;
        let deck = db.get_or_create_deck("A")?;
        let id = db.add_card(deck, &text("one"), Timestamp::from_secs(0))?;
        let mut card = db.card(id)?;
        card.queue = Queue::Relearning;
        card.card_type = CardType::Relearning;
        card.interval = 12;
        card.ease = 2150;
        card.due = 1_700_000_000;
        card.left = Left::new(1, 2);
        card.lapses = 3;
        card.reps = 9;
        db.update_card(&card)?;
        assert_eq!(db.card(id)?, card);

        db.set_suspended(id, true)?;
        assert_eq!(db.card(id)?.queue, Queue::Suspended);
        db.set_suspended(id, false)?;
        assert_eq!(db.card(id)?, card);
        Ok(())
    }

    #[test]
    fn test_flatten_deck() -> Fallible<()> {
        let mut db = Database::new(":memory:")?;
        let parent = db.get_or_create_deck("deck1")?;
        let child1 = db.get_or_create_deck("deck1::child1")?;
        let child2 = db.get_or_create_deck("deck1::child2")?;
        let grandchild = db.get_or_create_deck("deck1::child2::leaf")?;
        let other = db.get_or_create_deck("deck2")?;
        let first = db.add_card(child1, &text("one"), Timestamp::from_secs(0))?;
        let second = db.add_card(child2, &text("two"), Timestamp::from_secs(0))?;
        let third = db.add_card(grandchild, &text("three"), Timestamp::from_secs(0))?;
        let outside = db.add_card(other, &text("four"), Timestamp::from_secs(0))?;

        assert_eq!(db.flatten_deck(parent)?, 3);
        assert_eq!(db.card(first)?.deck_id, parent);
        assert_eq!(db.card(second)?.deck_id, parent);
        assert_eq!(db.card(third)?.deck_id, parent);
        assert_eq!(db.card(outside)?.deck_id, other);
        assert_eq!(db.decks()?.len(), 5);
        assert_eq!(db.flatten_deck(parent)?, 0);
        let err = db.flatten_deck(DeckId(99)).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        Ok(())
    }

    #[test]
    fn test_review_log() -> Fallible<()> {
        let mut db = Database::new(":memory:")?;
        let deck = db.get_or_create_deck("A")?;
        let id = db.add_card(deck, &text("one"), Timestamp::from_secs(0))?;
        let card = db.card(id)?;
        db.log_review(&entry(&card, 10, ReviewKind::New))?;
        db.log_review(&entry(&card, 20, ReviewKind::Learn))?;
        db.log_review(&entry(&card, 30, ReviewKind::Review))?;
        db.log_review(&entry(&card, 100, ReviewKind::Review))?;

        let entries = db.reviews_between(Timestamp::from_secs(0), Timestamp::from_secs(100))?;
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0], entry(&card, 10, ReviewKind::New));
        assert_eq!(entries[2].kind, ReviewKind::Review);

        let counts =
            db.studied_between(deck, Timestamp::from_secs(0), Timestamp::from_secs(100))?;
        assert_eq!(counts, DailyCounts { new: 1, review: 1 });
        Ok(())
    }

    #[test]
    fn test_record_answer_is_atomic() -> Fallible<()> {
        let mut db = Database::new(":memory:")?;
        let deck = db.get_or_create_deck("A")?;
        let id = db.add_card(deck, &text("one"), Timestamp::from_secs(0))?;
        let card = db.card(id)?;
        let mut missing = card.clone();
        missing.id = CardId(99);
        assert!(db.record_answer(&missing, &entry(&card, 10, ReviewKind::New)).is_err());
        let all = Timestamp::from_secs(i64::MAX);
        assert!(db.reviews_between(Timestamp::from_secs(0), all)?.is_empty());

        let mut answered = card.clone();
        answered.reps = 1;
        db.record_answer(&answered, &entry(&card, 10, ReviewKind::New))?;
        assert_eq!(db.card(id)?.reps, 1);
        assert_eq!(db.reviews_between(Timestamp::from_secs(0), all)?.len(), 1);
        Ok(())
    }

    #[test]
    fn test_reopen() -> Fallible<()> {
        let dir = tempdir()?;
        let path = dir.path().join("easecards.db");
        let path = path.to_str().unwrap();
        let id = {
            let mut db = Database::new(path)?;
            let deck = db.get_or_create_deck("A")?;
            db.add_card(deck, &text("one"), Timestamp::from_secs(0))?
        };
        let db = Database::new(path)?;
        assert_eq!(db.card_text(id)?, text("one"));
        Ok(())
    }
}
