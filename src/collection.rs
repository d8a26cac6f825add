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

use std::env::current_dir;
use std::path::PathBuf;

use crate::clock::Clock;
use crate::clock::SystemClock;
use crate::config::Config;
use crate::config::DeckConfig;
use crate::db::Database;
use crate::deck::Deck;
use crate::error::ErrorKind;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail;
use crate::error::fail_with;
use crate::registry::Registry;
use crate::rng::CardSeeded;
use crate::sched::Scheduler;
use crate::store::CardStore;
use crate::store::DeckStore;
use crate::store::ReviewLog;
use crate::store::Store;
use crate::types::card::Card;
use crate::types::id::CardId;
use crate::types::id::DeckId;
use crate::types::review::DailyCounts;
use crate::types::review::ReviewEntry;
use crate::types::timestamp::Timestamp;

const DATABASE_FILE: &str = "easecards.db";
const CONFIG_FILE: &str = "config.toml";
const FUZZ_SALT: u64 = 0x6561_7365;

/// A collection directory: the card database plus its configuration file.
pub struct Collection {
    pub directory: PathBuf,
    pub db: Database,
    pub config: Config,
}

impl Collection {
    pub fn new(directory: Option<String>) -> Fallible<Self> {
        let directory: PathBuf = match directory {
            Some(dir) => PathBuf::from(dir),
            None => current_dir()?,
        };
        let directory = if directory.exists() {
            directory.canonicalize()?
        } else {
            return fail("directory does not exist.");
        };

        let config = Config::load(&directory.join(CONFIG_FILE))?;

        let db_path: PathBuf = directory.join(DATABASE_FILE);
        let db_path: &str = db_path
            .to_str()
            .ok_or_else(|| ErrorReport::new("invalid path"))?;
        let db: Database = Database::new(db_path)?;

        Ok(Self {
            directory,
            db,
            config,
        })
    }

    /// Look up a deck by name.
    pub fn deck_id(&self, name: &str) -> Fallible<DeckId> {
        match self.db.find_deck(name)? {
            Some(id) => Ok(id),
            None => fail_with(ErrorKind::NotFound, format!("no deck named '{name}'")),
        }
    }

    /// A scheduler over this collection using the configured algorithm and
    /// the system clock.
    pub fn into_scheduler(self, registry: &Registry) -> Fallible<Scheduler<Self>> {
        self.into_scheduler_with(registry, Box::new(SystemClock))
    }

    pub fn into_scheduler_with(
        self,
        registry: &Registry,
        clock: Box<dyn Clock>,
    ) -> Fallible<Scheduler<Self>> {
        let settings = self.config.scheduler.clone();
        let algorithm = registry.resolve(&settings.algorithm)?;
        log::debug!("Using the '{}' scheduler.", settings.algorithm);
        Ok(Scheduler::new(
            self,
            clock,
            Box::new(CardSeeded::new(FUZZ_SALT)),
            algorithm,
            settings,
        ))
    }
}

impl CardStore for Collection {
    fn card(&self, id: CardId) -> Fallible<Card> {
        self.db.card(id)
    }

    fn cards_in_decks(&self, decks: &[DeckId]) -> Fallible<Vec<Card>> {
        self.db.cards_in_decks(decks)
    }

    fn update_card(&mut self, card: &Card) -> Fallible<()> {
        self.db.update_card(card)
    }
}

impl DeckStore for Collection {
    fn decks(&self) -> Fallible<Vec<Deck>> {
        self.db.decks()
    }

    fn conf_for_deck(&self, deck: DeckId) -> Fallible<DeckConfig> {
        let decks = self.db.decks()?;
        match decks.iter().find(|d| d.id == deck) {
            Some(found) => self.config.preset(&found.preset),
            None => fail_with(ErrorKind::NotFound, format!("no deck with ID {deck}")),
        }
    }
}

impl ReviewLog for Collection {
    fn log_review(&mut self, entry: &ReviewEntry) -> Fallible<()> {
        self.db.log_review(entry)
    }

    fn reviews_between(&self, start: Timestamp, end: Timestamp) -> Fallible<Vec<ReviewEntry>> {
        self.db.reviews_between(start, end)
    }

    fn studied_between(
        &self,
        deck: DeckId,
        start: Timestamp,
        end: Timestamp,
    ) -> Fallible<DailyCounts> {
        self.db.studied_between(deck, start, end)
    }
}

impl Store for Collection {
    fn record_answer(&mut self, card: &Card, entry: &ReviewEntry) -> Fallible<()> {
        self.db.record_answer(card, entry)
    }
}

#[cfg(test)]
mod tests {
    use std::fs::write;

    use tempfile::tempdir;

    use super::*;
    use crate::clock::DAY_SECS;
    use crate::clock::FixedClock;
    use crate::db::CardText;
    use crate::types::card_type::Queue;
    use crate::types::grade::Grade;

    #[test]
    fn test_non_existent_directory() {
        assert!(Collection::new(Some("./derpherp".to_string())).is_err());
    }

    #[test]
    fn test_presets_from_config() -> Fallible<()> {
        let dir = tempdir()?;
        write(
            dir.path().join(CONFIG_FILE),
            "[presets.slow.new]\nper_day = 3\n",
        )?;
        let mut col = Collection::new(Some(dir.path().display().to_string()))?;
        let a = col.db.get_or_create_deck("A")?;
        let b = col.db.get_or_create_deck("B")?;
        col.db.set_deck_preset(b, "slow")?;
        assert_eq!(col.conf_for_deck(a)?.new.per_day, 20);
        assert_eq!(col.conf_for_deck(b)?.new.per_day, 3);
        col.db.set_deck_preset(b, "missing")?;
        assert_eq!(col.conf_for_deck(b).err().unwrap().kind(), ErrorKind::NotFound);
        assert_eq!(col.deck_id("A")?, a);
        assert_eq!(col.deck_id("C").err().unwrap().kind(), ErrorKind::NotFound);
        Ok(())
    }

    #[test]
    fn test_unknown_algorithm() -> Fallible<()> {
        let dir = tempdir()?;
        write(
            dir.path().join(CONFIG_FILE),
            "[scheduler]\nalgorithm = \"sm17\"\n",
        )?;
        let col = Collection::new(Some(dir.path().display().to_string()))?;
        let err = col.into_scheduler(&Registry::builtin()).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidConfig);
        Ok(())
    }

    #[test]
    fn test_drill_persists() -> Fallible<()> {
        let dir = tempdir()?;
        let directory = dir.path().display().to_string();
        let mut col = Collection::new(Some(directory.clone()))?;
        let deck = col.db.get_or_create_deck("A")?;
        let text = CardText {
            front: "2 + 2".to_string(),
            back: "4".to_string(),
        };
        let id = col.db.add_card(deck, &text, Timestamp::from_secs(0))?;

        let clock = FixedClock::new(Timestamp::from_secs(20_000 * DAY_SECS + 12 * 3600));
        let mut sched = col.into_scheduler_with(&Registry::builtin(), Box::new(clock.clone()))?;
        let card = sched.get_card()?.unwrap();
        assert_eq!(card.id, id);
        sched.answer_card(&card, Grade::Easy)?;
        assert!(sched.get_card()?.is_none());
        drop(sched);

        let col = Collection::new(Some(directory))?;
        let card = col.card(id)?;
        assert_eq!(card.queue, Queue::Review);
        assert_eq!(card.reps, 1);
        let log = col.reviews_between(Timestamp::from_secs(0), clock.now().plus_secs(1))?;
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].grade, Grade::Easy);
        Ok(())
    }
}
