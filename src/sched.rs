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

//! The scheduler facade: which card to study next, and what answering it
//! does to the collection.

use std::collections::HashMap;
use std::collections::VecDeque;

use serde::Serialize;

use crate::calc::AnswerContext;
use crate::calc::compute_answer;
use crate::clock::Clock;
use crate::clock::Today;
use crate::config::DeckConfig;
use crate::config::NewOrder;
use crate::config::NewSpread;
use crate::config::SchedulerSettings;
use crate::deck::DeckTree;
use crate::describe::describe_delay;
use crate::error::ErrorKind;
use crate::error::Fallible;
use crate::error::fail_with;
use crate::registry::Algorithm;
use crate::rng::RandomSource;
use crate::rng::shuffle_key;
use crate::scatter::scatter;
use crate::store::Store;
use crate::types::card::Card;
use crate::types::card_type::Queue;
use crate::types::grade::Grade;
use crate::types::id::CardId;
use crate::types::id::DeckId;
use crate::types::review::ReviewEntry;
use crate::types::review::ReviewKind;

/// Cards left to study in the current session.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug, Serialize)]
pub struct Counts {
    pub learning: usize,
    pub review: usize,
    pub new: usize,
}

/// A learning card due later today.
#[derive(Clone, Copy, Debug)]
struct Pending {
    due: i64,
    card: CardId,
    deck: DeckId,
}

/// The day's queues, built by [`Scheduler::reset`].
struct Session {
    today: Today,
    tree: DeckTree,
    scope: Vec<DeckId>,
    /// Intraday learning cards, ordered by due time.
    learning: Vec<Pending>,
    /// Ladder cards carried over from an earlier day.
    day_learning: VecDeque<CardId>,
    review: VecDeque<CardId>,
    new: VecDeque<CardId>,
    /// Show a new card every this many answers. Zero: never interleave.
    new_modulus: usize,
    day_learn_first: bool,
}

impl Session {
    /// The learning card to show if only cards due by `cutoff` count.
    fn learning_due(&self, cutoff: i64) -> Option<CardId> {
        let due: Vec<(CardId, DeckId)> = self
            .learning
            .iter()
            .take_while(|pending| pending.due <= cutoff)
            .map(|pending| (pending.card, pending.deck))
            .collect();
        scatter(&due, &self.tree).first().copied()
    }

    fn time_for_new(&self, spread: NewSpread, answered: usize) -> bool {
        match spread {
            NewSpread::First => true,
            NewSpread::Last => false,
            NewSpread::Distribute => {
                self.new_modulus > 0 && answered > 0 && answered % self.new_modulus == 0
            }
        }
    }

    fn remove(&mut self, card: CardId) {
        self.learning.retain(|pending| pending.card != card);
        self.day_learning.retain(|id| *id != card);
        self.review.retain(|id| *id != card);
        self.new.retain(|id| *id != card);
    }

    fn push_learning(&mut self, pending: Pending) {
        let at = self
            .learning
            .partition_point(|other| (other.due, other.card) <= (pending.due, pending.card));
        self.learning.insert(at, pending);
    }

    fn counts(&self) -> Counts {
        Counts {
            learning: self.learning.len() + self.day_learning.len(),
            review: self.review.len(),
            new: self.new.len(),
        }
    }
}

pub struct Scheduler<S: Store> {
    store: S,
    clock: Box<dyn Clock>,
    rng: Box<dyn RandomSource>,
    algorithm: Algorithm,
    settings: SchedulerSettings,
    /// The deck being studied, with its subdecks. `None` studies everything.
    deck: Option<DeckId>,
    session: Option<Session>,
    /// Answers given since the last reset.
    answered: usize,
}

impl<S: Store> Scheduler<S> {
    pub fn new(
        store: S,
        clock: Box<dyn Clock>,
        rng: Box<dyn RandomSource>,
        algorithm: Algorithm,
        settings: SchedulerSettings,
    ) -> Self {
        Self {
            store,
            clock,
            rng,
            algorithm,
            settings,
            deck: None,
            session: None,
            answered: 0,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        self.session = None;
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Restrict study to `deck` and its subdecks. Takes effect at the next
    /// draw.
    pub fn select_deck(&mut self, deck: Option<DeckId>) {
        self.deck = deck;
        self.session = None;
    }

    pub fn today(&self) -> Today {
        Today::at(self.clock.as_ref(), self.settings.rollover_hour)
    }

    /// Rebuild the day's queues from the store, honoring each deck's daily
    /// limits.
    pub fn reset(&mut self) -> Fallible<()> {
        let today = self.today();
        let decks = self.store.decks()?;
        let tree = DeckTree::new(&decks);
        let scope: Vec<DeckId> = match self.deck {
            Some(root) => {
                if !decks.iter().any(|deck| deck.id == root) {
                    return fail_with(ErrorKind::NotFound, format!("no deck with ID {root}"));
                }
                decks
                    .iter()
                    .map(|deck| deck.id)
                    .filter(|id| tree.is_within(*id, root))
                    .collect()
            }
            None => decks.iter().map(|deck| deck.id).collect(),
        };

        let mut configs: HashMap<DeckId, DeckConfig> = HashMap::new();
        let mut new_allowance: HashMap<DeckId, u32> = HashMap::new();
        let mut review_allowance: HashMap<DeckId, u32> = HashMap::new();
        for deck in &scope {
            let config = self.store.conf_for_deck(*deck)?;
            let studied = self.store.studied_between(*deck, today.start, today.end())?;
            new_allowance.insert(*deck, config.new.per_day.saturating_sub(studied.new));
            review_allowance.insert(*deck, config.review.per_day.saturating_sub(studied.review));
            configs.insert(*deck, config);
        }

        let start = today.start.as_secs();
        let end = today.end().as_secs();
        let mut learning = Vec::new();
        let mut day_learning = Vec::new();
        let mut review = Vec::new();
        let mut new = Vec::new();
        for card in self.store.cards_in_decks(&scope)? {
            match card.queue {
                Queue::Learning | Queue::Relearning => {
                    if card.due <= start {
                        day_learning.push(card);
                    } else if card.due < end {
                        learning.push(Pending {
                            due: card.due,
                            card: card.id,
                            deck: card.deck_id,
                        });
                    }
                }
                Queue::Review if card.due <= today.day => review.push(card),
                Queue::New => new.push(card),
                Queue::Review | Queue::Suspended => {}
            }
        }
        learning.sort_by_key(|pending| (pending.due, pending.card));
        day_learning.sort_by_key(|card| (card.due, card.id));
        review.sort_by_key(|card| (card.due, shuffle_key(today.day, card.id.0), card.id));
        new.sort_by_key(|card| {
            let order = configs
                .get(&card.deck_id)
                .map(|config| config.new.order)
                .unwrap_or(NewOrder::Added);
            match order {
                NewOrder::Added => (card.due, 0, card.id),
                NewOrder::Random => (0, shuffle_key(card.deck_id.0, card.id.0), card.id),
            }
        });

        let day_learning: Vec<(CardId, DeckId)> =
            day_learning.iter().map(|card| (card.id, card.deck_id)).collect();
        let review = capped(review, review_allowance);
        let new = capped(new, new_allowance);
        let new_modulus = if new.is_empty() {
            0
        } else {
            let modulus = (new.len() + review.len()) / new.len();
            if review.is_empty() {
                modulus
            } else {
                modulus.max(2)
            }
        };
        // Without a selected deck, the first top-level deck stands in for it.
        let root = self
            .deck
            .or_else(|| scope.iter().copied().find(|id| tree.parent(*id).is_none()));
        let day_learn_first = root
            .and_then(|root| configs.get(&root))
            .map(|config| config.day_learn_first)
            .unwrap_or(DeckConfig::default().day_learn_first);

        let session = Session {
            today,
            day_learning: VecDeque::from(scatter(&day_learning, &tree)),
            review: VecDeque::from(scatter(&review, &tree)),
            new: VecDeque::from(scatter(&new, &tree)),
            tree,
            scope,
            learning,
            new_modulus,
            day_learn_first,
        };
        let counts = session.counts();
        log::debug!(
            "Queues for day {}: {} learning, {} review, {} new.",
            today.day,
            counts.learning,
            counts.review,
            counts.new
        );
        self.session = Some(session);
        self.answered = 0;
        Ok(())
    }

    /// The next card to study, or `None` when the day's queues are empty.
    ///
    /// Drawing a card changes nothing but its answer timer: calling this
    /// again without answering returns the same card.
    pub fn get_card(&mut self) -> Fallible<Option<Card>> {
        self.refresh()?;
        let now = self.clock.now();
        let Some(id) = self.next_card_id(now.as_secs()) else {
            return Ok(None);
        };
        let mut card = self.store.card(id)?;
        card.timer_started_at = Some(now);
        Ok(Some(card))
    }

    fn next_card_id(&self, now: i64) -> Option<CardId> {
        let session = self.session.as_ref()?;
        if let Some(id) = session.learning_due(now) {
            return Some(id);
        }
        if session.time_for_new(self.settings.new_spread, self.answered) {
            if let Some(id) = session.new.front() {
                return Some(*id);
            }
        }
        let main = if session.day_learn_first {
            [&session.day_learning, &session.review]
        } else {
            [&session.review, &session.day_learning]
        };
        for queue in main {
            if let Some(id) = queue.front() {
                return Some(*id);
            }
        }
        if let Some(id) = session.new.front() {
            return Some(*id);
        }
        session.learning_due(now + self.settings.learn_ahead_secs())
    }

    /// Answer `card`, persist its new state and log the review. Returns the
    /// card as stored.
    pub fn answer_card(&mut self, card: &Card, grade: Grade) -> Fallible<Card> {
        self.refresh()?;
        let (ctx, config) = self.context(card)?;
        let next = compute_answer(card, &config, grade, &ctx)?.commit(card);
        next.validate()?;

        let elapsed = card
            .elapsed_secs(ctx.now)
            .unwrap_or(0)
            .min(config.max_answer_secs as i64);
        let entry = ReviewEntry {
            card_id: card.id,
            deck_id: card.deck_id,
            reviewed_at: ctx.now,
            grade,
            interval: next.interval,
            last_interval: next.last_interval,
            ease: next.ease,
            time_taken_ms: elapsed as u64 * 1000,
            kind: ReviewKind::of(card.card_type),
        };
        self.store.record_answer(&next, &entry)?;
        log::debug!(
            "Card {} answered {grade}: {} -> {}, due {}.",
            card.id,
            card.queue.as_str(),
            next.queue.as_str(),
            next.due
        );

        self.answered += 1;
        if let Some(session) = self.session.as_mut() {
            session.remove(card.id);
            let in_scope = session.scope.contains(&next.deck_id);
            if in_scope && next.queue.is_ladder() && next.due < ctx.today.end().as_secs() {
                session.push_learning(Pending {
                    due: next.due,
                    card: next.id,
                    deck: next.deck_id,
                });
            }
        }
        Ok(next)
    }

    /// How long until `card` would be shown again if answered with `grade`,
    /// e.g. `10m` or `4d`. Nothing is modified.
    pub fn next_interval_description(&self, card: &Card, grade: Grade) -> Fallible<String> {
        let (ctx, config) = self.context(card)?;
        let schedule = compute_answer(card, &config, grade, &ctx)?;
        Ok(describe_delay(schedule.delay_secs(ctx.now, &ctx.today)))
    }

    pub fn counts(&mut self) -> Fallible<Counts> {
        self.refresh()?;
        Ok(self
            .session
            .as_ref()
            .map(|session| session.counts())
            .unwrap_or_default())
    }

    /// Rebuild the queues if there are none yet or the day has rolled over.
    fn refresh(&mut self) -> Fallible<()> {
        let day = self.today().day;
        match &self.session {
            Some(session) if session.today.day == day => Ok(()),
            Some(_) => {
                log::info!("Day rolled over, rebuilding queues.");
                self.reset()
            }
            None => self.reset(),
        }
    }

    fn context(&self, card: &Card) -> Fallible<(AnswerContext, DeckConfig)> {
        let config = self.store.conf_for_deck(card.deck_id)?;
        let ctx = AnswerContext {
            now: self.clock.now(),
            today: self.today(),
            draw: self.rng.draw(card),
            algorithm: self.algorithm,
        };
        Ok((ctx, config))
    }
}

/// Keep, per deck, only as many cards as the deck has left for today.
fn capped(cards: Vec<Card>, mut allowance: HashMap<DeckId, u32>) -> Vec<(CardId, DeckId)> {
    cards
        .into_iter()
        .filter(|card| match allowance.get_mut(&card.deck_id) {
            Some(left) if *left > 0 => {
                *left -= 1;
                true
            }
            _ => false,
        })
        .map(|card| (card.id, card.deck_id))
        .collect()
}
