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

use serde::Serialize;

use crate::error::ErrorKind;
use crate::error::Fallible;
use crate::error::fail_with;
use crate::types::card_type::CardType;
use crate::types::card_type::Queue;
use crate::types::id::CardId;
use crate::types::id::DeckId;
use crate::types::timestamp::Timestamp;

/// Remaining learning steps, packed as `remaining + total * 1000`.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug, Serialize)]
pub struct Left(u32);

impl Left {
    pub const NONE: Left = Left(0);

    pub fn new(remaining: u32, total: u32) -> Self {
        Self(remaining + total * 1000)
    }

    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }

    pub fn remaining(self) -> u32 {
        self.0 % 1000
    }

    pub fn total(self) -> u32 {
        self.0 / 1000
    }

    /// Zero-based position in the ladder.
    pub fn step(self) -> usize {
        self.total().saturating_sub(self.remaining()) as usize
    }
}

/// The scheduling state of a single card.
#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct Card {
    pub id: CardId,
    pub deck_id: DeckId,
    pub queue: Queue,
    pub card_type: CardType,
    /// Negative: seconds of the current learning step. Positive: days.
    pub interval: i64,
    /// The interval before the most recent answer.
    pub last_interval: i64,
    /// Ease factor, in thousandths.
    pub ease: u32,
    /// Position for new cards, Unix timestamp for ladder cards, day index
    /// for review cards.
    pub due: i64,
    pub left: Left,
    pub lapses: u32,
    /// The number of answers recorded for this card.
    pub reps: u32,
    /// When the card was last drawn. Consumed when it is answered.
    #[serde(skip)]
    pub timer_started_at: Option<Timestamp>,
}

impl Card {
    /// A card that has never been studied, at the given position in the
    /// new queue.
    pub fn new(id: CardId, deck_id: DeckId, position: i64) -> Self {
        Self {
            id,
            deck_id,
            queue: Queue::New,
            card_type: CardType::New,
            interval: 0,
            last_interval: 0,
            ease: 0,
            due: position,
            left: Left::NONE,
            lapses: 0,
            reps: 0,
            timer_started_at: None,
        }
    }

    /// Seconds since the card was drawn, if it was.
    pub fn elapsed_secs(&self, now: Timestamp) -> Option<i64> {
        self.timer_started_at.map(|start| now.secs_since(start))
    }

    /// Days past the due date of a review card. Zero when on time or early.
    pub fn days_late(&self, today: i64) -> i64 {
        if self.queue == Queue::Review {
            (today - self.due).max(0)
        } else {
            0
        }
    }

    /// Check that the queue and type agree with each other and with the
    /// interval and step counter.
    pub fn validate(&self) -> Fallible<()> {
        let consistent = match self.queue {
            Queue::New => self.card_type == CardType::New,
            Queue::Learning => self.card_type == CardType::Learning,
            Queue::Review => self.card_type == CardType::Review,
            Queue::Relearning => self.card_type == CardType::Relearning,
            Queue::Suspended => true,
        };
        if !consistent {
            return fail_with(
                ErrorKind::InvalidCardState,
                format!(
                    "card {} is in the {} queue but has type {}",
                    self.id,
                    self.queue.as_str(),
                    self.card_type.as_str()
                ),
            );
        }
        if self.queue.is_ladder() && !(self.interval < 0 || self.left.remaining() > 0) {
            return fail_with(
                ErrorKind::InvalidCardState,
                format!("card {} is in a ladder with no steps left", self.id),
            );
        }
        if self.queue == Queue::Review && self.interval < 1 {
            return fail_with(
                ErrorKind::InvalidCardState,
                format!("review card {} has interval {}", self.id, self.interval),
            );
        }
        Ok(())
    }
}
