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

//! Interval and ease computation.
//!
//! [`compute_answer`] is a pure function from a card, its deck's
//! configuration, and a grade to the card's next [`Schedule`]. Nothing is
//! mutated here: the scheduler commits the result.

use crate::clock::DAY_SECS;
use crate::clock::Today;
use crate::config::DeckConfig;
use crate::config::HardPolicy;
use crate::config::LapseStepPolicy;
use crate::error::ErrorKind;
use crate::error::Fallible;
use crate::error::fail_with;
use crate::fuzz::fuzz;
use crate::registry::Algorithm;
use crate::types::card::Card;
use crate::types::card::Left;
use crate::types::card_type::CardType;
use crate::types::card_type::Queue;
use crate::types::grade::Grade;
use crate::types::timestamp::Timestamp;

/// Ease lost on Again, in thousandths.
const AGAIN_EASE_PENALTY: i64 = 200;

/// Ease lost on Hard while relearning, in thousandths.
const HARD_EASE_PENALTY: i64 = 150;

/// Ease gained on Easy, in thousandths.
const EASY_EASE_BONUS: i64 = 150;

/// Everything about the moment of answering that the calculation needs.
#[derive(Clone, Copy, Debug)]
pub struct AnswerContext {
    pub now: Timestamp,
    pub today: Today,
    /// Fuzz draw in `[0, 1)`.
    pub draw: f64,
    pub algorithm: Algorithm,
}

/// A card's scheduling state after an answer.
#[derive(Clone, PartialEq, Debug)]
pub struct Schedule {
    pub queue: Queue,
    pub card_type: CardType,
    pub interval: i64,
    pub last_interval: i64,
    pub ease: u32,
    pub due: i64,
    pub left: Left,
    pub lapses: u32,
}

impl Schedule {
    fn from_card(card: &Card) -> Self {
        Self {
            queue: card.queue,
            card_type: card.card_type,
            interval: card.interval,
            last_interval: card.interval,
            ease: card.ease,
            due: card.due,
            left: card.left,
            lapses: card.lapses,
        }
    }

    /// The card with this schedule applied.
    pub fn commit(&self, card: &Card) -> Card {
        Card {
            id: card.id,
            deck_id: card.deck_id,
            queue: self.queue,
            card_type: self.card_type,
            interval: self.interval,
            last_interval: self.last_interval,
            ease: self.ease,
            due: self.due,
            left: self.left,
            lapses: self.lapses,
            reps: card.reps + 1,
            timer_started_at: None,
        }
    }

    /// Seconds from `now` until the card is next shown.
    pub fn delay_secs(&self, now: Timestamp, today: &Today) -> i64 {
        if self.queue == Queue::Review {
            (self.due - today.day).max(0) * DAY_SECS
        } else {
            (self.due - now.as_secs()).max(0)
        }
    }

    fn enter_ladder(&mut self, delays: &[u32], remaining: u32, ctx: &AnswerContext) {
        let total = delays.len() as u32;
        let remaining = remaining.clamp(1, total);
        let delay = delays[(total - remaining) as usize] as i64;
        self.left = Left::new(remaining, total);
        if delay < DAY_SECS {
            self.due = ctx.now.as_secs() + delay;
        } else {
            let days = (delay + DAY_SECS - 1) / DAY_SECS;
            self.due = ctx.today.start_of(days).as_secs();
        }
        if self.card_type == CardType::Learning {
            self.interval = -delay;
        }
    }

    fn graduate(&mut self, interval: i64, ctx: &AnswerContext) {
        self.queue = Queue::Review;
        self.card_type = CardType::Review;
        self.interval = interval;
        self.due = ctx.today.day + interval;
        self.left = Left::NONE;
    }
}

/// Compute the schedule that answering `card` with `grade` produces.
pub fn compute_answer(
    card: &Card,
    config: &DeckConfig,
    grade: Grade,
    ctx: &AnswerContext,
) -> Fallible<Schedule> {
    config.validate()?;
    card.validate()?;
    let mut schedule = match card.card_type {
        _ if card.queue == Queue::Suspended => {
            return fail_with(
                ErrorKind::InvalidCardState,
                format!("card {} is suspended", card.id),
            );
        }
        CardType::New => answer_new(card, config, grade, ctx),
        CardType::Learning => answer_learning(card, config, grade, ctx),
        CardType::Relearning => answer_relearning(card, config, grade, ctx),
        CardType::Review => answer_review(card, config, grade, ctx),
    };
    schedule.ease = schedule.ease.max(config.review.minimum_ease);
    Ok(schedule)
}

fn answer_new(card: &Card, config: &DeckConfig, grade: Grade, ctx: &AnswerContext) -> Schedule {
    let mut s = Schedule::from_card(card);
    s.ease = config.new.initial_ease.max(config.review.minimum_ease);
    let delays = &config.new.delays;
    let total = delays.len() as u32;
    match grade {
        Grade::Easy => {
            s.graduate(graduating_interval(config.new.easy_interval, config, ctx), ctx);
        }
        _ if total == 0 => {
            s.graduate(graduating_interval(config.new.good_interval, config, ctx), ctx);
        }
        Grade::Again => {
            s.queue = Queue::Learning;
            s.card_type = CardType::Learning;
            s.enter_ladder(delays, total, ctx);
        }
        Grade::Hard | Grade::Good => {
            if total == 1 {
                s.graduate(graduating_interval(config.new.good_interval, config, ctx), ctx);
            } else {
                s.queue = Queue::Learning;
                s.card_type = CardType::Learning;
                s.enter_ladder(delays, total - 1, ctx);
            }
        }
    }
    s
}

fn answer_learning(
    card: &Card,
    config: &DeckConfig,
    grade: Grade,
    ctx: &AnswerContext,
) -> Schedule {
    let mut s = Schedule::from_card(card);
    s.ease = floor_ease(s.ease as i64, config);
    let delays = &config.new.delays;
    let total = delays.len() as u32;
    let remaining = card.left.remaining().clamp(1, total.max(1));
    let good = || graduating_interval(config.new.good_interval, config, ctx);
    match grade {
        Grade::Easy => {
            s.graduate(graduating_interval(config.new.easy_interval, config, ctx), ctx);
        }
        // The ladder was removed from the preset since the card entered it.
        _ if total == 0 => s.graduate(good(), ctx),
        Grade::Again => {
            let remaining = step_back(config.lapse.step_policy, remaining, total);
            s.enter_ladder(delays, remaining, ctx);
        }
        Grade::Hard => s.enter_ladder(delays, remaining, ctx),
        Grade::Good => {
            if remaining <= 1 {
                s.graduate(good(), ctx);
            } else {
                s.enter_ladder(delays, remaining - 1, ctx);
            }
        }
    }
    s
}

fn answer_relearning(
    card: &Card,
    config: &DeckConfig,
    grade: Grade,
    ctx: &AnswerContext,
) -> Schedule {
    let mut s = Schedule::from_card(card);
    let lapse = &config.lapse;
    let delays = &lapse.delays;
    let total = delays.len() as u32;
    let remaining = card.left.remaining().clamp(1, total.max(1));
    let interval = card.interval.max(1);
    match grade {
        Grade::Again | Grade::Hard => {
            let (factor, penalty) = if grade == Grade::Again {
                (lapse.again_factor, AGAIN_EASE_PENALTY)
            } else {
                (lapse.hard_factor, HARD_EASE_PENALTY)
            };
            s.interval = decay(interval, factor, config);
            s.ease = floor_ease(card.ease as i64 - penalty, config);
            if total == 0 {
                s.graduate(s.interval, ctx);
            } else if grade == Grade::Again {
                let remaining = step_back(lapse.step_policy, remaining, total);
                s.enter_ladder(delays, remaining, ctx);
            } else {
                s.enter_ladder(delays, remaining, ctx);
            }
        }
        // Graduation keeps the interval and ease the failing answer set.
        Grade::Good if remaining > 1 && total > 0 => {
            s.enter_ladder(delays, remaining - 1, ctx);
        }
        Grade::Good | Grade::Easy => s.graduate(interval, ctx),
    }
    s
}

fn answer_review(card: &Card, config: &DeckConfig, grade: Grade, ctx: &AnswerContext) -> Schedule {
    let mut s = Schedule::from_card(card);
    let review = &config.review;
    let last = card.interval.max(1);
    let ease = card.ease as i64;
    let days_late = card.days_late(ctx.today.day);
    let lateness = if ctx.algorithm.uses_lateness() {
        days_late
    } else {
        0
    };
    match grade {
        Grade::Again => {
            if config.lapse.forgive_overdue && days_late >= last {
                log::debug!("card {} lapsed after {days_late} days overdue, forgiven", card.id);
                s.interval = last;
            } else {
                s.lapses += 1;
                s.ease = floor_ease(ease - AGAIN_EASE_PENALTY, config);
                s.interval = lapse_interval(last, ease, lateness, config);
            }
            relearn(&mut s, last, config, ctx);
        }
        Grade::Hard if review.hard_policy == HardPolicy::Relearn => {
            s.ease = floor_ease(ease - HARD_EASE_PENALTY, config);
            s.interval = decay(last, config.lapse.hard_factor, config);
            relearn(&mut s, last, config, ctx);
        }
        Grade::Hard => {
            s.ease = floor_ease(ease + review.hard_ease_delta as i64, config);
            let good = scale(last, ease as f64 / 1000.0 * review.interval_multiplier);
            let base = last as f64 + lateness as f64 * review.hard_lateness;
            let hard = scale_f(base, review.hard_factor * review.interval_multiplier);
            let hard = hard.clamp(last, good.max(last));
            s.graduate(review_interval(hard, config, ctx), ctx);
        }
        Grade::Good => {
            let good = scale(last, ease as f64 / 1000.0 * review.interval_multiplier);
            s.graduate(review_interval(good, config, ctx), ctx);
        }
        Grade::Easy => {
            let ease = ease + EASY_EASE_BONUS;
            s.ease = floor_ease(ease, config);
            let factor = ease as f64 / 1000.0 * review.easy_bonus * review.interval_multiplier;
            s.graduate(review_interval(scale(last, factor), config, ctx), ctx);
        }
    }
    s
}

/// Send a lapsed review card into the relearning ladder, or straight back to
/// review if the ladder is empty.
fn relearn(s: &mut Schedule, last: i64, config: &DeckConfig, ctx: &AnswerContext) {
    let delays = &config.lapse.delays;
    if delays.is_empty() {
        let interval = review_interval(s.interval, config, ctx).min(last);
        s.graduate(interval, ctx);
    } else {
        s.queue = Queue::Relearning;
        s.card_type = CardType::Relearning;
        s.enter_ladder(delays, delays.len() as u32, ctx);
    }
}

/// The interval after a lapse. On time, the last interval is divided by the
/// ease; the later the answer, the closer the result gets to the last
/// interval, reaching it once the card is a full interval overdue.
fn lapse_interval(last: i64, ease: i64, days_late: i64, config: &DeckConfig) -> i64 {
    let ease = (ease.max(config.review.minimum_ease as i64)) as f64 / 1000.0;
    let on_time = last as f64 / ease;
    let progress = (days_late as f64 / last as f64).min(1.0);
    let decayed = on_time + (last as f64 - on_time) * progress;
    (decayed.round() as i64)
        .max(config.lapse.min_interval as i64)
        .min(last)
}

fn decay(interval: i64, factor: f64, config: &DeckConfig) -> i64 {
    scale(interval, factor)
        .max(config.lapse.min_interval as i64)
        .min(interval.max(1))
}

fn step_back(policy: LapseStepPolicy, remaining: u32, total: u32) -> u32 {
    match policy {
        LapseStepPolicy::Reset => total,
        LapseStepPolicy::StepBack => (remaining + 1).min(total),
    }
}

fn graduating_interval(days: u32, config: &DeckConfig, ctx: &AnswerContext) -> i64 {
    review_interval(days as i64, config, ctx)
}

/// Cap an interval at the deck maximum and fuzz it.
fn review_interval(interval: i64, config: &DeckConfig, ctx: &AnswerContext) -> i64 {
    let max = config.review.max_interval as i64;
    let interval = interval.clamp(1, max);
    if config.review.fuzz {
        fuzz(interval, ctx.draw).clamp(1, max)
    } else {
        interval
    }
}

fn scale(interval: i64, factor: f64) -> i64 {
    scale_f(interval as f64, factor)
}

fn scale_f(interval: f64, factor: f64) -> i64 {
    (interval * factor).round() as i64
}

fn floor_ease(ease: i64, config: &DeckConfig) -> u32 {
    ease.max(config.review.minimum_ease as i64) as u32
}
