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

use std::collections::BTreeSet;

use serde::Serialize;

use crate::clock::DAY_SECS;
use crate::error::Fallible;
use crate::sched::Counts;
use crate::sched::Scheduler;
use crate::store::Store;
use crate::types::grade::Grade;
use crate::types::review::ReviewEntry;
use crate::types::review::ReviewKind;

/// How review cards (not learning ones) fared over a period.
#[derive(Clone, Copy, PartialEq, Default, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Retention {
    pub flunked: usize,
    pub hard: usize,
    pub passed: usize,
    pub easy: usize,
    /// Share of review answers that weren't Again. `None` without reviews.
    pub rate: Option<f64>,
}

impl Retention {
    pub fn from_entries(entries: &[ReviewEntry]) -> Self {
        let mut retention = Retention::default();
        for entry in entries.iter().filter(|e| e.kind == ReviewKind::Review) {
            match entry.grade {
                Grade::Again => retention.flunked += 1,
                Grade::Hard => retention.hard += 1,
                Grade::Good => retention.passed += 1,
                Grade::Easy => retention.easy += 1,
            }
        }
        let total = retention.flunked + retention.hard + retention.passed + retention.easy;
        if total > 0 {
            retention.rate = Some((total - retention.flunked) as f64 / total as f64);
        }
        retention
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetentionPeriods {
    pub past_day: Retention,
    pub past_week: Retention,
    pub past_month: Retention,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub card_count: usize,
    pub deck_count: usize,
    pub remaining_today: Counts,
    pub studied_today: usize,
    pub time_today_ms: u64,
    /// Days in the past month with at least one answer.
    pub days_studied: usize,
    pub retention: RetentionPeriods,
}

pub fn collect_stats<S: Store>(sched: &mut Scheduler<S>) -> Fallible<Stats> {
    let remaining_today = sched.counts()?;
    let today = sched.today();
    let store = sched.store();
    let decks: Vec<_> = store.decks()?.into_iter().map(|deck| deck.id).collect();
    let card_count = store.cards_in_decks(&decks)?.len();

    let end = today.end();
    let month = store.reviews_between(end.plus_secs(-31 * DAY_SECS), end)?;
    let since = |days: i64| {
        let start = end.plus_secs(-days * DAY_SECS);
        month
            .iter()
            .filter(|entry| entry.reviewed_at >= start)
            .cloned()
            .collect::<Vec<ReviewEntry>>()
    };
    let past_day = since(1);
    let days_studied = month
        .iter()
        .map(|entry| (entry.reviewed_at.as_secs() - today.start.as_secs()).div_euclid(DAY_SECS))
        .collect::<BTreeSet<i64>>()
        .len();

    Ok(Stats {
        card_count,
        deck_count: decks.len(),
        remaining_today,
        studied_today: past_day.len(),
        time_today_ms: past_day.iter().map(|entry| entry.time_taken_ms).sum(),
        days_studied,
        retention: RetentionPeriods {
            past_day: Retention::from_entries(&past_day),
            past_week: Retention::from_entries(&since(7)),
            past_month: Retention::from_entries(&month),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::config::DEFAULT_PRESET;
    use crate::config::SchedulerSettings;
    use crate::registry::Algorithm;
    use crate::rng::FixedDraw;
    use crate::store::MemoryCollection;
    use crate::store::ReviewLog;
    use crate::types::id::CardId;
    use crate::types::id::DeckId;
    use crate::types::timestamp::Timestamp;

    fn entry(at: i64, grade: Grade, kind: ReviewKind) -> ReviewEntry {
        ReviewEntry {
            card_id: CardId(1),
            deck_id: DeckId(1),
            reviewed_at: Timestamp::from_secs(at),
            grade,
            interval: 10,
            last_interval: 4,
            ease: 2500,
            time_taken_ms: 2000,
            kind,
        }
    }

    #[test]
    fn test_retention() {
        let entries = vec![
            entry(0, Grade::Again, ReviewKind::Review),
            entry(0, Grade::Hard, ReviewKind::Review),
            entry(0, Grade::Good, ReviewKind::Review),
            entry(0, Grade::Good, ReviewKind::Review),
            entry(0, Grade::Again, ReviewKind::Learn),
            entry(0, Grade::Easy, ReviewKind::New),
        ];
        let retention = Retention::from_entries(&entries);
        assert_eq!(retention.flunked, 1);
        assert_eq!(retention.hard, 1);
        assert_eq!(retention.passed, 2);
        assert_eq!(retention.easy, 0);
        assert_eq!(retention.rate, Some(0.75));
        assert_eq!(Retention::from_entries(&[]).rate, None);
    }

    #[test]
    fn test_collect_stats() -> Fallible<()> {
        let day = 20_000;
        let noon = day * DAY_SECS + 12 * 3600;
        let mut col = MemoryCollection::new();
        let deck = col.add_deck("A", DEFAULT_PRESET);
        col.add_card(deck);
        col.add_card(deck);
        col.log_review(&entry(noon - 3600, Grade::Good, ReviewKind::Review))?;
        col.log_review(&entry(noon - 3 * DAY_SECS, Grade::Again, ReviewKind::Review))?;
        col.log_review(&entry(noon - 20 * DAY_SECS, Grade::Easy, ReviewKind::Review))?;
        col.log_review(&entry(noon - 90 * DAY_SECS, Grade::Again, ReviewKind::Review))?;

        let clock = FixedClock::new(Timestamp::from_secs(noon));
        let settings = SchedulerSettings {
            rollover_hour: 0,
            ..SchedulerSettings::default()
        };
        let mut sched = Scheduler::new(
            col,
            Box::new(clock),
            Box::new(FixedDraw(0.5)),
            Algorithm::LatenessAware,
            settings,
        );
        let stats = collect_stats(&mut sched)?;
        assert_eq!(stats.card_count, 2);
        assert_eq!(stats.deck_count, 1);
        assert_eq!(stats.remaining_today.new, 2);
        assert_eq!(stats.studied_today, 1);
        assert_eq!(stats.time_today_ms, 2000);
        assert_eq!(stats.retention.past_day.passed, 1);
        assert_eq!(stats.retention.past_week.flunked, 1);
        assert_eq!(stats.retention.past_month.easy, 1);
        assert_eq!(stats.retention.past_month.flunked, 1);

        let json = serde_json::to_value(&stats)?;
        assert_eq!(json["remainingToday"]["new"], 2);
        assert_eq!(json["retention"]["pastWeek"]["rate"], 0.5);
        assert_eq!(json["daysStudied"], 3);
        Ok(())
    }

    #[test]
    fn test_days_studied() -> Fallible<()> {
        let noon = 20_000 * DAY_SECS + 12 * 3600;
        let mut col = MemoryCollection::new();
        col.add_deck("A", DEFAULT_PRESET);
        for day in 0..30 {
            col.log_review(&entry(noon - day * DAY_SECS, Grade::Hard, ReviewKind::Review))?;
        }
        // A second answer on a day already counted, and one too old to count.
        col.log_review(&entry(noon - 3600, Grade::Good, ReviewKind::Review))?;
        col.log_review(&entry(noon - 40 * DAY_SECS, Grade::Good, ReviewKind::Review))?;

        let settings = SchedulerSettings {
            rollover_hour: 0,
            ..SchedulerSettings::default()
        };
        let mut sched = Scheduler::new(
            col,
            Box::new(FixedClock::new(Timestamp::from_secs(noon))),
            Box::new(FixedDraw(0.5)),
            Algorithm::LatenessAware,
            settings,
        );
        assert_eq!(collect_stats(&mut sched)?.days_studied, 30);
        Ok(())
    }
}
