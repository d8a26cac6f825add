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
use crate::error::Fallible;
use crate::registry::Registry;
use crate::sched::Scheduler;
use crate::store::Store;
use crate::types::grade::Grade;
use crate::types::id::CardId;

/// Print the delay each answer would give a card, without answering it.
pub fn preview_card(directory: Option<String>, card: i64, registry: &Registry) -> Fallible<()> {
    let coll: Collection = Collection::new(directory)?;
    let sched = coll.into_scheduler(registry)?;
    for line in preview_lines(&sched, CardId(card))? {
        println!("{line}");
    }
    Ok(())
}

pub fn preview_lines<S: Store>(sched: &Scheduler<S>, card: CardId) -> Fallible<Vec<String>> {
    let card = sched.store().card(card)?;
    let mut lines = Vec::new();
    for grade in Grade::ALL {
        let delay = sched.next_interval_description(&card, grade)?;
        lines.push(format!("{grade}: {delay}"));
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::DAY_SECS;
    use crate::clock::FixedClock;
    use crate::config::DEFAULT_PRESET;
    use crate::config::SchedulerSettings;
    use crate::error::ErrorKind;
    use crate::registry::Algorithm;
    use crate::rng::FixedDraw;
    use crate::store::MemoryCollection;
    use crate::types::timestamp::Timestamp;

    #[test]
    fn test_preview_new_card() -> Fallible<()> {
        let mut col = MemoryCollection::new();
        let deck = col.add_deck("A", DEFAULT_PRESET);
        let id = col.add_card(deck);
        let clock = FixedClock::new(Timestamp::from_secs(20_000 * DAY_SECS));
        let sched = Scheduler::new(
            col,
            Box::new(clock),
            Box::new(FixedDraw(0.5)),
            Algorithm::LatenessAware,
            SchedulerSettings::default(),
        );
        let lines = preview_lines(&sched, id)?;
        assert_eq!(lines, vec!["again: 1m", "hard: 10m", "good: 10m", "easy: 4d"]);
        let err = preview_lines(&sched, CardId(99)).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        Ok(())
    }
}
