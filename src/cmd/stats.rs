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
use crate::sched::Counts;
use crate::stats::Stats;
use crate::stats::collect_stats;

pub fn print_stats(directory: Option<String>, registry: &Registry) -> Fallible<()> {
    let coll: Collection = Collection::new(directory)?;
    let mut sched = coll.into_scheduler(registry)?;
    let stats: Stats = collect_stats(&mut sched)?;
    let json: String = serde_json::to_string_pretty(&stats)?;
    println!("{json}");
    Ok(())
}

pub fn print_due(
    directory: Option<String>,
    deck: Option<String>,
    registry: &Registry,
) -> Fallible<()> {
    let coll: Collection = Collection::new(directory)?;
    let deck = deck.map(|name| coll.deck_id(&name)).transpose()?;
    let mut sched = coll.into_scheduler(registry)?;
    sched.select_deck(deck);
    println!("{}", format_counts(&sched.counts()?));
    Ok(())
}

pub fn format_counts(counts: &Counts) -> String {
    format!(
        "{} learning, {} review, {} new",
        counts.learning, counts.review, counts.new
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_existent_directory() {
        let registry = Registry::builtin();
        assert!(print_stats(Some("./derpherp".to_string()), &registry).is_err());
        assert!(print_due(Some("./derpherp".to_string()), None, &registry).is_err());
    }

    #[test]
    fn test_format_counts() {
        let counts = Counts {
            learning: 1,
            review: 12,
            new: 5,
        };
        assert_eq!(format_counts(&counts), "1 learning, 12 review, 5 new");
    }
}
