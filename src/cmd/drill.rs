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

use std::io::BufRead;
use std::io::Write;
use std::io::stdin;
use std::io::stdout;

use crate::cmd::stats::format_counts;
use crate::collection::Collection;
use crate::error::Fallible;
use crate::registry::Registry;
use crate::sched::Scheduler;
use crate::types::card::Card;
use crate::types::grade::Grade;

pub fn drill(directory: Option<String>, deck: Option<String>, registry: &Registry) -> Fallible<()> {
    let coll: Collection = Collection::new(directory)?;
    let deck = deck.map(|name| coll.deck_id(&name)).transpose()?;
    let mut sched = coll.into_scheduler(registry)?;
    sched.select_deck(deck);
    let reviewed = run_session(&mut sched, &mut stdin().lock(), &mut stdout().lock())?;
    println!("Reviewed {reviewed} cards.");
    Ok(())
}

/// Drill until the queues are empty or the input ends. Returns the number
/// of cards answered.
pub fn run_session<R: BufRead, W: Write>(
    sched: &mut Scheduler<Collection>,
    input: &mut R,
    output: &mut W,
) -> Fallible<usize> {
    let mut reviewed = 0;
    while let Some(card) = sched.get_card()? {
        let text = sched.store().db.card_text(card.id)?;
        writeln!(output, "[{}]", format_counts(&sched.counts()?))?;
        writeln!(output, "Q: {}", text.front)?;
        writeln!(output, "[press enter to reveal]")?;
        if read_line(input)?.is_none() {
            break;
        }
        writeln!(output, "A: {}", text.back)?;
        let Some(grade) = read_grade(sched, &card, input, output)? else {
            break;
        };
        sched.answer_card(&card, grade)?;
        reviewed += 1;
    }
    Ok(reviewed)
}

fn read_line<R: BufRead>(input: &mut R) -> Fallible<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Prompt until a valid grade is entered. `None` on end of input.
fn read_grade<R: BufRead, W: Write>(
    sched: &Scheduler<Collection>,
    card: &Card,
    input: &mut R,
    output: &mut W,
) -> Fallible<Option<Grade>> {
    let mut options = Vec::new();
    for grade in Grade::ALL {
        let delay = sched.next_interval_description(card, grade)?;
        options.push(format!("{} = {grade} ({delay})", grade.as_u8()));
    }
    loop {
        writeln!(output, "Grade: {}", options.join(", "))?;
        let Some(line) = read_line(input)? else {
            return Ok(None);
        };
        match line.parse::<u8>().ok().and_then(|n| Grade::try_from(n).ok()) {
            Some(grade) => return Ok(Some(grade)),
            None => writeln!(output, "Invalid input. Please enter a number between 1 and 4.")?,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use tempfile::TempDir;
    use tempfile::tempdir;

    use super::*;
    use crate::clock::DAY_SECS;
    use crate::clock::FixedClock;
    use crate::db::CardText;
    use crate::store::ReviewLog;
    use crate::types::timestamp::Timestamp;

    fn session(input: &str) -> Fallible<(TempDir, usize, String, Scheduler<Collection>)> {
        let dir = tempdir()?;
        let mut coll = Collection::new(Some(dir.path().display().to_string()))?;
        let deck = coll.db.get_or_create_deck("Capitals")?;
        for (front, back) in [("France", "Paris"), ("Peru", "Lima")] {
            let text = CardText {
                front: front.to_string(),
                back: back.to_string(),
            };
            coll.db.add_card(deck, &text, Timestamp::from_secs(0))?;
        }
        let clock = FixedClock::new(Timestamp::from_secs(20_000 * DAY_SECS + 12 * 3600));
        let mut sched = coll.into_scheduler_with(&Registry::builtin(), Box::new(clock))?;
        let mut output = Vec::new();
        let reviewed = run_session(&mut sched, &mut Cursor::new(input), &mut output)?;
        let output = String::from_utf8(output).unwrap();
        Ok((dir, reviewed, output, sched))
    }

    #[test]
    fn test_session() -> Fallible<()> {
        let (_dir, reviewed, output, sched) = session("\n4\n\nx\n9\n4\n")?;
        assert_eq!(reviewed, 2);
        assert!(output.contains("Q: France"));
        assert!(output.contains("A: Lima"));
        assert!(output.contains("[0 learning, 0 review, 2 new]"));
        assert!(output.contains("1 = again (1m)"));
        assert!(output.contains("Invalid input"));
        let log = sched
            .store()
            .reviews_between(Timestamp::from_secs(0), Timestamp::from_secs(i64::MAX))?;
        assert_eq!(log.len(), 2);
        assert!(log.iter().all(|entry| entry.grade == Grade::Easy));
        Ok(())
    }

    #[test]
    fn test_end_of_input_stops() -> Fallible<()> {
        let (_dir, reviewed, output, _) = session("\n")?;
        assert_eq!(reviewed, 0);
        assert!(output.contains("Grade: "));
        Ok(())
    }
}
