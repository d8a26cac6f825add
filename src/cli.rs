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

use clap::Parser;

use crate::cmd::add::add_card;
use crate::cmd::add::flatten_deck;
use crate::cmd::add::set_preset;
use crate::cmd::add::suspend_card;
use crate::cmd::drill::drill;
use crate::cmd::preview::preview_card;
use crate::cmd::stats::print_due;
use crate::cmd::stats::print_stats;
use crate::error::Fallible;
use crate::registry::Registry;

#[derive(Parser)]
#[command(version, about, long_about = None)]
enum Command {
    /// Add a card to a deck, creating the deck if it doesn't exist.
    Add {
        /// Deck name, e.g. `Languages::French`.
        deck: String,
        front: String,
        back: String,
        /// Optional path to the collection directory.
        #[arg(long)]
        directory: Option<String>,
    },
    /// Drill the cards due today.
    Drill {
        /// Optional path to the collection directory.
        directory: Option<String>,
        /// Only drill this deck and its subdecks.
        #[arg(long)]
        deck: Option<String>,
    },
    /// Show how long each answer would postpone a card.
    Preview {
        card: i64,
        /// Optional path to the collection directory.
        #[arg(long)]
        directory: Option<String>,
    },
    /// Show how many cards are left to study today.
    Due {
        /// Optional path to the collection directory.
        directory: Option<String>,
        /// Only count this deck and its subdecks.
        #[arg(long)]
        deck: Option<String>,
    },
    /// Print collection statistics as JSON.
    Stats {
        /// Optional path to the collection directory.
        directory: Option<String>,
    },
    /// Suspend a card, or put it back with `--undo`.
    Suspend {
        card: i64,
        #[arg(long)]
        undo: bool,
        /// Optional path to the collection directory.
        #[arg(long)]
        directory: Option<String>,
    },
    /// Set the configuration preset a deck uses.
    Preset {
        deck: String,
        preset: String,
        /// Optional path to the collection directory.
        #[arg(long)]
        directory: Option<String>,
    },
    /// Move the cards of a deck's subdecks into the deck itself.
    Flatten {
        deck: String,
        /// Optional path to the collection directory.
        #[arg(long)]
        directory: Option<String>,
    },
    /// List the available scheduling algorithms.
    Algorithms,
}

pub fn entrypoint() -> Fallible<()> {
    let cli: Command = Command::parse();
    let registry = Registry::builtin();
    match cli {
        Command::Add {
            deck,
            front,
            back,
            directory,
        } => add_card(directory, &deck, &front, &back),
        Command::Drill { directory, deck } => drill(directory, deck, &registry),
        Command::Preview { card, directory } => preview_card(directory, card, &registry),
        Command::Due { directory, deck } => print_due(directory, deck, &registry),
        Command::Stats { directory } => print_stats(directory, &registry),
        Command::Suspend {
            card,
            undo,
            directory,
        } => suspend_card(directory, card, !undo),
        Command::Preset {
            deck,
            preset,
            directory,
        } => set_preset(directory, &deck, &preset),
        Command::Flatten { deck, directory } => flatten_deck(directory, &deck),
        Command::Algorithms => {
            for entry in registry.entries() {
                println!("{}: {}", entry.name, entry.description);
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_command_definition() {
        Command::command().debug_assert();
    }

    #[test]
    fn test_parse_drill() {
        let cli = Command::try_parse_from(["easecards", "drill", "notes", "--deck", "A::B"]);
        match cli {
            Ok(Command::Drill { directory, deck }) => {
                assert_eq!(directory.as_deref(), Some("notes"));
                assert_eq!(deck.as_deref(), Some("A::B"));
            }
            _ => panic!("expected a drill command"),
        }
    }
}
