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

use crate::error::ErrorKind;
use crate::error::Fallible;
use crate::error::fail_with;

/// The scheduling algorithms this crate implements.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Algorithm {
    /// Review intervals account for how late a card was answered.
    LatenessAware,
    /// Plain ease-based intervals. Lateness is ignored.
    Standard,
}

impl Algorithm {
    /// Whether lateness feeds into lapse decay and the Hard bonus.
    pub fn uses_lateness(self) -> bool {
        match self {
            Algorithm::LatenessAware => true,
            Algorithm::Standard => false,
        }
    }
}

pub struct RegistryEntry {
    pub name: &'static str,
    pub description: &'static str,
    pub algorithm: Algorithm,
}

/// The table of algorithms available to a collection, built once at
/// startup and consulted when a collection is opened.
pub struct Registry {
    entries: Vec<RegistryEntry>,
}

impl Registry {
    pub fn builtin() -> Self {
        Self {
            entries: vec![
                RegistryEntry {
                    name: "lateness",
                    description: "Ease-based scheduling that rewards overdue recall.",
                    algorithm: Algorithm::LatenessAware,
                },
                RegistryEntry {
                    name: "standard",
                    description: "Ease-based scheduling without lateness adjustments.",
                    algorithm: Algorithm::Standard,
                },
            ],
        }
    }

    pub fn resolve(&self, name: &str) -> Fallible<Algorithm> {
        match self.entries.iter().find(|entry| entry.name == name) {
            Some(entry) => Ok(entry.algorithm),
            None => fail_with(
                ErrorKind::InvalidConfig,
                format!("unknown scheduling algorithm '{name}'"),
            ),
        }
    }

    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }
}
