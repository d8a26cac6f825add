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

use rusqlite::ToSql;
use rusqlite::types::FromSql;
use rusqlite::types::FromSqlError;
use rusqlite::types::FromSqlResult;
use rusqlite::types::ToSqlOutput;
use rusqlite::types::ValueRef;
use serde::Serialize;

use crate::error::ErrorKind;
use crate::error::ErrorReport;
use crate::error::fail_with;

/// The lifecycle stage of a card, independent of the queue it currently
/// sits in.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CardType {
    New,
    Learning,
    Review,
    Relearning,
}

impl CardType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardType::New => "new",
            CardType::Learning => "learning",
            CardType::Review => "review",
            CardType::Relearning => "relearning",
        }
    }
}

impl TryFrom<String> for CardType {
    type Error = ErrorReport;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "new" => Ok(CardType::New),
            "learning" => Ok(CardType::Learning),
            "review" => Ok(CardType::Review),
            "relearning" => Ok(CardType::Relearning),
            _ => fail_with(
                ErrorKind::InvalidCardState,
                format!("Invalid card type: {}", value),
            ),
        }
    }
}

impl ToSql for CardType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for CardType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let string: String = FromSql::column_result(value)?;
        CardType::try_from(string).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

/// The queue a card is drawn from.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Queue {
    /// Never answered. `due` is the card's position.
    New,
    /// Inside the learning ladder. `due` is a Unix timestamp.
    Learning,
    /// Graduated. `due` is a day index.
    Review,
    /// Inside the relearning ladder after a lapse. `due` is a Unix timestamp.
    Relearning,
    /// Suspended or buried. Never selected.
    Suspended,
}

impl Queue {
    pub fn as_str(&self) -> &'static str {
        match self {
            Queue::New => "new",
            Queue::Learning => "learning",
            Queue::Review => "review",
            Queue::Relearning => "relearning",
            Queue::Suspended => "suspended",
        }
    }

    /// Whether cards in this queue are stepping through a ladder.
    pub fn is_ladder(&self) -> bool {
        matches!(self, Queue::Learning | Queue::Relearning)
    }
}

impl TryFrom<String> for Queue {
    type Error = ErrorReport;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "new" => Ok(Queue::New),
            "learning" => Ok(Queue::Learning),
            "review" => Ok(Queue::Review),
            "relearning" => Ok(Queue::Relearning),
            "suspended" => Ok(Queue::Suspended),
            _ => fail_with(
                ErrorKind::InvalidCardState,
                format!("Invalid queue: {}", value),
            ),
        }
    }
}

impl ToSql for Queue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Queue {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let string: String = FromSql::column_result(value)?;
        Queue::try_from(string).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}
