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
use crate::types::card_type::CardType;
use crate::types::grade::Grade;
use crate::types::id::CardId;
use crate::types::id::DeckId;
use crate::types::timestamp::Timestamp;

/// The stage a card was in when it was answered.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewKind {
    /// The first answer of a new card.
    New,
    Learn,
    Review,
    Relearn,
}

impl ReviewKind {
    pub fn of(card_type: CardType) -> Self {
        match card_type {
            CardType::New => ReviewKind::New,
            CardType::Learning => ReviewKind::Learn,
            CardType::Review => ReviewKind::Review,
            CardType::Relearning => ReviewKind::Relearn,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            ReviewKind::New => "new",
            ReviewKind::Learn => "learn",
            ReviewKind::Review => "review",
            ReviewKind::Relearn => "relearn",
        }
    }
}

impl TryFrom<String> for ReviewKind {
    type Error = ErrorReport;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "new" => Ok(ReviewKind::New),
            "learn" => Ok(ReviewKind::Learn),
            "review" => Ok(ReviewKind::Review),
            "relearn" => Ok(ReviewKind::Relearn),
            _ => fail_with(ErrorKind::Storage, format!("Invalid review kind: {}", value)),
        }
    }
}

impl ToSql for ReviewKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ReviewKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let string: String = FromSql::column_result(value)?;
        ReviewKind::try_from(string).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

/// One line of the review log.
#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct ReviewEntry {
    pub card_id: CardId,
    pub deck_id: DeckId,
    pub reviewed_at: Timestamp,
    pub grade: Grade,
    /// The interval the answer produced.
    pub interval: i64,
    /// The interval before the answer.
    pub last_interval: i64,
    pub ease: u32,
    pub time_taken_ms: u64,
    pub kind: ReviewKind,
}

/// How many cards of a deck were studied on one day.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug, Serialize)]
pub struct DailyCounts {
    /// New cards seen for the first time.
    pub new: u32,
    /// Review cards answered.
    pub review: u32,
}
