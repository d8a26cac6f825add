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

use std::cell::Cell;
use std::rc::Rc;

use chrono::Local;

use crate::types::timestamp::Timestamp;

pub const DAY_SECS: i64 = 86_400;

/// The scheduler's only source of time.
pub trait Clock {
    fn now(&self) -> Timestamp;

    /// Local time minus UTC, in seconds.
    fn utc_offset_secs(&self) -> i64 {
        0
    }
}

/// Wall-clock time in the local timezone.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }

    fn utc_offset_secs(&self) -> i64 {
        Local::now().offset().local_minus_utc() as i64
    }
}

/// A manually driven clock in UTC. Clones share the same time.
#[derive(Clone)]
pub struct FixedClock {
    secs: Rc<Cell<i64>>,
}

impl FixedClock {
    pub fn new(now: Timestamp) -> Self {
        Self {
            secs: Rc::new(Cell::new(now.as_secs())),
        }
    }

    pub fn set(&self, now: Timestamp) {
        self.secs.set(now.as_secs());
    }

    pub fn advance(&self, secs: i64) {
        self.secs.set(self.secs.get() + secs);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_secs(self.secs.get())
    }
}

/// The current scheduling day: its index and the instant it began.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Today {
    pub day: i64,
    pub start: Timestamp,
}

impl Today {
    /// The day containing `clock.now()`, where days roll over at
    /// `rollover_hour` local time.
    pub fn at(clock: &dyn Clock, rollover_hour: u32) -> Self {
        let offset = clock.utc_offset_secs() - rollover_hour as i64 * 3600;
        let day = (clock.now().as_secs() + offset).div_euclid(DAY_SECS);
        let start = Timestamp::from_secs(day * DAY_SECS - offset);
        Self { day, start }
    }

    /// The instant the next day begins.
    pub fn end(&self) -> Timestamp {
        self.start.plus_secs(DAY_SECS)
    }

    /// The instant the day `days` after this one begins.
    pub fn start_of(&self, days: i64) -> Timestamp {
        self.start.plus_secs(days * DAY_SECS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rollover() {
        // 1970-01-02T03:00:00Z is still day zero with a 4am rollover.
        let clock = FixedClock::new(Timestamp::from_secs(DAY_SECS + 3 * 3600));
        let today = Today::at(&clock, 4);
        assert_eq!(today.day, 0);
        assert_eq!(today.start, Timestamp::from_secs(4 * 3600));
        clock.advance(3600);
        let today = Today::at(&clock, 4);
        assert_eq!(today.day, 1);
        assert_eq!(today.start, Timestamp::from_secs(DAY_SECS + 4 * 3600));
        assert_eq!(today.end(), Timestamp::from_secs(2 * DAY_SECS + 4 * 3600));
    }

    #[test]
    fn test_clones_share_time() {
        let clock = FixedClock::new(Timestamp::from_secs(0));
        let handle = clock.clone();
        handle.advance(90);
        assert_eq!(clock.now(), Timestamp::from_secs(90));
    }

    #[test]
    fn test_start_of() {
        let clock = FixedClock::new(Timestamp::from_secs(10 * DAY_SECS));
        let today = Today::at(&clock, 0);
        assert_eq!(today.day, 10);
        assert_eq!(today.start_of(2), Timestamp::from_secs(12 * DAY_SECS));
    }
}
