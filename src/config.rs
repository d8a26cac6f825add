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

//! Deck presets and collection-wide scheduler settings.
//!
//! Both are read from `config.toml` in the collection directory:
//!
//! ```toml
//! [scheduler]
//! algorithm = "lateness"
//! rollover_hour = 4
//!
//! [presets.default.new]
//! delays = [60, 600]
//! ```
//!
//! Every field has a default, so an empty or missing file is valid.

use std::collections::BTreeMap;
use std::fs::read_to_string;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

use crate::error::ErrorKind;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail_with;

/// The name of the preset used by decks that don't name one.
pub const DEFAULT_PRESET: &str = "default";

/// Longest ladder that fits in the packed step counter.
const MAX_STEPS: usize = 999;

/// Per-deck scheduling policy.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeckConfig {
    pub new: NewConfig,
    pub lapse: LapseConfig,
    pub review: ReviewConfig,
    /// Show learning cards carried over from a previous day before reviews.
    pub day_learn_first: bool,
    /// Answers slower than this are logged as taking this long.
    pub max_answer_secs: u32,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NewConfig {
    /// Learning ladder, in seconds.
    pub delays: Vec<u32>,
    /// Interval in days when graduating with Good.
    pub good_interval: u32,
    /// Interval in days when graduating with Easy.
    pub easy_interval: u32,
    pub initial_ease: u32,
    pub per_day: u32,
    pub order: NewOrder,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NewOrder {
    /// In the order cards were added.
    Added,
    /// Shuffled, with a stable order for a given day.
    Random,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LapseConfig {
    /// Relearning ladder, in seconds. Empty means lapsed cards go straight
    /// back to review with a reduced interval.
    pub delays: Vec<u32>,
    /// Interval multiplier for Again while relearning.
    pub again_factor: f64,
    /// Interval multiplier for Hard while relearning.
    pub hard_factor: f64,
    /// Lower bound for any decayed interval, in days.
    pub min_interval: u32,
    pub step_policy: LapseStepPolicy,
    /// Cards overdue by at least their own interval lapse without penalty.
    pub forgive_overdue: bool,
}

/// Where Again sends a card that is already inside a ladder.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LapseStepPolicy {
    /// Back to the first step.
    Reset,
    /// Back by one step.
    StepBack,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReviewConfig {
    pub per_day: u32,
    /// The floor for the ease factor.
    pub minimum_ease: u32,
    pub easy_bonus: f64,
    pub hard_factor: f64,
    /// Extra days of interval granted to Hard per day of lateness, before
    /// `hard_factor` is applied.
    pub hard_lateness: f64,
    /// Ease change on Hard. May be negative, zero, or positive.
    pub hard_ease_delta: i32,
    pub hard_policy: HardPolicy,
    pub interval_multiplier: f64,
    pub max_interval: u32,
    pub fuzz: bool,
}

/// What Hard means for a review card.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HardPolicy {
    /// A weak pass: the interval still grows.
    Pass,
    /// A mild failure: the card relearns with a lightly decayed interval.
    Relearn,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            new: NewConfig::default(),
            lapse: LapseConfig::default(),
            review: ReviewConfig::default(),
            day_learn_first: false,
            max_answer_secs: 60,
        }
    }
}

impl Default for NewConfig {
    fn default() -> Self {
        Self {
            delays: vec![60, 600],
            good_interval: 1,
            easy_interval: 4,
            initial_ease: 2500,
            per_day: 20,
            order: NewOrder::Added,
        }
    }
}

impl Default for LapseConfig {
    fn default() -> Self {
        Self {
            delays: vec![600],
            again_factor: 0.5,
            hard_factor: 0.8,
            min_interval: 1,
            step_policy: LapseStepPolicy::Reset,
            forgive_overdue: false,
        }
    }
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            per_day: 200,
            minimum_ease: 1300,
            easy_bonus: 1.3,
            hard_factor: 1.2,
            hard_lateness: 0.5,
            hard_ease_delta: 0,
            hard_policy: HardPolicy::Pass,
            interval_multiplier: 1.0,
            max_interval: 36500,
            fuzz: true,
        }
    }
}

impl DeckConfig {
    pub fn validate(&self) -> Fallible<()> {
        let new = &self.new;
        let lapse = &self.lapse;
        let review = &self.review;
        if new.delays.len() > MAX_STEPS || lapse.delays.len() > MAX_STEPS {
            return invalid(format!("ladders are limited to {MAX_STEPS} steps"));
        }
        if new.good_interval < 1 {
            return invalid("new.good_interval must be at least one day");
        }
        if new.easy_interval < new.good_interval {
            return invalid("new.easy_interval must not be shorter than new.good_interval");
        }
        if new.initial_ease < review.minimum_ease {
            return invalid("new.initial_ease must not be below review.minimum_ease");
        }
        if review.minimum_ease == 0 {
            return invalid("review.minimum_ease must be positive");
        }
        if !(0.0..=1.0).contains(&lapse.again_factor) {
            return invalid("lapse.again_factor must be between 0 and 1");
        }
        if !(0.0..=1.0).contains(&lapse.hard_factor) {
            return invalid("lapse.hard_factor must be between 0 and 1");
        }
        if lapse.min_interval < 1 {
            return invalid("lapse.min_interval must be at least one day");
        }
        if review.easy_bonus < 1.0 {
            return invalid("review.easy_bonus must be at least 1");
        }
        if review.hard_factor <= 0.0 {
            return invalid("review.hard_factor must be positive");
        }
        if review.hard_lateness < 0.0 {
            return invalid("review.hard_lateness must not be negative");
        }
        if review.interval_multiplier <= 0.0 {
            return invalid("review.interval_multiplier must be positive");
        }
        if review.max_interval < 1 {
            return invalid("review.max_interval must be at least one day");
        }
        Ok(())
    }
}

/// How new cards are mixed with reviews.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NewSpread {
    /// Spread new cards evenly among reviews.
    Distribute,
    /// Show new cards after reviews.
    Last,
    /// Show new cards before reviews.
    First,
}

/// Collection-wide settings.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchedulerSettings {
    /// Name of the scheduling algorithm, looked up in the registry.
    pub algorithm: String,
    /// Hour of the local day at which "today" begins.
    pub rollover_hour: u32,
    /// How far ahead learning cards may be shown when nothing else is due.
    pub learn_ahead_mins: u32,
    pub new_spread: NewSpread,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            algorithm: "lateness".to_string(),
            rollover_hour: 4,
            learn_ahead_mins: 20,
            new_spread: NewSpread::Distribute,
        }
    }
}

impl SchedulerSettings {
    pub fn learn_ahead_secs(&self) -> i64 {
        self.learn_ahead_mins as i64 * 60
    }
}

/// The contents of `config.toml`.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub scheduler: SchedulerSettings,
    pub presets: BTreeMap<String, DeckConfig>,
}

impl Config {
    pub fn parse(content: &str) -> Fallible<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the configuration file, falling back to defaults if it doesn't
    /// exist.
    pub fn load(path: &Path) -> Fallible<Self> {
        if !path.exists() {
            log::debug!("No config file at {}, using defaults.", path.display());
            return Ok(Self::default());
        }
        let content = read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn validate(&self) -> Fallible<()> {
        if self.scheduler.rollover_hour > 23 {
            return invalid("scheduler.rollover_hour must be between 0 and 23");
        }
        for (name, preset) in &self.presets {
            preset.validate().map_err(|e| {
                ErrorReport::with_kind(ErrorKind::InvalidConfig, format!("preset '{name}': {e}"))
            })?;
        }
        Ok(())
    }

    /// Look up a preset by name. The default preset always exists.
    pub fn preset(&self, name: &str) -> Fallible<DeckConfig> {
        match self.presets.get(name) {
            Some(preset) => Ok(preset.clone()),
            None if name == DEFAULT_PRESET => Ok(DeckConfig::default()),
            None => fail_with(ErrorKind::NotFound, format!("no preset named '{name}'")),
        }
    }
}

fn invalid<T>(message: impl Into<String>) -> Fallible<T> {
    fail_with(ErrorKind::InvalidConfig, message)
}
