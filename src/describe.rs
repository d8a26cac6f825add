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

use crate::clock::DAY_SECS;

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const MONTH_DAYS: f64 = 30.0;
const YEAR_DAYS: f64 = 365.0;

/// Format a delay the way it is shown on an answer button, e.g. `10m`,
/// `4d`, `1.5mo`.
pub fn describe_delay(secs: i64) -> String {
    let secs = secs.max(0);
    if secs == 0 {
        "now".to_string()
    } else if secs < MINUTE {
        format!("{secs}s")
    } else if secs < HOUR {
        format!("{}m", secs / MINUTE)
    } else if secs < DAY_SECS {
        format!("{}h", secs / HOUR)
    } else {
        let days = secs / DAY_SECS;
        let days_f = days as f64;
        if days_f < MONTH_DAYS {
            format!("{days}d")
        } else if days_f < YEAR_DAYS {
            trim(days_f / MONTH_DAYS, "mo")
        } else {
            trim(days_f / YEAR_DAYS, "y")
        }
    }
}

/// One decimal place, dropping a trailing `.0`.
fn trim(value: f64, unit: &str) -> String {
    let rounded = (value * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{}{unit}", rounded as i64)
    } else {
        format!("{rounded:.1}{unit}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_delay() {
        assert_eq!(describe_delay(0), "now");
        assert_eq!(describe_delay(-5), "now");
        assert_eq!(describe_delay(2), "2s");
        assert_eq!(describe_delay(600), "10m");
        assert_eq!(describe_delay(3 * HOUR), "3h");
        assert_eq!(describe_delay(DAY_SECS), "1d");
        assert_eq!(describe_delay(4 * DAY_SECS), "4d");
        assert_eq!(describe_delay(45 * DAY_SECS), "1.5mo");
        assert_eq!(describe_delay(60 * DAY_SECS), "2mo");
        assert_eq!(describe_delay(250 * DAY_SECS), "8.3mo");
        assert_eq!(describe_delay(730 * DAY_SECS), "2y");
    }
}
