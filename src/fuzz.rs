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

//! Interval jitter, so cards reviewed together don't stay clumped together.

/// The inclusive range a review interval of `target` days may be fuzzed
/// into. Symmetric around the target, never below one day.
pub fn fuzz_range(target: i64) -> (i64, i64) {
    if target < 3 {
        let target = target.max(1);
        return (target, target);
    }
    let ivl = target as f64;
    let fuzz = if target < 7 {
        (ivl * 0.25) as i64
    } else if target < 30 {
        ((ivl * 0.15) as i64).max(2)
    } else {
        ((ivl * 0.05) as i64).max(4)
    };
    let fuzz = fuzz.max(1);
    (target - fuzz, target + fuzz)
}

/// Pick an interval from `fuzz_range(target)` using `draw`, a value in
/// `[0, 1)`. A draw of one half picks the target itself.
pub fn fuzz(target: i64, draw: f64) -> i64 {
    let (min, max) = fuzz_range(target);
    let width = (max - min + 1) as f64;
    let offset = (draw.clamp(0.0, 1.0) * width).floor() as i64;
    (min + offset).min(max)
}
