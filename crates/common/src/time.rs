// Copyright 2025 Crrow
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::time::{SystemTime, UNIX_EPOCH};

const NANOS_PER_MILLI: i64 = 1_000_000;

/// Current wall-clock time in nanoseconds since the Unix epoch.
///
/// Precision is milliseconds; the sub-millisecond digits are always zero.
pub fn now_nanos() -> i64 {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64;
    millis * NANOS_PER_MILLI
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_nanos_has_millisecond_precision() {
        let now = now_nanos();
        assert!(now > 0);
        assert_eq!(now % NANOS_PER_MILLI, 0);
    }
}
