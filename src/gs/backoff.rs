// gstore: Rust client for signed REST object storage
// Copyright 2025 The gstore Authors
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

//! Exponential backoff state shared by all calls on one client.

use std::time::Duration;

/// Exponent value meaning "no backoff".
pub const BACKOFF_OFF: i32 = -1;

/// Largest exponent, i.e. a 32 second sleep.
pub const MAX_BACKOFF_EXPONENT: i32 = 5;

/// Backoff exponent `N`; while `N >= 0` every attempt is preceded by a
/// `2^N` second sleep.
///
/// Failures push the exponent up towards [`MAX_BACKOFF_EXPONENT`], successes
/// and redirects pull it back down towards [`BACKOFF_OFF`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Backoff {
    exponent: i32,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            exponent: BACKOFF_OFF,
        }
    }
}

impl Backoff {
    /// Returns backoff state starting at given exponent, clamped to the
    /// valid range.
    pub fn new(exponent: i32) -> Self {
        Self {
            exponent: exponent.clamp(BACKOFF_OFF, MAX_BACKOFF_EXPONENT),
        }
    }

    pub fn exponent(&self) -> i32 {
        self.exponent
    }

    /// Sleep required before the next attempt, if any.
    pub fn delay(&self) -> Option<Duration> {
        if self.exponent < 0 {
            return None;
        }
        Some(Duration::from_secs(1u64 << self.exponent))
    }

    pub fn increment(&mut self) {
        if self.exponent < MAX_BACKOFF_EXPONENT {
            self.exponent += 1;
        }
    }

    pub fn decrement(&mut self) {
        if self.exponent > BACKOFF_OFF {
            self.exponent -= 1;
        }
    }
}
