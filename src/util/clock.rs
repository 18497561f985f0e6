// Copyright 2023 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Time source injected into the cache and request manager so tests can
/// control elapsed time instead of sleeping through it.
pub trait Clock: Send + Sync {
    /// Monotonic reading used for cache entry ages and request hold-offs.
    fn now(&self) -> Instant;
    /// Wall-clock milliseconds since the UNIX epoch, used for subscription
    /// expiration checks.
    fn utc_millis(&self) -> i64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn utc_millis(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or_default()
    }
}
