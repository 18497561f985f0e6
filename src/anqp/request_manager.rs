// Copyright 2023 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use crate::anqp::cache::AnqpNetworkKey;
use crate::anqp::AnqpElementType;
use crate::client::types::{Bssid, HsRelease};
use crate::util::clock::Clock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// Base hold-off applied after issuing a query to a BSSID; doubles per
/// consecutive unanswered query up to `MAX_HOLDOFF_COUNT` doublings.
const BASE_HOLDOFF: Duration = Duration::from_secs(10);
const MAX_HOLDOFF_COUNT: u32 = 6;

const R1_BASE_SET: &[AnqpElementType] = &[
    AnqpElementType::VenueName,
    AnqpElementType::IpAddrAvailability,
    AnqpElementType::NaiRealm,
    AnqpElementType::ThreeGppNetwork,
    AnqpElementType::DomainName,
];

const R2_SET: &[AnqpElementType] = &[
    AnqpElementType::HsFriendlyName,
    AnqpElementType::HsWanMetrics,
    AnqpElementType::HsConnectionCapability,
    AnqpElementType::HsOsuProviders,
];

/// Lower-layer hook that transmits a query. The radio behind it completes
/// asynchronously; the completion is reported through `on_request_completed`.
pub trait AnqpRequester: Send + Sync {
    /// Returns false when the query could not even be issued.
    fn request_anqp_elements(&self, bssid: Bssid, elements: &[AnqpElementType]) -> bool;
}

struct HoldOff {
    count: u32,
    until: Instant,
}

/// Tracks in-flight ANQP queries so each cache entry has at most one
/// outstanding request, and rate-limits unresponsive BSSIDs.
pub struct AnqpRequestManager {
    requester: Arc<dyn AnqpRequester>,
    clock: Arc<dyn Clock>,
    pending: HashMap<Bssid, AnqpNetworkKey>,
    holdoff: HashMap<Bssid, HoldOff>,
}

impl AnqpRequestManager {
    pub fn new(requester: Arc<dyn AnqpRequester>, clock: Arc<dyn Clock>) -> Self {
        Self { requester, clock, pending: HashMap::new(), holdoff: HashMap::new() }
    }

    /// Issues a query for the element set appropriate to the AP's release,
    /// unless one is already in flight for the same cache entry or the BSSID
    /// is holding off after going unanswered.
    pub fn request_anqp_elements(
        &mut self,
        bssid: Bssid,
        key: AnqpNetworkKey,
        rc_ie_present: bool,
        hs_release: Option<HsRelease>,
    ) -> bool {
        if self.pending.values().any(|pending_key| *pending_key == key) {
            return false;
        }
        if !self.can_send_request_now(bssid) {
            return false;
        }

        let mut elements: Vec<AnqpElementType> = R1_BASE_SET.to_vec();
        if rc_ie_present {
            elements.push(AnqpElementType::RoamingConsortium);
        }
        if hs_release.is_some_and(|release| release >= HsRelease::R2) {
            elements.extend_from_slice(R2_SET);
        }

        if !self.requester.request_anqp_elements(bssid, &elements) {
            info!("failed to issue ANQP query to {}", bssid);
            return false;
        }
        let _ = self.pending.insert(bssid, key);
        self.update_hold_off(bssid);
        true
    }

    /// Reports a completed query. Returns the key of the most recent
    /// outstanding request to this BSSID, or None for unsolicited
    /// completions, which must never populate the cache.
    pub fn on_request_completed(&mut self, bssid: Bssid, success: bool) -> Option<AnqpNetworkKey> {
        let key = self.pending.remove(&bssid)?;
        if success {
            let _ = self.holdoff.remove(&bssid);
        }
        Some(key)
    }

    fn can_send_request_now(&self, bssid: Bssid) -> bool {
        match self.holdoff.get(&bssid) {
            Some(holdoff) => self.clock.now() >= holdoff.until,
            None => true,
        }
    }

    fn update_hold_off(&mut self, bssid: Bssid) {
        let now = self.clock.now();
        let holdoff = self.holdoff.entry(bssid).or_insert(HoldOff { count: 0, until: now });
        holdoff.until = now + BASE_HOLDOFF * (1u32 << holdoff.count.min(MAX_HOLDOFF_COUNT));
        if holdoff.count < MAX_HOLDOFF_COUNT {
            holdoff.count += 1;
        }
    }
}
