// Copyright 2022 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use crate::anqp::AnqpElementMap;
use crate::client::types::Bssid;
use crate::util::clock::Clock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// Identity of one ANQP cache entry. APs advertising a nonzero ANQP domain id
/// share a backend, so their entries collapse onto (ssid, hessid, domain id);
/// a domain id of zero keeps entries per-BSS.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AnqpNetworkKey {
    pub ssid: String,
    pub bssid: Bssid,
    pub hessid: u64,
    pub anqp_domain_id: u16,
}

impl AnqpNetworkKey {
    pub fn build(ssid: &str, bssid: Bssid, hessid: u64, anqp_domain_id: u16) -> Self {
        if anqp_domain_id == 0 {
            Self { ssid: ssid.to_string(), bssid, hessid: 0, anqp_domain_id: 0 }
        } else {
            Self { ssid: ssid.to_string(), bssid: Bssid::ZERO, hessid, anqp_domain_id }
        }
    }
}

/// One cached, timestamped element set.
#[derive(Clone, Debug)]
pub struct AnqpData {
    elements: AnqpElementMap,
    created_at: Instant,
}

impl AnqpData {
    pub fn elements(&self) -> &AnqpElementMap {
        &self.elements
    }

    fn expired(&self, lifetime: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.created_at) >= lifetime
    }
}

/// Keyed cache of decoded ANQP element sets. Reads are plain map lookups and
/// never wait on an outstanding query; entries only appear through
/// `add_entry` and only disappear through `sweep`.
pub struct AnqpCache {
    entries: HashMap<AnqpNetworkKey, AnqpData>,
    lifetime: Duration,
    clock: Arc<dyn Clock>,
}

impl AnqpCache {
    /// `lifetime` is owned by the embedding service; this cache applies it
    /// without interpretation.
    pub fn new(lifetime: Duration, clock: Arc<dyn Clock>) -> Self {
        Self { entries: HashMap::new(), lifetime, clock }
    }

    pub fn add_entry(&mut self, key: AnqpNetworkKey, elements: AnqpElementMap) {
        let data = AnqpData { elements, created_at: self.clock.now() };
        let _ = self.entries.insert(key, data);
    }

    pub fn get_entry(&self, key: &AnqpNetworkKey) -> Option<&AnqpData> {
        self.entries.get(key)
    }

    /// Evicts entries older than the configured lifetime. A no-op on an
    /// empty or freshly swept cache.
    pub fn sweep(&mut self) {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, data| !data.expired(self.lifetime, now));
        let evicted = before - self.entries.len();
        if evicted > 0 {
            info!("swept {} expired ANQP cache entries", evicted);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anqp::{AnqpElement, DomainNameElement};
    use crate::util::testing::fakes::FakeClock;

    const TEST_SSID: &str = "test-ssid";
    const TEST_BSSID: Bssid = Bssid([0x0a, 0x22, 0x33, 0x44, 0x55, 0x66]);
    const TEST_HESSID: u64 = 0x1122_3344_5566;
    const TEST_LIFETIME: Duration = Duration::from_secs(3600);

    fn test_elements() -> AnqpElementMap {
        let mut elements = AnqpElementMap::default();
        elements.insert(AnqpElement::DomainName(DomainNameElement {
            domains: vec!["test.com".to_string()],
        }));
        elements
    }

    #[test]
    fn key_with_zero_domain_id_is_per_bss() {
        let key = AnqpNetworkKey::build(TEST_SSID, TEST_BSSID, TEST_HESSID, 0);
        assert_eq!(key.bssid, TEST_BSSID);
        assert_eq!(key.hessid, 0);

        let other_bss =
            AnqpNetworkKey::build(TEST_SSID, Bssid([1, 2, 3, 4, 5, 6]), TEST_HESSID, 0);
        assert_ne!(key, other_bss);
    }

    #[test]
    fn keys_with_same_domain_id_collapse_across_bssids() {
        let key = AnqpNetworkKey::build(TEST_SSID, TEST_BSSID, TEST_HESSID, 5);
        let other_bss = AnqpNetworkKey::build(TEST_SSID, Bssid([1, 2, 3, 4, 5, 6]), TEST_HESSID, 5);
        assert_eq!(key, other_bss);
    }

    #[test]
    fn add_and_get_entry() {
        let clock = Arc::new(FakeClock::new());
        let mut cache = AnqpCache::new(TEST_LIFETIME, clock);
        let key = AnqpNetworkKey::build(TEST_SSID, TEST_BSSID, TEST_HESSID, 1);

        assert!(cache.get_entry(&key).is_none());
        cache.add_entry(key.clone(), test_elements());
        let data = cache.get_entry(&key).expect("entry should be cached");
        assert_eq!(data.elements(), &test_elements());
    }

    #[test]
    fn sweep_evicts_only_expired_entries() {
        let clock = Arc::new(FakeClock::new());
        let mut cache = AnqpCache::new(TEST_LIFETIME, Arc::clone(&clock) as Arc<dyn Clock>);
        let old_key = AnqpNetworkKey::build(TEST_SSID, TEST_BSSID, TEST_HESSID, 1);
        cache.add_entry(old_key.clone(), test_elements());

        clock.advance(TEST_LIFETIME - Duration::from_secs(1));
        let fresh_key = AnqpNetworkKey::build("other-ssid", TEST_BSSID, TEST_HESSID, 2);
        cache.add_entry(fresh_key.clone(), test_elements());

        clock.advance(Duration::from_secs(1));
        cache.sweep();

        assert!(cache.get_entry(&old_key).is_none());
        assert!(cache.get_entry(&fresh_key).is_some());
    }

    #[test]
    fn sweep_is_idempotent() {
        let clock = Arc::new(FakeClock::new());
        let mut cache = AnqpCache::new(TEST_LIFETIME, Arc::clone(&clock) as Arc<dyn Clock>);

        // Sweeping an empty cache has no observable effect.
        cache.sweep();
        assert!(cache.is_empty());

        let key = AnqpNetworkKey::build(TEST_SSID, TEST_BSSID, TEST_HESSID, 1);
        cache.add_entry(key, test_elements());
        clock.advance(TEST_LIFETIME);
        cache.sweep();
        assert!(cache.is_empty());
        cache.sweep();
        assert!(cache.is_empty());
    }
}
