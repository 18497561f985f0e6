// Copyright 2022 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Fake collaborators for unit tests. All of them record the calls they see
//! so tests can assert on side effects.

use crate::anqp::matcher::ImsiParameter;
use crate::anqp::request_manager::AnqpRequester;
use crate::anqp::AnqpElementType;
use crate::carrier::WifiCarrierInfo;
use crate::client::types::{
    Bssid, HsRelease, NetworkDetail, NetworkId, ScanDetail, ScanIeDecoder, ScanResult,
    WifiConfiguration,
};
use crate::config_management::passpoint_config::{Certificate, PrivateKey};
use crate::keystore::KeyStore;
use crate::persist::{
    ConnectionControl, NetworkConfigStore, PermissionChecker, ProviderStorage, ProviderStoreData,
};
use crate::util::clock::Clock;
use anyhow::format_err;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

pub struct FakeClock {
    now: Mutex<Instant>,
    utc_millis: Mutex<i64>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self { now: Mutex::new(Instant::now()), utc_millis: Mutex::new(0) }
    }

    pub fn advance(&self, duration: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += duration;
        *self.utc_millis.lock().unwrap() += duration.as_millis() as i64;
    }

    pub fn set_utc_millis(&self, millis: i64) {
        *self.utc_millis.lock().unwrap() = millis;
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap()
    }

    fn utc_millis(&self) -> i64 {
        *self.utc_millis.lock().unwrap()
    }
}

#[derive(Clone, Debug, PartialEq)]
enum KeyStoreEntry {
    CaCert(Certificate),
    KeyAndCerts(PrivateKey, Vec<Certificate>),
}

pub struct FakeKeyStore {
    entries: Mutex<HashMap<String, KeyStoreEntry>>,
    failing_aliases: Mutex<HashSet<String>>,
}

impl FakeKeyStore {
    pub fn new() -> Self {
        Self { entries: Mutex::new(HashMap::new()), failing_aliases: Mutex::new(HashSet::new()) }
    }

    /// Makes every install under this alias fail.
    pub fn fail_on_alias(&self, alias: &str) {
        let _ = self.failing_aliases.lock().unwrap().insert(alias.to_string());
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.entries.lock().unwrap().contains_key(alias)
    }

    pub fn aliases(&self) -> Vec<String> {
        self.entries.lock().unwrap().keys().cloned().collect()
    }
}

impl KeyStore for FakeKeyStore {
    fn put_ca_cert(&self, alias: &str, cert: &Certificate) -> bool {
        if self.failing_aliases.lock().unwrap().contains(alias) {
            return false;
        }
        let _ = self
            .entries
            .lock()
            .unwrap()
            .insert(alias.to_string(), KeyStoreEntry::CaCert(cert.clone()));
        true
    }

    fn put_user_priv_key_and_certs(
        &self,
        alias: &str,
        key: &PrivateKey,
        certs: &[Certificate],
    ) -> bool {
        if self.failing_aliases.lock().unwrap().contains(alias) {
            return false;
        }
        let _ = self.entries.lock().unwrap().insert(
            alias.to_string(),
            KeyStoreEntry::KeyAndCerts(key.clone(), certs.to_vec()),
        );
        true
    }

    fn remove_entry(&self, alias: &str) {
        let _ = self.entries.lock().unwrap().remove(alias);
    }
}

pub struct FakeCarrierInfo {
    sims: Mutex<Vec<(String, i32)>>,
}

impl FakeCarrierInfo {
    pub fn new() -> Self {
        Self { sims: Mutex::new(Vec::new()) }
    }

    pub fn install_sim(&self, imsi: &str, carrier_id: i32) {
        self.sims.lock().unwrap().push((imsi.to_string(), carrier_id));
    }

    pub fn remove_all_sims(&self) {
        self.sims.lock().unwrap().clear();
    }
}

impl WifiCarrierInfo for FakeCarrierInfo {
    fn get_matching_imsi_carrier_id(&self, imsi: &str) -> Option<(String, i32)> {
        let pattern = ImsiParameter::parse(imsi)?;
        self.sims
            .lock()
            .unwrap()
            .iter()
            .find(|(sim_imsi, _)| pattern.matches_imsi(sim_imsi))
            .cloned()
    }

    fn get_matching_imsi(&self, carrier_id: i32) -> Option<String> {
        self.sims
            .lock()
            .unwrap()
            .iter()
            .find(|(_, sim_carrier_id)| *sim_carrier_id == carrier_id)
            .map(|(imsi, _)| imsi.clone())
    }
}

pub struct FakeConfigStore {
    networks: Mutex<HashMap<String, WifiConfiguration>>,
    next_id: Mutex<u64>,
    candidate_updates: Mutex<Vec<(NetworkId, Bssid)>>,
    save_count: Mutex<usize>,
}

impl FakeConfigStore {
    pub fn new() -> Self {
        Self {
            networks: Mutex::new(HashMap::new()),
            next_id: Mutex::new(100),
            candidate_updates: Mutex::new(Vec::new()),
            save_count: Mutex::new(0),
        }
    }

    pub fn candidate_updates(&self) -> Vec<(NetworkId, Bssid)> {
        self.candidate_updates.lock().unwrap().clone()
    }

    pub fn network_count(&self) -> usize {
        self.networks.lock().unwrap().len()
    }

    /// Flips the stored network's enablement flags, as the user disabling a
    /// network would.
    pub fn set_network_flags(&self, unique_id: &str, autojoin: bool, selection_enabled: bool) {
        if let Some(config) = self.networks.lock().unwrap().get_mut(unique_id) {
            config.autojoin_allowed = autojoin;
            config.network_selection_enabled = selection_enabled;
        }
    }
}

impl NetworkConfigStore for FakeConfigStore {
    fn add_or_update_network(
        &self,
        config: &WifiConfiguration,
        _uid: u32,
        _package_name: &str,
    ) -> Option<NetworkId> {
        let mut networks = self.networks.lock().unwrap();
        let network_id = match config.network_id {
            Some(id) => id,
            None => match networks.get(&config.passpoint_unique_id).and_then(|c| c.network_id) {
                Some(id) => id,
                None => {
                    let mut next_id = self.next_id.lock().unwrap();
                    let id = NetworkId(*next_id);
                    *next_id += 1;
                    id
                }
            },
        };
        let mut stored = config.clone();
        stored.network_id = Some(network_id);
        let _ = networks.insert(config.passpoint_unique_id.clone(), stored);
        Some(network_id)
    }

    fn remove_network(&self, unique_id: &str) -> bool {
        self.networks.lock().unwrap().remove(unique_id).is_some()
    }

    fn get_configured_network(&self, unique_id: &str) -> Option<WifiConfiguration> {
        self.networks.lock().unwrap().get(unique_id).cloned()
    }

    fn save_to_store(&self) -> bool {
        *self.save_count.lock().unwrap() += 1;
        true
    }

    fn enable_network(&self, _network_id: NetworkId) -> bool {
        true
    }

    fn set_network_candidate_scan_result(&self, network_id: NetworkId, scan: &ScanResult) -> bool {
        self.candidate_updates.lock().unwrap().push((network_id, scan.bssid));
        true
    }

    fn update_scan_detail_for_network(&self, network_id: NetworkId, scan_detail: &ScanDetail) {
        self.candidate_updates
            .lock()
            .unwrap()
            .push((network_id, scan_detail.scan_result.bssid));
    }

    fn allow_autojoin(&self, network_id: NetworkId, allowed: bool) {
        let mut networks = self.networks.lock().unwrap();
        if let Some(config) = networks.values_mut().find(|c| c.network_id == Some(network_id)) {
            config.autojoin_allowed = allowed;
        }
    }
}

pub struct FakeConnectionControl {
    disconnected: Mutex<Vec<String>>,
}

impl FakeConnectionControl {
    pub fn new() -> Self {
        Self { disconnected: Mutex::new(Vec::new()) }
    }

    pub fn disconnected(&self) -> Vec<String> {
        self.disconnected.lock().unwrap().clone()
    }
}

impl ConnectionControl for FakeConnectionControl {
    fn disconnect_network(&self, unique_id: &str) {
        self.disconnected.lock().unwrap().push(unique_id.to_string());
    }
}

pub struct FakePermissionChecker {
    foreign_uids: Mutex<HashSet<u32>>,
}

impl FakePermissionChecker {
    pub fn new() -> Self {
        Self { foreign_uids: Mutex::new(HashSet::new()) }
    }

    /// Marks a UID as belonging to a background user.
    pub fn mark_foreign(&self, uid: u32) {
        let _ = self.foreign_uids.lock().unwrap().insert(uid);
    }
}

impl PermissionChecker for FakePermissionChecker {
    fn uid_belongs_to_current_user(&self, uid: u32) -> bool {
        !self.foreign_uids.lock().unwrap().contains(&uid)
    }
}

/// Shareable in-memory provider store. `share()` hands out another handle to
/// the same backing data, standing in for a restart over one file.
pub struct FakeProviderStorage {
    data: Arc<Mutex<Option<ProviderStoreData>>>,
}

impl FakeProviderStorage {
    pub fn new() -> Self {
        Self { data: Arc::new(Mutex::new(None)) }
    }

    pub fn share(&self) -> Self {
        Self { data: Arc::clone(&self.data) }
    }

    pub fn data(&self) -> ProviderStoreData {
        self.data.lock().unwrap().clone().unwrap_or_default()
    }
}

impl ProviderStorage for FakeProviderStorage {
    fn load(&mut self) -> Result<ProviderStoreData, anyhow::Error> {
        self.data
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| format_err!("no provider data has been written"))
    }

    fn write(&mut self, data: &ProviderStoreData) -> Result<(), anyhow::Error> {
        *self.data.lock().unwrap() = Some(data.clone());
        Ok(())
    }
}

pub struct FakeAnqpRequester {
    requests: Mutex<Vec<(Bssid, Vec<AnqpElementType>)>>,
    accept: Mutex<bool>,
}

impl FakeAnqpRequester {
    pub fn new() -> Self {
        Self { requests: Mutex::new(Vec::new()), accept: Mutex::new(true) }
    }

    pub fn set_accept(&self, accept: bool) {
        *self.accept.lock().unwrap() = accept;
    }

    pub fn requests(&self) -> Vec<(Bssid, Vec<AnqpElementType>)> {
        self.requests.lock().unwrap().clone()
    }
}

impl AnqpRequester for FakeAnqpRequester {
    fn request_anqp_elements(&self, bssid: Bssid, elements: &[AnqpElementType]) -> bool {
        if !*self.accept.lock().unwrap() {
            return false;
        }
        self.requests.lock().unwrap().push((bssid, elements.to_vec()));
        true
    }
}

/// Decoder that reports every scan as an interworking-capable R1 AP unless a
/// per-BSSID override says otherwise.
pub struct FakeScanDecoder {
    details: Mutex<HashMap<Bssid, Option<NetworkDetail>>>,
    rc_ois: Mutex<HashMap<Bssid, Vec<u64>>>,
}

impl FakeScanDecoder {
    pub fn new() -> Self {
        Self { details: Mutex::new(HashMap::new()), rc_ois: Mutex::new(HashMap::new()) }
    }

    pub fn set_network_detail(&self, bssid: Bssid, detail: Option<NetworkDetail>) {
        let _ = self.details.lock().unwrap().insert(bssid, detail);
    }

    pub fn set_roaming_consortium_ois(&self, bssid: Bssid, ois: Vec<u64>) {
        let _ = self.rc_ois.lock().unwrap().insert(bssid, ois);
    }
}

impl ScanIeDecoder for FakeScanDecoder {
    fn network_detail(&self, scan: &ScanResult) -> Option<NetworkDetail> {
        match self.details.lock().unwrap().get(&scan.bssid) {
            Some(detail) => detail.clone(),
            None => Some(NetworkDetail {
                is_interworking: true,
                hs_release: Some(HsRelease::R1),
                ant: None,
                is_internet: true,
                supports_encrypted_imsi: false,
            }),
        }
    }

    fn roaming_consortium_ois(&self, scan: &ScanResult) -> Vec<u64> {
        self.rc_ois.lock().unwrap().get(&scan.bssid).cloned().unwrap_or_default()
    }
}
