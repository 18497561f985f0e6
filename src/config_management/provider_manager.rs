// Copyright 2023 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use crate::anqp::cache::{AnqpCache, AnqpNetworkKey};
use crate::anqp::request_manager::{AnqpRequestManager, AnqpRequester};
use crate::anqp::{AnqpElementMap, OsuProvider};
use crate::carrier::WifiCarrierInfo;
use crate::client::types::{Bssid, ScanIeDecoder, ScanResult};
use crate::config_management::passpoint_config::PasspointConfiguration;
use crate::config_management::provider::{PasspointMatch, PasspointProvider};
use crate::keystore::KeyStore;
use crate::persist::{
    ConnectionControl, NetworkConfigStore, PermissionChecker, ProviderStorage, ProviderStoreData,
};
use crate::telemetry::{TelemetryEvent, TelemetrySender};
use crate::util::clock::Clock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Tunables owned by the embedding service. The cache lifetime in particular
/// is policy the engine applies without interpretation.
#[derive(Clone, Debug)]
pub struct PasspointPolicyConfig {
    pub anqp_cache_lifetime: Duration,
}

/// Which provider(s) a removal call targets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProviderTarget {
    UniqueId(String),
    /// Targets every provider sharing the FQDN; profiles with distinct
    /// realms legitimately coexist under one FQDN.
    Fqdn(String),
}

/// Owns the provider collection and the ANQP cache behind provider matching.
/// All mutation runs on the caller's single serialized thread; see
/// `service::serve_passpoint_requests`.
pub struct PasspointManager {
    // Backing arena plus the second index; the two are kept consistent on
    // every insert and remove.
    providers: HashMap<String, PasspointProvider>,
    provider_ids: HashMap<u64, String>,
    provider_index: u64,
    anqp_cache: AnqpCache,
    request_manager: AnqpRequestManager,
    key_store: Arc<dyn KeyStore>,
    carrier_info: Arc<dyn WifiCarrierInfo>,
    config_store: Arc<dyn NetworkConfigStore>,
    connection_control: Arc<dyn ConnectionControl>,
    permissions: Arc<dyn PermissionChecker>,
    provider_storage: Box<dyn ProviderStorage>,
    ie_decoder: Arc<dyn ScanIeDecoder>,
    telemetry_sender: TelemetrySender,
    clock: Arc<dyn Clock>,
}

impl PasspointManager {
    /// Builds the manager from persisted state. A load failure starts the
    /// manager empty rather than failing construction.
    pub fn new(
        policy: PasspointPolicyConfig,
        key_store: Arc<dyn KeyStore>,
        carrier_info: Arc<dyn WifiCarrierInfo>,
        config_store: Arc<dyn NetworkConfigStore>,
        connection_control: Arc<dyn ConnectionControl>,
        permissions: Arc<dyn PermissionChecker>,
        mut provider_storage: Box<dyn ProviderStorage>,
        ie_decoder: Arc<dyn ScanIeDecoder>,
        anqp_requester: Arc<dyn AnqpRequester>,
        telemetry_sender: TelemetrySender,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let stored = provider_storage.load().unwrap_or_else(|e| {
            error!("no saved Passpoint providers loaded; error loading from storage: {}", e);
            ProviderStoreData::default()
        });

        let mut providers = HashMap::new();
        let mut provider_ids = HashMap::new();
        for record in stored.providers {
            let provider = PasspointProvider::from_persistent_data(
                record,
                Arc::clone(&key_store),
                Arc::clone(&carrier_info),
            );
            let unique_id = provider.unique_id();
            let _ = provider_ids.insert(provider.provider_id(), unique_id.clone());
            let _ = providers.insert(unique_id, provider);
        }

        Self {
            providers,
            provider_ids,
            provider_index: stored.provider_index,
            anqp_cache: AnqpCache::new(policy.anqp_cache_lifetime, Arc::clone(&clock)),
            request_manager: AnqpRequestManager::new(anqp_requester, Arc::clone(&clock)),
            key_store,
            carrier_info,
            config_store,
            connection_control,
            permissions,
            provider_storage,
            ie_decoder,
            telemetry_sender,
            clock,
        }
    }

    /// Adds a new provider or updates the one sharing the config's unique id.
    /// Returns false on validation, permission, or keystore failure; no
    /// partial provider is registered on any failure path.
    pub fn add_or_update_provider(
        &mut self,
        config: PasspointConfiguration,
        creator_uid: u32,
        package_name: &str,
        is_from_suggestion: bool,
        is_trusted: bool,
    ) -> bool {
        self.telemetry_sender.send(TelemetryEvent::ProviderInstallAttempt);
        if let Err(e) = config.validate() {
            error!("rejecting Passpoint configuration: {}", e);
            return false;
        }
        if !self.permissions.uid_belongs_to_current_user(creator_uid) {
            info!("UID {} does not belong to the current user", creator_uid);
            return false;
        }
        if !is_trusted && !is_from_suggestion {
            error!("untrusted Passpoint networks are only supported through suggestions");
            return false;
        }

        let mut provider = PasspointProvider::new(
            config,
            Arc::clone(&self.key_store),
            Arc::clone(&self.carrier_info),
            self.provider_index,
            creator_uid,
            package_name.to_string(),
            is_from_suggestion,
            is_trusted,
        );
        // Pin the carrier id now for full-IMSI SIM profiles so later matching
        // survives the SIM moving between slots.
        let _ = provider.try_update_carrier_id();

        if !provider.install_certs_and_keys() {
            error!("failed to install certificates for provider {}", provider.provider_id());
            return false;
        }
        self.record_ca_cert_metrics(provider.config());

        let unique_id = provider.unique_id();
        match self.providers.get(&unique_id).map(|p| p.is_from_suggestion() == is_from_suggestion)
        {
            Some(true) => {
                // Same profile re-added from the same source: swap the
                // provider in place. The persisted network stays keyed by the
                // unchanged unique id, so an active session survives.
                if let Some(mut old) = self.providers.remove(&unique_id) {
                    let _ = self.provider_ids.remove(&old.provider_id());
                    old.uninstall_certs_and_keys();
                }
            }
            Some(false) => {
                // Same profile but the other source: the old registration
                // goes away entirely, persisted network included.
                self.telemetry_sender.send(TelemetryEvent::ProviderUninstallAttempt);
                self.remove_provider_unchecked(&unique_id);
            }
            None => {}
        }

        let _ = self.provider_ids.insert(provider.provider_id(), unique_id.clone());
        let _ = self.providers.insert(unique_id, provider);
        self.provider_index += 1;
        self.write_provider_storage();
        self.telemetry_sender.send(TelemetryEvent::ProviderInstallSuccess);
        true
    }

    /// Removes the targeted provider(s). Only the creator UID or a privileged
    /// caller may remove; an unauthorized or unmatched target fails the whole
    /// call with no side effects.
    pub fn remove_provider(
        &mut self,
        calling_uid: u32,
        privileged: bool,
        target: ProviderTarget,
    ) -> bool {
        let targets: Vec<String> = match &target {
            ProviderTarget::UniqueId(unique_id) => {
                self.providers.keys().filter(|id| *id == unique_id).cloned().collect()
            }
            ProviderTarget::Fqdn(fqdn) => self
                .providers
                .values()
                .filter(|provider| provider.config().home_sp.fqdn == *fqdn)
                .map(|provider| provider.unique_id())
                .collect(),
        };
        if targets.is_empty() {
            info!("no Passpoint provider found to remove");
            return false;
        }
        if !privileged {
            for unique_id in &targets {
                let authorized = self
                    .providers
                    .get(unique_id)
                    .is_some_and(|provider| provider.creator_uid() == calling_uid);
                if !authorized {
                    error!("UID {} is not permitted to remove this provider", calling_uid);
                    return false;
                }
            }
        }
        for unique_id in &targets {
            self.telemetry_sender.send(TelemetryEvent::ProviderUninstallAttempt);
            self.remove_provider_unchecked(unique_id);
        }
        self.write_provider_storage();
        true
    }

    /// Classifies one scan result against every installed provider. A cache
    /// hit evaluates synchronously; a miss issues a best-effort ANQP query
    /// and returns empty for this call. When any provider qualifies as Home,
    /// only Home matches are returned.
    pub fn get_all_matched_providers(
        &mut self,
        scan_result: &ScanResult,
    ) -> Vec<(&PasspointProvider, PasspointMatch)> {
        let rc_ie_ois = self.ie_decoder.roaming_consortium_ois(scan_result);
        let key = AnqpNetworkKey::build(
            &scan_result.ssid,
            scan_result.bssid,
            scan_result.hessid,
            scan_result.anqp_domain_id,
        );
        if self.anqp_cache.get_entry(&key).is_none() {
            let hs_release =
                self.ie_decoder.network_detail(scan_result).and_then(|detail| detail.hs_release);
            let _ = self.request_manager.request_anqp_elements(
                scan_result.bssid,
                key,
                !rc_ie_ois.is_empty(),
                hs_release,
            );
            return Vec::new();
        }
        let Some(data) = self.anqp_cache.get_entry(&key) else {
            return Vec::new();
        };
        let elements = data.elements();

        let now = self.clock.utc_millis();
        let mut home = Vec::new();
        let mut roaming = Vec::new();
        for provider in self.providers.values() {
            // An expired subscription renders the provider absent, letting a
            // non-expired roaming candidate win instead.
            if provider.is_expired(now) {
                self.telemetry_sender.send(TelemetryEvent::ProviderSubscriptionExpired);
                continue;
            }
            match provider.matches(elements, &rc_ie_ois) {
                PasspointMatch::HomeProvider => home.push(provider),
                PasspointMatch::RoamingProvider => roaming.push(provider),
                PasspointMatch::None => {}
            }
        }
        if !home.is_empty() {
            home.into_iter().map(|provider| (provider, PasspointMatch::HomeProvider)).collect()
        } else {
            roaming
                .into_iter()
                .map(|provider| (provider, PasspointMatch::RoamingProvider))
                .collect()
        }
    }

    /// Best single match for a scan result: a Home provider when one exists,
    /// else a Roaming provider.
    pub fn match_provider(
        &mut self,
        scan_result: &ScanResult,
    ) -> Option<(&PasspointProvider, PasspointMatch)> {
        self.get_all_matched_providers(scan_result).into_iter().next()
    }

    /// Routes an asynchronous ANQP completion into the cache. Responses with
    /// no matching outstanding request are dropped without touching it.
    pub fn on_anqp_response(&mut self, bssid: Bssid, elements: Option<AnqpElementMap>) {
        let success = elements.is_some();
        let Some(key) = self.request_manager.on_request_completed(bssid, success) else {
            info!("dropping unsolicited ANQP response from {}", bssid);
            return;
        };
        if let Some(elements) = elements {
            self.anqp_cache.add_entry(key, elements);
        }
    }

    /// Cached element set for a scan result, if its network answered a query
    /// recently.
    pub fn get_anqp_elements(&self, scan_result: &ScanResult) -> Option<&AnqpElementMap> {
        let key = AnqpNetworkKey::build(
            &scan_result.ssid,
            scan_result.bssid,
            scan_result.hessid,
            scan_result.anqp_domain_id,
        );
        self.anqp_cache.get_entry(&key).map(|data| data.elements())
    }

    /// Online Sign-Up offers advertised across the scan results, grouped by
    /// ANQP domain id so the APs of one ESS contribute a single entry.
    pub fn get_matching_osu_providers(
        &self,
        scan_results: &[ScanResult],
    ) -> Vec<(OsuProvider, Vec<ScanResult>)> {
        let mut matches: Vec<(OsuProvider, Vec<ScanResult>)> = Vec::new();
        let mut seen: HashSet<(u16, String)> = HashSet::new();
        for scan in scan_results {
            let key =
                AnqpNetworkKey::build(&scan.ssid, scan.bssid, scan.hessid, scan.anqp_domain_id);
            let Some(data) = self.anqp_cache.get_entry(&key) else {
                continue;
            };
            let Some(element) = data.elements().hs_osu_providers() else {
                continue;
            };
            for info in &element.providers {
                let provider = OsuProvider::from_info(&element.osu_ssid, info);
                if scan.anqp_domain_id != 0
                    && !seen.insert((scan.anqp_domain_id, info.server_uri.clone()))
                {
                    // Same ESS backend; attach the scan to the entry already
                    // collected instead of duplicating the offer.
                    if let Some((_, scans)) =
                        matches.iter_mut().find(|(existing, _)| *existing == provider)
                    {
                        scans.push(scan.clone());
                    }
                    continue;
                }
                match matches.iter_mut().find(|(existing, _)| *existing == provider) {
                    Some((_, scans)) => scans.push(scan.clone()),
                    None => matches.push((provider, vec![scan.clone()])),
                }
            }
        }
        matches
    }

    pub fn sweep_cache(&mut self) {
        self.anqp_cache.sweep();
    }

    /// Tears down every provider created by a package whose permission was
    /// revoked, disconnecting any active network that used one of them.
    pub fn on_app_permission_changed(&mut self, package_name: &str, allowed: bool) {
        if allowed {
            return;
        }
        let targets: Vec<String> = self
            .providers
            .values()
            .filter(|provider| provider.package_name() == package_name)
            .map(|provider| provider.unique_id())
            .collect();
        if targets.is_empty() {
            return;
        }
        info!(
            "removing {} Passpoint providers after permission revocation for {}",
            targets.len(),
            package_name
        );
        for unique_id in &targets {
            self.connection_control.disconnect_network(unique_id);
            self.telemetry_sender.send(TelemetryEvent::ProviderUninstallAttempt);
            self.remove_provider_unchecked(unique_id);
        }
        self.write_provider_storage();
    }

    /// Lists installed configurations; non-privileged callers only see their
    /// own.
    pub fn get_provider_configs(
        &self,
        calling_uid: u32,
        privileged: bool,
    ) -> Vec<PasspointConfiguration> {
        self.providers
            .values()
            .filter(|provider| privileged || provider.creator_uid() == calling_uid)
            .map(|provider| provider.config().clone())
            .collect()
    }

    pub fn get_provider(&self, unique_id: &str) -> Option<&PasspointProvider> {
        self.providers.get(unique_id)
    }

    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    /// Marks the first successful connection through a provider's network.
    pub fn on_network_connected(&mut self, unique_id: &str) -> bool {
        let Some(provider) = self.providers.get_mut(unique_id) else {
            return false;
        };
        if !provider.has_ever_connected() {
            provider.set_has_ever_connected(true);
            self.write_provider_storage();
        }
        true
    }

    /// Toggles autojoin for a provider and its persisted network.
    pub fn enable_autojoin(&mut self, unique_id: &str, allowed: bool) -> bool {
        let Some(provider) = self.providers.get_mut(unique_id) else {
            return false;
        };
        if provider.is_autojoin_enabled() == allowed {
            return true;
        }
        provider.set_autojoin_enabled(allowed);
        if let Some(network_id) =
            self.config_store.get_configured_network(unique_id).and_then(|config| config.network_id)
        {
            self.config_store.allow_autojoin(network_id, allowed);
        }
        self.write_provider_storage();
        true
    }

    pub fn record_periodic_metrics(&self) {
        self.telemetry_sender
            .send(TelemetryEvent::ProviderCount { providers: self.providers.len() });
    }

    fn record_ca_cert_metrics(&self, config: &PasspointConfiguration) {
        if config.credential.ca_certificates.is_empty() {
            self.telemetry_sender.send(TelemetryEvent::ProviderWithNoRootCa);
        } else if config.credential.ca_certificates.iter().any(|cert| cert.is_self_signed()) {
            self.telemetry_sender.send(TelemetryEvent::ProviderWithSelfSignedRootCa);
        }
    }

    // Removes one provider from the arena, its aliases from the keystore, and
    // its network from the persisted store. Callers persist the provider list
    // afterwards.
    fn remove_provider_unchecked(&mut self, unique_id: &str) {
        let Some(mut provider) = self.providers.remove(unique_id) else {
            return;
        };
        let _ = self.provider_ids.remove(&provider.provider_id());
        provider.uninstall_certs_and_keys();
        if !self.config_store.remove_network(unique_id) {
            info!("no persisted network to remove for provider");
        }
        let _ = self.config_store.save_to_store();
        self.telemetry_sender.send(TelemetryEvent::ProviderUninstallSuccess);
    }

    fn write_provider_storage(&mut self) {
        let data = ProviderStoreData {
            providers: self.providers.values().map(|p| p.to_persistent_data()).collect(),
            provider_index: self.provider_index,
        };
        if let Err(e) = self.provider_storage.write(&data) {
            error!("error writing Passpoint providers to persistent storage: {}", e);
        }
    }
}
