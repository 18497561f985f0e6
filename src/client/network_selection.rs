// Copyright 2023 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use crate::anqp::LinkStatus;
use crate::client::types::{
    NetworkDetail, ScanDetail, ScanIeDecoder, ScanResult, WifiConfiguration,
};
use crate::config_management::provider::PasspointMatch;
use crate::config_management::provider_manager::PasspointManager;
use crate::persist::NetworkConfigStore;
use std::collections::HashMap;
use std::sync::Arc;

/// One selectable network produced from a scan result and a matched provider.
#[derive(Clone, Debug, PartialEq)]
pub struct PasspointNetworkCandidate {
    pub scan_result: ScanResult,
    pub network_detail: NetworkDetail,
    pub config: WifiConfiguration,
}

// Owned snapshot of one provider match, so the manager borrow ends before the
// config store is touched.
struct ProviderMatchInfo {
    unique_id: String,
    is_home: bool,
    is_sim: bool,
    creator_uid: u32,
    package_name: String,
    config: WifiConfiguration,
}

/// Turns scan results plus manager matches into network candidates for the
/// selector, persisting a network per matched provider as it goes.
pub struct PasspointNetworkNominateHelper {
    config_store: Arc<dyn NetworkConfigStore>,
    ie_decoder: Arc<dyn ScanIeDecoder>,
}

impl PasspointNetworkNominateHelper {
    pub fn new(config_store: Arc<dyn NetworkConfigStore>, ie_decoder: Arc<dyn ScanIeDecoder>) -> Self {
        Self { config_store, ie_decoder }
    }

    /// Candidates for the current scan round. Only interworking APs with a
    /// parseable HS2.0 release participate; APs reporting their WAN link down
    /// are skipped, as are networks the user has disabled. When several BSSes
    /// match one provider, the first one becomes the candidate and the rest
    /// refresh its candidate scan.
    pub fn get_passpoint_network_candidates(
        &self,
        manager: &mut PasspointManager,
        scan_results: &[ScanResult],
        is_for_suggestion: bool,
    ) -> Vec<PasspointNetworkCandidate> {
        let mut candidates: Vec<PasspointNetworkCandidate> = Vec::new();
        let mut nominated: HashMap<String, usize> = HashMap::new();

        for scan in scan_results {
            let Some(detail) = self.ie_decoder.network_detail(scan) else {
                continue;
            };
            if !detail.is_interworking || detail.hs_release.is_none() {
                continue;
            }
            let link_down = manager
                .get_anqp_elements(scan)
                .and_then(|elements| elements.hs_wan_metrics())
                .is_some_and(|wan| wan.status != LinkStatus::Up);
            if link_down {
                continue;
            }

            let matches: Vec<ProviderMatchInfo> = manager
                .get_all_matched_providers(scan)
                .into_iter()
                .map(|(provider, matched)| ProviderMatchInfo {
                    unique_id: provider.unique_id(),
                    is_home: matched == PasspointMatch::HomeProvider,
                    is_sim: provider.is_sim_credential(),
                    creator_uid: provider.creator_uid(),
                    package_name: provider.package_name().to_string(),
                    config: provider.get_wifi_config(),
                })
                .collect();

            for info in matches {
                if info.config.from_wifi_network_suggestion != is_for_suggestion {
                    continue;
                }
                if let Some(&index) = nominated.get(&info.unique_id) {
                    // Another BSS matched this provider in the same round;
                    // refresh the candidate scan instead of duplicating it.
                    if let Some(network_id) = candidates[index].config.network_id {
                        let _ = self.config_store.set_network_candidate_scan_result(network_id, scan);
                        self.config_store.update_scan_detail_for_network(
                            network_id,
                            &ScanDetail {
                                scan_result: scan.clone(),
                                network_detail: detail.clone(),
                                roaming_consortium_ois: self.ie_decoder.roaming_consortium_ois(scan),
                            },
                        );
                    }
                    continue;
                }

                let mut config = info.config;
                config.is_home_provider_network = info.is_home;
                if info.is_sim {
                    config.enterprise.anonymous_identity = if detail.supports_encrypted_imsi {
                        // The connection layer substitutes the encrypted
                        // identity at connect time.
                        None
                    } else {
                        Some(format!("anonymous@{}", config.enterprise.realm))
                    };
                }

                match self.config_store.get_configured_network(&info.unique_id) {
                    Some(existing) => {
                        if !existing.autojoin_allowed || !existing.network_selection_enabled {
                            continue;
                        }
                        // Reuse the persisted row instead of duplicating it.
                        config.network_id = existing.network_id;
                        if let Some(network_id) = existing.network_id {
                            let _ =
                                self.config_store.set_network_candidate_scan_result(network_id, scan);
                        }
                    }
                    None => {
                        let Some(network_id) = self.config_store.add_or_update_network(
                            &config,
                            info.creator_uid,
                            &info.package_name,
                        ) else {
                            continue;
                        };
                        config.network_id = Some(network_id);
                        let _ = self.config_store.enable_network(network_id);
                        let _ = self.config_store.set_network_candidate_scan_result(network_id, scan);
                    }
                }

                let _ = nominated.insert(info.unique_id, candidates.len());
                candidates.push(PasspointNetworkCandidate {
                    scan_result: scan.clone(),
                    network_detail: detail.clone(),
                    config,
                });
            }
        }
        candidates
    }
}
