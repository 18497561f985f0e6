// Copyright 2023 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use crate::client::types::{NetworkId, ScanDetail, ScanResult, WifiConfiguration};
use crate::config_management::passpoint_config::PersistentProviderData;
use serde::{Deserialize, Serialize};

/// Persisted network-config store collaborator: the saved-network database
/// owned by the wider Wi-Fi service. Networks synthesized from providers are
/// keyed by the provider's unique id.
pub trait NetworkConfigStore: Send + Sync {
    /// Inserts or updates a network; reuses the config's network id when set.
    /// Returns the row id, or None on failure.
    fn add_or_update_network(
        &self,
        config: &WifiConfiguration,
        uid: u32,
        package_name: &str,
    ) -> Option<NetworkId>;
    /// Removes the network linked to a provider. Returns false when none was
    /// persisted.
    fn remove_network(&self, unique_id: &str) -> bool;
    fn get_configured_network(&self, unique_id: &str) -> Option<WifiConfiguration>;
    fn save_to_store(&self) -> bool;
    fn enable_network(&self, network_id: NetworkId) -> bool;
    fn set_network_candidate_scan_result(&self, network_id: NetworkId, scan: &ScanResult) -> bool;
    fn update_scan_detail_for_network(&self, network_id: NetworkId, scan_detail: &ScanDetail);
    fn allow_autojoin(&self, network_id: NetworkId, allowed: bool);
}

/// Disconnect hook used when a creator package loses its permission and its
/// providers are torn down underneath an active connection.
pub trait ConnectionControl: Send + Sync {
    fn disconnect_network(&self, unique_id: &str);
}

/// Caller identity checks delegated to the permission layer.
pub trait PermissionChecker: Send + Sync {
    fn uid_belongs_to_current_user(&self, uid: u32) -> bool;
}

/// On-disk form of the provider collection, exchanged with the provider
/// storage collaborator as one record.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderStoreData {
    pub providers: Vec<PersistentProviderData>,
    /// Next provider id. Strictly increasing across the life of the store so
    /// keystore aliases never collide with a removed provider's.
    pub provider_index: u64,
}

/// Provider-list / provider-index data source. The file or stash behind it
/// lives outside this crate.
pub trait ProviderStorage: Send {
    fn load(&mut self) -> Result<ProviderStoreData, anyhow::Error>;
    fn write(&mut self, data: &ProviderStoreData) -> Result<(), anyhow::Error>;
}
