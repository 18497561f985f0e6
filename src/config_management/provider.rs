// Copyright 2022 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use crate::anqp::matcher::{self, ImsiParameter};
use crate::anqp::AnqpElementMap;
use crate::carrier::{WifiCarrierInfo, UNKNOWN_CARRIER_ID};
use crate::client::types::{
    EapMethod, EnterpriseConfig, KeyMgmt, MacRandomizationSetting, Ocsp, Phase2Method,
    WifiConfiguration,
};
use crate::config_management::passpoint_config::{
    CredentialKind, InnerAuthMethod, PasspointConfiguration, PersistentProviderData, SimEapMethod,
};
use crate::keystore::KeyStore;
use base64::Engine;
use std::sync::Arc;
use tracing::error;

/// Keystore alias prefixes. The numeric provider id anchors aliases across
/// restarts; an alias never outlives its provider.
const ALIAS_HS_TYPE: &str = "HS2_";
const ALIAS_REMEDIATION_TYPE: &str = "HS2_REMEDIATION_";

/// Trust anchors fall back to the platform store when a profile carries no
/// CA certificate of its own.
pub const SYSTEM_CA_STORE_PATH: &str = "/system/etc/security/cacerts";

/// Outcome of evaluating one provider against one AP's ANQP element set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PasspointMatch {
    HomeProvider,
    RoamingProvider,
    None,
}

/// One stored credential profile plus its runtime state: keystore aliases,
/// ownership, and connection history.
pub struct PasspointProvider {
    config: PasspointConfiguration,
    key_store: Arc<dyn KeyStore>,
    carrier_info: Arc<dyn WifiCarrierInfo>,
    provider_id: u64,
    creator_uid: u32,
    package_name: String,
    is_from_suggestion: bool,
    is_trusted: bool,
    has_ever_connected: bool,
    ca_certificate_aliases: Vec<String>,
    client_private_key_and_cert_alias: Option<String>,
    remediation_ca_certificate_alias: Option<String>,
    // Parsed once at construction; None for non-SIM credentials.
    imsi_parameter: Option<ImsiParameter>,
}

impl PasspointProvider {
    pub fn new(
        config: PasspointConfiguration,
        key_store: Arc<dyn KeyStore>,
        carrier_info: Arc<dyn WifiCarrierInfo>,
        provider_id: u64,
        creator_uid: u32,
        package_name: String,
        is_from_suggestion: bool,
        is_trusted: bool,
    ) -> Self {
        let imsi_parameter = match &config.credential.kind {
            CredentialKind::Sim(sim) => ImsiParameter::parse(&sim.imsi),
            _ => None,
        };
        Self {
            config,
            key_store,
            carrier_info,
            provider_id,
            creator_uid,
            package_name,
            is_from_suggestion,
            is_trusted,
            has_ever_connected: false,
            ca_certificate_aliases: Vec::new(),
            client_private_key_and_cert_alias: None,
            remediation_ca_certificate_alias: None,
            imsi_parameter,
        }
    }

    /// Rebuilds a provider from its persisted record, including the keystore
    /// aliases registered before the restart.
    pub fn from_persistent_data(
        data: PersistentProviderData,
        key_store: Arc<dyn KeyStore>,
        carrier_info: Arc<dyn WifiCarrierInfo>,
    ) -> Self {
        let mut provider = Self::new(
            data.config,
            key_store,
            carrier_info,
            data.provider_id,
            data.creator_uid,
            data.package_name,
            data.is_from_suggestion,
            data.is_trusted,
        );
        provider.has_ever_connected = data.has_ever_connected;
        provider.ca_certificate_aliases = data.ca_certificate_aliases;
        provider.client_private_key_and_cert_alias = data.client_private_key_and_cert_alias;
        provider.remediation_ca_certificate_alias = data.remediation_ca_certificate_alias;
        provider
    }

    pub fn to_persistent_data(&self) -> PersistentProviderData {
        PersistentProviderData {
            provider_id: self.provider_id,
            creator_uid: self.creator_uid,
            package_name: self.package_name.clone(),
            is_from_suggestion: self.is_from_suggestion,
            is_trusted: self.is_trusted,
            has_ever_connected: self.has_ever_connected,
            config: self.config.clone(),
            ca_certificate_aliases: self.ca_certificate_aliases.clone(),
            client_private_key_and_cert_alias: self.client_private_key_and_cert_alias.clone(),
            remediation_ca_certificate_alias: self.remediation_ca_certificate_alias.clone(),
        }
    }

    pub fn config(&self) -> &PasspointConfiguration {
        &self.config
    }

    pub fn unique_id(&self) -> String {
        self.config.unique_id()
    }

    pub fn provider_id(&self) -> u64 {
        self.provider_id
    }

    pub fn creator_uid(&self) -> u32 {
        self.creator_uid
    }

    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    pub fn is_from_suggestion(&self) -> bool {
        self.is_from_suggestion
    }

    pub fn is_trusted(&self) -> bool {
        self.is_trusted
    }

    pub fn has_ever_connected(&self) -> bool {
        self.has_ever_connected
    }

    pub fn set_has_ever_connected(&mut self, connected: bool) {
        self.has_ever_connected = connected;
    }

    pub fn is_autojoin_enabled(&self) -> bool {
        self.config.is_autojoin_enabled
    }

    pub fn set_autojoin_enabled(&mut self, enabled: bool) {
        self.config.is_autojoin_enabled = enabled;
    }

    pub fn is_sim_credential(&self) -> bool {
        matches!(self.config.credential.kind, CredentialKind::Sim(_))
    }

    pub fn is_expired(&self, now_utc_millis: i64) -> bool {
        self.config.is_expired(now_utc_millis)
    }

    pub fn ca_certificate_aliases(&self) -> &[String] {
        &self.ca_certificate_aliases
    }

    pub fn client_private_key_and_cert_alias(&self) -> Option<&str> {
        self.client_private_key_and_cert_alias.as_deref()
    }

    pub fn remediation_ca_certificate_alias(&self) -> Option<&str> {
        self.remediation_ca_certificate_alias.as_deref()
    }

    /// For a full-IMSI SIM profile, resolves and records the carrier id of
    /// the installed SIM. Returns true when the config changed.
    pub fn try_update_carrier_id(&mut self) -> bool {
        let Some(imsi_parameter) = &self.imsi_parameter else {
            return false;
        };
        if !imsi_parameter.is_full_imsi() || self.config.carrier_id != UNKNOWN_CARRIER_ID {
            return false;
        }
        match self.carrier_info.get_matching_imsi_carrier_id(imsi_parameter.imsi()) {
            Some((_, carrier_id)) => {
                self.config.carrier_id = carrier_id;
                true
            }
            None => false,
        }
    }

    /// Installs the profile's certificate material under this provider's
    /// aliases. All-or-nothing: a failure removes any alias registered
    /// earlier in the same attempt and returns false, leaving the embedded
    /// material in place so the caller may retry.
    pub fn install_certs_and_keys(&mut self) -> bool {
        let mut installed: Vec<String> = Vec::new();
        let credential = &self.config.credential;

        let mut ca_aliases = Vec::with_capacity(credential.ca_certificates.len());
        for (index, cert) in credential.ca_certificates.iter().enumerate() {
            let alias = format!("{}{}_{}", ALIAS_HS_TYPE, self.provider_id, index);
            if !self.key_store.put_ca_cert(&alias, cert) {
                error!("failed to install CA certificate for provider {}", self.provider_id);
                self.remove_aliases(&installed);
                return false;
            }
            installed.push(alias.clone());
            ca_aliases.push(alias);
        }

        let mut client_alias = None;
        if let CredentialKind::Certificate(cert_credential) = &credential.kind {
            let alias = format!("{}{}", ALIAS_HS_TYPE, self.provider_id);
            let Some(key) = &cert_credential.client_private_key else {
                error!("certificate credential for provider {} has no key", self.provider_id);
                self.remove_aliases(&installed);
                return false;
            };
            if !self.key_store.put_user_priv_key_and_certs(
                &alias,
                key,
                &cert_credential.client_certificate_chain,
            ) {
                error!("failed to install client key for provider {}", self.provider_id);
                self.remove_aliases(&installed);
                return false;
            }
            installed.push(alias.clone());
            client_alias = Some(alias);
        }

        let mut remediation_alias = None;
        if let Some(cert) = &self.config.remediation_ca_certificate {
            let alias = format!("{}{}", ALIAS_REMEDIATION_TYPE, self.provider_id);
            if !self.key_store.put_ca_cert(&alias, cert) {
                error!(
                    "failed to install remediation CA certificate for provider {}",
                    self.provider_id
                );
                self.remove_aliases(&installed);
                return false;
            }
            remediation_alias = Some(alias);
        }

        self.ca_certificate_aliases = ca_aliases;
        self.client_private_key_and_cert_alias = client_alias;
        self.remediation_ca_certificate_alias = remediation_alias;
        true
    }

    /// Removes every recorded alias from the keystore and clears the alias
    /// sets.
    pub fn uninstall_certs_and_keys(&mut self) {
        for alias in self.ca_certificate_aliases.drain(..) {
            self.key_store.remove_entry(&alias);
        }
        if let Some(alias) = self.client_private_key_and_cert_alias.take() {
            self.key_store.remove_entry(&alias);
        }
        if let Some(alias) = self.remediation_ca_certificate_alias.take() {
            self.key_store.remove_entry(&alias);
        }
    }

    fn remove_aliases(&self, aliases: &[String]) {
        for alias in aliases {
            self.key_store.remove_entry(alias);
        }
    }

    /// Classifies one AP against this profile. `roaming_consortium_ie` is the
    /// OI list from the beacon's roaming consortium IE; it stands in as the
    /// OI source when the AP did not answer the ANQP query with one.
    pub fn matches(
        &self,
        anqp_elements: &AnqpElementMap,
        roaming_consortium_ie: &[u64],
    ) -> PasspointMatch {
        let sim_imsi = if self.is_sim_credential() { self.matching_sim_imsi() } else { None };

        let mut provider_match =
            self.match_fqdn_and_home_ois(anqp_elements, roaming_consortium_ie, sim_imsi.as_deref());

        if provider_match != PasspointMatch::HomeProvider {
            let home_sp = &self.config.home_sp;
            if self.match_ois(
                &home_sp.roaming_consortium_ois,
                anqp_elements,
                roaming_consortium_ie,
                false,
            ) {
                provider_match = PasspointMatch::RoamingProvider;
            } else if matcher::match_three_gpp_network(
                anqp_elements.three_gpp_network(),
                self.imsi_parameter.as_ref(),
                sim_imsi.as_deref(),
            ) {
                provider_match = PasspointMatch::RoamingProvider;
            } else if matcher::match_nai_realm(
                anqp_elements.nai_realm(),
                &self.config.credential.realm,
            ) {
                provider_match = PasspointMatch::RoamingProvider;
            }
        }

        // A SIM profile without its SIM installed never matches, whatever the
        // ANQP-level outcome was.
        if provider_match != PasspointMatch::None && self.is_sim_credential() && sim_imsi.is_none()
        {
            return PasspointMatch::None;
        }
        provider_match
    }

    fn match_fqdn_and_home_ois(
        &self,
        anqp_elements: &AnqpElementMap,
        roaming_consortium_ie: &[u64],
        sim_imsi: Option<&str>,
    ) -> PasspointMatch {
        let home_sp = &self.config.home_sp;
        if matcher::match_domain_name(
            anqp_elements.domain_name(),
            &home_sp.fqdn,
            self.imsi_parameter.as_ref(),
            sim_imsi,
        ) {
            return PasspointMatch::HomeProvider;
        }
        for partner in &home_sp.other_home_partners {
            if matcher::match_domain_name(anqp_elements.domain_name(), partner, None, None) {
                return PasspointMatch::HomeProvider;
            }
        }
        if !home_sp.match_all_ois.is_empty() {
            if self.match_ois(&home_sp.match_all_ois, anqp_elements, roaming_consortium_ie, true) {
                return PasspointMatch::HomeProvider;
            }
        } else if self.match_ois(&home_sp.match_any_ois, anqp_elements, roaming_consortium_ie, false)
        {
            return PasspointMatch::HomeProvider;
        }
        PasspointMatch::None
    }

    fn match_ois(
        &self,
        provider_ois: &[u64],
        anqp_elements: &AnqpElementMap,
        roaming_consortium_ie: &[u64],
        match_all: bool,
    ) -> bool {
        if let Some(element) = anqp_elements.roaming_consortium() {
            return matcher::match_roaming_consortium(Some(element), provider_ois, match_all);
        }
        if provider_ois.is_empty() || roaming_consortium_ie.is_empty() {
            return false;
        }
        if match_all {
            provider_ois.iter().all(|oi| roaming_consortium_ie.contains(oi))
        } else {
            provider_ois.iter().any(|oi| roaming_consortium_ie.contains(oi))
        }
    }

    /// Full IMSI of the installed SIM this profile authenticates with, via
    /// the recorded carrier id when one was resolved, else the IMSI pattern.
    fn matching_sim_imsi(&self) -> Option<String> {
        if self.config.carrier_id != UNKNOWN_CARRIER_ID {
            self.carrier_info.get_matching_imsi(self.config.carrier_id)
        } else {
            match &self.config.credential.kind {
                CredentialKind::Sim(sim) => self
                    .carrier_info
                    .get_matching_imsi_carrier_id(&sim.imsi)
                    .map(|(imsi, _)| imsi),
                _ => None,
            }
        }
    }

    /// Synthesizes the network configuration the connection layer uses for
    /// this profile.
    pub fn get_wifi_config(&self) -> WifiConfiguration {
        let home_sp = &self.config.home_sp;
        let credential = &self.config.credential;

        let domain_suffix_match = if self.config.aaa_server_trusted_names.is_empty() {
            home_sp.fqdn.clone()
        } else {
            self.config.aaa_server_trusted_names.join(";")
        };

        // Explicit AAA trusted names defer trust to the platform CA store.
        let (ca_certificate_aliases, ca_path) = if !self.config.aaa_server_trusted_names.is_empty()
        {
            (None, Some(SYSTEM_CA_STORE_PATH.to_string()))
        } else if !self.ca_certificate_aliases.is_empty() {
            (Some(self.ca_certificate_aliases.clone()), None)
        } else {
            (None, Some(SYSTEM_CA_STORE_PATH.to_string()))
        };

        let ocsp = if credential.check_aaa_server_cert_status {
            Ocsp::RequireCertStatus
        } else {
            Ocsp::None
        };

        let enterprise = match &credential.kind {
            CredentialKind::User(user) => EnterpriseConfig {
                eap_method: user.eap_type,
                phase2_method: match user.non_eap_inner_method {
                    InnerAuthMethod::Pap => Phase2Method::Pap,
                    InnerAuthMethod::MsChap => Phase2Method::MsChap,
                    InnerAuthMethod::MsChapV2 => Phase2Method::MsChapV2,
                },
                identity: Some(user.username.clone()),
                password: Some(decode_password(&user.password)),
                anonymous_identity: Some(format!("anonymous@{}", credential.realm)),
                realm: credential.realm.clone(),
                plmn: None,
                domain_suffix_match,
                ca_certificate_aliases,
                ca_path,
                client_certificate_alias: None,
                ocsp,
            },
            CredentialKind::Certificate(_) => EnterpriseConfig {
                eap_method: EapMethod::Tls,
                phase2_method: Phase2Method::None,
                identity: None,
                password: None,
                anonymous_identity: Some(format!("anonymous@{}", credential.realm)),
                realm: credential.realm.clone(),
                plmn: None,
                domain_suffix_match,
                ca_certificate_aliases,
                ca_path,
                client_certificate_alias: self.client_private_key_and_cert_alias.clone(),
                ocsp,
            },
            CredentialKind::Sim(sim) => EnterpriseConfig {
                eap_method: match sim.eap_type {
                    SimEapMethod::Sim => EapMethod::Sim,
                    SimEapMethod::Aka => EapMethod::Aka,
                    SimEapMethod::AkaPrime => EapMethod::AkaPrime,
                },
                phase2_method: Phase2Method::None,
                identity: None,
                password: None,
                anonymous_identity: None,
                realm: credential.realm.clone(),
                plmn: Some(sim.imsi.clone()),
                domain_suffix_match,
                ca_certificate_aliases,
                ca_path,
                client_certificate_alias: None,
                ocsp,
            },
        };

        WifiConfiguration {
            network_id: None,
            fqdn: home_sp.fqdn.clone(),
            provider_friendly_name: home_sp.friendly_name.clone(),
            roaming_consortium_ids: home_sp.roaming_consortium_ois.clone(),
            key_mgmt: vec![KeyMgmt::WpaEap, KeyMgmt::Ieee8021x],
            enterprise,
            update_identifier: self.config.update_identifier.map(|id| id.to_string()),
            shared: false,
            mac_randomization_setting: if self.config.is_mac_randomization_enabled {
                MacRandomizationSetting::Persistent
            } else {
                MacRandomizationSetting::None
            },
            metered_override: self.config.metered_override,
            carrier_id: self.config.carrier_id,
            is_home_provider_network: false,
            ephemeral: self.is_from_suggestion,
            from_wifi_network_suggestion: self.is_from_suggestion,
            trusted: self.is_trusted,
            autojoin_allowed: self.config.is_autojoin_enabled,
            network_selection_enabled: true,
            passpoint_unique_id: self.unique_id(),
        }
    }
}

/// PPS-MO passwords are base64; anything that does not decode to UTF-8 is
/// treated as a literal password.
fn decode_password(encoded: &str) -> String {
    match base64::engine::general_purpose::STANDARD.decode(encoded) {
        Ok(bytes) => String::from_utf8(bytes).unwrap_or_else(|_| encoded.to_string()),
        Err(_) => encoded.to_string(),
    }
}
