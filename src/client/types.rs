// Copyright 2022 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use serde::{Deserialize, Serialize};
use std::fmt;

/// BSSID of an access point.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bssid(pub [u8; 6]);

impl Bssid {
    pub const ZERO: Bssid = Bssid([0u8; 6]);
}

impl fmt::Display for Bssid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        write!(f, "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}", b[0], b[1], b[2], b[3], b[4], b[5])
    }
}

impl fmt::Debug for Bssid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

/// Hotspot 2.0 release advertised in the vendor-specific interworking IE.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum HsRelease {
    R1,
    R2,
    R3,
}

/// Access network type from the interworking IE.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ant {
    Private,
    PrivateWithGuest,
    ChargeablePublic,
    FreePublic,
    Personal,
    EmergencyOnly,
    Wildcard,
}

/// One beacon or probe response as delivered by the scan layer. The raw
/// information element payload is opaque here; decoding happens behind
/// [`ScanIeDecoder`].
#[derive(Clone, Debug, PartialEq)]
pub struct ScanResult {
    pub ssid: String,
    pub bssid: Bssid,
    pub hessid: u64,
    pub anqp_domain_id: u16,
    pub flags: u64,
    pub information_elements: Vec<u8>,
}

/// Interworking fields decoded out of a scan result's information elements.
#[derive(Clone, Debug, PartialEq)]
pub struct NetworkDetail {
    pub is_interworking: bool,
    pub hs_release: Option<HsRelease>,
    pub ant: Option<Ant>,
    pub is_internet: bool,
    pub supports_encrypted_imsi: bool,
}

/// A scan result bundled with its decoded interworking view and the OIs from
/// its roaming consortium IE.
#[derive(Clone, Debug, PartialEq)]
pub struct ScanDetail {
    pub scan_result: ScanResult,
    pub network_detail: NetworkDetail,
    pub roaming_consortium_ois: Vec<u64>,
}

/// Stateless decode seam for the raw information elements carried in scan
/// results. Injected so the parser stays out of this crate's state and can be
/// substituted in tests.
pub trait ScanIeDecoder: Send + Sync {
    /// Returns the interworking view of a scan result, or None when the IEs
    /// do not parse.
    fn network_detail(&self, scan: &ScanResult) -> Option<NetworkDetail>;
    /// Returns the OIs advertised in the roaming consortium IE, empty when
    /// the IE is absent.
    fn roaming_consortium_ois(&self, scan: &ScanResult) -> Vec<u64>;
}

/// Row id of a network in the persisted network-config store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NetworkId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EapMethod {
    Ttls,
    Tls,
    Sim,
    Aka,
    AkaPrime,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase2Method {
    None,
    Pap,
    MsChap,
    MsChapV2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ocsp {
    None,
    RequireCertStatus,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MacRandomizationSetting {
    None,
    Persistent,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeteredOverride {
    #[default]
    None,
    Metered,
    NotMetered,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyMgmt {
    WpaEap,
    Ieee8021x,
}

/// 802.1X parameters of a synthesized network configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct EnterpriseConfig {
    pub eap_method: EapMethod,
    pub phase2_method: Phase2Method,
    pub identity: Option<String>,
    pub password: Option<String>,
    pub anonymous_identity: Option<String>,
    pub realm: String,
    pub plmn: Option<String>,
    pub domain_suffix_match: String,
    pub ca_certificate_aliases: Option<Vec<String>>,
    pub ca_path: Option<String>,
    pub client_certificate_alias: Option<String>,
    pub ocsp: Ocsp,
}

/// The network configuration handed to the saved-network store and the
/// network selector. Synthesized from a provider, never parsed back.
#[derive(Clone, Debug, PartialEq)]
pub struct WifiConfiguration {
    pub network_id: Option<NetworkId>,
    pub fqdn: String,
    pub provider_friendly_name: String,
    pub roaming_consortium_ids: Vec<u64>,
    pub key_mgmt: Vec<KeyMgmt>,
    pub enterprise: EnterpriseConfig,
    pub update_identifier: Option<String>,
    pub shared: bool,
    pub mac_randomization_setting: MacRandomizationSetting,
    pub metered_override: MeteredOverride,
    pub carrier_id: i32,
    pub is_home_provider_network: bool,
    pub ephemeral: bool,
    pub from_wifi_network_suggestion: bool,
    pub trusted: bool,
    pub autojoin_allowed: bool,
    pub network_selection_enabled: bool,
    /// Links the persisted network back to the provider that produced it.
    pub passpoint_unique_id: String,
}
