// Copyright 2022 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Decoded ANQP element model. Wire-format parsing happens in the transport
//! layer; this crate only ever sees the element structs below.

pub mod cache;
pub mod matcher;
pub mod request_manager;

use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnqpElementType {
    VenueName,
    IpAddrAvailability,
    NaiRealm,
    ThreeGppNetwork,
    DomainName,
    RoamingConsortium,
    HsFriendlyName,
    HsConnectionCapability,
    HsWanMetrics,
    HsOsuProviders,
}

/// Domain Name ANQP element.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DomainNameElement {
    pub domains: Vec<String>,
}

/// One realm entry of the NAI Realm element. The EAP method list is decoded
/// and carried through, but matching considers the realm strings only.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NaiRealmData {
    pub realms: Vec<String>,
    pub eap_methods: Vec<EapMethodEntry>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct EapMethodEntry {
    pub eap_method_id: u8,
    pub inner_auth_methods: Vec<u8>,
}

/// NAI Realm ANQP element.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NaiRealmElement {
    pub realm_data: Vec<NaiRealmData>,
}

/// Roaming Consortium ANQP element.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RoamingConsortiumElement {
    pub ois: Vec<u64>,
}

/// One PLMN list of the 3GPP Cellular Network element. Each PLMN is the
/// concatenated MCC-MNC, 5 or 6 digits.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CellularNetwork {
    pub plmns: Vec<String>,
}

/// 3GPP Cellular Network ANQP element.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ThreeGppNetworkElement {
    pub networks: Vec<CellularNetwork>,
}

/// A language-tagged string, as carried by the HS2.0 friendly name and OSU
/// provider elements.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct I18Name {
    pub language: String,
    pub text: String,
}

/// HS2.0 Operator Friendly Name element.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HsFriendlyNameElement {
    pub names: Vec<I18Name>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkStatus {
    Up,
    Down,
    Test,
}

/// HS2.0 WAN Metrics element.
#[derive(Clone, Debug, PartialEq)]
pub struct HsWanMetricsElement {
    pub status: LinkStatus,
    pub symmetric: bool,
    pub capped: bool,
    pub downlink_speed_kbps: u32,
    pub uplink_speed_kbps: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OsuMethod {
    OmaDm,
    SoapXmlSpp,
}

/// One Online Sign-Up provider advertised in the HS2.0 OSU Providers element.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OsuProviderInfo {
    pub friendly_names: Vec<I18Name>,
    pub server_uri: String,
    pub method_list: Vec<OsuMethod>,
    pub network_access_identifier: Option<String>,
    pub service_descriptions: Vec<I18Name>,
}

/// HS2.0 OSU Providers element.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HsOsuProvidersElement {
    pub osu_ssid: String,
    pub providers: Vec<OsuProviderInfo>,
}

/// An Online Sign-Up offer surfaced to callers, deduplicated across the APs
/// of one ESS.
#[derive(Clone, Debug, PartialEq)]
pub struct OsuProvider {
    pub osu_ssid: String,
    pub friendly_name: Option<String>,
    pub server_uri: String,
    pub method_list: Vec<OsuMethod>,
    pub network_access_identifier: Option<String>,
    pub service_description: Option<String>,
}

impl OsuProvider {
    pub fn from_info(osu_ssid: &str, info: &OsuProviderInfo) -> Self {
        Self {
            osu_ssid: osu_ssid.to_string(),
            friendly_name: info.friendly_names.first().map(|name| name.text.clone()),
            server_uri: info.server_uri.clone(),
            method_list: info.method_list.clone(),
            network_access_identifier: info.network_access_identifier.clone(),
            service_description: info.service_descriptions.first().map(|name| name.text.clone()),
        }
    }
}

/// ANQP elements the engine consumes, already decoded by the transport layer.
#[derive(Clone, Debug, PartialEq)]
pub enum AnqpElement {
    DomainName(DomainNameElement),
    NaiRealm(NaiRealmElement),
    RoamingConsortium(RoamingConsortiumElement),
    ThreeGppNetwork(ThreeGppNetworkElement),
    HsFriendlyName(HsFriendlyNameElement),
    HsWanMetrics(HsWanMetricsElement),
    HsOsuProviders(HsOsuProvidersElement),
}

impl AnqpElement {
    pub fn element_type(&self) -> AnqpElementType {
        match self {
            AnqpElement::DomainName(_) => AnqpElementType::DomainName,
            AnqpElement::NaiRealm(_) => AnqpElementType::NaiRealm,
            AnqpElement::RoamingConsortium(_) => AnqpElementType::RoamingConsortium,
            AnqpElement::ThreeGppNetwork(_) => AnqpElementType::ThreeGppNetwork,
            AnqpElement::HsFriendlyName(_) => AnqpElementType::HsFriendlyName,
            AnqpElement::HsWanMetrics(_) => AnqpElementType::HsWanMetrics,
            AnqpElement::HsOsuProviders(_) => AnqpElementType::HsOsuProviders,
        }
    }
}

/// The decoded element set for one network, keyed by element type.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnqpElementMap {
    elements: HashMap<AnqpElementType, AnqpElement>,
}

impl AnqpElementMap {
    pub fn insert(&mut self, element: AnqpElement) {
        let _ = self.elements.insert(element.element_type(), element);
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn domain_name(&self) -> Option<&DomainNameElement> {
        match self.elements.get(&AnqpElementType::DomainName) {
            Some(AnqpElement::DomainName(element)) => Some(element),
            _ => None,
        }
    }

    pub fn nai_realm(&self) -> Option<&NaiRealmElement> {
        match self.elements.get(&AnqpElementType::NaiRealm) {
            Some(AnqpElement::NaiRealm(element)) => Some(element),
            _ => None,
        }
    }

    pub fn roaming_consortium(&self) -> Option<&RoamingConsortiumElement> {
        match self.elements.get(&AnqpElementType::RoamingConsortium) {
            Some(AnqpElement::RoamingConsortium(element)) => Some(element),
            _ => None,
        }
    }

    pub fn three_gpp_network(&self) -> Option<&ThreeGppNetworkElement> {
        match self.elements.get(&AnqpElementType::ThreeGppNetwork) {
            Some(AnqpElement::ThreeGppNetwork(element)) => Some(element),
            _ => None,
        }
    }

    pub fn hs_friendly_name(&self) -> Option<&HsFriendlyNameElement> {
        match self.elements.get(&AnqpElementType::HsFriendlyName) {
            Some(AnqpElement::HsFriendlyName(element)) => Some(element),
            _ => None,
        }
    }

    pub fn hs_wan_metrics(&self) -> Option<&HsWanMetricsElement> {
        match self.elements.get(&AnqpElementType::HsWanMetrics) {
            Some(AnqpElement::HsWanMetrics(element)) => Some(element),
            _ => None,
        }
    }

    pub fn hs_osu_providers(&self) -> Option<&HsOsuProvidersElement> {
        match self.elements.get(&AnqpElementType::HsOsuProviders) {
            Some(AnqpElement::HsOsuProviders(element)) => Some(element),
            _ => None,
        }
    }
}
