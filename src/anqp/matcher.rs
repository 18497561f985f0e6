// Copyright 2022 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Pure predicates matching one decoded ANQP element against one credential
//! criterion. All functions treat a missing element as a non-match.

use crate::anqp::{
    DomainNameElement, NaiRealmElement, RoamingConsortiumElement, ThreeGppNetworkElement,
};

const IMSI_MAX_DIGITS: usize = 15;
// An IMSI prefix must at least cover the MCC and a 2-digit MNC.
const IMSI_MIN_DIGITS: usize = 5;

/// IMSI from a SIM credential: either a full IMSI or a `<prefix>*` wildcard
/// covering every subscriber of one carrier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImsiParameter {
    imsi: String,
    prefix: bool,
}

impl ImsiParameter {
    /// Parses the IMSI field of a SIM credential. Returns None for anything
    /// that is not 5-15 digits with an optional trailing `*`.
    pub fn parse(imsi: &str) -> Option<Self> {
        let (digits, prefix) = match imsi.strip_suffix('*') {
            Some(stripped) => (stripped, true),
            None => (imsi, false),
        };
        if digits.len() < IMSI_MIN_DIGITS || digits.len() > IMSI_MAX_DIGITS {
            return None;
        }
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some(Self { imsi: digits.to_string(), prefix })
    }

    pub fn is_full_imsi(&self) -> bool {
        !self.prefix
    }

    pub fn imsi(&self) -> &str {
        &self.imsi
    }

    /// True when an advertised MCC-MNC is consistent with this parameter: a
    /// wildcard compares over the shared prefix region, a full IMSI must
    /// start with the MCC-MNC.
    pub fn matches_mcc_mnc(&self, mcc_mnc: &str) -> bool {
        if self.prefix {
            let n = self.imsi.len().min(mcc_mnc.len());
            self.imsi.as_bytes()[..n] == mcc_mnc.as_bytes()[..n]
        } else {
            self.imsi.starts_with(mcc_mnc)
        }
    }

    /// True when an installed SIM's full IMSI belongs to this parameter.
    pub fn matches_imsi(&self, imsi: &str) -> bool {
        if self.prefix {
            imsi.starts_with(self.imsi.as_str())
        } else {
            self.imsi == imsi
        }
    }
}

/// Matches the Domain Name element against a provider FQDN, or, for SIM
/// credentials, against the 3GPP network domain form
/// `wlan.mnc<MNC>.mcc<MCC>.3gppnetwork.org`.
pub fn match_domain_name(
    element: Option<&DomainNameElement>,
    fqdn: &str,
    imsi_param: Option<&ImsiParameter>,
    sim_imsi: Option<&str>,
) -> bool {
    let Some(element) = element else {
        return false;
    };
    for domain in &element.domains {
        if !fqdn.is_empty() && domain.eq_ignore_ascii_case(fqdn) {
            return true;
        }
        let (Some(imsi_param), Some(sim_imsi)) = (imsi_param, sim_imsi) else {
            continue;
        };
        if let Some(mcc_mnc) = mcc_mnc_from_domain(domain) {
            if imsi_param.matches_mcc_mnc(&mcc_mnc) && sim_imsi.starts_with(mcc_mnc.as_str()) {
                return true;
            }
        }
    }
    false
}

/// Extracts `<mcc><mnc>` from a 3GPP network domain. Returns None for any
/// other domain shape, including non-digit MCC/MNC segments.
fn mcc_mnc_from_domain(domain: &str) -> Option<String> {
    let labels: Vec<&str> = domain.split('.').collect();
    let n = labels.len();
    if n < 4 {
        return None;
    }
    if !labels[n - 2].eq_ignore_ascii_case("3gppnetwork") || !labels[n - 1].eq_ignore_ascii_case("org")
    {
        return None;
    }
    let mut mcc = None;
    let mut mnc = None;
    for label in &labels[..n - 2] {
        let lower = label.to_ascii_lowercase();
        if let Some(digits) = lower.strip_prefix("mcc") {
            if digits.len() != 3 || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            mcc = Some(digits.to_string());
        } else if let Some(digits) = lower.strip_prefix("mnc") {
            if !(2..=3).contains(&digits.len()) || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            mnc = Some(digits.to_string());
        }
    }
    match (mcc, mnc) {
        (Some(mcc), Some(mnc)) => Some(format!("{mcc}{mnc}")),
        _ => None,
    }
}

/// Matches a provider's OI list against the Roaming Consortium element.
/// `match_all = false` is the Any-OI semantic (non-empty intersection),
/// `match_all = true` the All-OI semantic (subset).
pub fn match_roaming_consortium(
    element: Option<&RoamingConsortiumElement>,
    provider_ois: &[u64],
    match_all: bool,
) -> bool {
    let Some(element) = element else {
        return false;
    };
    if provider_ois.is_empty() {
        return false;
    }
    if match_all {
        provider_ois.iter().all(|oi| element.ois.contains(oi))
    } else {
        provider_ois.iter().any(|oi| element.ois.contains(oi))
    }
}

/// Matches a credential realm against the NAI Realm element. A realm-string
/// match alone is sufficient; EAP method and inner-auth disagreement is not
/// disqualifying, since the infrastructure provider may differ from the
/// identity provider.
pub fn match_nai_realm(element: Option<&NaiRealmElement>, realm: &str) -> bool {
    let Some(element) = element else {
        return false;
    };
    if realm.is_empty() {
        return false;
    }
    element
        .realm_data
        .iter()
        .any(|data| data.realms.iter().any(|advertised| advertised.eq_ignore_ascii_case(realm)))
}

/// Matches a SIM credential against the 3GPP Cellular Network element: some
/// advertised PLMN must agree with the profile IMSI parameter and be a
/// literal prefix of the installed SIM's IMSI.
pub fn match_three_gpp_network(
    element: Option<&ThreeGppNetworkElement>,
    imsi_param: Option<&ImsiParameter>,
    sim_imsi: Option<&str>,
) -> bool {
    let Some(element) = element else {
        return false;
    };
    let (Some(imsi_param), Some(sim_imsi)) = (imsi_param, sim_imsi) else {
        return false;
    };
    element.networks.iter().flat_map(|network| &network.plmns).any(|plmn| {
        (5..=6).contains(&plmn.len())
            && plmn.bytes().all(|b| b.is_ascii_digit())
            && imsi_param.matches_mcc_mnc(plmn)
            && sim_imsi.starts_with(plmn.as_str())
    })
}
