// Copyright 2022 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Generators and builders shared across unit tests.

pub mod fakes;

use crate::anqp::{
    AnqpElement, CellularNetwork, DomainNameElement, EapMethodEntry, HsWanMetricsElement,
    LinkStatus, NaiRealmData, NaiRealmElement, RoamingConsortiumElement, ThreeGppNetworkElement,
};
use crate::client::types::{Bssid, EapMethod, ScanResult};
use crate::config_management::passpoint_config::{
    Certificate, CertificateCredential, Credential, CredentialKind, HomeSp, InnerAuthMethod,
    PasspointConfiguration, PrivateKey, SimCredential, SimEapMethod, UserCredential,
};
use rand::distributions::{Alphanumeric, DistString as _};
use rand::Rng;

pub fn generate_string() -> String {
    Alphanumeric.sample_string(&mut rand::thread_rng(), 20)
}

pub fn generate_random_bssid() -> Bssid {
    Bssid(rand::thread_rng().gen::<[u8; 6]>())
}

/// Base64 form of "password3", as a PPS-MO carries it.
const TEST_ENCODED_PASSWORD: &str = "cGFzc3dvcmQz";

fn test_home_sp(fqdn: &str) -> HomeSp {
    HomeSp {
        fqdn: fqdn.to_string(),
        friendly_name: "Friendly Name".to_string(),
        roaming_consortium_ois: vec![0x1234, 0x2345],
        match_any_ois: Vec::new(),
        match_all_ois: Vec::new(),
        other_home_partners: Vec::new(),
    }
}

pub fn test_user_config(fqdn: &str, realm: &str) -> PasspointConfiguration {
    PasspointConfiguration::new(
        test_home_sp(fqdn),
        Credential {
            realm: realm.to_string(),
            ca_certificates: Vec::new(),
            check_aaa_server_cert_status: false,
            kind: CredentialKind::User(UserCredential {
                username: "username".to_string(),
                password: TEST_ENCODED_PASSWORD.to_string(),
                eap_type: EapMethod::Ttls,
                non_eap_inner_method: InnerAuthMethod::MsChapV2,
            }),
        },
    )
}

pub fn test_cert_config(fqdn: &str, realm: &str) -> PasspointConfiguration {
    PasspointConfiguration::new(
        test_home_sp(fqdn),
        Credential {
            realm: realm.to_string(),
            ca_certificates: Vec::new(),
            check_aaa_server_cert_status: false,
            kind: CredentialKind::Certificate(CertificateCredential {
                cert_sha256_fingerprint: vec![0x5a; 32],
                client_certificate_chain: vec![fake_client_cert("client")],
                client_private_key: Some(fake_private_key("client")),
            }),
        },
    )
}

pub fn test_sim_config(fqdn: &str, imsi: &str) -> PasspointConfiguration {
    PasspointConfiguration::new(
        test_home_sp(fqdn),
        Credential {
            realm: "sim-realm.com".to_string(),
            ca_certificates: Vec::new(),
            check_aaa_server_cert_status: false,
            kind: CredentialKind::Sim(SimCredential {
                imsi: imsi.to_string(),
                eap_type: SimEapMethod::Sim,
            }),
        },
    )
}

/// A root certificate; subject and issuer agree, as self-signed roots do.
pub fn fake_ca_cert(name: &str) -> Certificate {
    Certificate {
        subject: format!("CN={name}"),
        issuer: format!("CN={name}"),
        der: name.as_bytes().to_vec(),
    }
}

pub fn fake_client_cert(name: &str) -> Certificate {
    Certificate {
        subject: format!("CN={name}"),
        issuer: "CN=issuing-ca".to_string(),
        der: name.as_bytes().to_vec(),
    }
}

pub fn fake_private_key(name: &str) -> PrivateKey {
    PrivateKey { algorithm: "RSA".to_string(), der: name.as_bytes().to_vec() }
}

pub fn test_scan_result(ssid: &str) -> ScanResult {
    ScanResult {
        ssid: ssid.to_string(),
        bssid: Bssid([0x0a, 0x22, 0x33, 0x44, 0x55, 0x66]),
        hessid: 0x1000,
        anqp_domain_id: 0,
        flags: 0,
        information_elements: Vec::new(),
    }
}

pub fn domain_name_element(domains: &[&str]) -> AnqpElement {
    AnqpElement::DomainName(DomainNameElement {
        domains: domains.iter().map(|d| d.to_string()).collect(),
    })
}

pub fn nai_realm_element(realm: &str) -> AnqpElement {
    AnqpElement::NaiRealm(NaiRealmElement {
        realm_data: vec![NaiRealmData {
            realms: vec![realm.to_string()],
            eap_methods: vec![EapMethodEntry { eap_method_id: 21, inner_auth_methods: vec![4] }],
        }],
    })
}

pub fn roaming_consortium_element(ois: &[u64]) -> AnqpElement {
    AnqpElement::RoamingConsortium(RoamingConsortiumElement { ois: ois.to_vec() })
}

pub fn three_gpp_network_element(plmns: &[&str]) -> AnqpElement {
    AnqpElement::ThreeGppNetwork(ThreeGppNetworkElement {
        networks: vec![CellularNetwork { plmns: plmns.iter().map(|p| p.to_string()).collect() }],
    })
}

pub fn wan_metrics_element(status: LinkStatus) -> AnqpElement {
    AnqpElement::HsWanMetrics(HsWanMetricsElement {
        status,
        symmetric: false,
        capped: false,
        downlink_speed_kbps: 100_000,
        uplink_speed_kbps: 50_000,
    })
}
