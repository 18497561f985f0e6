// Copyright 2022 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use crate::anqp::matcher::ImsiParameter;
use crate::carrier::UNKNOWN_CARRIER_ID;
use crate::client::types::{EapMethod, MeteredOverride};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Reasons a configuration is rejected before a provider is built from it.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("home SP FQDN is missing")]
    MissingFqdn,
    #[error("home SP friendly name is missing")]
    MissingFriendlyName,
    #[error("credential realm is missing")]
    MissingRealm,
    #[error("user credential is missing a username or password")]
    IncompleteUserCredential,
    #[error("user credential must use EAP-TTLS")]
    InvalidUserEapMethod,
    #[error("certificate credential is missing a fingerprint, chain, or key")]
    IncompleteCertCredential,
    #[error("SIM credential IMSI is malformed")]
    MalformedImsi,
}

/// Home service provider block of a profile.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomeSp {
    pub fqdn: String,
    pub friendly_name: String,
    /// OIs announced to roaming partners; used for the Roaming attempt.
    pub roaming_consortium_ois: Vec<u64>,
    /// Home-OI lists; a match against either promotes the AP to Home.
    pub match_any_ois: Vec<u64>,
    pub match_all_ois: Vec<u64>,
    pub other_home_partners: Vec<String>,
}

/// A certificate as it crosses this crate's boundary: DER bytes plus the
/// identity fields the engine needs. Parsing happens in the supplier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    pub subject: String,
    pub issuer: String,
    pub der: Vec<u8>,
}

impl Certificate {
    pub fn is_self_signed(&self) -> bool {
        self.subject == self.issuer
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateKey {
    pub algorithm: String,
    pub der: Vec<u8>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InnerAuthMethod {
    Pap,
    MsChap,
    MsChapV2,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCredential {
    pub username: String,
    /// Base64-encoded, as carried in the PPS-MO.
    pub password: String,
    pub eap_type: EapMethod,
    pub non_eap_inner_method: InnerAuthMethod,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateCredential {
    pub cert_sha256_fingerprint: Vec<u8>,
    pub client_certificate_chain: Vec<Certificate>,
    pub client_private_key: Option<PrivateKey>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimEapMethod {
    Sim,
    Aka,
    AkaPrime,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimCredential {
    /// Full IMSI or `<prefix>*` wildcard.
    pub imsi: String,
    pub eap_type: SimEapMethod,
}

/// The three credential shapes a profile may carry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CredentialKind {
    User(UserCredential),
    Certificate(CertificateCredential),
    Sim(SimCredential),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub realm: String,
    pub ca_certificates: Vec<Certificate>,
    pub check_aaa_server_cert_status: bool,
    pub kind: CredentialKind,
}

/// One stored or suggested Passpoint profile. Two configurations are equal by
/// full field value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PasspointConfiguration {
    pub home_sp: HomeSp,
    pub credential: Credential,
    pub aaa_server_trusted_names: Vec<String>,
    pub carrier_id: i32,
    pub subscription_expiration_time_millis: Option<i64>,
    /// Present on R2+ profiles provisioned through OSU.
    pub update_identifier: Option<u32>,
    /// Trust root for the remediation server of an R2 profile.
    pub remediation_ca_certificate: Option<Certificate>,
    pub is_mac_randomization_enabled: bool,
    pub is_autojoin_enabled: bool,
    pub metered_override: MeteredOverride,
}

impl PasspointConfiguration {
    pub fn new(home_sp: HomeSp, credential: Credential) -> Self {
        Self {
            home_sp,
            credential,
            aaa_server_trusted_names: Vec::new(),
            carrier_id: UNKNOWN_CARRIER_ID,
            subscription_expiration_time_millis: None,
            update_identifier: None,
            remediation_ca_certificate: None,
            is_mac_randomization_enabled: true,
            is_autojoin_enabled: true,
            metered_override: MeteredOverride::None,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.home_sp.fqdn.is_empty() {
            return Err(ConfigError::MissingFqdn);
        }
        if self.home_sp.friendly_name.is_empty() {
            return Err(ConfigError::MissingFriendlyName);
        }
        if self.credential.realm.is_empty() {
            return Err(ConfigError::MissingRealm);
        }
        match &self.credential.kind {
            CredentialKind::User(user) => {
                if user.username.is_empty() || user.password.is_empty() {
                    return Err(ConfigError::IncompleteUserCredential);
                }
                // A username/password credential cannot drive EAP-TLS.
                if user.eap_type != EapMethod::Ttls {
                    return Err(ConfigError::InvalidUserEapMethod);
                }
            }
            CredentialKind::Certificate(cert) => {
                if cert.cert_sha256_fingerprint.len() != 32
                    || cert.client_certificate_chain.is_empty()
                    || cert.client_private_key.is_none()
                {
                    return Err(ConfigError::IncompleteCertCredential);
                }
            }
            CredentialKind::Sim(sim) => {
                if ImsiParameter::parse(&sim.imsi).is_none() {
                    return Err(ConfigError::MalformedImsi);
                }
            }
        }
        Ok(())
    }

    /// True once the subscription's expiration time is in the past. Profiles
    /// without an expiration never expire.
    pub fn is_expired(&self, now_utc_millis: i64) -> bool {
        self.subscription_expiration_time_millis.is_some_and(|expiry| expiry <= now_utc_millis)
    }

    /// Stable identifier tying persisted networks back to this profile: the
    /// FQDN plus a digest of the credential content. Distinct realms under
    /// one FQDN stay distinct; the id is not unique across providers
    /// otherwise.
    pub fn unique_id(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.credential.realm.as_bytes());
        match &self.credential.kind {
            CredentialKind::User(user) => {
                hasher.update([0u8]);
                hasher.update(user.username.as_bytes());
                hasher.update(user.password.as_bytes());
            }
            CredentialKind::Certificate(cert) => {
                hasher.update([1u8]);
                hasher.update(&cert.cert_sha256_fingerprint);
            }
            CredentialKind::Sim(sim) => {
                hasher.update([2u8]);
                hasher.update(sim.imsi.as_bytes());
                hasher.update([sim.eap_type as u8]);
            }
        }
        let digest = hasher.finalize();
        format!("{}_{}", self.home_sp.fqdn, hex::encode(&digest[..8]))
    }
}

/// On-disk form of one provider, exchanged with the provider storage
/// collaborator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PersistentProviderData {
    pub provider_id: u64,
    pub creator_uid: u32,
    pub package_name: String,
    pub is_from_suggestion: bool,
    pub is_trusted: bool,
    pub has_ever_connected: bool,
    pub config: PasspointConfiguration,
    pub ca_certificate_aliases: Vec<String>,
    pub client_private_key_and_cert_alias: Option<String>,
    pub remediation_ca_certificate_alias: Option<String>,
}
