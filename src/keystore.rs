// Copyright 2022 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use crate::config_management::passpoint_config::{Certificate, PrivateKey};

/// Certificate store collaborator. Calls are synchronous and may block
/// briefly; failure is a returned boolean, never a panic or timeout.
pub trait KeyStore: Send + Sync {
    /// Installs a CA certificate under the alias. Returns false on failure.
    fn put_ca_cert(&self, alias: &str, cert: &Certificate) -> bool;
    /// Installs a client private key together with its certificate chain
    /// under the alias. Returns false on failure.
    fn put_user_priv_key_and_certs(
        &self,
        alias: &str,
        key: &PrivateKey,
        certs: &[Certificate],
    ) -> bool;
    /// Removes whatever is stored under the alias. Removing an absent alias
    /// is not an error.
    fn remove_entry(&self, alias: &str);
}
