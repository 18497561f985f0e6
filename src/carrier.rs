// Copyright 2022 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

/// Carrier id of a profile whose SIM has not been resolved.
pub const UNKNOWN_CARRIER_ID: i32 = -1;

/// SIM and carrier resolver collaborator, backed by the telephony stack.
pub trait WifiCarrierInfo: Send + Sync {
    /// Resolves a profile IMSI (full or `<prefix>*` wildcard) against the
    /// installed SIMs. Returns the full IMSI and carrier id of the first
    /// matching SIM.
    fn get_matching_imsi_carrier_id(&self, imsi: &str) -> Option<(String, i32)>;
    /// Returns the full IMSI of an installed SIM belonging to the carrier.
    fn get_matching_imsi(&self, carrier_id: i32) -> Option<String>;
}
