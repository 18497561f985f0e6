// Copyright 2024 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! The serialized event loop. Every mutation of the provider map and ANQP
//! cache funnels through one request stream, including the asynchronous ANQP
//! completions arriving from the radio layer; nothing here needs a lock.

use crate::anqp::AnqpElementMap;
use crate::client::types::Bssid;
use crate::config_management::passpoint_config::PasspointConfiguration;
use crate::config_management::provider_manager::{PasspointManager, ProviderTarget};
use futures::channel::{mpsc, oneshot};
use futures::StreamExt;
use tracing::{info, warn};

pub enum PasspointRequest {
    AddProvider {
        config: PasspointConfiguration,
        creator_uid: u32,
        package_name: String,
        is_from_suggestion: bool,
        is_trusted: bool,
        responder: oneshot::Sender<bool>,
    },
    RemoveProvider {
        calling_uid: u32,
        privileged: bool,
        target: ProviderTarget,
        responder: oneshot::Sender<bool>,
    },
    AnqpResponse {
        bssid: Bssid,
        /// None reports a failed query.
        elements: Option<AnqpElementMap>,
    },
    SweepCache,
    PermissionChanged {
        package_name: String,
        allowed: bool,
    },
}

/// Handle used by the lower radio layer to funnel ANQP completions onto the
/// policy loop.
#[derive(Clone)]
pub struct AnqpResponseSender {
    sender: mpsc::Sender<PasspointRequest>,
}

impl AnqpResponseSender {
    pub fn new(sender: mpsc::Sender<PasspointRequest>) -> Self {
        Self { sender }
    }

    pub fn send_anqp_response(
        &mut self,
        bssid: Bssid,
        elements: Option<AnqpElementMap>,
    ) -> Result<(), anyhow::Error> {
        Ok(self.sender.try_send(PasspointRequest::AnqpResponse { bssid, elements })?)
    }
}

/// Drains requests one at a time until every sender is gone.
pub async fn serve_passpoint_requests(
    mut manager: PasspointManager,
    mut receiver: mpsc::Receiver<PasspointRequest>,
) {
    while let Some(request) = receiver.next().await {
        match request {
            PasspointRequest::AddProvider {
                config,
                creator_uid,
                package_name,
                is_from_suggestion,
                is_trusted,
                responder,
            } => {
                let result = manager.add_or_update_provider(
                    config,
                    creator_uid,
                    &package_name,
                    is_from_suggestion,
                    is_trusted,
                );
                if responder.send(result).is_err() {
                    warn!("add-provider requester went away before the result was sent");
                }
            }
            PasspointRequest::RemoveProvider { calling_uid, privileged, target, responder } => {
                let result = manager.remove_provider(calling_uid, privileged, target);
                if responder.send(result).is_err() {
                    warn!("remove-provider requester went away before the result was sent");
                }
            }
            PasspointRequest::AnqpResponse { bssid, elements } => {
                manager.on_anqp_response(bssid, elements);
            }
            PasspointRequest::SweepCache => {
                manager.sweep_cache();
            }
            PasspointRequest::PermissionChanged { package_name, allowed } => {
                manager.on_app_permission_changed(&package_name, allowed);
            }
        }
    }
    info!("request stream ended, exiting Passpoint service loop");
}
