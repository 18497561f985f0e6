// Copyright 2023 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use futures::channel::mpsc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::warn;

/// Events recorded by the provider-management pipeline. Drained and reported
/// by the platform metrics service outside this crate.
#[derive(Clone, Debug, PartialEq)]
pub enum TelemetryEvent {
    ProviderInstallAttempt,
    ProviderInstallSuccess,
    ProviderUninstallAttempt,
    ProviderUninstallSuccess,
    ProviderWithSelfSignedRootCa,
    ProviderWithNoRootCa,
    ProviderSubscriptionExpired,
    ProviderCount { providers: usize },
}

/// Fire-and-forget event sender. Drops events instead of blocking when the
/// channel is full, logging the first drop until the channel drains again.
#[derive(Clone, Debug)]
pub struct TelemetrySender {
    sender: Arc<Mutex<mpsc::Sender<TelemetryEvent>>>,
    sender_is_blocked: Arc<AtomicBool>,
}

impl TelemetrySender {
    pub fn new(sender: mpsc::Sender<TelemetryEvent>) -> Self {
        Self {
            sender: Arc::new(Mutex::new(sender)),
            sender_is_blocked: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn send(&self, event: TelemetryEvent) {
        let Ok(mut sender) = self.sender.lock() else {
            return;
        };
        match sender.try_send(event) {
            Ok(()) => {
                // Indicate that sender is in a good state
                self.sender_is_blocked.store(false, Ordering::Relaxed);
            }
            Err(_) => {
                // Log at most once per stretch of blockage
                if !self.sender_is_blocked.swap(true, Ordering::Relaxed) {
                    warn!("TelemetrySender dropped an event because the channel is full");
                }
            }
        }
    }
}
