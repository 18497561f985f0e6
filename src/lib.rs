// Copyright 2021 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

// The complexity of a separate struct doesn't seem universally better than having many arguments
#![allow(clippy::too_many_arguments)]

pub mod anqp;
pub mod carrier;
pub mod client;
pub mod config_management;
pub mod keystore;
pub mod persist;
pub mod service;
pub mod telemetry;
pub mod util;
