// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Backup daemon lifecycle: startup, scheduling and graceful shutdown

pub mod lifecycle;

pub use lifecycle::{startup, Daemon, LifecycleError, LOCK_FILE_NAME};
