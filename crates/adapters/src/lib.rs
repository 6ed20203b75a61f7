// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters for external I/O: file-transfer hosts, Telegram and callbacks

pub mod destination;
pub mod notify;
pub mod source;
pub mod traced;
pub mod transport;

#[cfg(test)]
mod test_http;

pub use destination::{
    ConfiguredDestination, DestinationAdapter, DestinationError, RemoteDestination,
    TelegramDestination,
};
pub use notify::{HttpNotifyAdapter, NotifyAdapter, NotifyError};
pub use source::{ConfiguredSource, FtpSource, SftpSource, SourceAdapter, SourceError};
pub use traced::{TracedDestinationAdapter, TracedNotifyAdapter, TracedSourceAdapter};
pub use transport::{
    Connector, FtpConnector, RemoteFs, RemoteShell, SshConnector, TransportError,
};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use destination::{DestinationCall, FakeDestinationAdapter};
#[cfg(any(test, feature = "test-support"))]
pub use notify::{FakeNotifyAdapter, NotifyCall};
#[cfg(any(test, feature = "test-support"))]
pub use source::{FakeSourceAdapter, SourceCall};
#[cfg(any(test, feature = "test-support"))]
pub use transport::{FakeRemote, FakeSession, TransportCall};
