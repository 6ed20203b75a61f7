// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Blocking file-transfer sessions
//!
//! FTP and SFTP are driven through synchronous client libraries. Async
//! adapters open a session inside `spawn_blocking` and drive it there.

mod ftp;
mod ssh;

pub use ftp::{FtpConnector, FtpSession};
pub use ssh::{SshConnector, SshSession};

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeRemote, FakeSession, TransportCall};

use bkp_core::RemoteListing;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Dial and handshake timeout for every transport
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connect to {addr} failed: {message}")]
    Connect { addr: String, message: String },
    #[error("authentication as {user:?} failed: {message}")]
    Auth { user: String, message: String },
    #[error("{op} {path} failed: {message}")]
    Remote {
        op: &'static str,
        path: String,
        message: String,
    },
    #[error("local file {path}: {source}")]
    Local {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("remote script exited with status {status}: {output}")]
    Script { status: i32, output: String },
}

impl TransportError {
    pub(crate) fn remote(op: &'static str, path: &str, err: impl std::fmt::Display) -> Self {
        TransportError::Remote {
            op,
            path: path.to_string(),
            message: err.to_string(),
        }
    }

    pub(crate) fn local(path: &Path, source: std::io::Error) -> Self {
        TransportError::Local {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// An authenticated file-transfer session
pub trait RemoteFs: RemoteListing<Error = TransportError> + Send {
    /// Copy `remote` into the local file `local`, returning bytes written
    fn download(&mut self, remote: &str, local: &Path) -> Result<u64, TransportError>;

    /// Copy `local` to `remote`, returning the size the server reports
    fn upload(&mut self, local: &Path, remote: &str) -> Result<u64, TransportError>;

    /// Create `dir` and every missing parent. Failures are ignored since
    /// most of them mean the directory already exists.
    fn mkdir_all(&mut self, dir: &str);
}

/// Command execution on the remote host
pub trait RemoteShell: Send {
    /// Feed `script` to a login shell and return its combined output.
    /// A non-zero exit status is an error.
    fn run_script(&mut self, script: &str) -> Result<String, TransportError>;
}

/// Opens sessions to one configured endpoint
pub trait Connector: Clone + Send + Sync + 'static {
    type Session: Send + 'static;

    /// `host:port` for logs
    fn address(&self) -> String;

    fn connect(&self) -> Result<Self::Session, TransportError>;
}

/// Every cumulative prefix of `dir`: `/a/b` yields `/a`, `/a/b`
pub(crate) fn dir_prefixes(dir: &str) -> Vec<String> {
    let absolute = dir.starts_with('/');
    let mut prefixes = Vec::new();
    let mut current = String::new();
    for segment in dir.split('/').filter(|s| !s.is_empty()) {
        if !current.is_empty() || absolute {
            current.push('/');
        }
        current.push_str(segment);
        prefixes.push(current.clone());
    }
    prefixes
}

pub(crate) fn resolve(addr: &str) -> Result<SocketAddr, TransportError> {
    let connect_err = |message: String| TransportError::Connect {
        addr: addr.to_string(),
        message,
    };
    addr.to_socket_addrs()
        .map_err(|e| connect_err(e.to_string()))?
        .next()
        .ok_or_else(|| connect_err("no address resolved".to_string()))
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
