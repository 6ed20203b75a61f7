// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! FTP sessions over `suppaftp`

use super::{dir_prefixes, resolve, Connector, RemoteFs, TransportError, CONNECT_TIMEOUT};
use bkp_core::job::FtpEndpoint;
use bkp_core::{RemoteEntry, RemoteListing};
use chrono::{DateTime, Utc};
use std::fs::File;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use suppaftp::types::FileType;
use suppaftp::{FtpError, FtpStream};

#[derive(Debug, Clone)]
pub struct FtpConnector {
    endpoint: FtpEndpoint,
    timeout: Duration,
}

impl FtpConnector {
    pub fn new(endpoint: FtpEndpoint) -> Self {
        Self {
            endpoint,
            timeout: CONNECT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Connector for FtpConnector {
    type Session = FtpSession;

    fn address(&self) -> String {
        format!("{}:{}", self.endpoint.host, self.endpoint.port)
    }

    fn connect(&self) -> Result<FtpSession, TransportError> {
        let addr = self.address();
        let socket = resolve(&addr)?;
        let mut stream =
            FtpStream::connect_timeout(socket, self.timeout).map_err(|e| TransportError::Connect {
                addr: addr.clone(),
                message: e.to_string(),
            })?;

        stream
            .login(&self.endpoint.user, &self.endpoint.pass)
            .map_err(|e| TransportError::Auth {
                user: self.endpoint.user.clone(),
                message: e.to_string(),
            })?;
        stream
            .transfer_type(FileType::Binary)
            .map_err(|e| TransportError::remote("type", "I", e))?;

        tracing::debug!(addr = %addr, "ftp connected");
        Ok(FtpSession { stream })
    }
}

pub struct FtpSession {
    stream: FtpStream,
}

impl RemoteListing for FtpSession {
    type Error = TransportError;

    fn list(&mut self, dir: &str) -> Result<Vec<RemoteEntry>, TransportError> {
        let lines = self
            .stream
            .list(Some(dir))
            .map_err(|e| TransportError::remote("list", dir, e))?;

        let entries = lines
            .iter()
            .filter_map(|line| match suppaftp::list::File::from_str(line) {
                Ok(file) => Some(file),
                Err(e) => {
                    tracing::trace!(line = %line, error = %e, "skipping unparsable listing line");
                    None
                }
            })
            .filter(|file| file.name() != "." && file.name() != "..")
            .map(|file| {
                let modified = DateTime::<Utc>::from(file.modified());
                if file.is_directory() {
                    RemoteEntry::dir(file.name(), modified)
                } else {
                    RemoteEntry::file(file.name(), file.size() as u64, modified)
                }
            })
            .collect();
        Ok(entries)
    }

    fn delete(&mut self, path: &str) -> Result<(), TransportError> {
        self.stream
            .rm(path)
            .map_err(|e| TransportError::remote("delete", path, e))
    }
}

impl RemoteFs for FtpSession {
    fn download(&mut self, remote: &str, local: &Path) -> Result<u64, TransportError> {
        let mut file = File::create(local).map_err(|e| TransportError::local(local, e))?;
        let result = self.stream.retr(remote, |reader| {
            std::io::copy(reader, &mut file).map_err(FtpError::ConnectionError)
        });
        match result {
            Ok(bytes) => Ok(bytes),
            Err(e) => {
                drop(file);
                let _ = std::fs::remove_file(local);
                Err(TransportError::remote("download", remote, e))
            }
        }
    }

    fn upload(&mut self, local: &Path, remote: &str) -> Result<u64, TransportError> {
        let mut file = File::open(local).map_err(|e| TransportError::local(local, e))?;
        let written = self
            .stream
            .put_file(remote, &mut file)
            .map_err(|e| TransportError::remote("upload", remote, e))?;
        // SIZE is optional in RFC 3659; fall back to the transferred count
        Ok(self
            .stream
            .size(remote)
            .map(|size| size as u64)
            .unwrap_or(written))
    }

    fn mkdir_all(&mut self, dir: &str) {
        for prefix in dir_prefixes(dir) {
            if let Err(e) = self.stream.mkdir(&prefix) {
                tracing::trace!(dir = %prefix, error = %e, "mkdir ignored");
            }
        }
    }
}

impl Drop for FtpSession {
    fn drop(&mut self) {
        let _ = self.stream.quit();
    }
}
