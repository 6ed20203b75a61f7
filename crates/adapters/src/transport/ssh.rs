// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SSH sessions over `ssh2`: SFTP file transfer plus a shell channel

use super::{
    dir_prefixes, resolve, Connector, RemoteFs, RemoteShell, TransportError, CONNECT_TIMEOUT,
};
use bkp_core::job::SshEndpoint;
use bkp_core::{RemoteEntry, RemoteListing};
use chrono::{DateTime, Utc};
use ssh2::{ExtendedData, Session, Sftp};
use std::fs::File;
use std::io::{Read, Write};
use std::net::TcpStream;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SshConnector {
    endpoint: SshEndpoint,
    timeout: Duration,
}

impl SshConnector {
    pub fn new(endpoint: SshEndpoint) -> Self {
        Self {
            endpoint,
            timeout: CONNECT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn authenticate(&self, session: &Session) -> Result<(), TransportError> {
        let user = &self.endpoint.user;
        let auth_err = |e: ssh2::Error| TransportError::Auth {
            user: user.clone(),
            message: e.to_string(),
        };

        if let Some(key) = &self.endpoint.private_key_file {
            session
                .userauth_pubkey_file(user, None, key, self.endpoint.passphrase.as_deref())
                .map_err(auth_err)?;
        } else if let Some(pass) = &self.endpoint.pass {
            session.userauth_password(user, pass).map_err(auth_err)?;
        } else {
            session.userauth_agent(user).map_err(auth_err)?;
        }

        if !session.authenticated() {
            return Err(TransportError::Auth {
                user: user.clone(),
                message: "server did not accept credentials".to_string(),
            });
        }
        Ok(())
    }
}

impl Connector for SshConnector {
    type Session = SshSession;

    fn address(&self) -> String {
        format!("{}:{}", self.endpoint.host, self.endpoint.port)
    }

    fn connect(&self) -> Result<SshSession, TransportError> {
        let addr = self.address();
        let connect_err = |message: String| TransportError::Connect {
            addr: addr.clone(),
            message,
        };

        let socket = resolve(&addr)?;
        let tcp = TcpStream::connect_timeout(&socket, self.timeout)
            .map_err(|e| connect_err(e.to_string()))?;

        let mut session = Session::new().map_err(|e| connect_err(e.to_string()))?;
        session.set_tcp_stream(tcp);
        session.set_timeout(self.timeout.as_millis() as u32);
        session.handshake().map_err(|e| connect_err(e.to_string()))?;
        self.authenticate(&session)?;
        // long-running scripts and transfers must not hit the handshake timeout
        session.set_timeout(0);

        let sftp = session
            .sftp()
            .map_err(|e| TransportError::remote("sftp", "subsystem", e))?;

        tracing::debug!(addr = %addr, "ssh connected");
        Ok(SshSession { session, sftp })
    }
}

pub struct SshSession {
    session: Session,
    sftp: Sftp,
}

impl RemoteListing for SshSession {
    type Error = TransportError;

    fn list(&mut self, dir: &str) -> Result<Vec<RemoteEntry>, TransportError> {
        let entries = self
            .sftp
            .readdir(Path::new(dir))
            .map_err(|e| TransportError::remote("list", dir, e))?;

        Ok(entries
            .into_iter()
            .filter_map(|(path, stat)| {
                let name = path.file_name()?.to_string_lossy().into_owned();
                if name == "." || name == ".." {
                    return None;
                }
                let modified = stat
                    .mtime
                    .and_then(|secs| DateTime::<Utc>::from_timestamp(secs as i64, 0))
                    .unwrap_or(DateTime::UNIX_EPOCH);
                Some(if stat.is_dir() {
                    RemoteEntry::dir(name, modified)
                } else {
                    RemoteEntry::file(name, stat.size.unwrap_or(0), modified)
                })
            })
            .collect())
    }

    fn delete(&mut self, path: &str) -> Result<(), TransportError> {
        self.sftp
            .unlink(Path::new(path))
            .map_err(|e| TransportError::remote("delete", path, e))
    }
}

impl RemoteFs for SshSession {
    fn download(&mut self, remote: &str, local: &Path) -> Result<u64, TransportError> {
        let mut source = self
            .sftp
            .open(Path::new(remote))
            .map_err(|e| TransportError::remote("download", remote, e))?;
        let mut file = File::create(local).map_err(|e| TransportError::local(local, e))?;
        match std::io::copy(&mut source, &mut file) {
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
        let mut target = self
            .sftp
            .create(Path::new(remote))
            .map_err(|e| TransportError::remote("upload", remote, e))?;
        let written = std::io::copy(&mut file, &mut target)
            .map_err(|e| TransportError::remote("upload", remote, e))?;
        drop(target);

        Ok(self
            .sftp
            .stat(Path::new(remote))
            .ok()
            .and_then(|stat| stat.size)
            .unwrap_or(written))
    }

    fn mkdir_all(&mut self, dir: &str) {
        for prefix in dir_prefixes(dir) {
            if let Err(e) = self.sftp.mkdir(Path::new(&prefix), 0o755) {
                tracing::trace!(dir = %prefix, error = %e, "mkdir ignored");
            }
        }
    }
}

impl RemoteShell for SshSession {
    fn run_script(&mut self, script: &str) -> Result<String, TransportError> {
        let shell_err = |e: &dyn std::fmt::Display| TransportError::remote("shell", "channel", e);

        let mut channel = self
            .session
            .channel_session()
            .map_err(|e| shell_err(&e))?;
        channel
            .handle_extended_data(ExtendedData::Merge)
            .map_err(|e| shell_err(&e))?;
        channel.shell().map_err(|e| shell_err(&e))?;

        channel
            .write_all(script.as_bytes())
            .and_then(|()| channel.write_all(b"exit\n"))
            .map_err(|e| shell_err(&e))?;
        channel.send_eof().map_err(|e| shell_err(&e))?;

        let output = read_output(&mut channel).map_err(|e| shell_err(&e))?;
        channel.wait_close().map_err(|e| shell_err(&e))?;

        let status = channel.exit_status().map_err(|e| shell_err(&e))?;
        if status != 0 {
            return Err(TransportError::Script { status, output });
        }
        Ok(output)
    }
}

/// Drain a script's merged output. Bytes that are not UTF-8 are replaced.
fn read_output<R: Read>(reader: &mut R) -> std::io::Result<String> {
    let mut raw = Vec::new();
    reader.read_to_end(&mut raw)?;
    Ok(String::from_utf8_lossy(&raw).into_owned())
}

#[cfg(test)]
#[path = "ssh_tests.rs"]
mod tests;
