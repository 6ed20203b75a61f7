// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory remote host for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{Connector, RemoteFs, RemoteShell, TransportError};
use bkp_core::{RemoteEntry, RemoteListing};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Recorded transport call
#[derive(Debug, Clone, PartialEq)]
pub enum TransportCall {
    Connect,
    List { dir: String },
    Delete { path: String },
    Download { remote: String, local: PathBuf },
    Upload { local: PathBuf, remote: String },
    MkdirAll { dir: String },
    Script { script: String },
}

#[derive(Debug, Clone)]
struct FakeFile {
    data: Vec<u8>,
    modified: DateTime<Utc>,
}

#[derive(Default)]
struct RemoteState {
    files: BTreeMap<String, FakeFile>,
    dirs: BTreeSet<String>,
    calls: Vec<TransportCall>,
    connect_error: Option<String>,
    script_status: i32,
    failing_uploads: HashSet<String>,
    failing_deletes: HashSet<String>,
    upload_time: Option<DateTime<Utc>>,
}

impl RemoteState {
    fn add_parents(&mut self, path: &str) {
        let mut current = parent_of(path);
        while let Some(dir) = current {
            self.dirs.insert(dir.to_string());
            current = parent_of(dir);
        }
    }
}

fn parent_of(path: &str) -> Option<&str> {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(0) if trimmed.len() > 1 => Some("/"),
        Some(0) | None => None,
        Some(idx) => Some(&trimmed[..idx]),
    }
}

fn normalize_dir(dir: &str) -> &str {
    match dir.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}

/// Fake remote host. Clones share state, so a test keeps one handle while
/// adapters connect through another.
#[derive(Clone, Default)]
pub struct FakeRemote {
    state: Arc<Mutex<RemoteState>>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RemoteState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Place a file on the remote
    pub fn add_file(&self, path: &str, data: &[u8], modified: DateTime<Utc>) {
        let mut state = self.lock();
        state.add_parents(path);
        state.files.insert(
            path.to_string(),
            FakeFile {
                data: data.to_vec(),
                modified,
            },
        );
    }

    pub fn add_dir(&self, path: &str) {
        let mut state = self.lock();
        state.add_parents(path);
        state.dirs.insert(normalize_dir(path).to_string());
    }

    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.lock().files.get(path).map(|f| f.data.clone())
    }

    /// Paths of every stored file, sorted
    pub fn files(&self) -> Vec<String> {
        self.lock().files.keys().cloned().collect()
    }

    pub fn has_dir(&self, path: &str) -> bool {
        self.lock().dirs.contains(normalize_dir(path))
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<TransportCall> {
        self.lock().calls.clone()
    }

    /// Scripts fed to the shell, in order
    pub fn scripts(&self) -> Vec<String> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                TransportCall::Script { script } => Some(script.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn fail_connect(&self, message: &str) {
        self.lock().connect_error = Some(message.to_string());
    }

    /// Exit status reported for every script
    pub fn set_script_status(&self, status: i32) {
        self.lock().script_status = status;
    }

    pub fn fail_upload(&self, remote: &str) {
        self.lock().failing_uploads.insert(remote.to_string());
    }

    pub fn fail_delete(&self, path: &str) {
        self.lock().failing_deletes.insert(path.to_string());
    }

    /// Modification time stamped on uploaded files
    pub fn set_upload_time(&self, at: DateTime<Utc>) {
        self.lock().upload_time = Some(at);
    }
}

impl Connector for FakeRemote {
    type Session = FakeSession;

    fn address(&self) -> String {
        "fake:0".to_string()
    }

    fn connect(&self) -> Result<FakeSession, TransportError> {
        let mut state = self.lock();
        state.calls.push(TransportCall::Connect);
        if let Some(message) = &state.connect_error {
            return Err(TransportError::Connect {
                addr: "fake:0".to_string(),
                message: message.clone(),
            });
        }
        Ok(FakeSession {
            remote: self.clone(),
        })
    }
}

/// Session handed out by [`FakeRemote`]
pub struct FakeSession {
    remote: FakeRemote,
}

impl RemoteListing for FakeSession {
    type Error = TransportError;

    fn list(&mut self, dir: &str) -> Result<Vec<RemoteEntry>, TransportError> {
        let mut state = self.remote.lock();
        state.calls.push(TransportCall::List {
            dir: dir.to_string(),
        });

        let dir = normalize_dir(dir);
        if !state.dirs.contains(dir) {
            return Err(TransportError::remote("list", dir, "no such directory"));
        }

        let mut entries: Vec<RemoteEntry> = state
            .files
            .iter()
            .filter(|(path, _)| parent_of(path) == Some(dir))
            .map(|(path, file)| {
                let name = path.rsplit('/').next().unwrap_or(path.as_str());
                RemoteEntry::file(name, file.data.len() as u64, file.modified)
            })
            .collect();
        entries.extend(
            state
                .dirs
                .iter()
                .filter(|path| parent_of(path) == Some(dir))
                .map(|path| {
                    let name = path.rsplit('/').next().unwrap_or(path.as_str());
                    RemoteEntry::dir(name, DateTime::UNIX_EPOCH)
                }),
        );
        Ok(entries)
    }

    fn delete(&mut self, path: &str) -> Result<(), TransportError> {
        let mut state = self.remote.lock();
        state.calls.push(TransportCall::Delete {
            path: path.to_string(),
        });
        if state.failing_deletes.contains(path) {
            return Err(TransportError::remote("delete", path, "permission denied"));
        }
        state
            .files
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| TransportError::remote("delete", path, "no such file"))
    }
}

impl RemoteFs for FakeSession {
    fn download(&mut self, remote: &str, local: &Path) -> Result<u64, TransportError> {
        let data = {
            let mut state = self.remote.lock();
            state.calls.push(TransportCall::Download {
                remote: remote.to_string(),
                local: local.to_path_buf(),
            });
            state
                .files
                .get(remote)
                .map(|f| f.data.clone())
                .ok_or_else(|| TransportError::remote("download", remote, "no such file"))?
        };
        std::fs::write(local, &data).map_err(|e| TransportError::local(local, e))?;
        Ok(data.len() as u64)
    }

    fn upload(&mut self, local: &Path, remote: &str) -> Result<u64, TransportError> {
        let mut state = self.remote.lock();
        state.calls.push(TransportCall::Upload {
            local: local.to_path_buf(),
            remote: remote.to_string(),
        });
        if state.failing_uploads.contains(remote) {
            return Err(TransportError::remote("upload", remote, "disk full"));
        }
        let parent = parent_of(remote).unwrap_or("/");
        if !state.dirs.contains(parent) {
            return Err(TransportError::remote("upload", remote, "no such directory"));
        }

        let data = std::fs::read(local).map_err(|e| TransportError::local(local, e))?;
        let size = data.len() as u64;
        let modified = state.upload_time.unwrap_or_else(Utc::now);
        state
            .files
            .insert(remote.to_string(), FakeFile { data, modified });
        Ok(size)
    }

    fn mkdir_all(&mut self, dir: &str) {
        let mut state = self.remote.lock();
        state.calls.push(TransportCall::MkdirAll {
            dir: dir.to_string(),
        });
        let dir = normalize_dir(dir);
        state.add_parents(dir);
        state.dirs.insert(dir.to_string());
    }
}

impl RemoteShell for FakeSession {
    fn run_script(&mut self, script: &str) -> Result<String, TransportError> {
        let mut state = self.remote.lock();
        state.calls.push(TransportCall::Script {
            script: script.to_string(),
        });
        match state.script_status {
            0 => Ok(String::new()),
            status => Err(TransportError::Script {
                status,
                output: "fake script failure".to_string(),
            }),
        }
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
