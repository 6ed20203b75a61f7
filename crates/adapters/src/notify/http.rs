// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON POST callback

use super::{NotifyAdapter, NotifyError};
use async_trait::async_trait;
use bkp_core::CallbackPayload;
use reqwest::header::USER_AGENT;
use reqwest::StatusCode;

pub const CALLBACK_USER_AGENT: &str = "Backupper";

#[derive(Clone, Default)]
pub struct HttpNotifyAdapter {
    client: reqwest::Client,
}

impl HttpNotifyAdapter {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl NotifyAdapter for HttpNotifyAdapter {
    async fn notify(&self, url: &str, payload: &CallbackPayload) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(url)
            .header(USER_AGENT, CALLBACK_USER_AGENT)
            .json(payload)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(()),
            status => Err(NotifyError::Status(status.as_u16())),
        }
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
