// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Adapter selection per job

use bkp_adapters::{
    ConfiguredDestination, ConfiguredSource, DestinationAdapter, HttpNotifyAdapter,
    NotifyAdapter, SourceAdapter, TracedDestinationAdapter, TracedNotifyAdapter,
    TracedSourceAdapter,
};
use bkp_core::Job;

/// Builds the adapters a job's pipeline runs against
pub trait JobAdapters: Clone + Send + Sync + 'static {
    type Source: SourceAdapter;
    type Destination: DestinationAdapter;
    type Notify: NotifyAdapter;

    fn source(&self, job: &Job) -> Self::Source;
    fn destination(&self, job: &Job) -> Self::Destination;
    fn notify(&self) -> Self::Notify;
}

/// Real transports chosen from each job's configuration, with tracing
#[derive(Clone, Default)]
pub struct ConfiguredAdapters {
    client: reqwest::Client,
}

impl ConfiguredAdapters {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl JobAdapters for ConfiguredAdapters {
    type Source = TracedSourceAdapter<ConfiguredSource>;
    type Destination = TracedDestinationAdapter<ConfiguredDestination>;
    type Notify = TracedNotifyAdapter<HttpNotifyAdapter>;

    fn source(&self, job: &Job) -> Self::Source {
        TracedSourceAdapter::new(
            ConfiguredSource::from_config(&job.source),
            job.source.kind(),
        )
    }

    fn destination(&self, job: &Job) -> Self::Destination {
        TracedDestinationAdapter::new(
            ConfiguredDestination::from_config(&job.destination, self.client.clone()),
            job.destination.kind(),
        )
    }

    fn notify(&self) -> Self::Notify {
        TracedNotifyAdapter::new(HttpNotifyAdapter::new(self.client.clone()))
    }
}
