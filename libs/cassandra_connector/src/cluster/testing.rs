//! In-memory driver for unit tests

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::driver::{Cluster, ClusterDriver, ClusterOptions};
use crate::common::{ConnectorError, ConnectorResult};

#[derive(Default)]
struct FakeState {
    clusters: AtomicUsize,
    sessions: AtomicUsize,
    failing_connects: AtomicUsize,
    options: Mutex<Vec<ClusterOptions>>,
}

/// Counts clusters and sessions; can be told to refuse connections
#[derive(Clone, Default)]
pub(crate) struct FakeDriver {
    state: Arc<FakeState>,
}

impl FakeDriver {
    pub(crate) fn clusters_created(&self) -> usize {
        self.state.clusters.load(Ordering::SeqCst)
    }

    pub(crate) fn sessions_opened(&self) -> usize {
        self.state.sessions.load(Ordering::SeqCst)
    }

    /// Options passed to every `cluster` call, in order
    pub(crate) fn options(&self) -> Vec<ClusterOptions> {
        self.state.options.lock().unwrap().clone()
    }

    pub(crate) fn fail_next_connects(&self, count: usize) {
        self.state.failing_connects.store(count, Ordering::SeqCst);
    }
}

#[async_trait]
impl ClusterDriver for FakeDriver {
    type Cluster = FakeCluster;

    async fn cluster(&self, options: ClusterOptions) -> ConnectorResult<FakeCluster> {
        self.state.clusters.fetch_add(1, Ordering::SeqCst);
        self.state.options.lock().unwrap().push(options);
        Ok(FakeCluster {
            state: self.state.clone(),
        })
    }
}

pub(crate) struct FakeCluster {
    state: Arc<FakeState>,
}

#[derive(Debug)]
pub(crate) struct FakeSession {
    pub(crate) id: usize,
    closed: AtomicBool,
}

impl FakeSession {
    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Cluster for FakeCluster {
    type Session = FakeSession;

    async fn connect(&self) -> ConnectorResult<FakeSession> {
        let refused = self
            .state
            .failing_connects
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if refused {
            return Err(ConnectorError::Session("connection refused".to_string()));
        }

        let id = self.state.sessions.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(FakeSession {
            id,
            closed: AtomicBool::new(false),
        })
    }

    async fn shutdown(&self, session: Arc<FakeSession>) {
        session.closed.store(true, Ordering::SeqCst);
    }
}
