use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use super::driver::Cluster;
use crate::common::ConnectorResult;

/// Which session a caller asks a handle for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionMode {
    /// The shared primary session
    #[default]
    Primary,
    /// A fresh session owned by the caller; the primary is untouched
    New,
    /// A fresh session that becomes the primary; the old one is shut down
    Replace,
}

impl SessionMode {
    /// `new` wins when both flags are set
    pub fn from_flags(new: bool, replace: bool) -> Self {
        match (new, replace) {
            (true, _) => SessionMode::New,
            (false, true) => SessionMode::Replace,
            (false, false) => SessionMode::Primary,
        }
    }
}

/// A cluster plus its primary session
///
/// Handles are shared between callers through `Arc`; the primary session
/// can be swapped concurrently with readers.
pub struct ConnectionHandle<C: Cluster> {
    cluster: C,
    primary: RwLock<Arc<C::Session>>,
}

impl<C: Cluster> ConnectionHandle<C> {
    /// Open the primary session
    pub async fn open(cluster: C) -> ConnectorResult<Self> {
        let session = cluster.connect().await?;
        Ok(Self {
            cluster,
            primary: RwLock::new(Arc::new(session)),
        })
    }

    pub fn cluster(&self) -> &C {
        &self.cluster
    }

    pub async fn session(&self) -> Arc<C::Session> {
        self.primary.read().await.clone()
    }

    /// A session not shared with anyone; the caller shuts it down
    pub async fn new_session(&self) -> ConnectorResult<Arc<C::Session>> {
        debug!("Opening additional session");
        Ok(Arc::new(self.cluster.connect().await?))
    }

    /// Swap the primary for a fresh session.
    ///
    /// The new session is opened first and the old primary is shut down
    /// after the swap, the reverse of a close-then-open replace. If opening
    /// the new session fails, the old one stays in place and usable.
    pub async fn replace_session(&self) -> ConnectorResult<Arc<C::Session>> {
        let mut primary = self.primary.write().await;

        let fresh = Arc::new(self.cluster.connect().await?);
        let previous = std::mem::replace(&mut *primary, fresh.clone());
        self.cluster.shutdown(previous).await;

        debug!("Replaced primary session");
        Ok(fresh)
    }

    pub async fn session_with(&self, mode: SessionMode) -> ConnectorResult<Arc<C::Session>> {
        match mode {
            SessionMode::Primary => Ok(self.session().await),
            SessionMode::New => self.new_session().await,
            SessionMode::Replace => self.replace_session().await,
        }
    }

    /// Shut down the primary session
    pub async fn shutdown(&self) {
        let session = self.session().await;
        self.cluster.shutdown(session).await;
    }
}
