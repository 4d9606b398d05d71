// ── Session registry ──
//
// At most one monitor task per printer id. Sessions for different
// printers share nothing but this map.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures_util::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;
use ymir_api::DeviceApi;

use crate::config::{MonitorConfig, PrinterEndpoint};
use crate::error::CoreError;
use crate::monitor::{MonitorHandle, MonitorSnapshot, MonitorSubscription, PrinterMonitor};

/// Owns the running monitor sessions, keyed by printer id.
pub struct MonitorRegistry {
    sessions: DashMap<String, MonitorHandle>,
    root: CancellationToken,
}

impl Default for MonitorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MonitorRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            root: CancellationToken::new(),
        }
    }

    /// Start monitoring `endpoint`.
    ///
    /// Fails with [`CoreError::SessionAlreadyActive`] if a session for the
    /// same id is still running. A session whose task already exited is
    /// replaced.
    pub fn start<C: DeviceApi + 'static>(
        &self,
        endpoint: PrinterEndpoint,
        config: MonitorConfig,
        client: Arc<C>,
    ) -> Result<Uuid, CoreError> {
        config.validate()?;

        match self.sessions.entry(endpoint.id.clone()) {
            Entry::Occupied(entry) if !entry.get().is_finished() => {
                Err(CoreError::SessionAlreadyActive {
                    id: entry.key().clone(),
                })
            }
            Entry::Occupied(mut entry) => {
                debug!(printer = %entry.key(), "replacing finished session");
                let handle = spawn_session(endpoint, config, client, &self.root);
                let session_id = handle.session_id();
                entry.insert(handle);
                Ok(session_id)
            }
            Entry::Vacant(entry) => {
                let handle = spawn_session(endpoint, config, client, &self.root);
                let session_id = handle.session_id();
                info!(printer = %entry.key(), %session_id, "session started");
                entry.insert(handle);
                Ok(session_id)
            }
        }
    }

    /// Cancel the session for `id` and wait for its task to exit.
    pub async fn stop(&self, id: &str) -> Result<(), CoreError> {
        let (_, handle) = self
            .sessions
            .remove(id)
            .ok_or_else(|| CoreError::SessionNotFound { id: id.to_owned() })?;
        handle.stop().await?;
        info!(printer = %id, "session stopped");
        Ok(())
    }

    /// Replace the session for `endpoint.id` with one using new settings.
    ///
    /// Starts a session even if none was running.
    pub async fn restart<C: DeviceApi + 'static>(
        &self,
        endpoint: PrinterEndpoint,
        config: MonitorConfig,
        client: Arc<C>,
    ) -> Result<Uuid, CoreError> {
        match self.stop(&endpoint.id).await {
            Ok(()) | Err(CoreError::SessionNotFound { .. }) => {}
            Err(e) => return Err(e),
        }
        self.start(endpoint, config, client)
    }

    /// Stop every session and wait for all of them.
    pub async fn stop_all(&self) {
        let ids: Vec<String> = self.sessions.iter().map(|e| e.key().clone()).collect();
        let handles: Vec<MonitorHandle> = ids
            .iter()
            .filter_map(|id| self.sessions.remove(id).map(|(_, handle)| handle))
            .collect();

        for result in join_all(handles.into_iter().map(MonitorHandle::stop)).await {
            if let Err(e) = result {
                warn!(error = %e, "session did not stop cleanly");
            }
        }
    }

    pub fn snapshot(&self, id: &str) -> Option<Arc<MonitorSnapshot>> {
        self.sessions.get(id).map(|handle| handle.latest())
    }

    pub fn subscribe(&self, id: &str) -> Option<MonitorSubscription> {
        self.sessions.get(id).map(|handle| handle.subscribe())
    }

    /// Ids of sessions whose task is still running, sorted.
    pub fn active_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .sessions
            .iter()
            .filter(|e| !e.value().is_finished())
            .map(|e| e.key().clone())
            .collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Drop for MonitorRegistry {
    fn drop(&mut self) {
        self.root.cancel();
    }
}

fn spawn_session<C: DeviceApi + 'static>(
    endpoint: PrinterEndpoint,
    config: MonitorConfig,
    client: Arc<C>,
    root: &CancellationToken,
) -> MonitorHandle {
    PrinterMonitor::new(endpoint, config, client).spawn(root.child_token())
}
