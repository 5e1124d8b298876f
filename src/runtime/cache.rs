//! Version-keyed module cache shared by every session.
//!
//! An entry is either `Pending` (the in-flight fetch as a shared future) or
//! `Ready`. Late requesters for a pending version await the same future, so a
//! version is fetched once no matter how many sessions ask for it. Failed
//! fetches are evicted and the next request starts a fresh one.

use crate::config::types::{PlaygroundError, Result};
use crate::observability::audit::{self, RunEventKind};
use crate::runtime::module::{ModuleArtifact, ModuleFetcher};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type SharedLoad = Shared<BoxFuture<'static, std::result::Result<Arc<ModuleArtifact>, String>>>;

enum CacheEntry {
    Pending(SharedLoad),
    Ready(Arc<ModuleArtifact>),
}

pub struct ModuleCache {
    fetcher: Arc<dyn ModuleFetcher>,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ModuleCache {
    pub fn new(fetcher: Arc<dyn ModuleFetcher>) -> Self {
        Self {
            fetcher,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Artifact for `version`, fetching it on first request
    pub async fn get(&self, version: &str) -> Result<Arc<ModuleArtifact>> {
        let load = {
            let mut entries = self.entries();
            match entries.get(version) {
                Some(CacheEntry::Ready(artifact)) => return Ok(Arc::clone(artifact)),
                Some(CacheEntry::Pending(load)) => {
                    log::debug!("Joining in-flight fetch of module {}", version);
                    load.clone()
                }
                None => {
                    let load = self.start_fetch(version);
                    entries.insert(version.to_string(), CacheEntry::Pending(load.clone()));
                    load
                }
            }
        };

        let outcome = load.clone().await;

        let mut entries = self.entries();
        let still_ours = matches!(
            entries.get(version),
            Some(CacheEntry::Pending(current)) if current.ptr_eq(&load)
        );
        match &outcome {
            Ok(artifact) if still_ours => {
                entries.insert(version.to_string(), CacheEntry::Ready(Arc::clone(artifact)));
            }
            Err(_) if still_ours => {
                entries.remove(version);
            }
            _ => {}
        }
        drop(entries);

        outcome.map_err(|message| PlaygroundError::load(version, message))
    }

    fn start_fetch(&self, version: &str) -> SharedLoad {
        log::info!("Fetching interpreter module {}", version);
        let fetch = self.fetcher.fetch(version);
        let label = version.to_string();
        async move {
            match fetch.await {
                Ok(artifact) => {
                    audit::emit(audit::RunEvent::new(RunEventKind::ModuleFetched).version(&label));
                    Ok(Arc::new(artifact))
                }
                Err(PlaygroundError::Load { message, .. }) => Err(message),
                Err(e) => Err(e.to_string()),
            }
        }
        .boxed()
        .shared()
    }

    /// Whether a completed artifact is cached for `version`
    pub fn is_ready(&self, version: &str) -> bool {
        matches!(self.entries().get(version), Some(CacheEntry::Ready(_)))
    }

    pub fn is_pending(&self, version: &str) -> bool {
        matches!(self.entries().get(version), Some(CacheEntry::Pending(_)))
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
