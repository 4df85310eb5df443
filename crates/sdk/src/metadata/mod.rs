use std::{
    collections::HashMap,
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use crate::entry::ProjectedEntry;

/// Requests spawned on the tokio runtime.
#[cfg(client)]
pub mod spawn;

/// YouTube oEmbed metadata service.
#[cfg(client)]
pub mod youtube;

#[cfg(client)]
pub use self::{
    spawn::{MetadataFetcher, SpawnRequester},
    youtube::YoutubeMetadataService,
};

/// Display metadata of a video.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(serde, derive(serde::Serialize, serde::Deserialize))]
pub struct VideoMetadata {
    /// Title.
    pub title: String,
}

/// Fetch state of one identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(serde, derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(serde, serde(rename_all = "snake_case", tag = "state"))]
pub enum FetchState {
    /// A request is in flight.
    Pending,
    /// The request succeeded.
    Resolved(VideoMetadata),
    /// The request failed. Never retried.
    Failed,
}

/// Fetch states keyed by service-specific id.
///
/// Entries are only ever added, and each one moves out of
/// [`FetchState::Pending`] at most once.
#[derive(Debug, Default)]
pub struct MetadataCache {
    states: Mutex<HashMap<String, FetchState>>,
}

impl MetadataCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, FetchState>> {
        self.states.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mark `id` as pending if it has never been seen.
    ///
    /// Returns `true` if the caller is now responsible for requesting it.
    pub fn try_begin(&self, id: &str) -> bool {
        let mut states = self.lock();
        if states.contains_key(id) {
            return false;
        }
        states.insert(id.to_string(), FetchState::Pending);
        true
    }

    /// Record the outcome of the request for `id`.
    ///
    /// Returns `false` if `id` was not pending, in which case nothing changes.
    pub fn complete(&self, id: &str, outcome: Option<VideoMetadata>) -> bool {
        let mut states = self.lock();
        let Some(state) = states.get_mut(id) else {
            return false;
        };
        if *state != FetchState::Pending {
            return false;
        }
        *state = match outcome {
            Some(metadata) => FetchState::Resolved(metadata),
            None => FetchState::Failed,
        };
        true
    }

    /// Record a successful request.
    pub fn resolve(&self, id: &str, metadata: VideoMetadata) -> bool {
        self.complete(id, Some(metadata))
    }

    /// Record a failed request.
    pub fn fail(&self, id: &str) -> bool {
        self.complete(id, None)
    }

    /// Get the fetch state of `id`.
    pub fn state(&self, id: &str) -> Option<FetchState> {
        self.lock().get(id).cloned()
    }

    /// Get the resolved title of `id`.
    pub fn title(&self, id: &str) -> Option<String> {
        match self.lock().get(id)? {
            FetchState::Resolved(metadata) => Some(metadata.title.clone()),
            FetchState::Pending | FetchState::Failed => None,
        }
    }

    /// Number of known identifiers.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Is empty.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Number of requests in flight.
    pub fn num_pending(&self) -> usize {
        self.lock()
            .values()
            .filter(|state| matches!(state, FetchState::Pending))
            .count()
    }

    /// Returns `true` if no request is in flight.
    pub fn is_settled(&self) -> bool {
        self.num_pending() == 0
    }
}

/// Resolves display metadata of videos.
pub trait MetadataService {
    /// Request the metadata of the video with the given id.
    fn request_metadata(
        &self,
        id: &str,
    ) -> impl Future<Output = crate::Result<VideoMetadata>> + Send;
}

/// Issues a metadata request without waiting for it.
///
/// The outcome is expected to be written back to the [`MetadataCache`]
/// shared with the coordinator.
pub trait MetadataRequester {
    /// Start the request for `id`.
    fn request(&self, id: &str);
}

/// Requests metadata at most once per identifier.
#[derive(Debug)]
pub struct FetchCoordinator<R> {
    cache: Arc<MetadataCache>,
    requester: R,
}

impl<R: MetadataRequester> FetchCoordinator<R> {
    /// Create a coordinator writing into the given cache.
    pub fn new(cache: Arc<MetadataCache>, requester: R) -> Self {
        Self { cache, requester }
    }

    /// Get the cache.
    pub fn cache(&self) -> &Arc<MetadataCache> {
        &self.cache
    }

    /// Get the requester.
    pub fn requester(&self) -> &R {
        &self.requester
    }

    /// Request the metadata of `id` unless it is pending, resolved or failed.
    ///
    /// Returns `true` if a request was issued.
    pub fn ensure_fetched(&self, id: &str) -> bool {
        if !self.cache.try_begin(id) {
            return false;
        }
        #[cfg(tracing)]
        {
            tracing::debug!(%id, "requesting metadata");
        }
        self.requester.request(id);
        true
    }

    /// Call [`ensure_fetched`](Self::ensure_fetched) for every entry.
    ///
    /// Returns the number of requests issued.
    pub fn ensure_fetched_all<I>(&self, entries: I) -> usize
    where
        I: IntoIterator,
        I::Item: AsRef<ProjectedEntry>,
    {
        let mut issued = 0;
        for entry in entries {
            if self.ensure_fetched(&entry.as_ref().service_specific_id) {
                issued += 1;
            }
        }
        issued
    }

    /// Get the resolved title of `id`.
    pub fn title(&self, id: &str) -> Option<String> {
        self.cache.title(id)
    }
}
