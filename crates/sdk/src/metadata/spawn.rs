use std::sync::Arc;

use tokio::runtime::Handle;

use super::{FetchCoordinator, MetadataCache, MetadataRequester, MetadataService};

/// A [`FetchCoordinator`] whose requests run on the tokio runtime.
pub type MetadataFetcher<S> = FetchCoordinator<SpawnRequester<S>>;

/// Spawns each request as a detached task that writes its outcome back to
/// the cache.
#[derive(Debug)]
pub struct SpawnRequester<S> {
    service: Arc<S>,
    cache: Arc<MetadataCache>,
    handle: Handle,
}

impl<S> SpawnRequester<S> {
    /// Create a requester bound to the current tokio runtime.
    pub fn new(service: Arc<S>, cache: Arc<MetadataCache>) -> crate::Result<Self> {
        let handle = Handle::try_current().map_err(crate::Error::custom)?;
        Ok(Self {
            service,
            cache,
            handle,
        })
    }
}

impl<S> MetadataRequester for SpawnRequester<S>
where
    S: MetadataService + Send + Sync + 'static,
{
    fn request(&self, id: &str) {
        let service = self.service.clone();
        let cache = self.cache.clone();
        let id = id.to_string();
        self.handle.spawn(async move {
            match service.request_metadata(&id).await {
                Ok(metadata) => {
                    tracing::debug!(%id, title = %metadata.title, "metadata resolved");
                    cache.resolve(&id, metadata);
                }
                Err(err) => {
                    tracing::warn!(%id, %err, "metadata request failed");
                    cache.fail(&id);
                }
            }
        });
    }
}

impl<S> MetadataFetcher<S>
where
    S: MetadataService + Send + Sync + 'static,
{
    /// Create a fetcher requesting from `service` on the current tokio runtime.
    pub fn spawning(service: S, cache: Arc<MetadataCache>) -> crate::Result<Self> {
        let requester = SpawnRequester::new(Arc::new(service), cache.clone())?;
        Ok(Self::new(cache, requester))
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    use crate::metadata::{FetchState, VideoMetadata};

    use super::*;

    #[derive(Default)]
    struct Titles {
        calls: AtomicUsize,
    }

    impl MetadataService for Titles {
        async fn request_metadata(&self, id: &str) -> crate::Result<VideoMetadata> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            if id.starts_with("missing") {
                return Err(crate::Error::custom("not found"));
            }
            Ok(VideoMetadata {
                title: format!("title of {id}"),
            })
        }
    }

    async fn settle(cache: &MetadataCache) {
        while !cache.is_settled() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test]
    async fn fire_and_forget() -> crate::Result<()> {
        let cache = Arc::new(MetadataCache::new());
        let fetcher = MetadataFetcher::spawning(Titles::default(), cache.clone())?;

        for _ in 0..3 {
            fetcher.ensure_fetched("abc123");
            fetcher.ensure_fetched("missing-1");
        }
        assert_eq!(cache.state("abc123"), Some(FetchState::Pending));

        tokio::time::timeout(Duration::from_secs(5), settle(&cache))
            .await
            .map_err(crate::Error::custom)?;

        assert_eq!(fetcher.title("abc123").as_deref(), Some("title of abc123"));
        assert_eq!(cache.state("missing-1"), Some(FetchState::Failed));

        assert!(!fetcher.ensure_fetched("missing-1"));
        assert_eq!(fetcher.requester().service.calls.load(Ordering::SeqCst), 2);
        Ok(())
    }

    #[test]
    fn requires_runtime() {
        let err = SpawnRequester::new(Arc::new(Titles::default()), Default::default());
        assert!(err.is_err());
    }
}
