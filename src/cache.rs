use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::model::Image;

/// Process-lifetime image cache keyed by absolute URL string.
///
/// Entries never expire and the map is unbounded; the working set is a
/// handful of prefecture logos and header photos.
#[derive(Clone, Default)]
pub struct ImageCache {
    inner: Arc<RwLock<HashMap<String, Image>>>,
}

impl ImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, url: &str) -> Option<Image> {
        let guard = self.inner.read().await;
        guard.get(url).cloned()
    }

    /// Store `image` under `url`, replacing any earlier entry.
    pub async fn put(&self, url: String, image: Image) {
        let mut guard = self.inner.write().await;
        if guard.insert(url, image).is_some() {
            tracing::debug!("replaced cached image");
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}
