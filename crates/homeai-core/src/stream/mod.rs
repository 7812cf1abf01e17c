// ── Reactive catalog streams ──
//
// Subscription types for consuming catalog changes from the DeviceStore.

mod filter;

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::store::Catalog;

pub use filter::DeviceFilter;

/// A subscription to the device catalog.
///
/// Rapid successive mutations may be coalesced: a slow subscriber sees the
/// latest snapshot, not every intermediate one.
pub struct CatalogStream {
    current: Arc<Catalog>,
    receiver: watch::Receiver<Arc<Catalog>>,
}

impl CatalogStream {
    pub(crate) fn new(mut receiver: watch::Receiver<Arc<Catalog>>) -> Self {
        let current = receiver.borrow_and_update().clone();
        Self { current, receiver }
    }

    /// Snapshot captured at creation or at the last `changed()`.
    pub fn current(&self) -> &Arc<Catalog> {
        &self.current
    }

    /// Latest snapshot, which may be newer than `current()`.
    pub fn latest(&self) -> Arc<Catalog> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next change, returning the new snapshot.
    /// Returns `None` if the store has been dropped.
    pub async fn changed(&mut self) -> Option<Arc<Catalog>> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = snap.clone();
        Some(snap)
    }

    /// Convert into a `Stream`. The first item is the current snapshot.
    pub fn into_stream(self) -> CatalogWatchStream {
        CatalogWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by a `watch::Receiver`.
pub struct CatalogWatchStream {
    inner: WatchStream<Arc<Catalog>>,
}

impl Stream for CatalogWatchStream {
    type Item = Arc<Catalog>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
