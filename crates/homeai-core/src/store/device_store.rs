// ── Reactive catalog store ──
//
// Single source of truth for the device catalog. Every mutation swaps in a
// new `Arc<Catalog>` through a `watch` channel, so readers never block and
// subscribers always see whole snapshots.

use std::sync::Arc;

use tokio::sync::watch;

use super::catalog::Catalog;
use crate::model::{Device, DeviceState};
use crate::stream::CatalogStream;

pub struct DeviceStore {
    catalog: watch::Sender<Arc<Catalog>>,
}

impl DeviceStore {
    /// A store seeded with `initial`.
    pub fn new(initial: Catalog) -> Self {
        let (catalog, _) = watch::channel(Arc::new(initial));
        Self { catalog }
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Arc<Catalog> {
        self.catalog.borrow().clone()
    }

    pub fn device(&self, id: &str) -> Option<Arc<Device>> {
        self.catalog.borrow().get(id).cloned()
    }

    /// Replace the whole catalog. Unchanged devices keep their handles.
    pub fn replace(&self, catalog: Catalog) -> Arc<Catalog> {
        let mut installed = Arc::new(Catalog::empty());
        self.catalog.send_modify(|current| {
            let next = Arc::new(catalog.reuse_unchanged(current));
            installed = Arc::clone(&next);
            *current = next;
        });
        installed
    }

    /// Swap one device's state. Returns `false` if the id is unknown.
    pub fn update_state(&self, id: &str, state: DeviceState) -> bool {
        self.catalog.send_if_modified(|current| {
            match current.with_state(id, state) {
                Some(next) => {
                    *current = Arc::new(next);
                    true
                }
                None => false,
            }
        })
    }

    /// Insert or replace a device.
    pub fn upsert(&self, device: Device) {
        self.catalog.send_modify(|current| {
            *current = Arc::new(current.with_device(device));
        });
    }

    /// Remove a device. Returns `false` if the id is unknown.
    pub fn remove(&self, id: &str) -> bool {
        self.catalog.send_if_modified(|current| match current.without_device(id) {
            Some(next) => {
                *current = Arc::new(next);
                true
            }
            None => false,
        })
    }

    /// Subscribe to catalog snapshots.
    pub fn subscribe(&self) -> CatalogStream {
        CatalogStream::new(self.catalog.subscribe())
    }
}
