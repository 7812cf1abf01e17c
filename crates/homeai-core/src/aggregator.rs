// ── Device aggregation ──
//
// Merges every adapter's devices into one catalog, isolates per-backend
// failures, and falls back to the demonstration catalog when nothing
// real comes back. Also routes state changes to the owning adapter.

use std::sync::Arc;

use futures_util::future::join_all;
use tracing::{debug, info, warn};

use crate::adapter::{AdapterSet, DeviceAdapter};
use crate::demo;
use crate::error::CoreError;
use crate::model::{Device, DeviceState};
use crate::store::{Catalog, CatalogOrigin, DeviceStore, SourceOutcome, SourceReport};
use crate::stream::CatalogStream;

pub struct Aggregator {
    store: Arc<DeviceStore>,
    adapters: AdapterSet,
}

impl Aggregator {
    pub fn new(store: Arc<DeviceStore>) -> Self {
        Self {
            store,
            adapters: AdapterSet::new(),
        }
    }

    /// Register an adapter. A later adapter for the same integration replaces the earlier one.
    pub fn register(&mut self, adapter: Arc<dyn DeviceAdapter>) {
        self.adapters.insert(adapter.integration(), adapter);
    }

    pub fn adapters(&self) -> &AdapterSet {
        &self.adapters
    }

    pub fn store(&self) -> &Arc<DeviceStore> {
        &self.store
    }

    /// Pull every adapter concurrently and replace the catalog.
    ///
    /// One adapter failing never hides another's devices. When all of them
    /// come back empty the demonstration catalog is installed instead.
    pub async fn refresh(&self) -> Arc<Catalog> {
        let results = join_all(self.adapters.values().map(|adapter| async move {
            (adapter.integration(), adapter.fetch_devices().await)
        }))
        .await;

        let mut devices = Vec::new();
        let mut sources = Vec::with_capacity(results.len());
        for (integration, result) in results {
            let outcome = match result {
                Ok(found) => {
                    let n = found.len();
                    devices.extend(found);
                    SourceOutcome::Devices(n)
                }
                Err(CoreError::IntegrationDisconnected { .. } | CoreError::NotConfigured { .. }) => {
                    debug!(%integration, "skipping disconnected backend");
                    SourceOutcome::Disconnected
                }
                Err(e) => {
                    warn!(%integration, error = %e, "device listing failed");
                    SourceOutcome::Failed(e.to_string())
                }
            };
            sources.push(SourceReport {
                integration,
                outcome,
            });
        }

        let catalog = if devices.is_empty() {
            info!("no backend returned devices, showing demonstration catalog");
            Catalog::new(demo::devices(), CatalogOrigin::Demo, sources)
        } else {
            info!(devices = devices.len(), "catalog refreshed");
            Catalog::new(devices, CatalogOrigin::Live, sources)
        };
        self.store.replace(catalog)
    }

    pub fn device(&self, id: &str) -> Option<Arc<Device>> {
        self.store.device(id)
    }

    pub fn snapshot(&self) -> Arc<Catalog> {
        self.store.snapshot()
    }

    pub fn observe(&self) -> CatalogStream {
        self.store.subscribe()
    }

    /// Apply a desired state to a device.
    ///
    /// Devices owned by a registered adapter are updated through it and
    /// show the new state on the next refresh. Anything else (the
    /// demonstration catalog, locally added devices) is updated in place.
    pub async fn update_device_state(&self, id: &str, state: DeviceState) -> Result<(), CoreError> {
        let device = self.store.device(id).ok_or_else(|| CoreError::DeviceNotFound {
            identifier: id.to_owned(),
        })?;

        let owner = device
            .route
            .integration()
            .and_then(|integration| self.adapters.get(&integration));

        match owner {
            Some(adapter) => {
                debug!(id, integration = %adapter.integration(), "dispatching state change");
                adapter.set_state(&device, &state).await
            }
            None => {
                debug!(id, "applying state change locally");
                if self.store.update_state(id, state) {
                    Ok(())
                } else {
                    Err(CoreError::DeviceNotFound {
                        identifier: id.to_owned(),
                    })
                }
            }
        }
    }

    /// Add or replace a locally held device.
    pub fn add_device(&self, device: Device) {
        self.store.upsert(device);
    }

    /// Remove a device from the catalog until the next refresh.
    pub fn remove_device(&self, id: &str) -> Result<(), CoreError> {
        if self.store.remove(id) {
            Ok(())
        } else {
            Err(CoreError::DeviceNotFound {
                identifier: id.to_owned(),
            })
        }
    }
}
