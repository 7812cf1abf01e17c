// ── Device catalog snapshot ──
//
// An immutable, insertion-ordered view of every known device plus the
// per-backend outcome of the refresh that produced it. Snapshots are
// shared as `Arc<Catalog>` and replaced wholesale, never patched in place.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::model::{Device, DeviceId, DeviceState, Integration};

/// Where the current catalog came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogOrigin {
    /// Startup contents, before any refresh.
    Initial,
    /// At least one backend returned devices.
    Live,
    /// Every backend came back empty; the demonstration catalog is shown.
    Demo,
}

/// What one backend contributed to a refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum SourceOutcome {
    Devices(usize),
    Disconnected,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceReport {
    pub integration: Integration,
    #[serde(flatten)]
    pub outcome: SourceOutcome,
}

/// Full set of known devices, keyed by id, in list order.
#[derive(Debug, Clone)]
pub struct Catalog {
    devices: IndexMap<DeviceId, Arc<Device>>,
    origin: CatalogOrigin,
    sources: Vec<SourceReport>,
    refreshed_at: Option<DateTime<Utc>>,
}

impl Catalog {
    /// Build a catalog, keeping the first device seen for any duplicated id.
    pub fn new(
        devices: impl IntoIterator<Item = Device>,
        origin: CatalogOrigin,
        sources: Vec<SourceReport>,
    ) -> Self {
        let mut map = IndexMap::new();
        for device in devices {
            if map.contains_key(&device.id) {
                warn!(id = %device.id, "duplicate device id, keeping first");
                continue;
            }
            map.insert(device.id.clone(), Arc::new(device));
        }
        let refreshed_at = (origin != CatalogOrigin::Initial).then(Utc::now);
        Self {
            devices: map,
            origin,
            sources,
            refreshed_at,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), CatalogOrigin::Initial, Vec::new())
    }

    pub fn get(&self, id: &str) -> Option<&Arc<Device>> {
        self.devices.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.devices.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Device>> {
        self.devices.values()
    }

    /// Devices in list order, as owned handles.
    pub fn to_vec(&self) -> Vec<Arc<Device>> {
        self.devices.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn origin(&self) -> CatalogOrigin {
        self.origin
    }

    /// True for the demonstration catalog, at startup or after a refresh.
    pub fn is_demo(&self) -> bool {
        self.origin != CatalogOrigin::Live
    }

    pub fn sources(&self) -> &[SourceReport] {
        &self.sources
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }

    /// Reuse `previous` handles for devices whose value did not change, so
    /// consumers comparing by `Arc::ptr_eq` see no churn for them.
    pub(crate) fn reuse_unchanged(mut self, previous: &Catalog) -> Self {
        for (id, device) in &mut self.devices {
            if let Some(old) = previous.devices.get(id) {
                if **old == **device {
                    *device = Arc::clone(old);
                }
            }
        }
        self
    }

    /// A copy with one device's state replaced; `None` if the id is unknown.
    pub(crate) fn with_state(&self, id: &str, state: DeviceState) -> Option<Self> {
        let current = self.devices.get(id)?;
        let mut next = self.clone();
        if let Some(slot) = next.devices.get_mut(id) {
            *slot = Arc::new(current.with_state(state));
        }
        Some(next)
    }

    /// A copy with `device` appended, or replacing an entry with the same id.
    pub(crate) fn with_device(&self, device: Device) -> Self {
        let mut next = self.clone();
        next.devices.insert(device.id.clone(), Arc::new(device));
        next
    }

    /// A copy without `id`; `None` if the id is unknown.
    pub(crate) fn without_device(&self, id: &str) -> Option<Self> {
        let mut next = self.clone();
        next.devices.shift_remove(id)?;
        Some(next)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{DeviceRoute, DeviceType};

    fn device(id: &str, name: &str) -> Device {
        Device {
            id: DeviceId::from(id),
            name: name.into(),
            device_type: DeviceType::Switch,
            room: "Den".into(),
            integration: Integration::HomeAssistant,
            state: DeviceState::default(),
            route: DeviceRoute::Local,
        }
    }

    #[test]
    fn duplicates_keep_first() {
        let catalog = Catalog::new(
            vec![device("a", "First"), device("b", "B"), device("a", "Second")],
            CatalogOrigin::Live,
            Vec::new(),
        );
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("a").unwrap().name, "First");
        let order: Vec<_> = catalog.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(order, ["a", "b"]);
        assert!(catalog.refreshed_at().is_some());
    }

    #[test]
    fn with_state_touches_one_device() {
        let catalog = Catalog::new(
            vec![device("a", "A"), device("b", "B")],
            CatalogOrigin::Demo,
            Vec::new(),
        );
        let next = catalog.with_state("a", DeviceState::on()).unwrap();

        assert!(next.get("a").unwrap().state.is_on);
        assert!(Arc::ptr_eq(next.get("b").unwrap(), catalog.get("b").unwrap()));
        assert!(!catalog.get("a").unwrap().state.is_on);
        assert!(catalog.with_state("zzz", DeviceState::on()).is_none());
    }

    #[test]
    fn reuse_unchanged_preserves_identity() {
        let old = Catalog::new(vec![device("a", "A"), device("b", "B")], CatalogOrigin::Live, Vec::new());
        let mut changed = device("b", "B");
        changed.state.is_on = true;
        let fresh = Catalog::new(vec![device("a", "A"), changed], CatalogOrigin::Live, Vec::new())
            .reuse_unchanged(&old);

        assert!(Arc::ptr_eq(fresh.get("a").unwrap(), old.get("a").unwrap()));
        assert!(!Arc::ptr_eq(fresh.get("b").unwrap(), old.get("b").unwrap()));
    }

    #[test]
    fn add_and_remove_devices() {
        let catalog = Catalog::new(vec![device("a", "A")], CatalogOrigin::Demo, Vec::new());
        let grown = catalog.with_device(device("z", "Z"));
        assert_eq!(grown.len(), 2);
        let shrunk = grown.without_device("a").unwrap();
        assert_eq!(shrunk.to_vec()[0].id.as_str(), "z");
        assert!(shrunk.without_device("a").is_none());
    }

    #[test]
    fn source_report_serializes_flat() {
        let report = SourceReport {
            integration: Integration::Mqtt,
            outcome: SourceOutcome::Devices(3),
        };
        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            serde_json::json!({ "integration": "mqtt", "outcome": "devices", "detail": 3 })
        );
    }
}
