// ── Filter predicates for catalog snapshots ──

use crate::model::{Device, DeviceType, Integration};

/// Filter predicate for device collections.
pub enum DeviceFilter {
    All,
    ByIntegration(Integration),
    ByType(DeviceType),
    ByRoom(String),
    On,
    Off,
    Custom(Box<dyn Fn(&Device) -> bool + Send + Sync>),
}

impl DeviceFilter {
    pub fn matches(&self, device: &Device) -> bool {
        match self {
            Self::All => true,
            Self::ByIntegration(i) => device.integration == *i,
            Self::ByType(dt) => device.device_type == *dt,
            Self::ByRoom(room) => device.room.eq_ignore_ascii_case(room),
            Self::On => device.state.is_on,
            Self::Off => !device.state.is_on,
            Self::Custom(f) => f(device),
        }
    }
}
