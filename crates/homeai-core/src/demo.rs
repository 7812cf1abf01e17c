// ── Demonstration catalog ──
//
// Ten fixed devices shown whenever no backend returns anything. They are
// routed locally, so commands against them only update the in-memory
// catalog.

use crate::model::{Device, DeviceId, DeviceRoute, DeviceState, DeviceType, Integration};
use crate::store::{Catalog, CatalogOrigin};

fn demo_device(
    id: &str,
    name: &str,
    device_type: DeviceType,
    room: &str,
    integration: Integration,
    state: DeviceState,
) -> Device {
    Device {
        id: DeviceId::from(id),
        name: name.to_owned(),
        device_type,
        room: room.to_owned(),
        integration,
        state,
        route: DeviceRoute::Local,
    }
}

fn light(is_on: bool, brightness: u8) -> DeviceState {
    DeviceState {
        is_on,
        brightness: Some(brightness),
        ..DeviceState::default()
    }
}

/// The demonstration devices, in display order.
pub fn devices() -> Vec<Device> {
    use DeviceType as T;
    use Integration as I;

    vec![
        demo_device("living_room_light", "Main Light", T::Light, "Living Room", I::HomeAssistant, light(true, 80)),
        demo_device("living_room_lamp", "Floor Lamp", T::Light, "Living Room", I::HomeAssistant, light(false, 50)),
        demo_device("living_room_tv", "Smart TV", T::Tv, "Living Room", I::SmartThings, DeviceState::default()),
        demo_device("bedroom_light", "Ceiling Light", T::Light, "Bedroom", I::HomeAssistant, light(false, 100)),
        demo_device("bedroom_lamp", "Bedside Lamp", T::Light, "Bedroom", I::Mqtt, light(true, 30)),
        demo_device(
            "thermostat",
            "Main Thermostat",
            T::Thermostat,
            "Living Room",
            I::HomeAssistant,
            DeviceState {
                is_on: true,
                temperature: Some(71.0),
                target_temperature: Some(72.0),
                ..DeviceState::default()
            },
        ),
        demo_device(
            "front_door_lock",
            "Front Door",
            T::Lock,
            "Entryway",
            I::SmartThings,
            DeviceState {
                is_on: true,
                is_locked: Some(true),
                ..DeviceState::default()
            },
        ),
        demo_device("garage_door", "Garage Door", T::Switch, "Garage", I::Mqtt, DeviceState::default()),
        demo_device("kitchen_light", "Kitchen Light", T::Light, "Kitchen", I::HomeAssistant, light(false, 100)),
        demo_device("motion_sensor", "Hallway Sensor", T::Sensor, "Hallway", I::HomeAssistant, DeviceState::on()),
    ]
}

/// Startup catalog: the demonstration devices, before any refresh.
pub fn catalog() -> Catalog {
    Catalog::new(devices(), CatalogOrigin::Initial, Vec::new())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn demo_catalog_contents() {
        let catalog = catalog();
        assert_eq!(catalog.len(), 10);
        assert!(catalog.is_demo());

        let main = catalog.get("living_room_light").unwrap();
        assert_eq!(main.name, "Main Light");
        assert!(main.state.is_on);
        assert_eq!(main.state.brightness, Some(80));

        let lock = catalog.get("front_door_lock").unwrap();
        assert_eq!(lock.state.is_locked, Some(true));
        assert!(catalog.iter().all(|d| d.route == DeviceRoute::Local));
    }
}
