//! Shared helpers for command handlers.

use std::str::FromStr;
use std::sync::Arc;

use homeai_core::{Device, DeviceFilter, DeviceType, HomeHub, Integration};

use crate::cli::DeviceListArgs;
use crate::error::CliError;

/// Resolve a device by exact id, then by case-insensitive display name.
pub fn resolve_device(hub: &HomeHub, identifier: &str) -> Result<Arc<Device>, CliError> {
    if let Some(device) = hub.device(identifier) {
        return Ok(device);
    }
    hub.catalog()
        .iter()
        .find(|d| d.name.eq_ignore_ascii_case(identifier))
        .cloned()
        .ok_or_else(|| CliError::DeviceNotFound {
            identifier: identifier.into(),
        })
}

/// Translate `devices list` flags into filters; every filter must match.
pub fn list_filters(args: &DeviceListArgs) -> Result<Vec<DeviceFilter>, CliError> {
    let mut filters = Vec::new();
    if let Some(room) = &args.room {
        filters.push(DeviceFilter::ByRoom(room.clone()));
    }
    if let Some(raw) = &args.device_type {
        let device_type = DeviceType::from_str(raw).map_err(|_| CliError::Validation {
            field: "type".into(),
            reason: format!("unknown device type '{raw}'"),
        })?;
        filters.push(DeviceFilter::ByType(device_type));
    }
    if let Some(raw) = &args.integration {
        let integration = Integration::from_str(raw).map_err(|_| CliError::Validation {
            field: "integration".into(),
            reason: format!("unknown integration '{raw}'"),
        })?;
        filters.push(DeviceFilter::ByIntegration(integration));
    }
    Ok(filters)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn args(room: Option<&str>, device_type: Option<&str>, integration: Option<&str>) -> DeviceListArgs {
        DeviceListArgs {
            room: room.map(Into::into),
            device_type: device_type.map(Into::into),
            integration: integration.map(Into::into),
        }
    }

    #[test]
    fn filters_parse_case_insensitively() {
        let filters = list_filters(&args(Some("Bedroom"), Some("LIGHT"), Some("home_assistant"))).unwrap();
        assert_eq!(filters.len(), 3);
    }

    #[test]
    fn unknown_type_is_rejected() {
        let err = list_filters(&args(None, Some("toaster"), None)).err().unwrap();
        assert!(matches!(err, CliError::Validation { ref field, .. } if field == "type"));
    }

    #[tokio::test]
    async fn resolves_by_name_when_id_misses() {
        let hub = HomeHub::new(homeai_core::HubConfig::default()).unwrap();
        assert_eq!(resolve_device(&hub, "main light").unwrap().id.as_str(), "living_room_light");
        assert!(resolve_device(&hub, "nope").is_err());
    }
}
