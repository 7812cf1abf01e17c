// ── API → domain conversions ──
//
// Pure translations between each backend's wire types and the unified
// device model. No I/O happens here; adapters fetch, this module maps.

pub mod hass;
pub mod mqtt;
pub mod smartthings;

/// Native brightness ceiling used by Home Assistant lights.
pub const HASS_BRIGHTNESS_MAX: u32 = 255;
/// Native brightness ceiling used by Zigbee2MQTT.
pub const ZIGBEE_BRIGHTNESS_MAX: u32 = 254;

const PERCENT_MAX: u32 = 100;

/// Rescale `value` from `0..=from_max` to `0..=to_max`, rounding half up.
///
/// Out-of-range inputs are clamped first, so the result never exceeds
/// `to_max`. Rounding keeps both directions within ±1 of each other
/// (127/254 → 50 → 127, 204/255 → 80 → 204).
pub fn rescale(value: i64, from_max: u32, to_max: u32) -> u32 {
    if from_max == 0 {
        return 0;
    }
    let clamped = u64::try_from(value.clamp(0, i64::from(from_max))).unwrap_or(0);
    let from = u64::from(from_max);
    let scaled = (clamped * u64::from(to_max) + from / 2) / from;
    u32::try_from(scaled).unwrap_or(to_max)
}

/// Native brightness → percentage.
pub fn percent_from_native(value: i64, native_max: u32) -> u8 {
    u8::try_from(rescale(value, native_max, PERCENT_MAX)).unwrap_or(u8::MAX)
}

/// Percentage → native brightness. Native ceilings above 255 saturate.
pub fn native_from_percent(percent: u8, native_max: u32) -> u8 {
    u8::try_from(rescale(i64::from(percent), PERCENT_MAX, native_max)).unwrap_or(u8::MAX)
}

/// Clamp an arbitrary integer into a `0..=100` percentage.
pub fn clamp_percent(value: i64) -> u8 {
    u8::try_from(value.clamp(0, i64::from(PERCENT_MAX))).unwrap_or(0)
}

/// `living_room_lamp` → `Living room lamp`.
pub fn display_name_from_id(id: &str) -> String {
    let spaced = id.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Room label used when a backend does not know where a device lives.
pub const UNKNOWN_ROOM: &str = "Unknown";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rescale_round_trips_within_one() {
        for native in 0..=254_i64 {
            let pct = percent_from_native(native, ZIGBEE_BRIGHTNESS_MAX);
            assert!(pct <= 100);
            let back = i64::from(native_from_percent(pct, ZIGBEE_BRIGHTNESS_MAX));
            assert!((back - native).abs() <= 2, "{native} -> {pct} -> {back}");
        }
        for pct in 0..=100_u8 {
            let native = native_from_percent(pct, HASS_BRIGHTNESS_MAX);
            let back = percent_from_native(i64::from(native), HASS_BRIGHTNESS_MAX);
            assert!(back.abs_diff(pct) <= 1, "{pct} -> {native} -> {back}");
        }
    }

    #[test]
    fn rescale_reference_points() {
        assert_eq!(percent_from_native(127, ZIGBEE_BRIGHTNESS_MAX), 50);
        assert_eq!(native_from_percent(50, ZIGBEE_BRIGHTNESS_MAX), 127);
        assert_eq!(percent_from_native(204, HASS_BRIGHTNESS_MAX), 80);
        assert_eq!(native_from_percent(80, HASS_BRIGHTNESS_MAX), 204);
        assert_eq!(percent_from_native(255, HASS_BRIGHTNESS_MAX), 100);
        assert_eq!(native_from_percent(100, HASS_BRIGHTNESS_MAX), 255);
    }

    #[test]
    fn rescale_clamps_out_of_range() {
        assert_eq!(percent_from_native(400, HASS_BRIGHTNESS_MAX), 100);
        assert_eq!(percent_from_native(-5, HASS_BRIGHTNESS_MAX), 0);
        assert_eq!(rescale(10, 0, 100), 0);
        assert_eq!(clamp_percent(140), 100);
        assert_eq!(clamp_percent(-1), 0);
    }

    #[test]
    fn display_names() {
        assert_eq!(display_name_from_id("living_room_lamp"), "Living room lamp");
        assert_eq!(display_name_from_id("plug"), "Plug");
        assert_eq!(display_name_from_id(""), "");
    }
}
