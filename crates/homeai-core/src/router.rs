// ── Command routing ──
//
// Turns a `DeviceAction` into a state change on the owning device and a
// one-line confirmation. Every path returns text; failures are reported
// as `Error: …` rather than propagated.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::aggregator::Aggregator;
use crate::convert::clamp_percent;
use crate::model::{ActionVerb, DeviceAction, DeviceState};

/// Brightness used when a brightness action carries no value.
pub const DEFAULT_BRIGHTNESS: i64 = 50;
/// Target temperature (°F) used when a temperature action carries no value.
pub const DEFAULT_TEMPERATURE: f64 = 72.0;

#[derive(Clone)]
pub struct CommandRouter {
    aggregator: Arc<Aggregator>,
}

impl CommandRouter {
    pub fn new(aggregator: Arc<Aggregator>) -> Self {
        Self { aggregator }
    }

    /// Execute one action and describe the outcome.
    pub async fn execute(&self, action: &DeviceAction) -> String {
        let id = action.device_id.as_str();
        let name = &action.device_name;
        let mut state = self
            .aggregator
            .device(id)
            .map(|device| device.state.clone())
            .unwrap_or_default();

        let message = match &action.verb {
            ActionVerb::TurnOn => {
                state.is_on = true;
                format!("Turned on {name}")
            }
            ActionVerb::TurnOff => {
                state.is_on = false;
                format!("Turned off {name}")
            }
            ActionVerb::SetBrightness => {
                let level = clamp_percent(action.parameters.brightness.unwrap_or(DEFAULT_BRIGHTNESS));
                state.brightness = Some(level);
                format!("Set {name} brightness to {level}%")
            }
            ActionVerb::SetTemperature => {
                let target = action.parameters.temperature.unwrap_or(DEFAULT_TEMPERATURE);
                state.target_temperature = Some(target);
                format!("Set {name} to {}°F", format_temperature(target))
            }
            ActionVerb::Lock => {
                state.is_locked = Some(true);
                format!("Locked {name}")
            }
            ActionVerb::Unlock => {
                state.is_locked = Some(false);
                format!("Unlocked {name}")
            }
            ActionVerb::Unknown(verb) => return format!("Unknown action: {verb}"),
        };

        debug!(id, verb = %action.verb, "executing action");
        match self.aggregator.update_device_state(id, state).await {
            Ok(()) => message,
            Err(e) => {
                warn!(id, error = %e, "action failed");
                format!("Error: {e}")
            }
        }
    }
}

/// Temperatures always show at least one decimal: `72.0`, `68.5`.
fn format_temperature(value: f64) -> String {
    if value.fract().abs() < f64::EPSILON {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}
