// ── Domain model ──
//
// Backend-neutral types shared by adapters, the aggregator, the command
// router, and every consumer.

mod action;
mod chat;
mod device;

pub use action::{ActionParams, ActionVerb, DeviceAction};
pub use chat::{ChatMessage, ChatRole};
pub use device::{
    Device, DeviceId, DeviceRoute, DeviceState, DeviceType, FirmwareFamily, Integration,
};
