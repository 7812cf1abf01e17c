// ── MQTT adapter ──
//
// A persistent broker session. Devices cannot be enumerated on demand;
// they are discovered from telemetry traffic by a listener task and held
// in a discovery cache that `fetch_devices` snapshots.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use homeai_api::MqttSession;
use homeai_api::mqtt::{
    self, BrokerOptions, InboundMessage, TasmotaState, TopicKind, ZigbeeState, classify_topic,
};

use super::{DeviceAdapter, settings_mismatch};
use crate::config::{AdapterSettings, MqttSettings};
use crate::convert::mqtt::{command_payload, tasmota_device, zigbee_device};
use crate::error::CoreError;
use crate::model::{Device, DeviceId, DeviceRoute, DeviceState, Integration};

type DiscoveryCache = DashMap<DeviceId, Arc<Device>>;

struct Listener {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

pub struct MqttAdapter {
    settings: ArcSwapOption<MqttSettings>,
    session: ArcSwapOption<MqttSession>,
    cache: Arc<DiscoveryCache>,
    listener: Mutex<Option<Listener>>,
}

impl MqttAdapter {
    pub fn new(settings: Option<MqttSettings>) -> Self {
        Self {
            settings: ArcSwapOption::from(settings.map(Arc::new)),
            session: ArcSwapOption::empty(),
            cache: Arc::new(DashMap::new()),
            listener: Mutex::new(None),
        }
    }

    fn session(&self) -> Result<Arc<MqttSession>, CoreError> {
        match self.session.load_full() {
            Some(session) if session.is_connected() => Ok(session),
            _ => Err(CoreError::IntegrationDisconnected {
                integration: Integration::Mqtt,
            }),
        }
    }

    async fn stop_listener(&self) {
        let listener = self.listener.lock().await.take();
        if let Some(Listener { cancel, handle }) = listener {
            cancel.cancel();
            if let Err(e) = handle.await {
                warn!(error = %e, "MQTT listener task panicked");
            }
        }
    }
}

#[async_trait]
impl DeviceAdapter for MqttAdapter {
    fn integration(&self) -> Integration {
        Integration::Mqtt
    }

    fn is_connected(&self) -> bool {
        self.session
            .load_full()
            .is_some_and(|session| session.is_connected())
    }

    fn is_configured(&self) -> bool {
        self.settings.load().is_some()
    }

    async fn reconfigure(&self, settings: AdapterSettings) -> Result<(), CoreError> {
        let AdapterSettings::Mqtt(settings) = settings else {
            return Err(settings_mismatch(Integration::Mqtt, &settings));
        };
        self.disconnect().await;
        self.cache.clear();
        self.settings.store(Some(Arc::new(settings)));
        Ok(())
    }

    async fn connect(&self) -> Result<(), CoreError> {
        let settings = self.settings.load_full().ok_or(CoreError::NotConfigured {
            integration: Integration::Mqtt,
        })?;
        self.disconnect().await;

        let address = mqtt::parse_broker_url(&settings.broker_url)?;
        let options = BrokerOptions::new(address)
            .with_credentials(settings.username.clone(), settings.password.clone());

        let cancel = CancellationToken::new();
        let session =
            MqttSession::connect(options, &mqtt::DEFAULT_FILTERS, cancel.child_token()).await?;

        // The first receiver carries retained state replayed right after SUBSCRIBE.
        let rx = session.messages();
        let handle = tokio::spawn(listen(rx, Arc::clone(&self.cache), cancel.clone()));
        *self.listener.lock().await = Some(Listener { cancel, handle });

        info!(broker = %settings.broker_url, "connected to MQTT broker");
        self.session.store(Some(Arc::new(session)));
        Ok(())
    }

    async fn disconnect(&self) {
        if let Some(session) = self.session.swap(None) {
            session.disconnect();
        }
        self.stop_listener().await;
    }

    async fn fetch_devices(&self) -> Result<Vec<Device>, CoreError> {
        self.session()?;
        let mut devices: Vec<Device> = self
            .cache
            .iter()
            .map(|entry| Device::clone(entry.value()))
            .collect();
        devices.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(devices)
    }

    async fn set_state(&self, device: &Device, state: &DeviceState) -> Result<(), CoreError> {
        let DeviceRoute::Mqtt { topic, family } = &device.route else {
            return Err(CoreError::RouteMismatch {
                identifier: device.id.to_string(),
                integration: Integration::Mqtt,
            });
        };

        let session = self.session()?;
        let payload = command_payload(*family, state)?;
        session.publish(topic, payload).await?;
        Ok(())
    }
}

// ── Discovery listener ───────────────────────────────────────────────

async fn listen(
    mut rx: broadcast::Receiver<Arc<InboundMessage>>,
    cache: Arc<DiscoveryCache>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            msg = rx.recv() => match msg {
                Ok(msg) => {
                    if let Some(device) = discover(&msg) {
                        trace!(id = %device.id, "discovered device");
                        cache.insert(device.id.clone(), Arc::new(device));
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(skipped = n, "MQTT listener lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }
    debug!("MQTT listener stopped");
}

/// Turn one inbound publish into a device, if its topic and payload are recognized.
fn discover(msg: &InboundMessage) -> Option<Device> {
    match classify_topic(&msg.topic) {
        TopicKind::TasmotaState { device } => match TasmotaState::parse(&msg.payload) {
            Ok(state) => Some(tasmota_device(device, &state)),
            Err(e) => {
                debug!(topic = %msg.topic, error = %e, "unparseable Tasmota state");
                None
            }
        },
        TopicKind::Zigbee { device } => match ZigbeeState::parse(&msg.payload) {
            Ok(state) => Some(zigbee_device(device, &state)),
            Err(e) => {
                debug!(topic = %msg.topic, error = %e, "unparseable Zigbee2MQTT state");
                None
            }
        },
        TopicKind::Other => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::model::{DeviceType, FirmwareFamily};

    fn message(topic: &str, payload: &str) -> InboundMessage {
        InboundMessage {
            topic: topic.into(),
            payload: Bytes::copy_from_slice(payload.as_bytes()),
        }
    }

    #[test]
    fn discovers_tasmota_switch() {
        let device = discover(&message("tele/porch_light/STATE", r#"{"POWER":"ON"}"#)).unwrap();
        assert_eq!(device.id.as_str(), "tasmota_porch_light");
        assert_eq!(device.device_type, DeviceType::Switch);
        assert!(device.state.is_on);
        assert_eq!(
            device.route,
            DeviceRoute::Mqtt {
                topic: "cmnd/porch_light/POWER".into(),
                family: FirmwareFamily::Tasmota,
            }
        );
    }

    #[test]
    fn discovers_zigbee_light() {
        let device = discover(&message("zigbee2mqtt/desk", r#"{"state":"ON","brightness":127}"#)).unwrap();
        assert_eq!(device.id.as_str(), "zigbee_desk");
        assert_eq!(device.device_type, DeviceType::Light);
        assert_eq!(device.state.brightness, Some(50));
    }

    #[test]
    fn ignores_nested_and_foreign_topics() {
        assert!(discover(&message("zigbee2mqtt/bridge/state", "online")).is_none());
        assert!(discover(&message("homeai/ping", "{}")).is_none());
        assert!(discover(&message("zigbee2mqtt/desk", "not json")).is_none());
    }

    #[tokio::test]
    async fn listener_fills_cache_until_cancelled() {
        let (tx, rx) = broadcast::channel(8);
        let cache = Arc::new(DiscoveryCache::new());
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(listen(rx, Arc::clone(&cache), cancel.clone()));

        tx.send(Arc::new(message("tele/a/STATE", r#"{"POWER":"OFF"}"#))).unwrap();
        tx.send(Arc::new(message("tele/a/STATE", r#"{"POWER":"ON"}"#))).unwrap();
        drop(tx);
        handle.await.unwrap();

        assert_eq!(cache.len(), 1);
        assert!(cache.get("tasmota_a").unwrap().state.is_on);
        assert!(!cancel.is_cancelled());
    }

    #[tokio::test]
    async fn unconfigured_and_disconnected() {
        let adapter = MqttAdapter::new(None);
        assert!(!adapter.is_configured());
        assert!(matches!(
            adapter.connect().await,
            Err(CoreError::NotConfigured { integration: Integration::Mqtt })
        ));
        assert!(matches!(
            adapter.fetch_devices().await,
            Err(CoreError::IntegrationDisconnected { .. })
        ));
        assert!(adapter.list_devices().await.is_empty());
    }

    #[tokio::test]
    async fn failed_connect_leaves_no_listener() {
        let adapter = MqttAdapter::new(Some(MqttSettings {
            broker_url: "tcp://127.0.0.1:1".into(),
            username: None,
            password: None,
        }));

        assert!(adapter.connect().await.is_err());
        assert!(adapter.listener.lock().await.is_none());
        assert!(!adapter.is_connected());
    }

    fn tasmota_plug() -> Device {
        tasmota_device("porch", &TasmotaState::parse(br#"{"POWER":"OFF"}"#).unwrap())
    }

    #[tokio::test]
    async fn set_state_rejects_foreign_route() {
        let adapter = MqttAdapter::new(None);
        let mut device = tasmota_plug();
        device.route = DeviceRoute::HomeAssistant {
            entity_id: "switch.porch".into(),
        };

        let err = adapter.set_state(&device, &DeviceState::on()).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::RouteMismatch { integration: Integration::Mqtt, ref identifier }
                if identifier == "tasmota_porch"
        ));
    }

    #[tokio::test]
    async fn set_state_without_session_is_disconnected() {
        let adapter = MqttAdapter::new(Some(MqttSettings {
            broker_url: "tcp://127.0.0.1:1".into(),
            username: None,
            password: None,
        }));

        let err = adapter
            .set_state(&tasmota_plug(), &DeviceState::on())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::IntegrationDisconnected { integration: Integration::Mqtt }
        ));
    }
}
