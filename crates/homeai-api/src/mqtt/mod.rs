//! MQTT broker session with auto-reconnect.
//!
//! Opens a persistent session to a broker and streams inbound publishes
//! through a [`tokio::sync::broadcast`] channel. The event loop runs on a
//! background task: it re-subscribes after every reconnect and backs off
//! exponentially while the broker is unreachable.
//!
//! # Example
//!
//! ```rust,ignore
//! use homeai_api::mqtt::{self, BrokerOptions, MqttSession};
//! use tokio_util::sync::CancellationToken;
//!
//! let address = mqtt::parse_broker_url("tcp://192.168.1.20:1883")?;
//! let options = BrokerOptions::new(address);
//! let session = MqttSession::connect(options, &mqtt::DEFAULT_FILTERS, CancellationToken::new()).await?;
//! let mut rx = session.messages();
//!
//! while let Ok(msg) = rx.recv().await {
//!     println!("{}: {}", msg.topic, msg.payload_str());
//! }
//! ```

mod broker;
mod payload;
mod topic;

pub use broker::{BrokerAddress, BrokerOptions, generate_client_id, parse_broker_url};
pub use payload::{TasmotaState, ZigbeeCommand, ZigbeeState, tasmota_power_payload};
pub use topic::{
    DEFAULT_FILTERS, HOMEAI_FILTER, TASMOTA_STATE_FILTER, TopicKind, ZIGBEE_FILTER,
    classify_topic, tasmota_command_topic, zigbee_command_topic,
};

use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use rumqttc::{AsyncClient, Event, EventLoop, Packet, QoS, SubscribeFilter};
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::error::Error;

// ── Channel capacities ───────────────────────────────────────────────

const REQUEST_CHANNEL_CAPACITY: usize = 64;
const MESSAGE_CHANNEL_CAPACITY: usize = 1024;

// ── InboundMessage ───────────────────────────────────────────────────

/// A publish received from the broker.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: Bytes,
}

impl InboundMessage {
    /// Payload as text, lossily decoded.
    pub fn payload_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }
}

// ── ReconnectConfig ──────────────────────────────────────────────────

/// Exponential backoff configuration for broker reconnection.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt. Default: 1s.
    pub initial_delay: Duration,

    /// Upper bound on backoff delay. Default: 30s.
    pub max_delay: Duration,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

// ── MqttSession ──────────────────────────────────────────────────────

/// Handle to a running broker session.
pub struct MqttSession {
    client: AsyncClient,
    message_tx: broadcast::Sender<Arc<InboundMessage>>,
    /// Receiver opened before SUBSCRIBE went out; handed to the first
    /// [`messages`](Self::messages) caller.
    first_rx: Mutex<Option<broadcast::Receiver<Arc<InboundMessage>>>>,
    connected: watch::Receiver<bool>,
    cancel: CancellationToken,
}

impl MqttSession {
    /// Connect to the broker, subscribe to `filters` at QoS 0, and spawn the
    /// session loop.
    ///
    /// Resolves once the broker has acknowledged the connection, or fails
    /// after `options.connect_timeout`. The filters are re-sent after every
    /// reconnect.
    pub async fn connect(
        options: BrokerOptions,
        filters: &[&str],
        cancel: CancellationToken,
    ) -> Result<Self, Error> {
        info!(
            host = %options.address.host,
            port = options.address.port,
            client_id = %options.client_id,
            "connecting to MQTT broker"
        );

        let (client, mut eventloop) =
            AsyncClient::new(options.to_mqtt_options(), REQUEST_CHANNEL_CAPACITY);

        match tokio::time::timeout(options.connect_timeout, wait_for_connack(&mut eventloop)).await
        {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                return Err(Error::Timeout {
                    timeout_secs: options.connect_timeout.as_secs(),
                });
            }
        }
        info!("MQTT session established");

        let (message_tx, first_rx) = broadcast::channel(MESSAGE_CHANNEL_CAPACITY);
        let (connected_tx, connected) = watch::channel(true);
        let subscriptions: Arc<[String]> = filters.iter().map(|f| (*f).to_owned()).collect();

        if !subscriptions.is_empty() {
            debug!(?filters, "subscribing");
            client
                .subscribe_many(subscribe_filters(filters.iter().copied()))
                .await?;
        }

        tokio::spawn(session_loop(
            eventloop,
            client.clone(),
            subscriptions,
            message_tx.clone(),
            connected_tx,
            ReconnectConfig::default(),
            cancel.clone(),
        ));

        Ok(Self {
            client,
            message_tx,
            first_rx: Mutex::new(Some(first_rx)),
            connected,
            cancel,
        })
    }

    /// Get a receiver for inbound publishes.
    ///
    /// The first call returns a receiver that has buffered everything since
    /// the subscription, retained messages included; later calls see only
    /// new publishes. If a consumer falls behind, it receives
    /// [`broadcast::error::RecvError::Lagged`].
    pub fn messages(&self) -> broadcast::Receiver<Arc<InboundMessage>> {
        let first = self.first_rx.lock().ok().and_then(|mut rx| rx.take());
        first.unwrap_or_else(|| self.message_tx.subscribe())
    }

    /// Publish a payload at QoS 0, not retained.
    pub async fn publish(&self, topic: &str, payload: impl Into<Vec<u8>>) -> Result<(), Error> {
        if self.cancel.is_cancelled() {
            return Err(Error::MqttClosed);
        }
        debug!(topic, "publishing");
        self.client
            .publish(topic, QoS::AtMostOnce, false, payload)
            .await?;
        Ok(())
    }

    /// Whether the broker connection is currently up.
    pub fn is_connected(&self) -> bool {
        !self.cancel.is_cancelled() && *self.connected.borrow()
    }

    /// Send DISCONNECT and stop the session loop.
    pub fn disconnect(&self) {
        if let Err(e) = self.client.try_disconnect() {
            debug!(error = %e, "disconnect request not queued");
        }
        self.cancel.cancel();
    }
}

impl Drop for MqttSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ── Background session loop ──────────────────────────────────────────

async fn wait_for_connack(eventloop: &mut EventLoop) -> Result<(), Error> {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => return Ok(()),
            Ok(_) => {}
            Err(e) => return Err(Error::MqttConnect(e.to_string())),
        }
    }
}

/// Main loop: poll → dispatch → on error, backoff → poll again (which reconnects).
async fn session_loop(
    mut eventloop: EventLoop,
    client: AsyncClient,
    subscriptions: Arc<[String]>,
    message_tx: broadcast::Sender<Arc<InboundMessage>>,
    connected_tx: watch::Sender<bool>,
    reconnect: ReconnectConfig,
    cancel: CancellationToken,
) {
    let mut attempt: u32 = 0;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            event = eventloop.poll() => match event {
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    trace!(topic = %publish.topic, bytes = publish.payload.len(), "MQTT message");
                    // No subscribers is fine; nobody is listening yet.
                    let _ = message_tx.send(Arc::new(InboundMessage {
                        topic: publish.topic,
                        payload: publish.payload,
                    }));
                }
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    info!(attempt, "MQTT session re-established");
                    attempt = 0;
                    connected_tx.send_replace(true);
                    resubscribe(&client, &subscriptions);
                }
                Ok(_) => {}
                Err(e) => {
                    connected_tx.send_replace(false);
                    warn!(error = %e, attempt, "MQTT connection error");

                    let delay = calculate_backoff(attempt, &reconnect);
                    debug!(delay_secs = delay.as_secs_f64(), attempt, "waiting before reconnect");

                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => break,
                        () = tokio::time::sleep(delay) => {}
                    }

                    attempt = attempt.saturating_add(1);
                }
            }
        }
    }

    // Flush a queued DISCONNECT, if any.
    let _ = tokio::time::timeout(Duration::from_millis(250), eventloop.poll()).await;
    connected_tx.send_replace(false);
    debug!("MQTT session loop exiting");
}

fn resubscribe(client: &AsyncClient, subscriptions: &[String]) {
    if subscriptions.is_empty() {
        return;
    }
    if let Err(e) = client.try_subscribe_many(subscribe_filters(subscriptions.iter().map(String::as_str))) {
        warn!(error = %e, "failed to queue re-subscription");
    }
}

fn subscribe_filters<'a>(filters: impl Iterator<Item = &'a str>) -> Vec<SubscribeFilter> {
    filters
        .map(|f| SubscribeFilter::new(f.to_owned(), QoS::AtMostOnce))
        .collect()
}

// ── Backoff calculation ──────────────────────────────────────────────

/// Exponential backoff with jitter.
///
/// `delay = min(initial * 2^attempt, max) + jitter`
///
/// Jitter is +-25% to spread out reconnection storms from many clients.
fn calculate_backoff(attempt: u32, config: &ReconnectConfig) -> Duration {
    let exponent = i32::try_from(attempt.min(16)).unwrap_or(16);
    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(exponent);
    let capped = base.min(config.max_delay.as_secs_f64());

    // Deterministic "jitter" seeded from the attempt number.
    let jitter_factor = 1.0 + 0.25 * (f64::from(attempt) * 7.3).sin();
    let with_jitter = (capped * jitter_factor).max(0.0);

    Duration::from_secs_f64(with_jitter)
}

// ── Tests ────────────────────────────────────────────────────────────
