// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Best-effort relay of the latest reading to a paired companion device.
//!
//! The companion exposes a small data layer: a presence check and a
//! key-value "data item" endpoint addressed by path. A missing companion is
//! the common case and is reported as [`RelayOutcome::Skipped`].

use crate::error::SyncError;
use crate::models::GlucoseMeasurement;
use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Data-layer path the companion listens on.
pub const GLUCOSE_PATH: &str = "/glucose";

/// Payload keys understood by the companion.
pub mod keys {
    pub const GLUCOSE: &str = "glucose";
    pub const TREND_ARROW: &str = "trendArrow";
    pub const COLOR: &str = "color";
    pub const UNITS: &str = "units";
    pub const TIMESTAMP: &str = "timestamp";
}

/// One typed value in a data item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DataValue {
    Float(f64),
    Int(i32),
    Text(String),
}

/// Flat key-value payload.
pub type DataMap = BTreeMap<String, DataValue>;

/// Platform channel to the companion device.
#[async_trait]
pub trait CompanionChannel: Send + Sync {
    /// Whether a companion app is present to receive data.
    async fn is_installed(&self) -> bool;

    /// Push a data item and wait for the companion's acknowledgment.
    async fn put_data_item(&self, path: &str, data: &DataMap) -> Result<(), SyncError>;
}

/// Result of one relay attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    Relayed,
    /// No companion present; not an error.
    Skipped,
    Failed(String),
}

/// Build the data item for a measurement.
pub fn build_payload(measurement: &GlucoseMeasurement) -> DataMap {
    let mut data = DataMap::new();
    data.insert(keys::GLUCOSE.to_string(), DataValue::Float(measurement.value));
    data.insert(
        keys::COLOR.to_string(),
        DataValue::Int(measurement.measurement_color),
    );
    data.insert(
        keys::TREND_ARROW.to_string(),
        DataValue::Int(measurement.trend_arrow.unwrap_or(0)),
    );
    data.insert(
        keys::UNITS.to_string(),
        DataValue::Int(measurement.glucose_units),
    );
    data.insert(
        keys::TIMESTAMP.to_string(),
        DataValue::Text(measurement.factory_timestamp.clone()),
    );
    data
}

/// Relays measurements over an optional companion channel.
#[derive(Clone)]
pub struct CompanionRelay {
    channel: Option<Arc<dyn CompanionChannel>>,
    ack_timeout: Duration,
}

impl CompanionRelay {
    pub fn new(channel: Option<Arc<dyn CompanionChannel>>, ack_timeout: Duration) -> Self {
        Self {
            channel,
            ack_timeout,
        }
    }

    /// Relay that always skips (no companion configured).
    pub fn disabled() -> Self {
        Self::new(None, Duration::from_secs(0))
    }

    /// Push the measurement to the companion, if one is present.
    pub async fn relay(&self, measurement: &GlucoseMeasurement) -> RelayOutcome {
        let Some(channel) = &self.channel else {
            return RelayOutcome::Skipped;
        };

        if !channel.is_installed().await {
            tracing::debug!("No companion app present, skipping relay");
            return RelayOutcome::Skipped;
        }

        let payload = build_payload(measurement);

        match tokio::time::timeout(
            self.ack_timeout,
            channel.put_data_item(GLUCOSE_PATH, &payload),
        )
        .await
        {
            Ok(Ok(())) => {
                tracing::info!(path = GLUCOSE_PATH, "Reading relayed to companion");
                RelayOutcome::Relayed
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Companion relay failed");
                RelayOutcome::Failed(e.to_string())
            }
            Err(_) => {
                tracing::warn!(
                    timeout_secs = self.ack_timeout.as_secs(),
                    "Companion relay timed out"
                );
                RelayOutcome::Failed("timed out waiting for acknowledgment".to_string())
            }
        }
    }
}

/// Companion data layer reached over HTTP.
///
/// - `GET {base}/status` answers 2xx when the companion app is running
/// - `POST {base}/data-items` with `{path, data}` answers 2xx once stored
#[derive(Clone)]
pub struct HttpCompanionChannel {
    http: reqwest::Client,
    base_url: String,
}

impl HttpCompanionChannel {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build companion HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[derive(Serialize)]
struct DataItemRequest<'a> {
    path: &'a str,
    data: &'a DataMap,
}

#[async_trait]
impl CompanionChannel for HttpCompanionChannel {
    async fn is_installed(&self) -> bool {
        let url = format!("{}/status", self.base_url);
        match self.http.get(&url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                tracing::debug!(error = %e, "Companion status check failed");
                false
            }
        }
    }

    async fn put_data_item(&self, path: &str, data: &DataMap) -> Result<(), SyncError> {
        let url = format!("{}/data-items", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&DataItemRequest { path, data })
            .send()
            .await
            .map_err(|e| SyncError::Relay(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(SyncError::Relay(format!("HTTP {}", response.status())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn measurement() -> GlucoseMeasurement {
        GlucoseMeasurement {
            factory_timestamp: "1/2/2024 3:04:05 PM".to_string(),
            timestamp: None,
            value: 120.0,
            value_in_mg_per_dl: Some(120.0),
            measurement_color: 1,
            glucose_units: 1,
            trend_arrow: Some(4),
            is_high: false,
            is_low: false,
        }
    }

    fn relay_over(channel: Arc<dyn CompanionChannel>, ack_timeout: Duration) -> CompanionRelay {
        CompanionRelay::new(Some(channel), ack_timeout)
    }

    /// Channel double with a fixed presence answer.
    struct FakeChannel {
        installed: bool,
        delay: Duration,
        pushes: AtomicUsize,
    }

    #[async_trait]
    impl CompanionChannel for FakeChannel {
        async fn is_installed(&self) -> bool {
            self.installed
        }

        async fn put_data_item(&self, _path: &str, _data: &DataMap) -> Result<(), SyncError> {
            tokio::time::sleep(self.delay).await;
            self.pushes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn test_payload_carries_raw_fields() {
        let payload = build_payload(&measurement());
        assert_eq!(payload[keys::GLUCOSE], DataValue::Float(120.0));
        assert_eq!(payload[keys::COLOR], DataValue::Int(1));
        assert_eq!(payload[keys::TREND_ARROW], DataValue::Int(4));
        assert_eq!(payload[keys::UNITS], DataValue::Int(1));
        assert_eq!(
            payload[keys::TIMESTAMP],
            DataValue::Text("1/2/2024 3:04:05 PM".to_string())
        );
    }

    #[tokio::test]
    async fn test_absent_companion_is_skipped() {
        let channel = Arc::new(FakeChannel {
            installed: false,
            delay: Duration::ZERO,
            pushes: AtomicUsize::new(0),
        });
        let relay = relay_over(channel.clone(), Duration::from_secs(1));

        assert_eq!(relay.relay(&measurement()).await, RelayOutcome::Skipped);
        assert_eq!(channel.pushes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_disabled_relay_is_skipped() {
        assert_eq!(
            CompanionRelay::disabled().relay(&measurement()).await,
            RelayOutcome::Skipped
        );
    }

    #[tokio::test]
    async fn test_present_companion_is_relayed() {
        let channel = Arc::new(FakeChannel {
            installed: true,
            delay: Duration::ZERO,
            pushes: AtomicUsize::new(0),
        });
        let relay = relay_over(channel.clone(), Duration::from_secs(1));

        assert_eq!(relay.relay(&measurement()).await, RelayOutcome::Relayed);
        assert_eq!(channel.pushes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_slow_ack_times_out() {
        let channel = Arc::new(FakeChannel {
            installed: true,
            delay: Duration::from_secs(5),
            pushes: AtomicUsize::new(0),
        });
        let relay = relay_over(channel, Duration::from_millis(50));

        assert!(matches!(
            relay.relay(&measurement()).await,
            RelayOutcome::Failed(_)
        ));
    }

    #[tokio::test]
    async fn test_http_channel_pushes_data_item() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/status"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/data-items"))
            .and(body_json(serde_json::json!({
                "path": "/glucose",
                "data": {
                    "color": 1,
                    "glucose": 120.0,
                    "timestamp": "1/2/2024 3:04:05 PM",
                    "trendArrow": 4,
                    "units": 1
                }
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let channel =
            Arc::new(HttpCompanionChannel::new(server.uri(), Duration::from_secs(2)).unwrap());
        let relay = relay_over(channel, Duration::from_secs(2));

        assert_eq!(relay.relay(&measurement()).await, RelayOutcome::Relayed);
    }

    #[tokio::test]
    async fn test_http_channel_unreachable_is_skipped() {
        let channel = Arc::new(
            HttpCompanionChannel::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap(),
        );
        let relay = relay_over(channel, Duration::from_secs(1));

        assert_eq!(relay.relay(&measurement()).await, RelayOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_http_channel_applies_request_timeout() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/status"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let channel = Arc::new(
            HttpCompanionChannel::new(server.uri(), Duration::from_millis(200)).unwrap(),
        );
        // Ack timeout far above the request timeout; only the client can cut this short.
        let relay = relay_over(channel, Duration::from_secs(30));

        let outcome = tokio::time::timeout(Duration::from_secs(3), relay.relay(&measurement()))
            .await
            .expect("request timeout not applied");
        assert_eq!(outcome, RelayOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_http_channel_rejected_push_is_failure() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/status"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/data-items"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let channel =
            Arc::new(HttpCompanionChannel::new(server.uri(), Duration::from_secs(2)).unwrap());
        let relay = relay_over(channel, Duration::from_secs(2));

        assert!(matches!(
            relay.relay(&measurement()).await,
            RelayOutcome::Failed(_)
        ));
    }
}
