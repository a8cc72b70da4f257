//! # Station Poller
//!
//! Queries the configured channels once per cycle and collects the values
//! into a [`WeatherRecord`]. Channels with `every = n` are only queried on
//! every n-th cycle.

use std::collections::BTreeMap;

use chrono::Local;
use serde::Serialize;
use tracing::{debug, warn};

use crate::client::UmbClient;
use crate::config::{ChannelConfig, StationConfig};
use crate::serial::port_trait::UmbTransport;
use crate::umb::protocol::Reading;

/// Timestamp format of persisted records
pub const RECORD_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Values collected in one polling cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherRecord {
    /// Local time the cycle started
    pub timestamp: String,

    /// Channel name to value
    #[serde(flatten)]
    pub readings: BTreeMap<String, f64>,
}

/// Cycles through the configured channels of one station
#[derive(Debug)]
pub struct Poller {
    receiver_id: u8,
    channels: Vec<ChannelConfig>,
    cycle: u64,
}

impl Poller {
    pub fn new(station: &StationConfig) -> Self {
        Self {
            receiver_id: station.receiver_id,
            channels: station.channels.clone(),
            cycle: 0,
        }
    }

    /// Number of completed cycles
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Channels due in the current cycle
    pub fn due_channels(&self) -> impl Iterator<Item = &ChannelConfig> {
        let cycle = self.cycle;
        self.channels
            .iter()
            .filter(move |channel| cycle % u64::from(channel.every.max(1)) == 0)
    }

    /// Run one polling cycle
    ///
    /// A channel that fails or reports a non-zero status is left out of the
    /// record; the cycle itself never fails.
    pub async fn poll_cycle<T: UmbTransport>(&mut self, client: &mut UmbClient<T>) -> WeatherRecord {
        let timestamp = Local::now().format(RECORD_TIMESTAMP_FORMAT).to_string();
        let mut readings = BTreeMap::new();
        let due: Vec<ChannelConfig> = self.due_channels().cloned().collect();

        for channel in &due {
            let name = channel.display_name();

            match client.online_data_query(self.receiver_id, channel.channel).await {
                Ok(Reading {
                    status,
                    value: Some(value),
                    ..
                }) if status.is_success() => {
                    let value = round_to(value.as_f64(), channel.decimals);
                    debug!("Channel {} ({}): {}", channel.channel, name, value);
                    readings.insert(name, value);
                }
                Ok(reading) => {
                    warn!(
                        "Channel {} ({}) skipped, device status: {}",
                        channel.channel, name, reading.status
                    );
                }
                Err(e) => {
                    warn!("Channel {} ({}) query failed: {}", channel.channel, name, e);
                }
            }
        }

        self.cycle += 1;
        WeatherRecord { timestamp, readings }
    }
}

/// Round to `decimals` places; `None` keeps the value as is
fn round_to(value: f64, decimals: Option<u32>) -> f64 {
    match decimals {
        Some(decimals) => {
            let factor = 10f64.powi(decimals as i32);
            (value * factor).round() / factor
        }
        None => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serial::port_trait::{IdleTimeout, MockUmbTransport};
    use crate::umb::encoder::{encode_frame, encode_online_data_response};
    use crate::umb::protocol::{Address, Value, UMB_CMD_ONLINE_DATA, UMB_CMD_ONLINE_DATA_VERSION};
    use crate::umb::status::DeviceStatus;
    use std::collections::VecDeque;
    use std::time::Duration;

    fn channel(channel: u16, every: u32) -> ChannelConfig {
        ChannelConfig {
            channel,
            name: None,
            decimals: Some(2),
            every,
        }
    }

    fn station(channels: Vec<ChannelConfig>) -> StationConfig {
        StationConfig {
            receiver_id: 1,
            poll_interval_s: 60,
            channels,
        }
    }

    fn scripted(responses: Vec<Vec<u8>>) -> UmbClient<MockUmbTransport> {
        let mut queue = VecDeque::from(responses);
        let mut mock = MockUmbTransport::new();
        mock.expect_write_all().returning(|_| Ok(()));
        mock.expect_flush().returning(|| Ok(()));
        mock.expect_read_until_idle()
            .returning(move |_| Ok(queue.pop_front().unwrap_or_default()));
        UmbClient::new(mock, IdleTimeout::new(Duration::from_millis(20), Duration::from_millis(5)))
    }

    fn response(channel: u16, status: DeviceStatus, value: Value) -> Vec<u8> {
        encode_online_data_response(1, status, channel, value).unwrap()
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(21.456, Some(2)), 21.46);
        assert_eq!(round_to(21.456, Some(0)), 21.0);
        assert_eq!(round_to(21.456, None), 21.456);
    }

    #[test]
    fn test_due_channels_every() {
        let mut poller = Poller::new(&station(vec![channel(100, 1), channel(800, 6)]));
        assert_eq!(poller.due_channels().count(), 2);

        for cycle in 1..6 {
            poller.cycle = cycle;
            let due: Vec<u16> = poller.due_channels().map(|c| c.channel).collect();
            assert_eq!(due, vec![100], "cycle {}", cycle);
        }

        poller.cycle = 6;
        assert_eq!(poller.due_channels().count(), 2);
    }

    #[tokio::test]
    async fn test_poll_cycle_collects_readings() {
        let mut client = scripted(vec![
            response(100, DeviceStatus::Success, Value::F32(21.456)),
            response(200, DeviceStatus::Success, Value::F32(61.5)),
            response(700, DeviceStatus::Success, Value::U8(60)),
        ]);
        let mut poller = Poller::new(&station(vec![
            channel(100, 1),
            channel(200, 1),
            ChannelConfig {
                decimals: None,
                ..channel(700, 1)
            },
        ]));

        let record = poller.poll_cycle(&mut client).await;

        assert_eq!(poller.cycle(), 1);
        assert_eq!(record.readings.len(), 3);
        assert_eq!(record.readings["air_temperature"], 21.46);
        assert_eq!(record.readings["relative_humidity"], 61.5);
        assert_eq!(record.readings["precipitation_type"], 60.0);
        assert_eq!(record.timestamp.len(), 19);
    }

    #[tokio::test]
    async fn test_poll_cycle_skips_failures_and_device_status() {
        let mut client = scripted(vec![
            response(100, DeviceStatus::Success, Value::F32(20.0)),
            response(200, DeviceStatus::MeasurementError, Value::F32(0.0)),
            vec![0x01, 0x10, 0xFF],
            Vec::new(),
            // Invalid channel, answered without type tag and value
            encode_frame(
                Address::CONTROLLER,
                Address::device(1),
                UMB_CMD_ONLINE_DATA,
                UMB_CMD_ONLINE_DATA_VERSION,
                &[36, 0xF4, 0x01],
            )
            .unwrap(),
        ]);
        let mut poller = Poller::new(&station(vec![
            channel(100, 1),
            channel(200, 1),
            channel(300, 1),
            channel(400, 1),
            channel(500, 1),
        ]));

        let record = poller.poll_cycle(&mut client).await;

        assert_eq!(record.readings.len(), 1);
        assert_eq!(record.readings["air_temperature"], 20.0);
    }

    #[test]
    fn test_record_serialization() {
        let mut readings = BTreeMap::new();
        readings.insert("air_temperature".to_string(), 25.0);
        readings.insert("wind_speed".to_string(), 3.2);
        let record = WeatherRecord {
            timestamp: "2026-10-17T12:00:00".to_string(),
            readings,
        };

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"timestamp":"2026-10-17T12:00:00","air_temperature":25.0,"wind_speed":3.2}"#
        );
    }
}
