//! # UMB Client
//!
//! Request/response exchange with a station over any [`UmbTransport`].
//!
//! The protocol has no request ids, so a client serves one request at a
//! time; `&mut self` on every exchange enforces that. Tasks sharing a link
//! wrap the client in a `tokio::sync::Mutex`.

use tracing::debug;

use crate::error::{Result, UmbError};
use crate::serial::port_trait::{IdleTimeout, UmbTransport};
use crate::umb::decoder::parse_response;
use crate::umb::encoder::encode_request;
use crate::umb::protocol::{Address, Reading, RequestFrame};

/// UMB master talking to stations on one link
#[derive(Debug)]
pub struct UmbClient<T> {
    transport: T,
    idle: IdleTimeout,
}

impl<T: UmbTransport> UmbClient<T> {
    /// Create a client on an already opened transport
    ///
    /// # Arguments
    ///
    /// * `transport` - Connected byte transport
    /// * `idle` - Line silence that delimits a response
    pub fn new(transport: T, idle: IdleTimeout) -> Self {
        Self { transport, idle }
    }

    /// Send one command to a device and decode its reading
    ///
    /// # Arguments
    ///
    /// * `receiver_id` - Device id of the station
    /// * `command` - Command code
    /// * `command_version` - Command version
    /// * `payload` - Command payload (max 253 bytes)
    ///
    /// # Returns
    ///
    /// * `Result<Reading>` - Value and device status; a non-zero status is
    ///   returned, not raised
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The payload does not fit a frame
    /// - Writing or reading the line fails ([`UmbError::Io`] with the
    ///   transport's error kind)
    /// - No byte arrives before the line goes idle
    /// - The response fails checksum, structure or value decoding
    pub async fn send_request(
        &mut self,
        receiver_id: u8,
        command: u8,
        command_version: u8,
        payload: &[u8],
    ) -> Result<Reading> {
        let request = RequestFrame::new(
            Address::device(receiver_id),
            command,
            command_version,
            payload.to_vec(),
        )?;
        self.exchange(&request).await
    }

    /// Query the current value of one measurement channel
    ///
    /// Command 35 (online data request), version 16, channel as a
    /// little-endian `u16` payload.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use umb_station::client::UmbClient;
    /// use umb_station::serial::port_trait::IdleTimeout;
    /// use umb_station::serial::{RetryPolicy, SerialLink, UMB_DEFAULT_BAUD_RATE};
    ///
    /// #[tokio::main]
    /// async fn main() -> anyhow::Result<()> {
    ///     let link = SerialLink::connect("/dev/ttyUSB0", UMB_DEFAULT_BAUD_RATE, RetryPolicy::default()).await?;
    ///     let mut client = UmbClient::new(link, IdleTimeout::default());
    ///
    ///     let reading = client.online_data_query(1, 100).await?;
    ///     if let Some(value) = reading.value {
    ///         println!("Temperature: {} ({})", value, reading.status);
    ///     }
    ///     Ok(())
    /// }
    /// ```
    pub async fn online_data_query(&mut self, receiver_id: u8, channel: u16) -> Result<Reading> {
        self.exchange(&RequestFrame::online_data(receiver_id, channel)).await
    }

    /// Write one request and parse the idle-delimited answer
    async fn exchange(&mut self, request: &RequestFrame) -> Result<Reading> {
        let frame = encode_request(request)?;

        self.transport.write_all(&frame).await.map_err(|e| {
            debug!("Failed to write request to {}: {}", request.destination, e);
            e
        })?;

        self.transport.flush().await.map_err(|e| {
            debug!("Failed to flush request to {}: {}", request.destination, e);
            e
        })?;

        debug!("Sent UMB request to {}: {:02X?}", request.destination, frame);

        let response = self.transport.read_until_idle(self.idle).await.map_err(|e| {
            debug!("Failed to read response from {}: {}", request.destination, e);
            e
        })?;

        if response.is_empty() {
            return Err(UmbError::NoResponse(self.idle.threshold));
        }

        debug!("Received UMB response ({} bytes): {:02X?}", response.len(), response);

        let reading = parse_response(&response, request)?;
        Ok(reading)
    }
}
