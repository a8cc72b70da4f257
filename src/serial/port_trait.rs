//! Trait abstraction for the byte transport under the UMB client
//!
//! The serial port, a TCP-to-serial bridge and test doubles all implement
//! [`UmbTransport`], so framing logic exists only once.

use async_trait::async_trait;
use std::io;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;

/// Upper bound for one idle-delimited response
///
/// A UMB frame is at most 267 bytes; anything far beyond that means the
/// line is carrying something other than our response.
pub const MAX_RESPONSE_SIZE: usize = 1024;

/// Silence that ends a response, sampled in `poll_interval` steps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdleTimeout {
    /// Total silence after which the response is considered complete
    pub threshold: Duration,

    /// Granularity of the silence measurement
    pub poll_interval: Duration,
}

impl IdleTimeout {
    pub const fn new(threshold: Duration, poll_interval: Duration) -> Self {
        Self {
            threshold,
            poll_interval,
        }
    }

    /// Number of consecutive empty polls that make up the threshold
    pub fn idle_polls(&self) -> u32 {
        let poll = self.poll_interval.as_nanos().max(1);
        let polls = self.threshold.as_nanos().div_ceil(poll).max(1);
        u32::try_from(polls).unwrap_or(u32::MAX)
    }
}

impl Default for IdleTimeout {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_millis(10))
    }
}

/// Trait for UMB transport I/O operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UmbTransport: Send {
    /// Write all data to the line
    async fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Flush the output buffer
    async fn flush(&mut self) -> io::Result<()>;

    /// Collect bytes until the line has been idle for `idle.threshold`
    ///
    /// Returns whatever arrived, possibly nothing.
    async fn read_until_idle(&mut self, idle: IdleTimeout) -> io::Result<Vec<u8>>;
}

/// Read from `reader` until no byte arrived for `idle.threshold`
///
/// End of stream also ends the response, unless nothing was received at
/// all, which is reported as [`io::ErrorKind::UnexpectedEof`].
///
/// # Errors
///
/// * Read errors of the underlying stream
/// * [`io::ErrorKind::InvalidData`] once more than [`MAX_RESPONSE_SIZE`]
///   bytes accumulate
pub async fn read_until_idle<R>(reader: &mut R, idle: IdleTimeout) -> io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let max_idle_polls = idle.idle_polls();
    let mut data = Vec::new();
    let mut buffer = [0u8; 64];
    let mut idle_polls = 0;

    while idle_polls < max_idle_polls {
        match timeout(idle.poll_interval, reader.read(&mut buffer)).await {
            Ok(Ok(0)) => {
                if data.is_empty() {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "stream closed before any response byte",
                    ));
                }
                break;
            }
            Ok(Ok(n)) => {
                data.extend_from_slice(&buffer[..n]);
                idle_polls = 0;

                if data.len() > MAX_RESPONSE_SIZE {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("response exceeds {} bytes", MAX_RESPONSE_SIZE),
                    ));
                }
            }
            Ok(Err(e)) => return Err(e),
            Err(_) => idle_polls += 1,
        }
    }

    Ok(data)
}

/// [`UmbTransport`] over any async byte stream
pub struct StreamTransport<S> {
    stream: S,
}

impl<S> StreamTransport<S> {
    pub fn new(stream: S) -> Self {
        Self { stream }
    }
}

#[async_trait]
impl<S> UmbTransport for StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.stream.write_all(data).await
    }

    async fn flush(&mut self) -> io::Result<()> {
        self.stream.flush().await
    }

    async fn read_until_idle(&mut self, idle: IdleTimeout) -> io::Result<Vec<u8>> {
        read_until_idle(&mut self.stream, idle).await
    }
}
