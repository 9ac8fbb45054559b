//! Raw frame relay to the upstream collector servers
//!
//! The received frame is forwarded verbatim over a fresh outbound
//! connection: primary collector first, secondary on any connect, send or
//! receive failure. The forwarder runs in its own spawned task with its
//! own socket, so a slow or unreachable collector never delays the
//! acknowledgment written back to the logger, and nothing here can touch
//! the inbound connection.

use std::io;
use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, error, info};

use crate::config::ForwardConfig;

/// Fixed timeout for each upstream connect/send/receive step
const FORWARD_TIMEOUT: Duration = Duration::from_secs(10);

/// Collectors reply with at most one frame; reads are capped like the
/// inbound path.
const REPLY_CHUNK: usize = 1024;

/// Upstream collector address/port pair
#[derive(Debug, Clone)]
pub struct ForwardTarget {
    pub address: String,
    pub port: u16,
}

/// Relays raw frames upstream with primary→secondary failover
#[derive(Debug, Clone)]
pub struct Forwarder {
    primary: ForwardTarget,
    secondary: ForwardTarget,
}

impl Forwarder {
    pub fn new(config: &ForwardConfig) -> Self {
        Self {
            primary: ForwardTarget {
                address: config.primary_address.clone(),
                port: config.primary_port,
            },
            secondary: ForwardTarget {
                address: config.secondary_address.clone(),
                port: config.secondary_port,
            },
        }
    }

    /// Forward one frame: primary first, secondary on failure
    ///
    /// Both collectors failing is logged only; forwarding outcome is never
    /// surfaced to the originating device.
    pub async fn forward(&self, raw: Bytes) {
        if self.send_to(&self.primary, &raw).await {
            return;
        }
        if !self.send_to(&self.secondary, &raw).await {
            error!("forwarding failed for both collector servers");
        }
    }

    async fn send_to(&self, target: &ForwardTarget, raw: &[u8]) -> bool {
        info!("connecting to collector [{}:{}]", target.address, target.port);
        match self.try_send(target, raw).await {
            Ok(()) => {
                info!("forwarded {} bytes to {}:{}", raw.len(), target.address, target.port);
                true
            }
            Err(e) => {
                error!(
                    "forwarding to {}:{} failed: {}",
                    target.address, target.port, e
                );
                false
            }
        }
    }

    async fn try_send(&self, target: &ForwardTarget, raw: &[u8]) -> io::Result<()> {
        let mut stream = timeout(
            FORWARD_TIMEOUT,
            TcpStream::connect((target.address.as_str(), target.port)),
        )
        .await
        .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "connect timed out"))??;

        timeout(FORWARD_TIMEOUT, stream.write_all(raw))
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "send timed out"))??;

        // At most one collector reply is awaited; a silent collector is
        // not a failure, a broken read is.
        let mut reply = [0u8; REPLY_CHUNK];
        match timeout(FORWARD_TIMEOUT, stream.read(&mut reply)).await {
            Ok(Ok(n)) if n > 0 => debug!("collector replied: {}", hex::encode(&reply[..n])),
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => {}
        }

        Ok(())
    }
}
