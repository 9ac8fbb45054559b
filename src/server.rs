//! Connection orchestration
//!
//! The listener processes one logger connection at a time: a single
//! bounded read, envelope validation, payload decoding and publishing,
//! and the acknowledgment write. Forwarding to the upstream collectors is
//! the one concurrent step; it is spawned onto its own task with a clone
//! of the raw bytes and never touches the inbound socket.
//!
//! Per-connection failures are logged and the loop keeps accepting; the
//! logger either receives a well-formed acknowledgment or nothing at all.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::Local;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::forward::Forwarder;
use crate::protocol::{build_response, decode, Clock, Frame, SequenceTracker, SystemClock};
use crate::publish::Publisher;

/// A logical frame is assumed to arrive in a single read of this size
const READ_CHUNK: usize = 1024;

/// The proxy server
pub struct ProxyServer {
    config: Config,
    sequence: SequenceTracker,
    forwarder: Option<Arc<Forwarder>>,
    publisher: Option<Arc<dyn Publisher>>,
    clock: Arc<dyn Clock>,
}

impl ProxyServer {
    pub fn new(config: Config, publisher: Option<Arc<dyn Publisher>>) -> Self {
        let forwarder = config
            .forward
            .enabled
            .then(|| Arc::new(Forwarder::new(&config.forward)));
        let publisher = if config.mqtt.enabled { publisher } else { None };

        Self {
            config,
            sequence: SequenceTracker::new(),
            forwarder,
            publisher,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the wall clock used for acknowledgments (tests)
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Bind the configured listen address and serve forever
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind((
            self.config.server.listen_address.as_str(),
            self.config.server.listen_port,
        ))
        .await?;
        info!(
            "listening on {}:{}",
            self.config.server.listen_address, self.config.server.listen_port
        );
        self.serve(listener).await
    }

    /// Accept loop over an already-bound listener
    ///
    /// Connections are accepted and fully processed one at a time; a bad
    /// connection never terminates the service.
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        loop {
            let (stream, peer) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!("accept failed: {}", e);
                    continue;
                }
            };
            info!("connection from {}", peer);

            if let Err(e) = self.handle_connection(stream).await {
                error!("connection handling failed: {}", e);
            }
            info!("disconnected");
        }
    }

    async fn handle_connection(&self, mut stream: TcpStream) -> Result<()> {
        let io_timeout = Duration::from_secs(self.config.server.connection_timeout_secs);

        let mut buf = vec![0u8; READ_CHUNK];
        let received = match timeout(io_timeout, stream.read(&mut buf)).await {
            Ok(Ok(n)) => n,
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => {
                warn!("socket read timed out");
                return Ok(());
            }
        };
        if received == 0 {
            return Ok(());
        }
        buf.truncate(received);
        let raw = Bytes::from(buf);
        debug!("received {} bytes: {}", raw.len(), hex::encode(&raw));

        let frame = match Frame::validate(raw.clone()) {
            Ok(frame) => frame,
            Err(e) => {
                // Never respond to a frame that failed validation
                error!("frame validation error: {}", e);
                return Ok(());
            }
        };

        if let Some(forwarder) = &self.forwarder {
            let forwarder = Arc::clone(forwarder);
            let raw = raw.clone();
            tokio::spawn(async move {
                forwarder.forward(raw).await;
            });
        }

        match decode(&frame, &Local) {
            Ok(payload) => {
                let message = serde_json::to_string(&payload)?;
                info!("payload: {}", message);

                if let Some(publisher) = &self.publisher {
                    let topic = format!(
                        "{}/{}/{}",
                        self.config.mqtt.base_topic,
                        frame.logger_serial(),
                        payload.topic_suffix()
                    );
                    debug!("MQTT topic: {}", topic);
                    if let Err(e) = publisher.publish(&topic, &message).await {
                        error!("publishing failed: {}", e);
                    }
                }
            }
            // Still acknowledge: the envelope was valid, only the payload
            // could not be used
            Err(e) => warn!("payload skipped: {}", e),
        }

        if let Some(response) = build_response(&frame, &self.sequence, self.clock.as_ref()) {
            debug!("response: {}", hex::encode(response));
            match timeout(io_timeout, stream.write_all(&response)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => return Err(e.into()),
                Err(_) => warn!("response write timed out"),
            }
        }

        Ok(())
    }
}
