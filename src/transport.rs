//! Byte-level links carrying RTU frames.
//!
//! The protocol core is transport-agnostic: it only needs the two
//! operations of [`RtuLink`] — push one frame out, pull one frame in within
//! a deadline. Two implementations are provided:
//!
//! - [`SerialLink`]: a serial port (RS-232/RS-485) driven through
//!   tokio-serial, with RTU frame boundaries detected by the 3.5-character
//!   inter-frame gap derived from the baud rate.
//! - [`MemoryLink`]: a connected in-process pair over tokio channels, used
//!   by the loopback demo and the test suite to exercise both roles without
//!   hardware.
//!
//! A link moves opaque byte frames; CRC generation and validation stay in
//! [`crate::protocol`].

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::debug;

use crate::error::{RtuError, RtuResult};
use crate::utils::format::bytes_to_hex;

/// Transfer statistics kept by every link implementation.
#[derive(Debug, Clone, Default)]
pub struct LinkStats {
    pub frames_sent: u64,
    pub frames_received: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub timeouts: u64,
    pub errors: u64,
}

/// A half-duplex frame pipe between the two bus roles.
///
/// `receive` yields one complete frame attempt per call; there is no
/// partial-frame buffering across calls. It resolves to
/// [`RtuError::Timeout`] when nothing arrives within the deadline, which is
/// the only suspension point in the crate.
#[async_trait]
pub trait RtuLink: Send {
    /// Transmit one frame.
    async fn send(&mut self, frame: &[u8]) -> RtuResult<()>;

    /// Receive one frame of at most `max_len` bytes within `deadline`.
    async fn receive(&mut self, max_len: usize, deadline: Duration) -> RtuResult<Vec<u8>>;

    /// Snapshot of the link's transfer statistics.
    fn stats(&self) -> LinkStats;
}

/// Inter-frame gap for a baud rate: 3.5 character times at 11 bits per
/// character, floored at 1750us above 19200 baud as Modbus RTU requires.
fn frame_gap_for(baud_rate: u32) -> Duration {
    let char_time_us = (11_000_000u64 / baud_rate as u64).max(1);
    let gap_us = char_time_us * 35 / 10;
    if baud_rate > 19200 {
        Duration::from_micros(gap_us.max(1750))
    } else {
        Duration::from_micros(gap_us)
    }
}

/// Serial port link with RTU frame-gap framing.
pub struct SerialLink {
    port: Option<tokio_serial::SerialStream>,
    port_name: String,
    baud_rate: u32,
    data_bits: tokio_serial::DataBits,
    stop_bits: tokio_serial::StopBits,
    parity: tokio_serial::Parity,
    /// Timeout applied to send operations.
    timeout: Duration,
    /// Minimum quiet time separating frames on the wire.
    frame_gap: Duration,
    stats: LinkStats,
    packet_logging: bool,
}

impl SerialLink {
    /// Open a serial link with 8N1 framing and a one second send timeout.
    pub fn new(port: &str, baud_rate: u32) -> RtuResult<Self> {
        Self::new_with_config(
            port,
            baud_rate,
            tokio_serial::DataBits::Eight,
            tokio_serial::StopBits::One,
            tokio_serial::Parity::None,
            Duration::from_millis(1000),
        )
    }

    /// Open a serial link with full control over the line parameters.
    pub fn new_with_config(
        port: &str,
        baud_rate: u32,
        data_bits: tokio_serial::DataBits,
        stop_bits: tokio_serial::StopBits,
        parity: tokio_serial::Parity,
        timeout: Duration,
    ) -> RtuResult<Self> {
        if baud_rate == 0 {
            return Err(RtuError::configuration("Baud rate must be non-zero"));
        }

        let mut link = Self {
            port: None,
            port_name: port.to_string(),
            baud_rate,
            data_bits,
            stop_bits,
            parity,
            timeout,
            frame_gap: frame_gap_for(baud_rate),
            stats: LinkStats::default(),
            packet_logging: false,
        };

        link.connect()?;
        Ok(link)
    }

    /// Enable or disable hex dumps of every frame moved over the link.
    pub fn set_packet_logging(&mut self, enabled: bool) {
        self.packet_logging = enabled;
    }

    /// Whether the serial port is currently open.
    pub fn is_connected(&self) -> bool {
        self.port.is_some()
    }

    fn connect(&mut self) -> RtuResult<()> {
        let builder = tokio_serial::new(&self.port_name, self.baud_rate)
            .data_bits(self.data_bits)
            .stop_bits(self.stop_bits)
            .parity(self.parity)
            .timeout(self.timeout);

        let port = tokio_serial::SerialStream::open(&builder).map_err(|e| {
            RtuError::connection(format!(
                "Failed to open serial port {}: {}",
                self.port_name, e
            ))
        })?;

        self.port = Some(port);
        Ok(())
    }
}

#[async_trait]
impl RtuLink for SerialLink {
    async fn send(&mut self, frame: &[u8]) -> RtuResult<()> {
        if self.port.is_none() {
            self.connect()?;
        }

        // Half-duplex turnaround: keep the mandated quiet time before
        // occupying the bus.
        tokio::time::sleep(self.frame_gap).await;

        if self.packet_logging {
            debug!("[RTU] send {} bytes: {}", frame.len(), bytes_to_hex(frame));
        }

        let send_timeout = self.timeout;
        let port = self
            .port
            .as_mut()
            .ok_or_else(|| RtuError::connection("Serial port not open"))?;

        match timeout(send_timeout, port.write_all(frame)).await {
            Ok(Ok(())) => {
                let _ = timeout(send_timeout, port.flush()).await;
            }
            Ok(Err(e)) => {
                self.stats.errors += 1;
                return Err(RtuError::io(format!("Failed to send frame: {}", e)));
            }
            Err(_) => {
                self.stats.timeouts += 1;
                self.stats.errors += 1;
                return Err(RtuError::timeout(
                    "send frame",
                    send_timeout.as_millis() as u64,
                ));
            }
        }

        self.stats.frames_sent += 1;
        self.stats.bytes_sent += frame.len() as u64;
        Ok(())
    }

    async fn receive(&mut self, max_len: usize, deadline: Duration) -> RtuResult<Vec<u8>> {
        if self.port.is_none() {
            self.connect()?;
        }

        let frame_gap = self.frame_gap;
        let port = self
            .port
            .as_mut()
            .ok_or_else(|| RtuError::connection("Serial port not open"))?;

        let mut frame = Vec::new();
        let mut buf = [0u8; 1];

        // First byte decides between a frame and a timeout.
        match timeout(deadline, port.read_exact(&mut buf)).await {
            Ok(Ok(_)) => frame.push(buf[0]),
            Ok(Err(e)) => {
                self.stats.errors += 1;
                return Err(RtuError::io(format!("Serial read error: {}", e)));
            }
            Err(_) => {
                self.stats.timeouts += 1;
                return Err(RtuError::timeout(
                    "receive frame",
                    deadline.as_millis() as u64,
                ));
            }
        }

        // Accumulate until the line goes quiet for a frame gap.
        while frame.len() < max_len {
            match timeout(frame_gap, port.read_exact(&mut buf)).await {
                Ok(Ok(_)) => frame.push(buf[0]),
                Ok(Err(e)) => {
                    self.stats.errors += 1;
                    return Err(RtuError::io(format!("Serial read error: {}", e)));
                }
                Err(_) => break,
            }
        }

        self.stats.frames_received += 1;
        self.stats.bytes_received += frame.len() as u64;

        if self.packet_logging {
            debug!(
                "[RTU] receive {} bytes: {}",
                frame.len(),
                bytes_to_hex(&frame)
            );
        }

        Ok(frame)
    }

    fn stats(&self) -> LinkStats {
        self.stats.clone()
    }
}

/// In-process link endpoint; frames travel whole over a channel pair.
pub struct MemoryLink {
    tx: mpsc::UnboundedSender<Vec<u8>>,
    rx: mpsc::UnboundedReceiver<Vec<u8>>,
    stats: LinkStats,
}

impl MemoryLink {
    /// Create two connected endpoints; what one sends, the other receives.
    pub fn pair() -> (MemoryLink, MemoryLink) {
        let (a_tx, a_rx) = mpsc::unbounded_channel();
        let (b_tx, b_rx) = mpsc::unbounded_channel();

        (
            MemoryLink {
                tx: a_tx,
                rx: b_rx,
                stats: LinkStats::default(),
            },
            MemoryLink {
                tx: b_tx,
                rx: a_rx,
                stats: LinkStats::default(),
            },
        )
    }
}

#[async_trait]
impl RtuLink for MemoryLink {
    async fn send(&mut self, frame: &[u8]) -> RtuResult<()> {
        self.tx
            .send(frame.to_vec())
            .map_err(|_| RtuError::connection("Peer endpoint closed"))?;
        self.stats.frames_sent += 1;
        self.stats.bytes_sent += frame.len() as u64;
        Ok(())
    }

    async fn receive(&mut self, max_len: usize, deadline: Duration) -> RtuResult<Vec<u8>> {
        match timeout(deadline, self.rx.recv()).await {
            Ok(Some(mut frame)) => {
                frame.truncate(max_len);
                self.stats.frames_received += 1;
                self.stats.bytes_received += frame.len() as u64;
                debug!(
                    "[RTU] loopback receive {} bytes: {}",
                    frame.len(),
                    bytes_to_hex(&frame)
                );
                Ok(frame)
            }
            Ok(None) => {
                self.stats.errors += 1;
                Err(RtuError::connection("Peer endpoint closed"))
            }
            Err(_) => {
                self.stats.timeouts += 1;
                Err(RtuError::timeout(
                    "receive frame",
                    deadline.as_millis() as u64,
                ))
            }
        }
    }

    fn stats(&self) -> LinkStats {
        self.stats.clone()
    }
}
