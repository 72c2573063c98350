//! Master query engine.
//!
//! [`RtuMaster`] owns one link and produces exactly one outstanding request
//! at a time: encode, send, block on receive until a CRC-valid response
//! arrives or the deadline elapses. The bus is half-duplex and the wire
//! format carries no correlation id, so responses are matched to requests
//! purely by call sequence; callers must not overlap queries.
//!
//! `query` performs a single send/receive cycle and returns a typed result.
//! Retry is an explicit, bounded, caller-owned decision through
//! [`RetryPolicy`] — never an implicit loop inside the engine.

use std::time::Duration;

use log::{debug, warn};

use crate::error::{RtuError, RtuResult};
use crate::protocol::{self, READ_HOLDING_REGISTERS};
use crate::transport::RtuLink;
use crate::utils::validation;
use crate::MAX_RTU_FRAME_SIZE;

/// Bounded retry parameters for [`RtuMaster::query_with_retry`].
///
/// Backoff grows linearly: attempt `n` sleeps `backoff * n` before the next
/// try. Only recoverable errors (timeouts, I/O hiccups) are retried; slave
/// exceptions and malformed frames surface immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first. Treated as at least 1.
    pub max_attempts: u32,
    /// Base delay between attempts.
    pub backoff: Duration,
}

impl RetryPolicy {
    /// A policy with the given attempt limit and base backoff.
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts,
            backoff,
        }
    }

    /// Exactly one attempt, no backoff: the strict single-shot contract.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            backoff: Duration::ZERO,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

/// Read-holding-registers client for a single slave on the bus.
pub struct RtuMaster<L: RtuLink> {
    link: L,
    timeout: Duration,
}

impl<L: RtuLink> RtuMaster<L> {
    /// Create a master over `link` with the given response deadline.
    pub fn new(link: L, timeout: Duration) -> Self {
        Self { link, timeout }
    }

    /// Reference to the underlying link.
    pub fn link(&self) -> &L {
        &self.link
    }

    /// Mutable reference to the underlying link.
    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    /// Query `quantity` holding registers starting at `start_address` from
    /// `slave_id`.
    ///
    /// Performs exactly one send and one receive. Returns the register
    /// values, or [`RtuError::Timeout`] when nothing arrives in time,
    /// [`RtuError::Frame`]/[`RtuError::CrcMismatch`] for a malformed reply,
    /// and [`RtuError::Exception`] when the slave rejects the request.
    pub async fn query(
        &mut self,
        slave_id: u8,
        start_address: u16,
        quantity: u16,
    ) -> RtuResult<Vec<u16>> {
        validation::validate_slave_id(slave_id)?;
        validation::validate_quantity(quantity)?;

        let request = protocol::encode_read_request(slave_id, start_address, quantity);
        debug!(
            "Query -> slave {}: start={}, quantity={}",
            slave_id, start_address, quantity
        );

        self.link.send(&request).await?;
        let raw = self.link.receive(MAX_RTU_FRAME_SIZE, self.timeout).await?;
        let response = protocol::decode_response(&raw)?;

        if response.slave_id != slave_id {
            return Err(RtuError::frame(format!(
                "Response slave ID mismatch: expected {}, got {}",
                slave_id, response.slave_id
            )));
        }
        if response.function != READ_HOLDING_REGISTERS {
            return Err(RtuError::frame(format!(
                "Unexpected function code in response: 0x{:02X}",
                response.function
            )));
        }

        debug!(
            "Query <- slave {}: {} registers",
            slave_id,
            response.values.len()
        );
        Ok(response.values)
    }

    /// [`query`](Self::query) wrapped in a bounded retry loop.
    pub async fn query_with_retry(
        &mut self,
        slave_id: u8,
        start_address: u16,
        quantity: u16,
        policy: &RetryPolicy,
    ) -> RtuResult<Vec<u16>> {
        let attempts = policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.query(slave_id, start_address, quantity).await {
                Ok(values) => return Ok(values),
                Err(err) if err.is_recoverable() && attempt < attempts => {
                    warn!(
                        "Query attempt {}/{} failed: {}, retrying",
                        attempt, attempts, err
                    );
                    tokio::time::sleep(policy.backoff * attempt).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
