//! Slave responder.
//!
//! [`RtuSlave`] turns one received buffer into zero or one response buffer.
//! It is stateless per call: no session, no sequence numbers, no memory of
//! prior requests. The bus is shared, so the correct reaction to traffic
//! that is not addressed to this device — or that cannot be parsed at all —
//! is silence, never an error frame.

use std::time::Duration;

use log::{debug, info};

use crate::error::{RtuError, RtuResult};
use crate::protocol::{self, ExceptionCode, READ_HOLDING_REGISTERS};
use crate::registers::RegisterTable;
use crate::transport::RtuLink;
use crate::MAX_RTU_FRAME_SIZE;

/// How long one `receive` poll in the serve loop waits before polling again.
const RECEIVE_POLL: Duration = Duration::from_millis(1000);

/// A single addressed slave device: one fixed id, one register table.
pub struct RtuSlave {
    slave_id: u8,
    table: RegisterTable,
}

impl RtuSlave {
    /// Create a responder for `slave_id` owning `table`.
    pub fn new(slave_id: u8, table: RegisterTable) -> Self {
        Self { slave_id, table }
    }

    /// The configured bus address.
    pub fn slave_id(&self) -> u8 {
        self.slave_id
    }

    /// The holding register table.
    pub fn table(&self) -> &RegisterTable {
        &self.table
    }

    /// Process one received buffer and produce the response frame, if any.
    ///
    /// Returns `None` for frames that must be ignored (unparseable, CRC
    /// mismatch, addressed to another slave) and `Some` with either a data
    /// response or an exception response otherwise.
    pub fn handle_frame(&self, frame: &[u8]) -> Option<Vec<u8>> {
        let request = match protocol::decode_request(frame) {
            Ok(request) => request,
            Err(err) => {
                debug!("Dropping unparseable frame ({}): {}", err, hex::encode(frame));
                return None;
            }
        };

        if request.slave_id != self.slave_id {
            debug!("Ignoring frame addressed to slave {}", request.slave_id);
            return None;
        }

        if request.function != READ_HOLDING_REGISTERS {
            debug!(
                "Rejecting unsupported function 0x{:02X} from request",
                request.function
            );
            return Some(protocol::encode_exception(
                self.slave_id,
                request.function,
                ExceptionCode::IllegalFunction,
            ));
        }

        match self.table.read_range(request.start_address, request.quantity) {
            Ok(values) => Some(protocol::encode_read_response(
                self.slave_id,
                request.function,
                values,
            )),
            Err(_) => {
                debug!(
                    "Rejecting out-of-range read: start={}, quantity={}, table len {}",
                    request.start_address,
                    request.quantity,
                    self.table.len()
                );
                Some(protocol::encode_exception(
                    self.slave_id,
                    request.function,
                    ExceptionCode::IllegalDataAddress,
                ))
            }
        }
    }

    /// Long-running receive → handle → send loop over `link`.
    ///
    /// Receive timeouts simply poll again; link failures propagate to the
    /// caller. The loop never returns on its own.
    pub async fn serve<L: RtuLink>(&self, link: &mut L) -> RtuResult<()> {
        info!(
            "Slave {} serving {} holding registers",
            self.slave_id,
            self.table.len()
        );

        loop {
            let frame = match link.receive(MAX_RTU_FRAME_SIZE, RECEIVE_POLL).await {
                Ok(frame) => frame,
                Err(RtuError::Timeout { .. }) => continue,
                Err(err) => return Err(err),
            };

            if let Some(response) = self.handle_frame(&frame) {
                link.send(&response).await?;
            }
        }
    }
}
