//! # rtulink - Modbus RTU Master/Slave Exchange Library
//!
//! **Author:** Evan Liu <evan.liu@voltageenergy.com>
//! **License:** MIT
//!
//! A minimal, correctness-focused Modbus RTU implementation for a bus master
//! and a single addressed slave sharing one serial line. The crate keeps the
//! protocol engine — frame construction, CRC16 validation, register-range
//! checking, exception generation — pure and transport-agnostic, and treats
//! the serial line as a pluggable byte pipe.
//!
//! ## Features
//!
//! - **Pure frame codec**: encode/decode/CRC with no I/O and no state
//! - **Validated both ways**: request and response paths verify the trailing
//!   CRC before any field is trusted
//! - **Typed errors**: timeout, malformed frame, and slave exception are
//!   distinct, and retry-worthiness is a property of the error
//! - **Bounded retry**: caller-owned policy instead of a hidden loop
//! - **Hardware-free testing**: an in-memory link pair drives both roles in
//!   plain `#[tokio::test]` functions
//!
//! Scope is deliberately narrow: function code 0x03 (Read Holding Registers)
//! only, one slave per master, no writes, no broadcast.
//!
//! ## Master example
//!
//! ```rust,no_run
//! use rtulink::{RtuMaster, SerialLink, RtuResult};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> RtuResult<()> {
//!     let link = SerialLink::new("/dev/ttyUSB0", 9600)?;
//!     let mut master = RtuMaster::new(link, Duration::from_secs(5));
//!
//!     // Read three holding registers starting at address 1 from slave 1.
//!     let values = master.query(1, 1, 3).await?;
//!     println!("Registers: {:?}", values);
//!     Ok(())
//! }
//! ```
//!
//! ## Slave example
//!
//! ```rust,no_run
//! use rtulink::{RegisterTable, RtuSlave, SerialLink, RtuResult};
//!
//! #[tokio::main]
//! async fn main() -> RtuResult<()> {
//!     let mut link = SerialLink::new("/dev/ttyUSB1", 9600)?;
//!     let slave = RtuSlave::new(1, RegisterTable::new([1, 2, 3, 4, 5]));
//!     slave.serve(&mut link).await
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐                      ┌──────────────┐
//! │  RtuMaster   │                      │   RtuSlave   │
//! └──────────────┘                      └──────────────┘
//!        │                                     │
//! ┌──────────────┐                      ┌──────────────┐
//! │  protocol    │                      │ RegisterTable│
//! │  (codec/CRC) │                      │  (storage)   │
//! └──────────────┘                      └──────────────┘
//!        │                                     │
//! ┌──────────────┐     shared serial    ┌──────────────┐
//! │   RtuLink    │◄────────────────────►│   RtuLink    │
//! └──────────────┘                      └──────────────┘
//! ```

/// Error types and result alias.
pub mod error;

/// Frame codec: CRC16, encoders, validating decoders.
pub mod protocol;

/// Holding register table.
pub mod registers;

/// Byte-level links: serial port and in-memory pair.
pub mod transport;

/// Master query engine with bounded retry.
pub mod master;

/// Slave responder and serve loop.
pub mod slave;

/// Validation, formatting, and logging helpers.
pub mod utils;

pub use error::{RtuError, RtuResult};
pub use master::{RetryPolicy, RtuMaster};
pub use protocol::{
    crc16, decode_request, decode_response, encode_exception, encode_read_request,
    encode_read_response, ExceptionCode, RequestFrame, ResponseFrame, READ_HOLDING_REGISTERS,
};
pub use registers::RegisterTable;
pub use slave::RtuSlave;
pub use transport::{LinkStats, MemoryLink, RtuLink, SerialLink};

/// Default response deadline in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Maximum Modbus RTU frame size.
pub const MAX_RTU_FRAME_SIZE: usize = 256;

/// Maximum registers readable in a single request.
pub const MAX_REGISTERS_PER_REQUEST: u16 = 125;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
