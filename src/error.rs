//! Error handling for the rtulink library.
//!
//! Every fallible operation in the crate returns [`RtuResult`]. The error
//! enum covers the three families of failure a Modbus RTU exchange can see:
//!
//! - **Transport**: I/O failures, connection problems, and deadline misses
//!   (`Io`, `Connection`, `Timeout`).
//! - **Protocol**: frame-level violations detected locally (`Frame`,
//!   `CrcMismatch`) and protocol-level rejections reported by the remote
//!   device (`Exception`).
//! - **Data**: request parameters that fail validation before anything is
//!   put on the wire (`InvalidAddress`, `InvalidData`, `Configuration`).
//!
//! No error is fatal to the process: each query/response cycle is
//! independent, and a failure in one leaves no state behind for the next.
//! [`RtuError::is_recoverable`] tells retry loops which failures are worth
//! another attempt.

use thiserror::Error;

/// Result type alias used throughout the crate.
pub type RtuResult<T> = Result<T, RtuError>;

/// Errors produced by the frame codec, the query engine, and the links.
#[derive(Error, Debug, Clone)]
pub enum RtuError {
    /// Low-level I/O failure on the serial line.
    #[error("I/O error: {message}")]
    Io { message: String },

    /// The serial port could not be opened or was lost.
    #[error("Connection error: {message}")]
    Connection { message: String },

    /// No complete response arrived within the deadline.
    #[error("Timeout after {timeout_ms}ms: {operation}")]
    Timeout { operation: String, timeout_ms: u64 },

    /// Frame structure violation: too short, bad byte count, truncated data.
    #[error("Frame error: {message}")]
    Frame { message: String },

    /// Trailing CRC did not match the CRC computed over the frame body.
    #[error("CRC mismatch: expected={expected:04X}, actual={actual:04X}")]
    CrcMismatch { expected: u16, actual: u16 },

    /// The slave answered with a Modbus exception frame.
    ///
    /// `function` is the original function code (high bit cleared), `code`
    /// the raw exception code from the wire. Codes this crate's responder
    /// produces are limited to 0x01/0x02, but a master may hear anything.
    #[error("Modbus exception: function={function:02X}, code={code:02X} ({message})")]
    Exception {
        function: u8,
        code: u8,
        message: String,
    },

    /// Register range outside the addressable table.
    #[error("Invalid address: start={start}, count={count}")]
    InvalidAddress { start: u16, count: u16 },

    /// Request parameter failed validation.
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// Link or engine misconfiguration.
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl RtuError {
    /// Create a new I/O error.
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Create a new connection error.
    pub fn connection<S: Into<String>>(message: S) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a new timeout error for the named operation.
    pub fn timeout<S: Into<String>>(operation: S, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }

    /// Create a new frame error.
    pub fn frame<S: Into<String>>(message: S) -> Self {
        Self::Frame {
            message: message.into(),
        }
    }

    /// Create a CRC mismatch error.
    pub fn crc_mismatch(expected: u16, actual: u16) -> Self {
        Self::CrcMismatch { expected, actual }
    }

    /// Create a Modbus exception error, mapping standard codes to a
    /// human-readable message.
    pub fn exception(function: u8, code: u8) -> Self {
        let message = match code {
            0x01 => "Illegal Function",
            0x02 => "Illegal Data Address",
            0x03 => "Illegal Data Value",
            0x04 => "Slave Device Failure",
            0x05 => "Acknowledge",
            0x06 => "Slave Device Busy",
            _ => "Unknown Exception",
        }
        .to_string();

        Self::Exception {
            function,
            code,
            message,
        }
    }

    /// Create an invalid address error.
    pub fn invalid_address(start: u16, count: u16) -> Self {
        Self::InvalidAddress { start, count }
    }

    /// Create an invalid data error.
    pub fn invalid_data<S: Into<String>>(message: S) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Whether retrying the failed operation could plausibly succeed.
    ///
    /// Timeouts and I/O hiccups are transient on a serial bus; protocol and
    /// validation failures are not, and an exception response is the slave's
    /// final word on a request.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Io { .. } => true,
            Self::Connection { .. } => true,
            Self::Timeout { .. } => true,
            Self::Exception { code, .. } => {
                // Acknowledge, Busy
                matches!(code, 0x05 | 0x06)
            }
            _ => false,
        }
    }

    /// Whether the error originates in the transport rather than the protocol.
    pub fn is_transport_error(&self) -> bool {
        matches!(
            self,
            Self::Io { .. } | Self::Connection { .. } | Self::Timeout { .. }
        )
    }

    /// Whether the error is a Modbus protocol violation or rejection.
    pub fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            Self::Frame { .. } | Self::CrcMismatch { .. } | Self::Exception { .. }
        )
    }
}

impl From<std::io::Error> for RtuError {
    fn from(err: std::io::Error) -> Self {
        Self::io(err.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for RtuError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        Self::timeout("Operation timeout", 0)
    }
}
