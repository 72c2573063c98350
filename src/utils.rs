//! Validation and formatting helpers shared by the engine and the links.

/// Request parameter validation.
pub mod validation {
    use crate::error::{RtuError, RtuResult};
    use crate::MAX_REGISTERS_PER_REQUEST;

    /// Validate a slave address (1-247; 0 is broadcast, 248-255 reserved).
    pub fn validate_slave_id(slave_id: u8) -> RtuResult<()> {
        if slave_id == 0 || slave_id > 247 {
            return Err(RtuError::invalid_data(format!(
                "Invalid slave ID: {} (must be 1-247)",
                slave_id
            )));
        }
        Ok(())
    }

    /// Validate a register quantity against the protocol ceiling.
    pub fn validate_quantity(quantity: u16) -> RtuResult<()> {
        if quantity == 0 || quantity > MAX_REGISTERS_PER_REQUEST {
            return Err(RtuError::invalid_data(format!(
                "Invalid register quantity: {} (must be 1-{})",
                quantity, MAX_REGISTERS_PER_REQUEST
            )));
        }
        Ok(())
    }

    /// Validate that an address range stays inside the 16-bit address space.
    ///
    /// Widened to u32 so `start + count` cannot wrap.
    pub fn validate_address_range(start: u16, count: u16) -> RtuResult<()> {
        if count == 0 {
            return Err(RtuError::invalid_address(start, count));
        }
        if (start as u32 + count as u32) > 65536 {
            return Err(RtuError::invalid_address(start, count));
        }
        Ok(())
    }
}

/// Display helpers for logs and diagnostics.
pub mod format {
    /// Format a byte slice as spaced uppercase hex.
    pub fn bytes_to_hex(bytes: &[u8]) -> String {
        bytes
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Format register values as spaced 4-digit hex words.
    pub fn registers_to_hex(registers: &[u16]) -> String {
        registers
            .iter()
            .map(|r| format!("{:04X}", r))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Logging setup helpers.
pub mod logging {
    /// Initialize a debug-level logger for tests.
    pub fn init_test_logger() {
        let _ = env_logger::builder()
            .filter_level(log::LevelFilter::Debug)
            .is_test(true)
            .try_init();
    }
}
