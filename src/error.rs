//! Custom error types for the bridge.
//!
//! This module defines the primary error type, `BridgeError`, used across the
//! crate. Using the `thiserror` crate, it provides one consistent taxonomy
//! for everything that can go wrong while constructing a bridged device.
//!
//! The taxonomy is deliberately small:
//!
//! - **`UnsupportedTransport`**: the configured transport kind is not
//!   supported by the loaded driver. Always a construction-time failure.
//! - **`PortRegistration`**: a COM port required one-time registration with
//!   the hosting environment and that registration failed. Fatal; the device
//!   is never constructed.
//! - **`MissingParameter`**: the parameter group matching the declared
//!   transport kind was absent from the configuration.
//! - **`TransportInit`**: the driver rejected an otherwise well-formed
//!   transport (bad address, session refused to start, ...).
//!
//! Runtime connectivity loss is intentionally *not* represented here — it is
//! surfaced as a [`HealthStatus`](crate::monitor::HealthStatus) transition,
//! never as an error crossing the event-notification boundary.

use thiserror::Error;

/// Convenience alias for results using the bridge error type.
pub type BridgeResult<T> = std::result::Result<T, BridgeError>;

/// Errors raised while constructing or initializing a bridged device.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// The configured transport kind has no matching driver capability.
    #[error("transport '{0}' is not supported by this driver")]
    UnsupportedTransport(String),

    /// One-time COM port registration with the control system failed.
    #[error("COM port '{port}' registration failed: {reason}")]
    PortRegistration {
        /// Name of the port that failed to register.
        port: String,
        /// Environment-reported failure reason.
        reason: String,
    },

    /// The parameter group required by the transport kind is missing.
    #[error("missing configuration parameter '{0}'")]
    MissingParameter(&'static str),

    /// The driver rejected transport initialization.
    #[error("transport initialization failed: {0}")]
    TransportInit(String),

    /// I/O error while opening a transport.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Environment-specific failure with attached context.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BridgeError::UnsupportedTransport("ICecDevice".to_string());
        assert_eq!(
            err.to_string(),
            "transport 'ICecDevice' is not supported by this driver"
        );
    }

    #[test]
    fn test_registration_error_display() {
        let err = BridgeError::PortRegistration {
            port: "COM3".to_string(),
            reason: "already owned".to_string(),
        };
        assert!(err.to_string().contains("COM3"));
        assert!(err.to_string().contains("already owned"));
    }
}
