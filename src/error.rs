// SPDX-License-Identifier: GPL-3.0-only
//! Error types for VCP controls
//!
//! Every failure leaves the cached control state at its last known-good value;
//! these errors only tell the caller that nothing changed and why.

use thiserror::Error;

/// Main error type
#[derive(Error, Debug)]
pub enum VcpError {
    /// Every attempt of a bus read or write failed
    #[error("{property}: bus call failed after {attempts} attempt(s): {source}")]
    RetriesExhausted {
        property: String,
        attempts: u32,
        #[source]
        source: anyhow::Error,
    },

    /// A checked write never read back the requested value
    #[error("{property}: device settled at {actual} instead of {target} after {attempts} attempt(s)")]
    NotConverged {
        property: String,
        target: u32,
        actual: u32,
        attempts: u32,
    },

    /// Display not found in registry
    #[error("Display {0} not found")]
    DisplayNotFound(String),

    /// Property name not recognised
    #[error("Unknown VCP property: {0}")]
    UnknownProperty(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for VcpError
pub type Result<T> = std::result::Result<T, VcpError>;
