//! ==============================================================================
//! error.rs - library error type
//! ==============================================================================
//!
//! purpose:
//!     the few things in the core that can actually fail: touching the
//!     snapshot store, encoding/decoding a reading set, and asking for a
//!     concrete parameter by a key the registry does not know.
//!
//! relationships:
//!     - returned by: sync.rs (publish, latest), controller.rs (page setup)
//!     - converted to anyhow at the binary edge (main.rs)
//!
//! ==============================================================================

use std::io;

/// Errors raised by the monitoring core.
#[derive(Debug, thiserror::Error)]
pub enum SentinelError {
    /// snapshot store could not be read or written
    #[error("snapshot storage failed: {0}")]
    Storage(#[from] io::Error),

    /// reading set could not be serialized or parsed
    #[error("snapshot encoding failed: {0}")]
    Encode(#[from] serde_json::Error),

    /// a caller asked for a parameter the registry does not define
    #[error("unknown parameter: {0:?}")]
    UnknownParameter(String),
}

pub type Result<T> = std::result::Result<T, SentinelError>;
