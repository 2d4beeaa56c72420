//! Error types shared by the object store, display manager and UI context.

use thiserror_no_std::Error;

use crate::display_manager::BufferState;
use crate::ui::core::ObjectType;

/// Errors reported synchronously by structural and protocol operations.
///
/// Rendering and dispatch never produce these: a frame always completes and
/// unmatched events are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UiError {
    /// The handle refers to a destroyed or never-created object or display.
    #[error("Invalid or stale handle")]
    InvalidHandle,

    /// The parent does not exist, or attaching would create a cycle.
    #[error("Invalid parent for attach")]
    InvalidParent,

    /// Display buffer state machine misuse (double submit or double complete).
    #[error("Display update protocol violated in state {state:?}")]
    ProtocolViolation {
        /// State the display was in when the illegal transition was requested
        state: BufferState,
    },

    /// Inconsistent display configuration.
    #[error("Display configuration error: {reason}")]
    ConfigurationError {
        /// What was wrong with the configuration
        reason: &'static str,
    },

    /// A variant-specific operation was applied to the wrong kind of object.
    #[error("Object is not a {expected:?}")]
    KindMismatch {
        /// Kind the operation requires
        expected: ObjectType,
    },
}

/// Result type for UI operations
pub type UiResult<T> = Result<T, UiError>;
