//! Error types

use thiserror::Error;

/// Reasons a [`Signal::try_emit`](crate::Signal::try_emit) call delivered nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EmitError {
    #[error("signal is closed")]
    Closed,
}
