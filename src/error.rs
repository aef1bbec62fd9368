use crate::engine::{Engine, status};
use thiserror::Error;

/// Result type produced by cursor operations.
pub type CursorResult<T> = Result<T, CursorError>;

/// Errors surfaced by the cursor layer.
///
/// "Not found" is deliberately absent: expected absence on a positioned read
/// is reported as `Ok(None)` / `Ok(false)`, never through this type. The
/// remaining failures split into engine-reported errors, usage violations
/// (the caller's code or codec configuration is wrong), and native allocation
/// failure. [`CursorError::is_usage`] distinguishes the middle group.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CursorError {
    /// The engine rejected the operation. Propagated verbatim, never retried
    /// at this layer.
    #[error("engine error {code}: {message}")]
    Engine {
        /// The engine's numeric status code.
        code: i32,
        /// The engine's description of the code.
        message: String,
    },
    /// An operation was attempted on a closed cursor. The engine is never
    /// reached in this case.
    #[error("operation on a closed cursor")]
    Closed,
    /// A decoded byte region did not have the length the target type
    /// requires.
    #[error("decoded data length differs from the expected size")]
    DecodeLenDiff,
    /// A codec rejected its input for a reason other than length.
    #[error("codec failure: {0}")]
    Codec(&'static str),
    /// Native marshal buffer allocation failed. Buffers already acquired for
    /// the same call are still released.
    #[error("native buffer allocation of {len} bytes failed")]
    Alloc {
        /// The requested allocation size.
        len: usize,
    },
}

impl CursorError {
    /// Builds an [`CursorError::Engine`] from a status code, asking the
    /// engine for the message.
    pub fn engine<E: Engine + ?Sized>(engine: &E, code: i32) -> Self {
        Self::Engine { code, message: engine.message(code) }
    }

    /// Whether this error marks a defect in the calling code or its codec
    /// configuration, as opposed to an engine-reported condition.
    pub const fn is_usage(&self) -> bool {
        matches!(self, Self::Closed | Self::DecodeLenDiff | Self::Codec(_))
    }

    /// The engine status code, for [`CursorError::Engine`] values.
    pub const fn engine_code(&self) -> Option<i32> {
        match self {
            Self::Engine { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Collapses a positioned-read status into the tagged result: `SUCCESS`
/// becomes `Ok(true)`, the not-found sentinel becomes `Ok(false)`, and every
/// other code becomes [`CursorError::Engine`].
pub(crate) fn engine_check<E: Engine + ?Sized>(engine: &E, code: i32) -> CursorResult<bool> {
    match code {
        status::SUCCESS => Ok(true),
        status::NOT_FOUND => Ok(false),
        code => Err(CursorError::engine(engine, code)),
    }
}

/// Maps a write-path status, where not-found is not an expected outcome.
pub(crate) fn engine_ok<E: Engine + ?Sized>(engine: &E, code: i32) -> CursorResult<()> {
    if code == status::SUCCESS { Ok(()) } else { Err(CursorError::engine(engine, code)) }
}
