//! Engine error types.
//!
//! Numeric trouble never shows up here: division by zero, NaN inputs and
//! out-of-range reads resolve to NaN (see [`crate::domain::nan_policy`]).
//! Everything in this enum is a structural violation by the computation,
//! a sequencing mistake by the host driving the cycles, or a collaborator
//! failure.

use crate::domain::cell::SlotKind;
use crate::domain::series::WriteMode;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("slot {slot} was {expected} on the previous cycle, visited as {found}")]
    SlotKindMismatch {
        slot: String,
        expected: SlotKind,
        found: SlotKind,
    },

    #[error("slot {slot} holds a value of a different type")]
    SlotTypeMismatch { slot: String },

    #[error("dependency list of {slot} changed length from {previous} to {current}")]
    DependencyArityChanged {
        slot: String,
        previous: usize,
        current: usize,
    },

    #[error("a cycle is already in progress")]
    Reentrant,

    #[error("no cycle in progress")]
    NotInCycle,

    #[error("computation instance is poisoned by an earlier structural error")]
    Poisoned,

    #[error("computation instance has been disposed")]
    Disposed,

    #[error("driving series must grow by exactly one per cycle: expected length {expected}, found {found}")]
    CycleGrowth { expected: usize, found: usize },

    #[error("{mode} write to {series} at index {index} rejected (length {len})")]
    InvalidWrite {
        series: String,
        index: usize,
        len: usize,
        mode: WriteMode,
    },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("unknown indicator: {spec}")]
    UnknownIndicator { spec: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Whether this error is fatal to the computation instance.
    ///
    /// Graph-shape violations poison the context as soon as they are raised;
    /// an invalid write poisons it once it escapes evaluation through
    /// [`crate::domain::engine::Engine::push_bar`]. Host sequencing errors
    /// (`NotInCycle`, `CycleGrowth`) and collaborator failures leave the
    /// instance usable.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            EngineError::SlotKindMismatch { .. }
                | EngineError::SlotTypeMismatch { .. }
                | EngineError::DependencyArityChanged { .. }
                | EngineError::Reentrant
                | EngineError::Poisoned
                | EngineError::Disposed
                | EngineError::InvalidWrite { .. }
        )
    }
}

impl From<&EngineError> for std::process::ExitCode {
    fn from(err: &EngineError) -> Self {
        let code: u8 = match err {
            EngineError::Io(_) => 1,
            EngineError::ConfigParse { .. } | EngineError::UnknownIndicator { .. } => 2,
            EngineError::Data { .. } => 3,
            _ => 4,
        };
        std::process::ExitCode::from(code)
    }
}
