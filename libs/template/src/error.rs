//! Rendering errors.

use thiserror::Error;

/// Errors produced while parsing, composing, or rendering a template.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// A hole names neither a registry key nor a case parameter.
    #[error("unknown hole '{name}' at line {line}")]
    UnknownHole { name: String, line: usize },

    /// A hole names a known setting that has no value.
    #[error("hole '{name}' at line {line} has no value")]
    EmptyHole { name: String, line: usize },

    /// `{{` without a matching `}}`.
    #[error("unterminated hole starting at line {line}")]
    Unterminated { line: usize },

    /// The text between the braces is not a valid hole name.
    #[error("invalid hole '{raw}' at line {line}")]
    InvalidHole { raw: String, line: usize },

    /// A composition slot was never filled.
    #[error("slot '{slot}' was not filled before rendering")]
    UnfilledSlot { slot: String },

    /// `compose` targeted a slot the parent does not declare.
    #[error("template has no slot named '{slot}'")]
    MissingSlot { slot: String },
}
