use thiserror::Error;

use crate::host::Section;
use crate::params::ParamKind;

/// Failure of a full compilation.
///
/// Every variant stems from a defect in the input, so none of them is worth
/// retrying. A failed compile never produces a partial artifact.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// The marker character occurs an odd number of times in the source.
    #[error("unbalanced variant marker {0:?}: markers must come in pairs")]
    MalformedVariantMarkers(char),

    /// A parameter name is empty or is not a valid kernel identifier.
    #[error("invalid parameter name {0:?}")]
    InvalidParameterName(String),

    /// Two declarations share the same name.
    #[error("duplicate parameter name {0:?}")]
    DuplicateParameterName(String),

    /// A render configuration value cannot be baked into the kernel.
    #[error("invalid render configuration: {0}")]
    InvalidRenderConfig(String),
}

/// Rejected parameter mutation. The store is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParameterError {
    #[error("no parameter named {0:?} in the current layout")]
    UnknownParameterName(String),

    #[error("parameter {name:?} is declared as {expected} but was given a {found}")]
    TypeMismatch {
        name: String,
        expected: ParamKind,
        found: ParamKind,
    },

    /// A buffer image does not span the layout it is paired with.
    #[error("buffer image has {found} word(s), layout needs {expected}")]
    WordCountMismatch { expected: usize, found: usize },
}

/// Scene code the host target cannot parse. The kernel is unaffected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostParseError {
    /// A material marker inside a `#` region has no partner.
    #[error("host code: unbalanced variant marker {0:?}")]
    MalformedVariantMarkers(char),

    #[error("{section} code, line {line}, column {col}: {message}")]
    Syntax {
        section: Section,
        line: usize,
        col: usize,
        message: String,
    },
}
