use thiserror::Error;

/// Hard failures while binding a record. Anything not listed here is
/// tolerated and surfaces as a [`BindWarning`] instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BindError {
    #[error("Malformed {expected} value '{value}' for field '{field}'")]
    MalformedValue {
        field: String,
        value: String,
        expected: &'static str,
    },
}

/// Structural problems that did not stop a record from binding.
#[derive(Debug, Clone, PartialEq)]
pub enum BindWarning {
    /// A dotted key with an empty prefix or suffix, e.g. `".latitude"`.
    MalformedKey { key: String },

    /// Dotted keys whose prefix does not name a nested field of the target.
    UnmatchedGroup { prefix: String },

    /// A nested group failed to bind; the parent field was left unset.
    NestedFailed { field: String, error: BindError },

    /// A value that does not name any variant of the field's enumeration.
    UnknownVariant { field: String, value: String },
}

impl std::fmt::Display for BindWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BindWarning::MalformedKey { key } => write!(f, "ignored malformed key '{key}'"),
            BindWarning::UnmatchedGroup { prefix } => {
                write!(f, "no nested field named '{prefix}'")
            }
            BindWarning::NestedFailed { field, error } => {
                write!(f, "nested field '{field}' left unset: {error}")
            }
            BindWarning::UnknownVariant { field, value } => {
                write!(f, "unknown value '{value}' for field '{field}'")
            }
        }
    }
}
