use std::fmt;

/// Typed errors for dictionary operations.
///
/// These cover the recoverable failure class only. Invariant breaches
/// (pause-counter underflow, iterator fingerprint mismatch) are programming
/// errors and panic instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DictError {
    /// The key is already present.
    Exists,
    /// The key was not found.
    NotFound,
    /// Table allocation failed (reported by the try-variant only).
    NoMem,
    /// The operation cannot run while an incremental rehash is in progress.
    Rehashing,
    /// Automatic resizing is disabled or the expansion policy rejected it.
    ResizeForbidden,
}

impl fmt::Display for DictError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DictError::Exists => write!(f, "key already exists"),
            DictError::NotFound => write!(f, "key not found"),
            DictError::NoMem => write!(f, "table allocation failed"),
            DictError::Rehashing => write!(f, "rehash in progress"),
            DictError::ResizeForbidden => write!(f, "resize not allowed"),
        }
    }
}

impl std::error::Error for DictError {}
