use std::error::Error;
use std::fmt;

/// Error taxonomy returned by every public entry point of the RIB.
///
/// Variants map 1:1 onto the wire error codes of the external interface
/// (see [`RibError::code`]); nothing here ever panics on caller-supplied
/// bad data. Invariant violations (a corrupted arena, a negative mask
/// refcount) are bugs, not [`RibError`]s, and abort via `debug_assert!`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RibError {
    /// Null key, malformed length byte, family mismatch, negative prefix
    /// length.
    InvalidArgument,
    /// Exact-match lookup or delete found no matching leaf.
    NotFound,
    /// `add` encountered a leaf with identical key and identical interned
    /// mask.
    AlreadyExists,
    /// Allocation of a node, mask descriptor, or route entry failed.
    OutOfMemory,
    /// Requested address family not compiled in.
    Unsupported,
}

impl RibError {
    /// The stable wire integer constant for this error (§6).
    #[inline]
    pub const fn code(&self) -> i32 {
        match self {
            RibError::InvalidArgument => -1,
            RibError::NotFound => -2,
            RibError::AlreadyExists => -3,
            RibError::OutOfMemory => -4,
            RibError::Unsupported => -5,
        }
    }
}

impl Error for RibError {}

impl fmt::Display for RibError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RibError::InvalidArgument => write!(f, "invalid argument"),
            RibError::NotFound => write!(f, "no matching route"),
            RibError::AlreadyExists => write!(f, "route already exists"),
            RibError::OutOfMemory => write!(f, "allocation failed"),
            RibError::Unsupported => write!(f, "address family not supported"),
        }
    }
}

/// `Ok = 0` plus the five [`RibError`] kinds, matching §6's literal table.
pub const OK: i32 = 0;

pub type Result<T> = std::result::Result<T, RibError>;
