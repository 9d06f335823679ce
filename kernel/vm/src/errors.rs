use thiserror_no_std::Error;

/// The errors the memory subsystem reports to its callers.
///
/// Violated internal invariants are not represented here; those panic
/// instead of propagating.
#[derive(Debug, Error, Copy, Clone, Eq, PartialEq)]
pub enum Error {
    /// The frame allocator could not satisfy an extent request
    #[error("out of physical memory")]
    OutOfMemory,
    /// A fault hit an address no region maps, no address space was active,
    /// or no translation slot was free
    #[error("bad address")]
    BadAddress,
    /// A fault of an unknown kind was reported
    #[error("invalid argument")]
    InvalidArgument,
    /// An address space already has both of its regions defined
    #[error("too many regions")]
    TooManyRegions,
}
