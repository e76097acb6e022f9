//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the analysis core and an
//! external system (time, filesystem, the metadata API). Implementations
//! live in `src/adapters/`.

pub mod clock;
pub mod filesystem;
pub mod metadata;

pub use clock::Clock;
pub use filesystem::FileSystem;
pub use metadata::{FetchFuture, MetadataApi};

/// Error type returned across every port.
pub type PortError = Box<dyn std::error::Error + Send + Sync>;

/// Result alias for port operations.
pub type PortResult<T> = std::result::Result<T, PortError>;
