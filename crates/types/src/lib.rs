//! Foundation types for the provql query engine.
//!
//! These carry no evaluation behavior: they describe the identity and the
//! ordering of the versioned items the engine groups and filters.

pub mod ids;
pub mod version;

pub use ids::ItemId;
pub use version::{Version, VersionError, VersionRange};
