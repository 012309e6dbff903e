//! Storage resource tree traversal and drive records.

pub mod drive;
pub mod walker;

pub use drive::{DriveRecord, MediaType};
pub use walker::{DriveWalker, Level, LinkFilter, ResourceLink};
