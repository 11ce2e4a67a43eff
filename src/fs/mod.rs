//! File system abstraction so sources can be exercised without touching disk

mod mock;
mod real;
mod r#trait;

pub use mock::MockFileSystem;
pub use r#trait::{FileMetadata, FileSystem, FileType};
pub use real::RealFileSystem;
