//! Menu catalog: the set of navigable leaves for the current identity

pub mod loader;
pub mod store;
pub mod tree;

pub use loader::{CatalogLoad, CatalogLoader, CatalogScope, DirectoryService, HttpDirectoryService};
pub use store::{CatalogEntry, CatalogSnapshot, CatalogStore};
pub use tree::TreeShape;
