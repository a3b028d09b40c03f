pub mod error;
pub mod hasher;
pub mod table;

pub use error::HashTableError;
pub use hasher::{DefaultKeyHasher, KeyHasher};
pub use table::ExtendibleHashTable;
