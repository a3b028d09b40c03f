pub mod codec;
pub mod hash_bucket;
pub mod hash_directory;

pub use codec::FixedCodec;
pub use hash_bucket::{bucket_array_size, HashBucketPage};
pub use hash_directory::{HashDirectoryPage, DIRECTORY_ARRAY_SIZE, MAX_DEPTH};
