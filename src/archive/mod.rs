pub mod index;
pub mod packer;

pub use index::{read_archive_index, verify_packed_ids};
pub use packer::FeatureArchiveWriter;
