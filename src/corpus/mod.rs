pub mod materialize;
pub mod segments;
