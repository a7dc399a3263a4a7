//! Local stores the coordinator reads from and writes through.
//!
//! # Modules
//!
//! - `bucket`: the [`Bucket`] contract every store implements
//! - `memory`: [`MemoryBucket`], an in-process bucket with an event outbox

pub mod bucket;
pub mod memory;

pub use bucket::Bucket;
pub use memory::MemoryBucket;
