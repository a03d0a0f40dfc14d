pub mod segment;
pub mod segmentizer;

pub use segment::{Chunk, Segment};
pub use segmentizer::Segmentizer;
