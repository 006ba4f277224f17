pub mod detector;
pub mod markup;

pub use detector::{SentenceBoundaryDetector, Sentences};
pub use markup::remove_asterisks;
