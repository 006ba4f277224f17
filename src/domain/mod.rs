pub mod protocol;
pub mod segmentation;
pub mod synthesis;
pub mod voice;
