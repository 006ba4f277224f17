pub mod normalize;
pub mod params;

pub use normalize::normalize_text;
pub use params::SynthesisParams;
