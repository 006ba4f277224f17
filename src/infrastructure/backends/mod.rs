pub mod model_pool;
pub mod piper_pool;
pub mod synthesis_backend;

pub use model_pool::{ModelVoicePool, VoiceModel, VoiceModelLoader};
pub use piper_pool::{PiperProcessPool, PiperSettings};
pub use synthesis_backend::SynthesisBackend;
