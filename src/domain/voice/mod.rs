pub mod catalog;
pub mod model;
pub mod resolver;
pub mod speaker;

pub use catalog::{VoiceCatalog, VoiceEntry, VoiceLanguage};
pub use model::{AudioFormat, SynthesizedAudio, VoiceSelector};
pub use resolver::{ResolvedVoice, VoiceResolver};
pub use speaker::resolve_speaker_id;
