pub mod audio;
pub mod events;
pub mod info;
pub mod session;

pub use audio::audio_chunks;
pub use events::{ClientEvent, ServerEvent, Synthesize, SynthesizeChunk, SynthesizeStart};
pub use info::{build_info, Attribution, Info, TtsProgram, TtsVoice, TtsVoiceSpeaker};
pub use session::{Session, SessionMode, SessionSettings};
