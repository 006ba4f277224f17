pub mod wav;

pub use wav::{read_wav, read_wav_bytes, read_wav_file};
