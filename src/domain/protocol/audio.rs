use super::events::ServerEvent;
use crate::domain::voice::SynthesizedAudio;

/// Split synthesized PCM into `audio-chunk` events of `samples_per_chunk`
/// frames each. The last chunk may be shorter.
pub fn audio_chunks(
    audio: &SynthesizedAudio,
    samples_per_chunk: usize,
) -> impl Iterator<Item = ServerEvent> + '_ {
    let bytes_per_chunk = (audio.format.bytes_per_frame() * samples_per_chunk).max(1);

    audio
        .pcm
        .chunks(bytes_per_chunk)
        .map(move |chunk| ServerEvent::audio_chunk(audio.format, chunk.to_vec()))
}
