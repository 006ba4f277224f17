use std::collections::HashMap;

/// Resolve a speaker given by name or numeric id against a voice's
/// `speaker_id_map`. Returns `None` when neither matches.
pub fn resolve_speaker_id(speaker_id_map: &HashMap<String, i64>, speaker: &str) -> Option<i64> {
    if speaker.is_empty() {
        return None;
    }

    speaker_id_map
        .get(speaker)
        .copied()
        .or_else(|| speaker.trim().parse::<i64>().ok())
}
