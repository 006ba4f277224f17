/// Prepare text for the synthesis engine.
///
/// Lines are joined with single spaces. When `auto_punctuation` is non-empty
/// and the text does not already end with one of its characters, the first of
/// them is appended; some voices trail off without terminal punctuation.
pub fn normalize_text(raw_text: &str, auto_punctuation: &str) -> String {
    let mut text = raw_text.trim().lines().collect::<Vec<_>>().join(" ");

    if let (Some(first_punctuation), Some(last_char)) =
        (auto_punctuation.chars().next(), text.chars().last())
    {
        if !auto_punctuation.contains(last_char) {
            text.push(first_punctuation);
        }
    }

    text
}
