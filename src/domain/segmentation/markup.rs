use regex::Regex;
use std::sync::LazyLock;

/// `*word*`, `**word**` and unbalanced runs like `***word*`, across lines too
static INLINE_EMPHASIS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*+([^*]+)\*+").expect("valid emphasis pattern"));

/// Bullet markers opening a line, with the whitespace around them
static LINE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*\*+[ \t]*").expect("valid line marker pattern"));

/// Strip markdown emphasis and bullet asterisks so they are not read aloud.
///
/// Inline emphasis keeps its content (`**Bold**` becomes `Bold`). A run of
/// asterisks opening a line is dropped along with its surrounding blanks.
pub fn remove_asterisks(text: &str) -> String {
    let without_emphasis = INLINE_EMPHASIS.replace_all(text, "$1");
    LINE_MARKER.replace_all(&without_emphasis, "").into_owned()
}
