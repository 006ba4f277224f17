use super::markup::remove_asterisks;
use regex::Regex;
use std::collections::VecDeque;
use std::sync::LazyLock;

/// A run of sentence-terminal punctuation followed by whitespace and the start
/// of a new sentence: a capital (or caseless) letter, or a numbered list item.
/// Only group 1 is consumed; what follows it stays in the buffer.
static SENTENCE_BOUNDARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^(.*?[.!?…。！？؟।॥]+)\s+(?:[\p{Lu}\p{Lt}\p{Lo}]|\d+\.)")
        .expect("valid sentence boundary pattern")
});

/// Short word ending in a period, e.g. `Dr.` or `e.g.`
static ABBREVIATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\p{L}{1,3}\.$").expect("valid abbreviation pattern"));

/// A candidate that is nothing but a list number such as `2.`
static LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+\.$").expect("valid list marker pattern"));

/// Number of trailing characters inspected for an abbreviation
const ABBREVIATION_WINDOW: usize = 5;

/// Splits text arriving in chunks into sentences that can be synthesized
/// independently.
///
/// Text is buffered until a boundary can be confirmed by the character that
/// follows it, so the same sentences come out however the text is chunked.
#[derive(Debug, Default, Clone)]
pub struct SentenceBoundaryDetector {
    remaining: String,
    current: String,
}

impl SentenceBoundaryDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and iterate over the sentences it completes.
    ///
    /// The iterator is lazy; sentences not pulled from it stay buffered and
    /// are picked up by the next call or by [`finish`](Self::finish).
    pub fn add_chunk(&mut self, chunk: &str) -> Sentences<'_> {
        self.remaining.push_str(chunk);
        Sentences {
            detector: self,
            ready: VecDeque::new(),
        }
    }

    /// Flush everything still buffered as the final sentence and reset.
    ///
    /// The result may be empty.
    pub fn finish(&mut self) -> String {
        let mut text = std::mem::take(&mut self.current);
        text.push_str(&self.remaining);
        self.remaining.clear();
        clean(&text)
    }

    /// Consume one boundary match, pushing any completed sentences to `ready`.
    /// Returns false when the buffer holds no further boundary.
    fn step(&mut self, ready: &mut VecDeque<String>) -> bool {
        let consumed = match SENTENCE_BOUNDARY
            .captures(&self.remaining)
            .and_then(|caps| caps.get(1))
        {
            Some(candidate) => candidate.end(),
            None => return false,
        };

        let candidate: String = self.remaining.drain(..consumed).collect();

        if self.current.is_empty() {
            self.current = candidate;
        } else if is_open(&self.current) {
            self.current.push_str(&candidate);
        } else {
            ready.push_back(clean(&self.current));
            self.current = candidate;
        }

        if !is_open(&self.current) {
            ready.push_back(clean(&self.current));
            self.current.clear();
        }

        true
    }
}

/// Lazy iterator over the sentences completed by one [`SentenceBoundaryDetector::add_chunk`] call
pub struct Sentences<'a> {
    detector: &'a mut SentenceBoundaryDetector,
    ready: VecDeque<String>,
}

impl Iterator for Sentences<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            if let Some(sentence) = self.ready.pop_front() {
                if sentence.is_empty() {
                    continue;
                }
                return Some(sentence);
            }
            if !self.detector.step(&mut self.ready) {
                return None;
            }
        }
    }
}

/// Whether the pending sentence must wait for more text before it is complete
fn is_open(current: &str) -> bool {
    let tail_start = current
        .char_indices()
        .rev()
        .nth(ABBREVIATION_WINDOW - 1)
        .map(|(index, _)| index)
        .unwrap_or(0);

    ABBREVIATION.is_match(&current[tail_start..]) || LIST_MARKER.is_match(current)
}

fn clean(text: &str) -> String {
    remove_asterisks(text).trim().to_string()
}
