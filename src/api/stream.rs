use crate::config::StreamFilter;
use regex::Regex;

const EVENT_PREFIX: &str = "data: ";

/// UTF-8 decoder that survives characters split across chunk boundaries.
///
/// An incomplete trailing sequence is held back until the next chunk. Invalid
/// bytes decode to U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8ChunkDecoder {
    pending: Vec<u8>,
}

impl Utf8ChunkDecoder {
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);

        let mut out = String::new();
        let mut consumed = 0;
        loop {
            let rest = &self.pending[consumed..];
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    consumed = self.pending.len();
                    break;
                }
                Err(err) => {
                    let valid = err.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&rest[..valid]));
                    match err.error_len() {
                        Some(bad) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            consumed += valid + bad;
                        }
                        None => {
                            consumed += valid;
                            break;
                        }
                    }
                }
            }
        }

        self.pending.drain(..consumed);
        out
    }

    /// True while the tail of the last chunk is an incomplete character.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Flush whatever is still held back at end of stream.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            String::new()
        } else {
            self.pending.clear();
            char::REPLACEMENT_CHARACTER.to_string()
        }
    }
}

/// Builds the display string from successive decoded chunks.
#[derive(Debug)]
pub struct ResponseAccumulator {
    text: String,
    strip_event_prefix: bool,
    placeholder: Option<Placeholder>,
}

#[derive(Debug)]
struct Placeholder {
    pattern: Regex,
    /// Most bytes of a match that can sit before the newest chunk.
    reach: usize,
}

impl ResponseAccumulator {
    pub fn new(filter: &StreamFilter) -> Self {
        Self {
            text: String::new(),
            strip_event_prefix: filter.strip_event_prefix,
            placeholder: filter.placeholder.as_deref().and_then(placeholder_pattern),
        }
    }

    /// Append one decoded chunk and return the running text.
    pub fn push(&mut self, chunk: &str) -> &str {
        self.push_with(chunk, true)
    }

    /// Like [`push`](Self::push), but with `join == false` the chunk finishes a
    /// character split off the previous one: no prefix strip, no separator.
    pub fn push_with(&mut self, chunk: &str, join: bool) -> &str {
        let chunk = match chunk.strip_prefix(EVENT_PREFIX) {
            Some(rest) if join && self.strip_event_prefix => rest,
            _ => chunk,
        };
        if chunk.is_empty() {
            return &self.text;
        }

        let boundary = self.text.len();
        if join && !self.text.is_empty() && !self.text.ends_with(char::is_whitespace) {
            self.text.push(' ');
        }
        self.text.push_str(chunk);
        self.strip_placeholder(boundary);
        &self.text
    }

    /// Earlier text is already clean, so only a window reaching back from the
    /// newest chunk can hold a fresh match.
    fn strip_placeholder(&mut self, boundary: usize) {
        let Some(placeholder) = &self.placeholder else {
            return;
        };
        let mut start = boundary.saturating_sub(placeholder.reach);
        while !self.text.is_char_boundary(start) {
            start -= 1;
        }
        let window = &self.text[start..];
        if placeholder.pattern.is_match(window) {
            let cleaned = placeholder.pattern.replace_all(window, "").into_owned();
            self.text.truncate(start);
            self.text.push_str(&cleaned);
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

fn placeholder_pattern(phrase: &str) -> Option<Placeholder> {
    let phrase = phrase.trim();
    if phrase.is_empty() {
        return None;
    }
    match Regex::new(&format!(r"(?i){}[.\s]*", regex::escape(phrase))) {
        // case folding can change a char's encoded width, up to 4 bytes
        Ok(pattern) => Some(Placeholder {
            pattern,
            reach: phrase.chars().count() * 4,
        }),
        Err(err) => {
            tracing::warn!(error = %err, "placeholder phrase rejected, leaving stream text untouched");
            None
        }
    }
}

/// Run a whole chunk sequence through a fresh accumulator.
pub fn accumulate<'a, I>(filter: &StreamFilter, chunks: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut acc = ResponseAccumulator::new(filter);
    for chunk in chunks {
        acc.push(chunk);
    }
    acc.into_text()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn filter() -> StreamFilter {
        StreamFilter::default()
    }

    #[test]
    fn strips_prefix_and_joins_with_space() {
        assert_eq!(accumulate(&filter(), ["data: Hello", "world"]), "Hello world");
    }

    #[test]
    fn removes_placeholder_wherever_it_lands() {
        assert_eq!(
            accumulate(&filter(), ["Processing your request...", "Done"]),
            "Done"
        );
        assert_eq!(
            accumulate(&filter(), ["Hello", "PROCESSING YOUR REQUEST. . .", "world"]),
            "Hello world"
        );
        assert_eq!(
            accumulate(&filter(), ["Step one processing your request... step two"]),
            "Step one step two"
        );
    }

    #[test]
    fn no_separator_after_trailing_whitespace() {
        assert_eq!(accumulate(&filter(), ["line one\n", "line two"]), "line one\nline two");
        assert_eq!(accumulate(&filter(), ["a ", "b"]), "a b");
    }

    #[test]
    fn prefix_only_stripped_at_chunk_start() {
        assert_eq!(
            accumulate(&filter(), ["see data: here"]),
            "see data: here"
        );
        let keep = StreamFilter {
            strip_event_prefix: false,
            placeholder: None,
        };
        assert_eq!(accumulate(&keep, ["data: raw"]), "data: raw");
    }

    #[test]
    fn disabled_placeholder_keeps_text() {
        let keep = StreamFilter {
            strip_event_prefix: true,
            placeholder: None,
        };
        assert_eq!(
            accumulate(&keep, ["Processing your request...", "Done"]),
            "Processing your request... Done"
        );
    }

    #[test]
    fn zero_chunks_is_empty() {
        assert_eq!(accumulate(&filter(), std::iter::empty()), "");
        assert_eq!(accumulate(&filter(), ["", "data: "]), "");
    }

    #[test]
    fn running_text_grows_in_order() {
        let mut acc = ResponseAccumulator::new(&filter());
        let mut seen = Vec::new();
        for chunk in ["one", "two", "three"] {
            seen.push(acc.push(chunk).to_string());
        }
        assert_eq!(seen, vec!["one", "one two", "one two three"]);
    }

    #[test]
    fn decoder_rejoins_split_characters() {
        let bytes = "héllo ✓".as_bytes();
        let mut decoder = Utf8ChunkDecoder::default();
        let mut out = String::new();
        for byte in bytes {
            out.push_str(&decoder.decode(std::slice::from_ref(byte)));
        }
        out.push_str(&decoder.finish());
        assert_eq!(out, "héllo ✓");
    }

    #[test]
    fn decoder_replaces_invalid_bytes() {
        let mut decoder = Utf8ChunkDecoder::default();
        assert_eq!(decoder.decode(b"ok\xffgo"), "ok\u{FFFD}go");
        assert_eq!(decoder.decode(&[0xE2, 0x9C]), "");
        assert_eq!(decoder.finish(), "\u{FFFD}");
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn continuation_chunk_joins_without_separator() {
        let bytes = "naïve café".as_bytes();
        let (head, rest) = bytes.split_at(3);
        let mut decoder = Utf8ChunkDecoder::default();
        let mut acc = ResponseAccumulator::new(&filter());

        let join = !decoder.has_pending();
        acc.push_with(&decoder.decode(head), join);
        assert!(decoder.has_pending());

        let join = !decoder.has_pending();
        acc.push_with(&decoder.decode(rest), join);
        assert!(!decoder.has_pending());
        assert_eq!(acc.text(), "naïve café");
    }

    #[test]
    fn continuation_keeps_a_leading_event_prefix() {
        let mut acc = ResponseAccumulator::new(&filter());
        acc.push("data: x");
        assert_eq!(acc.push_with("data: y", false), "xdata: y");
    }

    /// Strip, join, then clean the whole text after every chunk.
    fn whole_text_join(chunks: &[&str]) -> String {
        let pattern = Regex::new(r"(?i)Processing your request[.\s]*").unwrap();
        let mut text = String::new();
        for chunk in chunks {
            let chunk = chunk.strip_prefix(EVENT_PREFIX).unwrap_or(chunk);
            if chunk.is_empty() {
                continue;
            }
            if !text.is_empty() && !text.ends_with(char::is_whitespace) {
                text.push(' ');
            }
            text.push_str(chunk);
            text = pattern.replace_all(&text, "").into_owned();
        }
        text
    }

    #[test]
    fn matches_whole_text_join_for_chunk_sequences() {
        let cases: &[&[&str]] = &[
            &["data: Hello", "world"],
            &["data: a", "b", "data: c", "data: "],
            &["line\n", "data: next\t", "tail "],
            &["Processing your request...", "Done"],
            &["Hello", "processing YOUR request . . .", "world"],
            &["Answer:", "Processing your request"],
            &["Answer:", "Processing your", "request...", "more"],
            &["Proc", "essing your request", "ok"],
            &["data: Processing your request... Hello"],
            &["ünïcödé ", "data: Processing your request..", "🚀 lift", "off"],
            &["x processing your request y", "processing your request z"],
        ];
        for chunks in cases {
            let expected = whole_text_join(chunks);
            assert_eq!(
                accumulate(&filter(), chunks.iter().copied()),
                expected,
                "chunks: {chunks:?}"
            );
        }
    }
}
