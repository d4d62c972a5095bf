//! Pulls JSON objects out of free-form model output.
//!
//! Chat models often wrap the requested JSON in prose or markdown fences. A top-level span
//! starts at a `{` found outside any object and ends at its matching `}`. Braces inside JSON
//! string literals do not count toward nesting. Text outside spans is never interpreted, so
//! stray quotes or apostrophes in surrounding prose cannot desynchronise the scan.

use serde::de::DeserializeOwned;

/// Iterator over the top-level `{...}` spans of `text`, in order of appearance.
pub struct ObjectSpans<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Iterator for ObjectSpans<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let bytes = self.text.as_bytes();
        while self.pos < bytes.len() {
            let start = self.pos + bytes[self.pos..].iter().position(|&b| b == b'{')?;
            match matching_brace(bytes, start) {
                Some(end) => {
                    self.pos = end + 1;
                    return Some(&self.text[start..=end]);
                }
                // Unbalanced from here on; a later `{` can still close
                None => self.pos = start + 1,
            }
        }
        None
    }
}

fn matching_brace(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Top-level spans in order; `.next()` is the first `{...}` object in the text.
pub fn object_spans(text: &str) -> ObjectSpans<'_> {
    ObjectSpans { text, pos: 0 }
}

/// Decodes the first top-level span that parses as `T`.
///
/// Spans that are not valid JSON for `T` (placeholders like `{idea}` in an echoed prompt)
/// are skipped. Returns the last parse error when no span fits, or `None` when the text
/// has no span at all.
pub fn parse_first_object<T: DeserializeOwned>(text: &str) -> Option<Result<T, serde_json::Error>> {
    let mut last_err = None;
    for span in object_spans(text) {
        match serde_json::from_str::<T>(span) {
            Ok(value) => return Some(Ok(value)),
            Err(e) => last_err = Some(e),
        }
    }
    last_err.map(Err)
}
