//! Reply chunking for platform message-size limits.

/// Default per-message character limit (Discord-era value kept as the
/// product default; Telegram callers pass their own).
pub const DEFAULT_MESSAGE_LIMIT: usize = 2000;

/// Split `text` into segments of at most `max_length` characters, breaking
/// only at line boundaries.
///
/// Lines keep their trailing newline, so concatenating the returned segments
/// reproduces `text` exactly. A single line longer than `max_length` is
/// emitted alone as an oversized segment rather than split mid-line; callers
/// that cannot tolerate that must enforce a hard limit themselves. Empty
/// input yields no segments.
pub fn split_message(text: &str, max_length: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for line in split_keepends(text) {
        let line_len = line.chars().count();
        if current_len + line_len <= max_length {
            current.push_str(line);
            current_len += line_len;
            continue;
        }

        if !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }
        current.push_str(line);
        current_len = line_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Line iterator that keeps the terminating `\n` on each line.
fn split_keepends(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = text;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        match rest.find('\n') {
            Some(i) => {
                let (line, tail) = rest.split_at(i + 1);
                rest = tail;
                Some(line)
            }
            None => {
                let line = rest;
                rest = "";
                Some(line)
            }
        }
    })
}
