//! Splitting long text into transport-sized chunks.

/// Splits `text` into chunks of at most `max_bytes` bytes, in order.
///
/// Cuts after the last line break that fits, else after the last whitespace, else at the last
/// char boundary. A single char wider than the limit becomes its own chunk. Whitespace-only
/// chunks are dropped.
pub fn split_into_chunks(text: &str, max_bytes: usize) -> Vec<&str> {
    let max_bytes = max_bytes.max(1);
    let mut chunks = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        let cut = if rest.len() <= max_bytes {
            rest.len()
        } else {
            cut_point(rest, max_bytes)
        };
        let (chunk, tail) = rest.split_at(cut);
        if !chunk.trim().is_empty() {
            chunks.push(chunk);
        }
        rest = tail;
    }

    chunks
}

/// Byte index to cut `text` at; `0 < result <= max_bytes` unless the first char alone is wider.
fn cut_point(text: &str, max_bytes: usize) -> usize {
    let mut limit = max_bytes;
    while !text.is_char_boundary(limit) {
        limit -= 1;
    }
    if limit == 0 {
        return text.chars().next().map_or(text.len(), char::len_utf8);
    }

    let window = &text[..limit];
    if let Some(i) = window.rfind('\n') {
        return i + 1;
    }
    if let Some((i, c)) = window.char_indices().rev().find(|(_, c)| c.is_whitespace()) {
        return i + c.len_utf8();
    }
    limit
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_one_chunk() {
        assert_eq!(split_into_chunks("hello", 4000), vec!["hello"]);
    }

    #[test]
    fn test_9000_bytes_limit_4000_gives_three_chunks() {
        let line = "x".repeat(99) + "\n";
        let text = line.repeat(90);
        assert_eq!(text.len(), 9000);

        let chunks = split_into_chunks(&text, 4000);
        let sizes: Vec<usize> = chunks.iter().map(|c| c.len()).collect();
        assert_eq!(sizes, vec![4000, 4000, 1000]);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_prefers_line_break_over_space() {
        let chunks = split_into_chunks("aaa bbb\nccc ddd", 12);
        assert_eq!(chunks, vec!["aaa bbb\n", "ccc ddd"]);
    }

    #[test]
    fn test_falls_back_to_whitespace() {
        let chunks = split_into_chunks("alpha beta gamma", 12);
        assert_eq!(chunks, vec!["alpha beta ", "gamma"]);
    }

    #[test]
    fn test_hard_cut_never_splits_a_char() {
        // Cyrillic letters are two bytes each.
        let text = "привет".repeat(10);
        for chunk in split_into_chunks(&text, 7) {
            assert!(chunk.len() <= 7);
            assert_eq!(chunk.len() % 2, 0);
        }
        assert_eq!(split_into_chunks(&text, 7).concat(), text);
    }

    #[test]
    fn test_char_wider_than_limit_is_sent_alone() {
        assert_eq!(split_into_chunks("😀a", 2), vec!["😀", "a"]);
    }

    #[test]
    fn test_whitespace_only_chunks_are_dropped() {
        let text = format!("{}\n{}\n", "a".repeat(5), " ".repeat(5));
        assert_eq!(split_into_chunks(&text, 6), vec!["aaaaa\n"]);
    }
}
