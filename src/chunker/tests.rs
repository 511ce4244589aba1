use super::*;

/// Undo the overlap: strip each non-first chunk's shared prefix and
/// concatenate what remains.
fn reconstruct(chunks: &[String], overlap: usize) -> String {
    let mut text = String::new();
    let mut prev_len: Option<usize> = None;

    for chunk in chunks {
        match prev_len {
            None => text.push_str(chunk),
            Some(len) => text.extend(chunk.chars().skip(overlap.min(len))),
        }
        prev_len = Some(chunk.chars().count());
    }

    text
}

fn assert_chunk_properties(text: &str, chunks: &[String], chunk_size: usize, overlap: usize) {
    assert!(!chunks.is_empty());

    for chunk in chunks {
        assert!(!chunk.is_empty(), "chunks must be non-empty");
        assert!(
            chunk.chars().count() <= chunk_size,
            "chunk exceeds size bound: {:?} ({} chars, max {})",
            chunk,
            chunk.chars().count(),
            chunk_size
        );
    }

    for pair in chunks.windows(2) {
        let prev_chars: Vec<char> = pair[0].chars().collect();
        let shared = overlap.min(prev_chars.len());
        let expected_prefix: String = prev_chars[prev_chars.len() - shared..].iter().collect();
        let actual_prefix: String = pair[1].chars().take(shared).collect();
        assert_eq!(
            expected_prefix, actual_prefix,
            "adjacent chunks must share {} characters of context",
            shared
        );
    }

    assert_eq!(
        reconstruct(chunks, overlap),
        text,
        "stripping overlap prefixes must reconstruct the input"
    );
}

#[test]
fn rejects_zero_chunk_size() {
    let result = split("some text", 0, 0);
    assert!(matches!(result, Err(TextQaError::InvalidInput(_))));
}

#[test]
fn rejects_overlap_not_smaller_than_chunk_size() {
    assert!(matches!(
        split("some text", 10, 10),
        Err(TextQaError::InvalidInput(_))
    ));
    assert!(matches!(
        split("some text", 10, 15),
        Err(TextQaError::InvalidInput(_))
    ));
}

#[test]
fn rejects_empty_text() {
    let result = split("", 10, 2);
    assert!(matches!(result, Err(TextQaError::InvalidInput(_))));
}

#[test]
fn short_text_yields_single_chunk() {
    let chunks = split("hello world", 100, 20).expect("should split");
    assert_eq!(chunks, vec!["hello world".to_string()]);
}

#[test]
fn word_boundary_scenario() {
    let text = "AAAA BBBB CCCC DDDD";
    let chunks = split(text, 9, 3).expect("should split");

    assert_eq!(chunks[0], "AAAA BBBB");
    assert!(chunks.len() >= 3);
    assert_chunk_properties(text, &chunks, 9, 3);
}

#[test]
fn prefers_paragraph_breaks() {
    let text = "First paragraph here.\n\nSecond paragraph here.\n\nThird one.";
    let chunks = split(text, 30, 0).expect("should split");

    // Each paragraph fits the bound on its own, so no paragraph is cut.
    assert!(chunks.iter().all(|c| c.contains("paragraph") || c.contains("Third")));
    assert_chunk_properties(text, &chunks, 30, 0);
}

#[test]
fn falls_back_to_line_breaks() {
    let text = "a line of text\nanother line\nshort\nlast line of the document";
    let chunks = split(text, 20, 4).expect("should split");
    assert_chunk_properties(text, &chunks, 20, 4);
}

#[test]
fn unsplittable_token_is_cut_at_character_level() {
    let text = "x".repeat(53);
    let chunks = split(&text, 10, 0).expect("should split");

    assert_eq!(chunks.len(), 6);
    assert_chunk_properties(&text, &chunks, 10, 0);
}

#[test]
fn unsplittable_token_with_overlap() {
    let text = "y".repeat(53);
    let chunks = split(&text, 10, 3).expect("should split");
    assert_chunk_properties(&text, &chunks, 10, 3);
}

#[test]
fn lossless_over_parameter_grid() {
    let text = "The quick brown fox jumps over the lazy dog.\n\
                Pack my box with five dozen liquor jugs.\n\n\
                How vexingly quick daft zebras jump! Sphinx of black quartz,\n\
                judge my vow. The five boxing wizards jump quickly.";

    for &(chunk_size, overlap) in &[(10, 0), (10, 3), (25, 5), (7, 3), (50, 10), (5, 4), (200, 40)]
    {
        let chunks = split(text, chunk_size, overlap).expect("should split");
        assert_chunk_properties(text, &chunks, chunk_size, overlap);
    }
}

#[test]
fn multibyte_text_respects_char_boundaries() {
    let text = "héllo wörld 一二三四五六七八九十 日本語のテキストです。 further ascii words here";
    let chunks = split(text, 8, 2).expect("should split");
    assert_chunk_properties(text, &chunks, 8, 2);
}

#[test]
fn consecutive_separators_are_preserved() {
    let text = "a\n\n\n\nb c\n\nd";
    let chunks = split(text, 4, 1).expect("should split");
    assert_chunk_properties(text, &chunks, 4, 1);
}

#[test]
fn output_is_deterministic() {
    let text = "Some repeatable input text.\n\nWith two paragraphs to split apart.";
    let first = split(text, 16, 4).expect("should split");
    let second = split(text, 16, 4).expect("should split");
    assert_eq!(first, second);
}

#[test]
fn whitespace_only_text_is_kept() {
    let text = "   \n\n   ";
    let chunks = split(text, 4, 1).expect("should split");
    assert_chunk_properties(text, &chunks, 4, 1);
}

#[test]
fn tail_chars_handles_short_strings() {
    assert_eq!(tail_chars("abcdef", 3), "def");
    assert_eq!(tail_chars("ab", 5), "ab");
    assert_eq!(tail_chars("日本語", 2), "本語");
}
