// Recursive character chunker
// Splits raw document text into bounded, overlapping chunks for embedding

#[cfg(test)]
mod tests;

use tracing::debug;

use crate::{Result, TextQaError};

/// Separator ladder, coarsest first: paragraph break, line break, word break.
/// Character-level splitting is the implicit final fallback.
const SEPARATORS: [&str; 3] = ["\n\n", "\n", " "];

/// Split `text` into chunks of at most `chunk_size` characters, where each
/// chunk after the first begins with the trailing `overlap` characters of the
/// chunk before it.
///
/// Separators stay attached to the text that follows them, so stripping the
/// `overlap`-character prefix of every chunk after the first and concatenating
/// the rest reconstructs the input exactly. Output is deterministic for a
/// given input and parameters.
///
/// Fails with [`TextQaError::InvalidInput`] when `chunk_size` is zero,
/// `overlap >= chunk_size`, or `text` is empty.
#[inline]
pub fn split(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<String>> {
    if chunk_size == 0 {
        return Err(TextQaError::InvalidInput(
            "chunk_size must be greater than zero".to_string(),
        ));
    }
    if overlap >= chunk_size {
        return Err(TextQaError::InvalidInput(format!(
            "overlap ({}) must be smaller than chunk_size ({})",
            overlap, chunk_size
        )));
    }
    if text.is_empty() {
        return Err(TextQaError::InvalidInput(
            "cannot split empty text".to_string(),
        ));
    }

    // Chunks after the first carry an `overlap`-character prefix from the
    // previous chunk, so the new content they can hold is capped accordingly.
    let piece_budget = chunk_size - overlap;

    let mut pieces = Vec::new();
    collect_pieces(text, 0, piece_budget, &mut pieces);

    let mut chunks: Vec<String> = Vec::new();
    let mut base = String::new();
    let mut base_len = 0_usize;

    for piece in pieces {
        let piece_len = piece.chars().count();
        let budget = if chunks.is_empty() {
            chunk_size
        } else {
            piece_budget
        };

        if base_len > 0 && base_len + piece_len > budget {
            push_chunk(&mut chunks, &base, overlap);
            base.clear();
            base_len = 0;
        }

        base.push_str(piece);
        base_len += piece_len;
    }

    if base_len > 0 {
        push_chunk(&mut chunks, &base, overlap);
    }

    debug!(
        "Split {} characters into {} chunks (chunk_size: {}, overlap: {})",
        text.chars().count(),
        chunks.len(),
        chunk_size,
        overlap
    );

    Ok(chunks)
}

/// Recursively break `text` into pieces of at most `max` characters,
/// preferring the coarsest separator that produces conforming pieces.
fn collect_pieces<'a>(text: &'a str, sep_idx: usize, max: usize, out: &mut Vec<&'a str>) {
    if text.chars().count() <= max {
        out.push(text);
        return;
    }

    if sep_idx >= SEPARATORS.len() {
        split_chars(text, max, out);
        return;
    }

    let parts = split_keeping_separator(text, SEPARATORS[sep_idx]);
    if parts.len() == 1 {
        // Separator not present, try the next finer one.
        collect_pieces(text, sep_idx + 1, max, out);
        return;
    }

    for part in parts {
        if part.chars().count() <= max {
            out.push(part);
        } else {
            collect_pieces(part, sep_idx + 1, max, out);
        }
    }
}

/// Split `text` at each occurrence of `sep`, leaving the separator attached
/// to the piece that follows it so that concatenating the pieces yields
/// `text` unchanged.
fn split_keeping_separator<'a>(text: &'a str, sep: &str) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut from = 0;

    while let Some(pos) = text[from..].find(sep) {
        let idx = from + pos;
        if idx > start {
            parts.push(&text[start..idx]);
            start = idx;
        }
        from = idx + sep.len();
    }

    parts.push(&text[start..]);
    parts
}

/// Character-level fallback: cut `text` into pieces of exactly `max`
/// characters (the last piece may be shorter), on char boundaries.
fn split_chars<'a>(text: &'a str, max: usize, out: &mut Vec<&'a str>) {
    let mut start = 0;
    let mut count = 0;

    for (idx, _) in text.char_indices() {
        if count == max {
            out.push(&text[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }

    if start < text.len() {
        out.push(&text[start..]);
    }
}

/// Append `base` as a chunk, prefixing it with the trailing `overlap`
/// characters of the previous chunk when there is one.
fn push_chunk(chunks: &mut Vec<String>, base: &str, overlap: usize) {
    match chunks.last() {
        Some(prev) if overlap > 0 => {
            let prefix = tail_chars(prev, overlap);
            let mut chunk = String::with_capacity(prefix.len() + base.len());
            chunk.push_str(prefix);
            chunk.push_str(base);
            chunks.push(chunk);
        }
        _ => chunks.push(base.to_string()),
    }
}

/// The final `n` characters of `s`, or all of `s` when it is shorter.
fn tail_chars(s: &str, n: usize) -> &str {
    let mut idx = s.len();
    let mut iter = s.char_indices().rev();

    for _ in 0..n {
        match iter.next() {
            Some((i, _)) => idx = i,
            None => return s,
        }
    }

    &s[idx..]
}
