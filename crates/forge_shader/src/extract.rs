//! Entry-point discovery from shader source text
//!
//! Scalar shader kinds (vertex, pixel, compute) declare their entry points
//! directly in source as `<return-type> <Prefix>Name(...)`. Ray-tracing
//! shaders compile as a whole library and get exactly one entry-point
//! symbol synthesized from the file name.
//!
//! The textual scan lives in [`scan_entry_points`] so a change to the
//! signature convention touches one place.

use std::path::Path;

use crate::kind::ShaderKind;

/// Discover the ordered entry-point symbols for one source file.
///
/// Order is first-occurrence order in the source text. Duplicate names are
/// preserved, not deduplicated; the table mirrors the source.
pub fn entry_points(kind: ShaderKind, source_text: &str, source_path: &Path) -> Vec<String> {
    if kind.is_library() {
        let stem = source_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("");
        return vec![format!("{}{}", kind.prefix(), pascal_case(stem))];
    }
    scan_entry_points(source_text, kind.prefix())
}

/// Scan source text for function definitions of the form
/// `<word-run> <Prefix><identifier> (`, with arbitrary whitespace between
/// the pieces. Matches are non-overlapping; scanning resumes after the
/// opening parenthesis of each hit.
pub fn scan_entry_points(source: &str, prefix: &str) -> Vec<String> {
    let bytes = source.as_bytes();
    let pat = prefix.as_bytes();
    let mut symbols = Vec::new();
    let mut pos = 0;

    while let Some(hit) = find_from(bytes, pat, pos) {
        match match_signature(bytes, hit, pat.len()) {
            Some((symbol_end, resume)) => {
                symbols.push(source[hit..symbol_end].to_string());
                pos = resume;
            }
            None => pos = hit + 1,
        }
    }
    symbols
}

/// Try to complete a signature match around a prefix occurrence at `hit`.
/// Returns (end of symbol, position to resume scanning at).
fn match_signature(bytes: &[u8], hit: usize, prefix_len: usize) -> Option<(usize, usize)> {
    // A return-type word must precede the symbol, whitespace permitted.
    let mut before = hit;
    while before > 0 && bytes[before - 1].is_ascii_whitespace() {
        before -= 1;
    }
    if before == 0 || !is_word_byte(bytes[before - 1]) {
        return None;
    }

    // At least one identifier character after the prefix.
    let mut end = hit + prefix_len;
    while end < bytes.len() && is_word_byte(bytes[end]) {
        end += 1;
    }
    if end == hit + prefix_len {
        return None;
    }

    // Opening parenthesis, whitespace permitted.
    let mut paren = end;
    while paren < bytes.len() && bytes[paren].is_ascii_whitespace() {
        paren += 1;
    }
    if paren < bytes.len() && bytes[paren] == b'(' {
        Some((end, paren + 1))
    } else {
        None
    }
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn find_from(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from >= haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p + from)
}

/// Convert a file stem to PascalCase with underscores as word boundaries.
///
/// `my_shader` -> `MyShader`. Letters directly following another letter are
/// lowercased, letters following anything else are uppercased, so
/// `gi_probe_2x` -> `GiProbe2X`.
pub fn pascal_case(stem: &str) -> String {
    let mut out = String::with_capacity(stem.len());
    let mut prev_alpha = false;
    for c in stem.chars() {
        if c == '_' {
            prev_alpha = false;
            continue;
        }
        if prev_alpha {
            out.extend(c.to_lowercase());
        } else {
            out.extend(c.to_uppercase());
        }
        prev_alpha = c.is_alphabetic();
    }
    out
}
