//! Small text helpers.

/// Truncate `text` to at most `max_length` bytes, appending `affix` when
/// anything was cut off. Used to keep literal script text readable in
/// error messages.
///
/// Truncation is byte-based and assumes ASCII script text; a multi-byte
/// boundary is backed out of rather than split.
pub fn truncate(text: &str, max_length: usize, affix: &str) -> String {
    if text.len() <= max_length {
        return text.to_string();
    }

    let mut end = max_length;
    while !text.is_char_boundary(end) {
        end -= 1;
    }

    format!("{}{}", &text[..end], affix)
}
