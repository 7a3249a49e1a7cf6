//! UTF-8 byte offset to UTF-16 offset conversion utilities.
//!
//! JavaScript uses UTF-16 code units for string indexing, while Rust uses bytes.
//! Printers running on the JavaScript side need template ranges in their own units.

use std::ops::Range;

/// Convert a byte offset to a UTF-16 code unit offset in a UTF-8 string.
///
/// For ASCII the two are the same; a 2- or 3-byte character is one UTF-16 unit,
/// and a 4-byte character (emoji, astral plane) is a surrogate pair of two units.
/// Offsets past the end clamp to the UTF-16 length of `content`.
///
/// # Examples
/// ```
/// use tagsplice_lib::utils::utf8_offsets::byte_to_utf16_offset;
///
/// assert_eq!(byte_to_utf16_offset("Hello", 5), 5);
/// // `æ` is 2 bytes, 1 unit
/// assert_eq!(byte_to_utf16_offset("æ", 2), 1);
/// // `👋` is 4 bytes, 2 units
/// assert_eq!(byte_to_utf16_offset("Hi 👋", 7), 5);
/// ```
pub fn byte_to_utf16_offset(content: &str, byte_offset: usize) -> usize {
    if byte_offset == 0 {
        return 0;
    }

    content
        .char_indices()
        .take_while(|(byte_idx, _)| *byte_idx < byte_offset)
        .map(|(_, c)| c.len_utf16())
        .sum()
}

/// Convert a byte range to a UTF-16 code unit range.
pub fn byte_range_to_utf16(content: &str, range: &Range<usize>) -> Range<usize> {
    let start = byte_to_utf16_offset(content, range.start);
    // Count only the slice between the two offsets instead of rescanning from zero
    let end = match content.get(range.start..range.end) {
        Some(slice) => start + slice.encode_utf16().count(),
        None => byte_to_utf16_offset(content, range.end),
    };
    start..end
}
