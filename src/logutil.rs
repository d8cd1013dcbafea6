//! Log sanitization helpers. Payload bytes and message text come straight off
//! the radio, so anything logged passes through these to stay single-line and
//! printable.

/// Escape a string for single-line logging: `\n`, `\r`, `\t` and backslash are
/// escaped, other control characters render as `\xNN`. Output is capped to
/// keep noisy payloads from flooding the log.
pub fn escape_log(s: &str) -> String {
    const MAX_PREVIEW: usize = 300;
    let mut out = String::with_capacity(s.len().min(MAX_PREVIEW) + 8);
    for (count, ch) in s.chars().enumerate() {
        if count >= MAX_PREVIEW {
            out.push('…');
            break;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                use std::fmt::Write;
                let _ = write!(&mut out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

/// Hex dump of at most `max` leading bytes, for frame/payload logging.
pub fn hex_snippet(data: &[u8], max: usize) -> String {
    data.iter()
        .take(max.min(data.len()))
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join("")
}

/// UTF-8 safe truncation for log display; never slices inside a multi-byte
/// character. Appends an ellipsis when input exceeds `max_bytes`.
pub fn truncate_for_log(input: &str, max_bytes: usize) -> String {
    if input.len() <= max_bytes {
        return escape_log(input);
    }
    let reserve = 3usize;
    let mut cut = max_bytes.saturating_sub(reserve);
    while cut > 0 && !input.is_char_boundary(cut) {
        cut -= 1;
    }
    let mut out = escape_log(&input[..cut]);
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_newlines() {
        assert_eq!(escape_log("a\nb\r\tc"), "a\\nb\\r\\tc");
    }

    #[test]
    fn hex_snippet_caps_length() {
        assert_eq!(hex_snippet(&[0x94, 0xC3, 0x00, 0x05], 2), "94c3");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        // Em dash is 3 bytes; the cut target lands inside it.
        let s = "12345\u{2014}7890";
        assert_eq!(truncate_for_log(s, 10), "12345...");
        assert_eq!(truncate_for_log("hello", 10), "hello");
    }
}
